pub mod common;
pub mod image;
pub mod request;
pub mod result;
pub mod storage;
pub mod text;

pub use common::*;
pub use self::image::*;
pub use request::*;
pub use result::*;
pub use storage::*;
pub use text::*;
