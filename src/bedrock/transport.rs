use crate::error::Result;
use async_trait::async_trait;

/// One raw model invocation: a JSON request body in, a JSON response body out.
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    async fn invoke(&self, model_id: &str, body: Vec<u8>) -> Result<Vec<u8>>;
}
