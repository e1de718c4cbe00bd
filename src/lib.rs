pub mod bedrock;
pub mod catalog;
pub mod classifier;
pub mod config;
pub mod error;
pub mod geometry;
pub mod logger;
pub mod models;
pub mod normalizer;
pub mod payload;
pub mod storage;

pub use bedrock::{BedrockClient, ModelInvoker, RequestDispatcher};
pub use catalog::{ProviderCatalog, ProviderSizeTable};
pub use classifier::ResponseClassifier;
pub use config::{AdapterConfig, BedrockConfig};
pub use error::{BedrockError, Result};
pub use geometry::{GeometryResolver, ResolvedGeometry};
pub use models::{
    GeneratedImage, GenerationRequest, GenerationResult, ImageAnalysis, InferenceParameters,
    NormalizedImage, ProviderFamily, ReferenceImage, TaskType,
};
pub use normalizer::ImageNormalizer;
pub use payload::{PayloadBuilder, WirePayload};
pub use storage::{ArtifactStorageManager, ArtifactStore, FileArtifactStore, MemoryArtifactStore};
