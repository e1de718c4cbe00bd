pub mod file;
pub mod memory;
pub mod traits;

use crate::{
    config::AdapterConfig,
    error::{BedrockError, Result},
    models::ArtifactRecord,
};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

pub use file::FileArtifactStore;
pub use memory::MemoryArtifactStore;
pub use traits::ArtifactStore;

pub(crate) fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\'])
        || name.contains("..")
    {
        return Err(BedrockError::InvalidRequest(format!(
            "invalid artifact name '{}'",
            name
        )));
    }
    Ok(())
}

/// Typed access on top of any `ArtifactStore` backend.
#[derive(Clone)]
pub struct ArtifactStorageManager {
    backend: Arc<dyn ArtifactStore>,
}

impl ArtifactStorageManager {
    pub fn new(backend: Arc<dyn ArtifactStore>) -> Self {
        Self { backend }
    }

    pub async fn from_config(config: &AdapterConfig) -> Result<Self> {
        let store = FileArtifactStore::new(config.artifact_dir.clone()).await?;
        Ok(Self::new(Arc::new(store)))
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryArtifactStore::new()))
    }

    pub fn storage(&self) -> &Arc<dyn ArtifactStore> {
        &self.backend
    }

    pub async fn save_as<T: Serialize>(&self, name: &str, value: &T) -> Result<ArtifactRecord> {
        let payload = serde_json::to_value(value)?;
        self.backend.save(name, payload).await
    }

    pub async fn load_as<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let record = self.backend.load(name).await?;
        serde_json::from_value(record.payload).map_err(|e| {
            BedrockError::SerializationError(format!("artifact '{}': {}", name, e))
        })
    }

    pub async fn exists(&self, name: &str) -> Result<bool> {
        self.backend.exists(name).await
    }

    pub async fn delete(&self, name: &str) -> Result<bool> {
        self.backend.delete(name).await
    }

    pub async fn list(&self) -> Result<Vec<String>> {
        self.backend.list().await
    }
}
