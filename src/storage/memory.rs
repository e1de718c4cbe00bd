use crate::{
    error::{BedrockError, Result},
    models::ArtifactRecord,
    storage::{traits::ArtifactStore, validate_name},
};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryArtifactStore {
    records: RwLock<HashMap<String, ArtifactRecord>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn save(&self, name: &str, payload: serde_json::Value) -> Result<ArtifactRecord> {
        validate_name(name)?;
        let record = ArtifactRecord::new(name, payload);
        self.records
            .write()
            .await
            .insert(name.to_string(), record.clone());
        Ok(record)
    }

    async fn load(&self, name: &str) -> Result<ArtifactRecord> {
        validate_name(name)?;
        self.records
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| BedrockError::ArtifactNotFound(name.to_string()))
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        validate_name(name)?;
        Ok(self.records.read().await.contains_key(name))
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        validate_name(name)?;
        Ok(self.records.write().await.remove(name).is_some())
    }

    async fn list(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.records.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}
