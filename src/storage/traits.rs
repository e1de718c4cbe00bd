use crate::{error::Result, models::ArtifactRecord};
use async_trait::async_trait;

/// Key-addressed store for intermediate pipeline artifacts.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Replaces any artifact already stored under `name`.
    async fn save(&self, name: &str, payload: serde_json::Value) -> Result<ArtifactRecord>;

    /// Fails with `ArtifactNotFound` when nothing is stored under `name`.
    async fn load(&self, name: &str) -> Result<ArtifactRecord>;

    async fn exists(&self, name: &str) -> Result<bool>;

    async fn delete(&self, name: &str) -> Result<bool>;

    async fn list(&self) -> Result<Vec<String>>;
}
