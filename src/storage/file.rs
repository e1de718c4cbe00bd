use crate::{
    error::{BedrockError, Result},
    models::ArtifactRecord,
    storage::{traits::ArtifactStore, validate_name},
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const EXTENSION: &str = "json";

/// One JSON document per artifact under a base directory.
pub struct FileArtifactStore {
    base_dir: PathBuf,
}

impl FileArtifactStore {
    pub async fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        tokio::fs::create_dir_all(&base_dir).await?;
        log::debug!("Artifact directory: {}", base_dir.display());
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.base_dir.join(format!("{}.{}", name, EXTENSION)))
    }
}

#[async_trait]
impl ArtifactStore for FileArtifactStore {
    async fn save(&self, name: &str, payload: serde_json::Value) -> Result<ArtifactRecord> {
        let path = self.path_for(name)?;
        let record = ArtifactRecord::new(name, payload);
        let json = serde_json::to_vec_pretty(&record)?;

        // Write then rename so readers never see a partial document.
        let tmp = self
            .base_dir
            .join(format!("{}.{}.tmp", name, Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, json).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        log::info!("Stored artifact '{}' at {}", name, path.display());
        Ok(record)
    }

    async fn load(&self, name: &str) -> Result<ArtifactRecord> {
        let path = self.path_for(name)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BedrockError::ArtifactNotFound(name.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        let path = self.path_for(name)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let path = self.path_for(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.base_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}
