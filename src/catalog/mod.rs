//! Static registry of provider size tables, model routing and finish-reason
//! policies. The built-in data lives in `providers.json`; new providers are
//! added there, not in code.

use crate::{
    error::{BedrockError, Result},
    models::{Modality, ModelInfo, ProviderFamily},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

const BUILTIN_CATALOG: &str = include_str!("providers.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(u32, u32)", into = "(u32, u32)")]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl From<(u32, u32)> for ImageSize {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

impl From<ImageSize> for (u32, u32) {
    fn from(size: ImageSize) -> Self {
        (size.width, size.height)
    }
}

/// Supported aspect ratios and discrete sizes, in table order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSizeTable {
    pub name: String,
    pub families: Vec<ProviderFamily>,
    pub aspect_ratios: Vec<f64>,
    pub sizes: Vec<ImageSize>,
}

impl ProviderSizeTable {
    pub fn contains(&self, width: u32, height: u32) -> bool {
        self.sizes
            .iter()
            .any(|s| s.width == width && s.height == height)
    }

    fn validate(&self) -> Result<()> {
        if self.aspect_ratios.is_empty() || self.sizes.is_empty() {
            return Err(BedrockError::ConfigError(format!(
                "size table '{}' must list aspect ratios and sizes",
                self.name
            )));
        }
        if let Some(ratio) = self
            .aspect_ratios
            .iter()
            .find(|r| !r.is_finite() || **r <= 0.0)
        {
            return Err(BedrockError::ConfigError(format!(
                "size table '{}' has invalid aspect ratio {}",
                self.name, ratio
            )));
        }
        if let Some(size) = self.sizes.iter().find(|s| s.width == 0 || s.height == 0) {
            return Err(BedrockError::ConfigError(format!(
                "size table '{}' has zero-area size {}x{}",
                self.name, size.width, size.height
            )));
        }
        Ok(())
    }
}

/// Model-id rule: every substring must occur in the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRoute {
    pub contains: Vec<String>,
    pub family: ProviderFamily,
}

impl ModelRoute {
    pub fn matches(&self, model_id: &str) -> bool {
        self.contains.iter().all(|needle| model_id.contains(needle.as_str()))
    }
}

/// Decides which provider finish reasons are hard failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishReasonPolicy {
    pub family: ProviderFamily,
    #[serde(default)]
    pub deny: Vec<String>,
    #[serde(default)]
    pub allow: Vec<String>,
    #[serde(default = "default_deny_unlisted")]
    pub deny_unlisted: bool,
}

fn default_deny_unlisted() -> bool {
    true
}

impl FinishReasonPolicy {
    pub fn strict(family: ProviderFamily) -> Self {
        Self {
            family,
            deny: Vec::new(),
            allow: Vec::new(),
            deny_unlisted: true,
        }
    }

    /// Empty or missing reasons never fail.
    pub fn is_failure(&self, reason: Option<&str>) -> bool {
        let reason = match reason.map(str::trim) {
            Some(r) if !r.is_empty() => r,
            _ => return false,
        };
        if self.allow.iter().any(|a| a == reason) {
            return false;
        }
        if self.deny.iter().any(|d| d == reason) {
            return true;
        }
        self.deny_unlisted
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderCatalog {
    tables: Vec<ProviderSizeTable>,
    #[serde(default)]
    routes: Vec<ModelRoute>,
    #[serde(default)]
    default_family: Option<ProviderFamily>,
    #[serde(default)]
    finish_reasons: Vec<FinishReasonPolicy>,
    #[serde(default)]
    extended_ceiling_models: Vec<String>,
    #[serde(default)]
    models: Vec<ModelInfo>,
}

impl ProviderCatalog {
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_CATALOG)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let catalog: ProviderCatalog = serde_json::from_str(json)
            .map_err(|e| BedrockError::ConfigError(format!("invalid provider catalog: {}", e)))?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading provider catalog from {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<()> {
        for table in &self.tables {
            table.validate()?;
        }
        Ok(())
    }

    pub fn tables(&self) -> &[ProviderSizeTable] {
        &self.tables
    }

    pub fn sizes_for(&self, family: ProviderFamily) -> Result<&ProviderSizeTable> {
        self.tables
            .iter()
            .find(|t| t.families.contains(&family))
            .ok_or_else(|| {
                BedrockError::UnknownProvider(format!("no size table registered for {}", family))
            })
    }

    pub fn family_for_model(&self, model_id: &str) -> Result<ProviderFamily> {
        self.routes
            .iter()
            .find(|route| route.matches(model_id))
            .map(|route| route.family)
            .or(self.default_family)
            .ok_or_else(|| BedrockError::UnknownProvider(model_id.to_string()))
    }

    pub fn finish_reason_policy(&self, family: ProviderFamily) -> FinishReasonPolicy {
        self.finish_reasons
            .iter()
            .find(|p| p.family == family)
            .cloned()
            .unwrap_or_else(|| FinishReasonPolicy::strict(family))
    }

    /// Models whose TEXT_IMAGE ceiling is 1408px instead of 1024px.
    pub fn has_extended_ceiling(&self, model_id: &str) -> bool {
        self.extended_ceiling_models
            .iter()
            .any(|prefix| model_id.contains(prefix.as_str()))
    }

    pub fn models(&self) -> &[ModelInfo] {
        &self.models
    }

    pub fn filtered_models(&self, input: Modality, output: Modality) -> Vec<&ModelInfo> {
        self.models
            .iter()
            .filter(|m| m.accepts(input, output))
            .collect()
    }
}
