use crate::error::{BedrockError, Result};
use crate::normalizer::DEFAULT_JPEG_QUALITY;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_ARTIFACT_DIR: &str = "temp";

#[derive(Debug, Clone, Default)]
pub struct BedrockConfig {
    pub region: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub profile: Option<String>,
}

impl BedrockConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let region = env::var("AWS_REGION")
            .or_else(|_| env::var("AWS_DEFAULT_REGION"))
            .ok();
        let access_key = env::var("AWS_ACCESS_KEY_ID").ok();
        let secret_key = env::var("AWS_SECRET_ACCESS_KEY").ok();
        let profile = env::var("AWS_PROFILE").ok();

        BedrockConfig {
            region,
            access_key,
            secret_key,
            profile,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.access_key = Some(access_key.into());
        self.secret_key = Some(secret_key.into());
        self
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }
}

/// Settings of the adapter itself, independent of AWS credentials.
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    pub artifact_dir: PathBuf,
    pub invoke_timeout: Option<Duration>,
    pub catalog_path: Option<PathBuf>,
    pub jpeg_quality: u8,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        AdapterConfig {
            artifact_dir: PathBuf::from(DEFAULT_ARTIFACT_DIR),
            invoke_timeout: None,
            catalog_path: None,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl AdapterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(dir) = env::var("ADGEN_ARTIFACT_DIR") {
            if !dir.trim().is_empty() {
                config.artifact_dir = PathBuf::from(dir);
            }
        }
        if let Ok(secs) = env::var("ADGEN_INVOKE_TIMEOUT_SECS") {
            config.invoke_timeout = Some(Duration::from_secs(parse_var(
                "ADGEN_INVOKE_TIMEOUT_SECS",
                &secs,
            )?));
        }
        if let Ok(path) = env::var("ADGEN_CATALOG_PATH") {
            config.catalog_path = Some(PathBuf::from(path));
        }
        if let Ok(quality) = env::var("ADGEN_JPEG_QUALITY") {
            config = config.with_jpeg_quality(parse_var("ADGEN_JPEG_QUALITY", &quality)?)?;
        }

        Ok(config)
    }

    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = dir.into();
        self
    }

    pub fn with_invoke_timeout(mut self, timeout: Duration) -> Self {
        self.invoke_timeout = Some(timeout);
        self
    }

    pub fn with_catalog_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog_path = Some(path.into());
        self
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Result<Self> {
        if !(1..=100).contains(&quality) {
            return Err(BedrockError::ConfigError(format!(
                "jpeg quality must be within 1..=100, got {}",
                quality
            )));
        }
        self.jpeg_quality = quality;
        Ok(self)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| BedrockError::ConfigError(format!("{} has invalid value '{}'", name, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_defaults() {
        let config = AdapterConfig::default();
        assert_eq!(config.artifact_dir, PathBuf::from("temp"));
        assert_eq!(config.jpeg_quality, 75);
        assert!(config.invoke_timeout.is_none());
        assert!(config.catalog_path.is_none());
    }

    #[test]
    fn test_adapter_builders() {
        let config = AdapterConfig::new()
            .with_artifact_dir("/tmp/adgen")
            .with_invoke_timeout(Duration::from_secs(30))
            .with_jpeg_quality(90)
            .unwrap();
        assert_eq!(config.artifact_dir, PathBuf::from("/tmp/adgen"));
        assert_eq!(config.invoke_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.jpeg_quality, 90);

        assert!(AdapterConfig::new().with_jpeg_quality(0).is_err());
        assert!(AdapterConfig::new().with_jpeg_quality(101).is_err());
    }

    #[test]
    fn test_parse_var() {
        assert_eq!(parse_var::<u64>("X", " 12 ").unwrap(), 12);
        assert!(matches!(
            parse_var::<u8>("ADGEN_JPEG_QUALITY", "high"),
            Err(BedrockError::ConfigError(_))
        ));
    }

    #[test]
    fn test_bedrock_builders() {
        let config = BedrockConfig::new()
            .with_region("us-west-2")
            .with_credentials("AKIA", "secret")
            .with_profile("adgen");
        assert_eq!(config.region.as_deref(), Some("us-west-2"));
        assert_eq!(config.access_key.as_deref(), Some("AKIA"));
        assert_eq!(config.secret_key.as_deref(), Some("secret"));
        assert_eq!(config.profile.as_deref(), Some("adgen"));
    }
}
