use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum BedrockError {
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Image decode error: {0}")]
    ImageDecode(String),

    #[error("Image encode error: {0}")]
    ImageEncode(String),

    #[error("Unsupported task type: {0}")]
    UnsupportedTaskType(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The provider answered successfully but reported that generation failed.
    #[error("{message}")]
    GenerationFailed { code: String, message: String },

    #[error("Artifact not found: {0}")]
    ArtifactNotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("AWS error: {0}")]
    AwsError(String),

    #[error("AWS service error: {0}")]
    AwsServiceError(String),

    #[error("Model invocation timed out after {0:?}")]
    Timeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BedrockError {
    /// True for failures the provider reported inside a successful response.
    pub fn is_generation_failure(&self) -> bool {
        matches!(self, Self::GenerationFailed { .. })
    }

    /// Transport-level failures a caller may choose to retry. This layer never does.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::AwsError(_) | Self::Timeout(_))
    }
}

impl From<serde_json::Error> for BedrockError {
    fn from(e: serde_json::Error) -> Self {
        BedrockError::SerializationError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BedrockError>;
