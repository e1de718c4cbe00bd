use crate::error::{BedrockError, Result};
use crate::models::GeneratedImage;

/// Outcome of one dispatched request. Owned by the caller once returned.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationResult {
    Text {
        content: String,
        input_tokens: u32,
        output_tokens: u32,
    },
    Image {
        images: Vec<GeneratedImage>,
    },
    /// Generation failure the provider reported inside a successful response.
    Error { code: String, message: String },
}

impl GenerationResult {
    pub fn failed(code: impl Into<String>) -> Self {
        let code = code.into();
        GenerationResult::Error {
            message: format!("Image generation error. Error code is {}", code),
            code,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, GenerationResult::Error { .. })
    }

    pub fn images(&self) -> &[GeneratedImage] {
        match self {
            GenerationResult::Image { images } => images,
            _ => &[],
        }
    }

    /// Turns the in-band `Error` variant into `BedrockError::GenerationFailed`.
    pub fn into_result(self) -> Result<Self> {
        match self {
            GenerationResult::Error { code, message } => {
                Err(BedrockError::GenerationFailed { code, message })
            }
            other => Ok(other),
        }
    }
}
