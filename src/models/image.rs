use crate::error::{BedrockError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A reference image after resampling: base64 JPEG plus its pixel size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    pub data: String,
    pub width: u32,
    pub height: u32,
    pub media_type: String,
}

/// Image bytes returned by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
}

impl GeneratedImage {
    pub fn from_base64(data: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(data.trim())
            .map_err(|e| BedrockError::MalformedResponse(format!("invalid base64 image: {}", e)))?;
        Ok(Self { bytes })
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    pub fn format(&self) -> Option<image::ImageFormat> {
        image::guess_format(&self.bytes).ok()
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, &self.bytes)?;
        Ok(())
    }
}

// Stability SD3

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode")]
pub enum Sd3Request {
    #[serde(rename = "text-to-image")]
    TextToImage {
        prompt: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        negative_prompt: Option<String>,
        seed: u32,
        aspect_ratio: String,
        output_format: String,
    },
    #[serde(rename = "image-to-image")]
    ImageToImage {
        prompt: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        negative_prompt: Option<String>,
        seed: u32,
        image: String,
        strength: f32,
        output_format: String,
    },
}

#[derive(Debug, Deserialize)]
pub struct Sd3Response {
    pub images: Vec<String>,
    #[serde(default)]
    pub finish_reasons: Vec<Option<String>>,
    #[serde(default)]
    pub seeds: Vec<u64>,
}

// Legacy Stability diffusion

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextPrompt {
    pub text: String,
    pub weight: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StableDiffusionRequest {
    pub text_prompts: Vec<TextPrompt>,
    pub cfg_scale: f32,
    pub steps: u32,
    pub seed: u32,
    pub style_preset: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init_image: Option<String>,
    pub image_strength: f32,
}

#[derive(Debug, Deserialize)]
pub struct StableDiffusionResponse {
    pub artifacts: Vec<StableDiffusionArtifact>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StableDiffusionArtifact {
    pub base64: Option<String>,
    pub finish_reason: Option<String>,
    pub seed: Option<u64>,
}

// Amazon Titan Image Generator

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageGenerationConfig {
    pub number_of_images: u32,
    pub height: u32,
    pub width: u32,
    pub cfg_scale: f32,
    pub seed: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextToImageParams {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InPaintingParams {
    pub image: String,
    pub text: String,
    pub mask_prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutPaintingParams {
    pub image: String,
    pub text: String,
    pub mask_prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_text: Option<String>,
    pub out_painting_mode: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageVariationParams {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_text: Option<String>,
    pub images: Vec<String>,
    pub similarity_strength: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorGuidedGenerationParams {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_text: Option<String>,
    pub reference_image: String,
    pub colors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackgroundRemovalParams {
    pub image: String,
}

/// One variant per Titan task; the variant name becomes `taskType`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "taskType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TitanImageRequest {
    TextImage {
        #[serde(rename = "textToImageParams")]
        params: TextToImageParams,
        #[serde(rename = "imageGenerationConfig")]
        config: ImageGenerationConfig,
    },
    Inpainting {
        #[serde(rename = "inPaintingParams")]
        params: InPaintingParams,
        #[serde(rename = "imageGenerationConfig")]
        config: ImageGenerationConfig,
    },
    Outpainting {
        #[serde(rename = "outPaintingParams")]
        params: OutPaintingParams,
        #[serde(rename = "imageGenerationConfig")]
        config: ImageGenerationConfig,
    },
    ImageVariation {
        #[serde(rename = "imageVariationParams")]
        params: ImageVariationParams,
        #[serde(rename = "imageGenerationConfig")]
        config: ImageGenerationConfig,
    },
    ColorGuidedGeneration {
        #[serde(rename = "colorGuidedGenerationParams")]
        params: ColorGuidedGenerationParams,
        #[serde(rename = "imageGenerationConfig")]
        config: ImageGenerationConfig,
    },
    BackgroundRemoval {
        #[serde(rename = "backgroundRemovalParams")]
        params: BackgroundRemovalParams,
    },
}

#[derive(Serialize, Deserialize)]
pub struct TitanImageResponse {
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}
