use crate::error::{BedrockError, Result};
use crate::models::{ChatMessage, ProviderFamily, TaskType};
use image::ImageReader;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;

/// Sampling and generation knobs for one request.
///
/// Text models read `max_tokens`, `temperature`, `top_p` and `top_k`; image
/// models read the rest. Built once per request and passed by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceParameters {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub seed: u32,
    pub cfg_scale: f32,
    pub steps: u32,
    pub style_preset: String,
    pub weight: f32,
    pub image_strength: f32,
    pub num_images: u32,
    pub similarity_strength: f32,
    pub colors: Vec<String>,
    pub outpainting_mode: String,
    /// Titan output size used when no reference image sets it.
    pub image_width: u32,
    pub image_height: u32,
}

impl Default for InferenceParameters {
    fn default() -> Self {
        Self {
            max_tokens: 4096,
            temperature: 0.5,
            top_p: 0.999,
            top_k: 250,
            seed: 45,
            cfg_scale: 10.0,
            steps: 30,
            style_preset: "photographic".to_string(),
            weight: 1.0,
            image_strength: 0.5,
            num_images: 3,
            similarity_strength: 0.7,
            colors: vec![
                "#FF0000".to_string(),
                "#00FF00".to_string(),
                "#0000FF".to_string(),
            ],
            outpainting_mode: "DEFAULT".to_string(),
            image_width: 1024,
            image_height: 1024,
        }
    }
}

impl InferenceParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = top_p;
        self
    }

    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_cfg_scale(mut self, cfg_scale: f32) -> Self {
        self.cfg_scale = cfg_scale;
        self
    }

    pub fn with_steps(mut self, steps: u32) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_style_preset(mut self, style_preset: impl Into<String>) -> Self {
        self.style_preset = style_preset.into();
        self
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_image_strength(mut self, image_strength: f32) -> Self {
        self.image_strength = image_strength;
        self
    }

    pub fn with_num_images(mut self, num_images: u32) -> Self {
        self.num_images = num_images;
        self
    }

    pub fn with_similarity_strength(mut self, similarity_strength: f32) -> Self {
        self.similarity_strength = similarity_strength;
        self
    }

    pub fn with_colors(mut self, colors: Vec<String>) -> Self {
        self.colors = colors;
        self
    }

    pub fn with_image_size(mut self, width: u32, height: u32) -> Self {
        self.image_width = width;
        self.image_height = height;
        self
    }
}

/// Caller supplied image. Never mutated; normalization produces a new image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceImage {
    bytes: Vec<u8>,
    media_type: String,
    width: u32,
    height: u32,
}

impl ReferenceImage {
    /// Reads the natural dimensions from the encoded header. An empty
    /// `media_type` is replaced with the sniffed one.
    pub fn from_bytes(bytes: Vec<u8>, media_type: impl Into<String>) -> Result<Self> {
        let reader = ImageReader::new(Cursor::new(bytes.as_slice()))
            .with_guessed_format()
            .map_err(|e| BedrockError::ImageDecode(e.to_string()))?;
        let sniffed = reader.format().map(|f| f.to_mime_type().to_string());
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| BedrockError::ImageDecode(e.to_string()))?;

        let mut media_type = media_type.into();
        if media_type.is_empty() {
            media_type = sniffed.unwrap_or_else(|| "application/octet-stream".to_string());
        }

        Ok(Self {
            bytes,
            media_type,
            width,
            height,
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let media_type = image::ImageFormat::from_path(path)
            .map(|f| f.to_mime_type().to_string())
            .unwrap_or_default();
        Self::from_bytes(bytes, media_type)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub model_id: String,
    pub prompt: String,
    pub mask_prompt: Option<String>,
    pub negative_prompt: Option<String>,
    pub task_type: TaskType,
    pub images: Vec<ReferenceImage>,
    /// Earlier turns of a chat; only text-chat models read it.
    pub history: Vec<ChatMessage>,
    pub parameters: InferenceParameters,
}

impl GenerationRequest {
    pub fn new(model_id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            prompt: prompt.into(),
            mask_prompt: None,
            negative_prompt: None,
            task_type: TaskType::None,
            images: Vec::new(),
            history: Vec::new(),
            parameters: InferenceParameters::default(),
        }
    }

    /// Prefills prompt, mask prompt and negative prompt from an earlier analysis stage.
    pub fn from_analysis(model_id: impl Into<String>, analysis: &ImageAnalysis) -> Self {
        Self::new(model_id, analysis.prompt.clone())
            .with_mask_prompt(analysis.mask_prompt.clone())
            .with_negative_prompt(analysis.negative_prompt.clone())
    }

    pub fn with_task_type(mut self, task_type: TaskType) -> Self {
        self.task_type = task_type;
        self
    }

    pub fn with_mask_prompt(mut self, mask_prompt: impl Into<String>) -> Self {
        self.mask_prompt = Some(mask_prompt.into());
        self
    }

    pub fn with_negative_prompt(mut self, negative_prompt: impl Into<String>) -> Self {
        self.negative_prompt = Some(negative_prompt.into());
        self
    }

    pub fn with_image(mut self, image: ReferenceImage) -> Self {
        self.images.push(image);
        self
    }

    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }

    pub fn with_parameters(mut self, parameters: InferenceParameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Negative prompt with blank values treated as absent.
    pub fn negative_text(&self) -> Option<String> {
        non_blank(self.negative_prompt.as_deref())
    }

    pub fn mask_text(&self) -> Option<String> {
        non_blank(self.mask_prompt.as_deref())
    }

    pub fn validate(&self, family: ProviderFamily) -> Result<()> {
        if self.task_type != TaskType::None && !family.is_image_capable() {
            return Err(BedrockError::InvalidRequest(format!(
                "task type {} needs an image model, {} is {}",
                self.task_type, self.model_id, family
            )));
        }

        if self.task_type.requires_reference_image() && self.images.is_empty() {
            return Err(BedrockError::InvalidRequest(format!(
                "task type {} needs at least one reference image",
                self.task_type
            )));
        }

        if family == ProviderFamily::TitanImage
            && matches!(self.task_type, TaskType::Inpainting | TaskType::Outpainting)
            && self.mask_text().is_none()
        {
            return Err(BedrockError::InvalidRequest(format!(
                "task type {} needs a mask prompt",
                self.task_type
            )));
        }

        Ok(())
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| v.to_string())
}

/// Prompt triple produced by the image-analysis chat stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAnalysis {
    pub prompt: String,
    #[serde(default)]
    pub mask_prompt: String,
    #[serde(default)]
    pub negative_prompt: String,
}

impl ImageAnalysis {
    /// Parses the JSON object embedded in a chat answer. Text before the
    /// first `{` and after the object is ignored.
    pub fn from_model_text(text: &str) -> Result<Self> {
        let start = text.find('{').ok_or_else(|| {
            BedrockError::MalformedResponse("no JSON object in model answer".into())
        })?;

        serde_json::Deserializer::from_str(&text[start..])
            .into_iter::<ImageAnalysis>()
            .next()
            .ok_or_else(|| BedrockError::MalformedResponse("empty JSON object".into()))?
            .map_err(|e| BedrockError::MalformedResponse(format!("invalid image analysis: {}", e)))
    }
}
