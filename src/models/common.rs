use crate::error::BedrockError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Wire-format group a Bedrock model belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderFamily {
    /// Anthropic Claude messages API.
    TextChat,
    /// Stability SD3 family (`mode` based documents).
    Sd3,
    /// Legacy Stability diffusion models (`text_prompts` documents).
    StableDiffusion,
    /// Amazon Titan Image Generator (`taskType` based documents).
    TitanImage,
}

impl ProviderFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderFamily::TextChat => "text-chat",
            ProviderFamily::Sd3 => "sd3",
            ProviderFamily::StableDiffusion => "stable-diffusion",
            ProviderFamily::TitanImage => "titan-image",
        }
    }

    pub fn is_image_capable(&self) -> bool {
        !matches!(self, ProviderFamily::TextChat)
    }
}

impl fmt::Display for ProviderFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generation mode requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    /// Plain text chat, no image generation.
    #[default]
    None,
    TextImage,
    ImageVariation,
    Inpainting,
    Outpainting,
    ColorGuidedGeneration,
    BackgroundRemoval,
}

impl TaskType {
    pub const IMAGE_TASKS: [TaskType; 6] = [
        TaskType::TextImage,
        TaskType::ImageVariation,
        TaskType::Inpainting,
        TaskType::Outpainting,
        TaskType::ColorGuidedGeneration,
        TaskType::BackgroundRemoval,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::None => "NONE",
            TaskType::TextImage => "TEXT_IMAGE",
            TaskType::ImageVariation => "IMAGE_VARIATION",
            TaskType::Inpainting => "INPAINTING",
            TaskType::Outpainting => "OUTPAINTING",
            TaskType::ColorGuidedGeneration => "COLOR_GUIDED_GENERATION",
            TaskType::BackgroundRemoval => "BACKGROUND_REMOVAL",
        }
    }

    /// Tasks that operate on a caller supplied image.
    pub fn requires_reference_image(&self) -> bool {
        matches!(
            self,
            TaskType::ImageVariation
                | TaskType::Inpainting
                | TaskType::Outpainting
                | TaskType::ColorGuidedGeneration
                | TaskType::BackgroundRemoval
        )
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = BedrockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "NONE" => Ok(TaskType::None),
            "TEXT_IMAGE" => Ok(TaskType::TextImage),
            "IMAGE_VARIATION" => Ok(TaskType::ImageVariation),
            "INPAINTING" => Ok(TaskType::Inpainting),
            "OUTPAINTING" => Ok(TaskType::Outpainting),
            "COLOR_GUIDED_GENERATION" => Ok(TaskType::ColorGuidedGeneration),
            "BACKGROUND_REMOVAL" => Ok(TaskType::BackgroundRemoval),
            other => Err(BedrockError::UnsupportedTaskType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Modality {
    Text,
    Image,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub provider: String,
    pub input_modalities: Vec<Modality>,
    pub output_modalities: Vec<Modality>,
    #[serde(default)]
    pub description: String,
}

impl ModelInfo {
    pub fn accepts(&self, input: Modality, output: Modality) -> bool {
        self.input_modalities.contains(&input) && self.output_modalities.contains(&output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_type_parse() {
        assert_eq!("INPAINTING".parse::<TaskType>().unwrap(), TaskType::Inpainting);
        assert_eq!("".parse::<TaskType>().unwrap(), TaskType::None);
        for task in TaskType::IMAGE_TASKS {
            assert_eq!(task.as_str().parse::<TaskType>().unwrap(), task);
        }

        let err = "SKETCH_TO_IMAGE".parse::<TaskType>().unwrap_err();
        assert!(matches!(err, BedrockError::UnsupportedTaskType(ref t) if t == "SKETCH_TO_IMAGE"));
    }

    #[test]
    fn test_task_type_serde_matches_wire_names() {
        let json = serde_json::to_string(&TaskType::ColorGuidedGeneration).unwrap();
        assert_eq!(json, "\"COLOR_GUIDED_GENERATION\"");
        let family: ProviderFamily = serde_json::from_str("\"titan-image\"").unwrap();
        assert_eq!(family, ProviderFamily::TitanImage);
    }

    #[test]
    fn test_reference_image_requirement() {
        assert!(!TaskType::TextImage.requires_reference_image());
        assert!(!TaskType::None.requires_reference_image());
        assert!(TaskType::Inpainting.requires_reference_image());
        assert!(TaskType::BackgroundRemoval.requires_reference_image());
    }
}
