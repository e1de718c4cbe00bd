use crate::{
    error::{BedrockError, Result},
    models::{
        BackgroundRemovalParams, ChatMessage, ClaudeMessagesRequest, ColorGuidedGenerationParams,
        ContentBlock, GenerationRequest, ImageGenerationConfig, ImageVariationParams,
        InPaintingParams, NormalizedImage, OutPaintingParams, ProviderFamily, Sd3Request,
        StableDiffusionRequest, TaskType, TextPrompt, TextToImageParams, TitanImageRequest,
        ANTHROPIC_VERSION,
    },
};
use serde::Serialize;
use serde_json::Value;

const SD3_ASPECT_RATIO: &str = "1:1";
const SD3_OUTPUT_FORMAT: &str = "jpeg";

/// Provider document plus the model id it is routed to.
#[derive(Debug, Clone, PartialEq)]
pub struct WirePayload {
    pub model_id: String,
    pub family: ProviderFamily,
    pub body: Value,
}

impl WirePayload {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.body)?)
    }

    /// Body with long strings (inlined images) replaced by their length, for logs.
    pub fn summary(&self) -> String {
        redact(&self.body).to_string()
    }
}

fn redact(value: &Value) -> Value {
    match value {
        Value::String(s) if s.len() > 256 => Value::String(format!("<{} chars>", s.len())),
        Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), redact(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Builds provider request documents. Pure: no I/O, same input gives the same bytes.
#[derive(Debug, Clone, Default)]
pub struct PayloadBuilder;

impl PayloadBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(
        &self,
        request: &GenerationRequest,
        family: ProviderFamily,
        images: &[NormalizedImage],
    ) -> Result<WirePayload> {
        let body = match family {
            ProviderFamily::TextChat => to_value(self.text_chat(request, images))?,
            ProviderFamily::Sd3 => to_value(self.sd3(request, images))?,
            ProviderFamily::StableDiffusion => to_value(self.stable_diffusion(request, images))?,
            ProviderFamily::TitanImage => to_value(self.titan(request, images)?)?,
        };

        Ok(WirePayload {
            model_id: request.model_id.clone(),
            family,
            body,
        })
    }

    fn text_chat(&self, request: &GenerationRequest, images: &[NormalizedImage]) -> ClaudeMessagesRequest {
        let params = &request.parameters;

        let mut content = vec![ContentBlock::text(request.prompt.clone())];
        content.extend(
            images
                .iter()
                .map(|image| ContentBlock::base64_image(image.media_type.clone(), image.data.clone())),
        );

        let mut messages = request.history.clone();
        messages.push(ChatMessage {
            role: "user".to_string(),
            content,
        });

        ClaudeMessagesRequest {
            anthropic_version: ANTHROPIC_VERSION.to_string(),
            max_tokens: params.max_tokens,
            messages,
            temperature: params.temperature,
            top_p: params.top_p,
            top_k: params.top_k,
        }
    }

    fn sd3(&self, request: &GenerationRequest, images: &[NormalizedImage]) -> Sd3Request {
        let params = &request.parameters;
        match (request.task_type, images.first()) {
            (TaskType::ImageVariation, Some(image)) => {
                log::info!("Image to Image");
                Sd3Request::ImageToImage {
                    prompt: request.prompt.clone(),
                    negative_prompt: request.negative_text(),
                    seed: params.seed,
                    image: image.data.clone(),
                    strength: params.image_strength,
                    output_format: SD3_OUTPUT_FORMAT.to_string(),
                }
            }
            _ => {
                log::info!("Text to Image");
                Sd3Request::TextToImage {
                    prompt: request.prompt.clone(),
                    negative_prompt: request.negative_text(),
                    seed: params.seed,
                    aspect_ratio: SD3_ASPECT_RATIO.to_string(),
                    output_format: SD3_OUTPUT_FORMAT.to_string(),
                }
            }
        }
    }

    fn stable_diffusion(
        &self,
        request: &GenerationRequest,
        images: &[NormalizedImage],
    ) -> StableDiffusionRequest {
        let params = &request.parameters;
        StableDiffusionRequest {
            text_prompts: vec![TextPrompt {
                text: request.prompt.clone(),
                weight: params.weight,
            }],
            cfg_scale: params.cfg_scale,
            steps: params.steps,
            seed: params.seed,
            style_preset: params.style_preset.clone(),
            init_image: images.first().map(|image| image.data.clone()),
            image_strength: params.image_strength,
        }
    }

    fn titan(&self, request: &GenerationRequest, images: &[NormalizedImage]) -> Result<TitanImageRequest> {
        let params = &request.parameters;
        let (width, height) = images
            .first()
            .map(|image| (image.width, image.height))
            .unwrap_or((params.image_width, params.image_height));
        let config = ImageGenerationConfig {
            number_of_images: params.num_images,
            height,
            width,
            cfg_scale: params.cfg_scale,
            seed: params.seed,
        };
        let text = request.prompt.clone();
        let negative_text = request.negative_text();

        log::info!(
            "Titan {} ({}x{}), mask {}, negative prompt {}",
            request.task_type,
            width,
            height,
            if request.mask_text().is_some() { "provided" } else { "not provided" },
            if negative_text.is_some() { "provided" } else { "not provided" },
        );

        let payload = match request.task_type {
            TaskType::TextImage => TitanImageRequest::TextImage {
                params: TextToImageParams {
                    text,
                    negative_text,
                },
                config,
            },
            TaskType::Inpainting => TitanImageRequest::Inpainting {
                params: InPaintingParams {
                    image: first_image(images, request.task_type)?,
                    text,
                    mask_prompt: mask_prompt(request)?,
                    negative_text,
                },
                config,
            },
            TaskType::Outpainting => TitanImageRequest::Outpainting {
                params: OutPaintingParams {
                    image: first_image(images, request.task_type)?,
                    text,
                    mask_prompt: mask_prompt(request)?,
                    negative_text,
                    out_painting_mode: params.outpainting_mode.clone(),
                },
                config,
            },
            TaskType::ImageVariation => TitanImageRequest::ImageVariation {
                params: ImageVariationParams {
                    text,
                    negative_text,
                    images: all_images(images, request.task_type)?,
                    similarity_strength: params.similarity_strength,
                },
                config,
            },
            TaskType::ColorGuidedGeneration => TitanImageRequest::ColorGuidedGeneration {
                params: ColorGuidedGenerationParams {
                    text,
                    negative_text,
                    reference_image: first_image(images, request.task_type)?,
                    colors: params.colors.clone(),
                },
                config,
            },
            TaskType::BackgroundRemoval => TitanImageRequest::BackgroundRemoval {
                params: BackgroundRemovalParams {
                    image: first_image(images, request.task_type)?,
                },
            },
            TaskType::None => {
                return Err(BedrockError::UnsupportedTaskType(format!(
                    "{} for {}",
                    request.task_type,
                    ProviderFamily::TitanImage
                )))
            }
        };

        Ok(payload)
    }
}

fn to_value<T: Serialize>(document: T) -> Result<Value> {
    Ok(serde_json::to_value(document)?)
}

fn first_image(images: &[NormalizedImage], task_type: TaskType) -> Result<String> {
    images
        .first()
        .map(|image| image.data.clone())
        .ok_or_else(|| {
            BedrockError::InvalidRequest(format!("task type {} needs a reference image", task_type))
        })
}

fn all_images(images: &[NormalizedImage], task_type: TaskType) -> Result<Vec<String>> {
    if images.is_empty() {
        return Err(BedrockError::InvalidRequest(format!(
            "task type {} needs at least one reference image",
            task_type
        )));
    }
    Ok(images.iter().map(|image| image.data.clone()).collect())
}

fn mask_prompt(request: &GenerationRequest) -> Result<String> {
    request.mask_text().ok_or_else(|| {
        BedrockError::InvalidRequest(format!("task type {} needs a mask prompt", request.task_type))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InferenceParameters;
    use serde_json::json;

    const TITAN: &str = "amazon.titan-image-generator-v1";
    const SD3: &str = "stability.sd3-large-v1:0";

    fn image() -> NormalizedImage {
        NormalizedImage {
            data: "QUJD".into(),
            width: 1152,
            height: 896,
            media_type: "image/jpeg".into(),
        }
    }

    #[test]
    fn test_titan_inpainting() {
        let request = GenerationRequest::new(TITAN, "a sunny beach")
            .with_task_type(TaskType::Inpainting)
            .with_mask_prompt("sky")
            .with_negative_prompt("")
            .with_parameters(InferenceParameters::new().with_num_images(2));

        let payload = PayloadBuilder::new()
            .build(&request, ProviderFamily::TitanImage, &[image()])
            .unwrap();

        assert_eq!(payload.model_id, TITAN);
        assert_eq!(payload.body["taskType"], "INPAINTING");
        assert_eq!(payload.body["inPaintingParams"]["maskPrompt"], "sky");
        assert_eq!(payload.body["inPaintingParams"]["image"], "QUJD");
        assert!(payload.body["inPaintingParams"].get("negativeText").is_none());
        assert_eq!(
            payload.body["imageGenerationConfig"],
            json!({"numberOfImages": 2, "height": 896, "width": 1152, "cfgScale": 10.0, "seed": 45})
        );
    }

    #[test]
    fn test_titan_sub_schemas() {
        let builder = PayloadBuilder::new();
        let cases = [
            (TaskType::TextImage, "textToImageParams"),
            (TaskType::Outpainting, "outPaintingParams"),
            (TaskType::ImageVariation, "imageVariationParams"),
            (TaskType::ColorGuidedGeneration, "colorGuidedGenerationParams"),
            (TaskType::BackgroundRemoval, "backgroundRemovalParams"),
        ];

        for (task, key) in cases {
            let request = GenerationRequest::new(TITAN, "poster")
                .with_task_type(task)
                .with_mask_prompt("logo")
                .with_negative_prompt("blurry");
            let payload = builder
                .build(&request, ProviderFamily::TitanImage, &[image()])
                .unwrap();
            assert_eq!(payload.body["taskType"], task.as_str());
            assert!(payload.body.get(key).is_some(), "{} missing {}", task, key);
            assert_eq!(
                payload.body.get("imageGenerationConfig").is_some(),
                task != TaskType::BackgroundRemoval
            );
        }
    }

    #[test]
    fn test_titan_variation_and_color_fields() {
        let builder = PayloadBuilder::new();
        let variation = GenerationRequest::new(TITAN, "dog").with_task_type(TaskType::ImageVariation);
        let body = builder
            .build(&variation, ProviderFamily::TitanImage, &[image()])
            .unwrap()
            .body;
        assert_eq!(body["imageVariationParams"]["images"], json!(["QUJD"]));
        assert!((body["imageVariationParams"]["similarityStrength"].as_f64().unwrap() - 0.7).abs() < 1e-6);

        let second = NormalizedImage {
            data: "REVG".into(),
            ..image()
        };
        let body = builder
            .build(&variation, ProviderFamily::TitanImage, &[image(), second])
            .unwrap()
            .body;
        assert_eq!(body["imageVariationParams"]["images"], json!(["QUJD", "REVG"]));
        assert!(matches!(
            builder.build(&variation, ProviderFamily::TitanImage, &[]),
            Err(BedrockError::InvalidRequest(_))
        ));

        let color = GenerationRequest::new(TITAN, "dog").with_task_type(TaskType::ColorGuidedGeneration);
        let body = builder
            .build(&color, ProviderFamily::TitanImage, &[image()])
            .unwrap()
            .body;
        assert_eq!(body["colorGuidedGenerationParams"]["referenceImage"], "QUJD");
        assert_eq!(
            body["colorGuidedGenerationParams"]["colors"],
            json!(["#FF0000", "#00FF00", "#0000FF"])
        );
    }

    #[test]
    fn test_titan_text_image_uses_parameter_size() {
        let request = GenerationRequest::new(TITAN, "a lighthouse")
            .with_task_type(TaskType::TextImage)
            .with_parameters(InferenceParameters::new().with_image_size(1408, 768));
        let body = PayloadBuilder::new()
            .build(&request, ProviderFamily::TitanImage, &[])
            .unwrap()
            .body;
        assert_eq!(body["imageGenerationConfig"]["width"], 1408);
        assert_eq!(body["imageGenerationConfig"]["height"], 768);
        assert_eq!(body["textToImageParams"], json!({"text": "a lighthouse"}));
    }

    #[test]
    fn test_titan_rejects_missing_task_and_image() {
        let builder = PayloadBuilder::new();
        let none = GenerationRequest::new(TITAN, "x");
        assert!(matches!(
            builder.build(&none, ProviderFamily::TitanImage, &[]),
            Err(BedrockError::UnsupportedTaskType(_))
        ));

        let removal = GenerationRequest::new(TITAN, "x").with_task_type(TaskType::BackgroundRemoval);
        assert!(matches!(
            builder.build(&removal, ProviderFamily::TitanImage, &[]),
            Err(BedrockError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_sd3_modes() {
        let builder = PayloadBuilder::new();
        let request = GenerationRequest::new(SD3, "a red car")
            .with_task_type(TaskType::ImageVariation)
            .with_parameters(InferenceParameters::new().with_image_strength(0.6).with_seed(7));

        let with_image = builder.build(&request, ProviderFamily::Sd3, &[image()]).unwrap().body;
        assert_eq!(with_image["mode"], "image-to-image");
        assert!((with_image["strength"].as_f64().unwrap() - 0.6).abs() < 1e-6);
        assert_eq!(with_image["image"], "QUJD");
        assert!(with_image.get("aspect_ratio").is_none());

        let without_image = builder.build(&request, ProviderFamily::Sd3, &[]).unwrap().body;
        assert_eq!(
            without_image,
            json!({
                "mode": "text-to-image",
                "prompt": "a red car",
                "seed": 7,
                "aspect_ratio": "1:1",
                "output_format": "jpeg"
            })
        );

        let text_image = request.clone().with_task_type(TaskType::TextImage);
        let body = builder.build(&text_image, ProviderFamily::Sd3, &[image()]).unwrap().body;
        assert_eq!(body["mode"], "text-to-image");
    }

    #[test]
    fn test_stable_diffusion_document() {
        let request = GenerationRequest::new("stability.stable-diffusion-xl-v1", "castle")
            .with_parameters(InferenceParameters::new().with_style_preset("anime"));
        let builder = PayloadBuilder::new();

        let body = builder
            .build(&request, ProviderFamily::StableDiffusion, &[])
            .unwrap()
            .body;
        assert_eq!(body["text_prompts"], json!([{"text": "castle", "weight": 1.0}]));
        assert_eq!(body["style_preset"], "anime");
        assert_eq!(body["steps"], 30);
        assert!(body.get("init_image").is_none());
        assert!(body.get("image_strength").is_some());

        let body = builder
            .build(&request, ProviderFamily::StableDiffusion, &[image()])
            .unwrap()
            .body;
        assert_eq!(body["init_image"], "QUJD");
    }

    #[test]
    fn test_text_chat_envelope() {
        let request = GenerationRequest::new("anthropic.claude-3-sonnet-20240229-v1:0", "What is in this image?")
            .with_history(vec![
                ChatMessage::user("hello"),
                ChatMessage::assistant("hi there"),
            ]);
        let body = PayloadBuilder::new()
            .build(&request, ProviderFamily::TextChat, &[image()])
            .unwrap()
            .body;

        assert_eq!(body["anthropic_version"], "bedrock-2023-05-31");
        assert_eq!(body["max_tokens"], 4096);
        assert_eq!(body["top_k"], 250);
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2]["content"][0], json!({"type": "text", "text": "What is in this image?"}));
        assert_eq!(messages[2]["content"][1]["source"]["media_type"], "image/jpeg");
        assert!(body.get("taskType").is_none());
    }

    #[test]
    fn test_build_is_deterministic() {
        let request = GenerationRequest::new(TITAN, "same input")
            .with_task_type(TaskType::Outpainting)
            .with_mask_prompt("frame");
        let builder = PayloadBuilder::new();
        let a = builder.build(&request, ProviderFamily::TitanImage, &[image()]).unwrap();
        let b = builder.build(&request, ProviderFamily::TitanImage, &[image()]).unwrap();
        assert_eq!(a.to_bytes().unwrap(), b.to_bytes().unwrap());
    }

    #[test]
    fn test_summary_elides_image_data() {
        let long = NormalizedImage {
            data: "A".repeat(1000),
            ..image()
        };
        let request = GenerationRequest::new(SD3, "p").with_task_type(TaskType::ImageVariation);
        let payload = PayloadBuilder::new()
            .build(&request, ProviderFamily::Sd3, &[long])
            .unwrap();
        let summary = payload.summary();
        assert!(summary.contains("<1000 chars>"));
        assert!(!summary.contains(&"A".repeat(300)));
    }
}
