use crate::{
    catalog::ProviderCatalog,
    error::{BedrockError, Result},
    models::{
        ClaudeResponse, GeneratedImage, GenerationResult, ProviderFamily, Sd3Response,
        StableDiffusionResponse, TitanImageResponse,
    },
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Turns a decoded provider response into a `GenerationResult`.
///
/// Failures reported inside a successful response come back as
/// `GenerationResult::Error`; only unreadable documents are `Err`.
#[derive(Debug, Clone)]
pub struct ResponseClassifier {
    catalog: Arc<ProviderCatalog>,
}

impl ResponseClassifier {
    pub fn new(catalog: Arc<ProviderCatalog>) -> Self {
        Self { catalog }
    }

    pub fn classify(&self, family: ProviderFamily, raw: &Value) -> Result<GenerationResult> {
        match family {
            ProviderFamily::TextChat => self.text_chat(raw),
            ProviderFamily::Sd3 => self.sd3(raw),
            ProviderFamily::StableDiffusion => self.stable_diffusion(raw),
            ProviderFamily::TitanImage => self.titan(raw),
        }
    }

    /// Parses raw response bytes first; invalid JSON is a malformed response.
    pub fn classify_bytes(&self, family: ProviderFamily, raw: &[u8]) -> Result<GenerationResult> {
        let value: Value = serde_json::from_slice(raw)
            .map_err(|e| BedrockError::MalformedResponse(format!("response is not JSON: {}", e)))?;
        self.classify(family, &value)
    }

    fn text_chat(&self, raw: &Value) -> Result<GenerationResult> {
        let response: ClaudeResponse = parse(raw, ProviderFamily::TextChat)?;

        let texts: Vec<&str> = response
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text.as_deref())
            .collect();
        if texts.is_empty() {
            return Err(BedrockError::MalformedResponse(
                "text-chat response has no text content".into(),
            ));
        }

        log::debug!(
            "Text response: stop_reason={:?}, input_tokens={}, output_tokens={}",
            response.stop_reason,
            response.usage.input_tokens,
            response.usage.output_tokens
        );

        Ok(GenerationResult::Text {
            content: texts.concat(),
            input_tokens: response.usage.input_tokens,
            output_tokens: response.usage.output_tokens,
        })
    }

    fn sd3(&self, raw: &Value) -> Result<GenerationResult> {
        let response: Sd3Response = parse(raw, ProviderFamily::Sd3)?;

        let reason = response.finish_reasons.first().and_then(|r| r.as_deref());
        if self
            .catalog
            .finish_reason_policy(ProviderFamily::Sd3)
            .is_failure(reason)
        {
            let code = reason.unwrap_or_default();
            log::warn!("SD3 generation failed: {}", code);
            return Ok(GenerationResult::failed(code));
        }

        let first = response.images.first().ok_or_else(|| {
            BedrockError::MalformedResponse("sd3 response has no images".into())
        })?;

        Ok(GenerationResult::Image {
            images: vec![GeneratedImage::from_base64(first)?],
        })
    }

    fn stable_diffusion(&self, raw: &Value) -> Result<GenerationResult> {
        let response: StableDiffusionResponse = parse(raw, ProviderFamily::StableDiffusion)?;

        let artifact = response.artifacts.first().ok_or_else(|| {
            BedrockError::MalformedResponse("stable-diffusion response has no artifacts".into())
        })?;

        let reason = artifact.finish_reason.as_deref();
        if self
            .catalog
            .finish_reason_policy(ProviderFamily::StableDiffusion)
            .is_failure(reason)
        {
            let code = reason.unwrap_or_default();
            log::warn!("Stable diffusion generation failed: {}", code);
            return Ok(GenerationResult::failed(code));
        }

        let data = artifact.base64.as_deref().ok_or_else(|| {
            BedrockError::MalformedResponse("stable-diffusion artifact has no image".into())
        })?;

        Ok(GenerationResult::Image {
            images: vec![GeneratedImage::from_base64(data)?],
        })
    }

    fn titan(&self, raw: &Value) -> Result<GenerationResult> {
        let response: TitanImageResponse = parse(raw, ProviderFamily::TitanImage)?;

        let reported = match &response.error {
            None | Some(Value::Null) => find_error(raw),
            Some(error) => Some(error),
        };
        match reported {
            None => {}
            Some(Value::String(message)) => {
                log::warn!("Titan generation failed: {}", message);
                return Ok(GenerationResult::failed(message.as_str()));
            }
            Some(other) => {
                log::warn!("Titan generation failed: {}", other);
                return Ok(GenerationResult::failed(other.to_string()));
            }
        }

        if response.images.is_empty() {
            return Err(BedrockError::MalformedResponse(
                "titan response has no images".into(),
            ));
        }

        let images = response
            .images
            .iter()
            .map(|data| GeneratedImage::from_base64(data))
            .collect::<Result<Vec<_>>>()?;

        Ok(GenerationResult::Image { images })
    }
}

/// First non-null `error` value at any depth, in document order.
fn find_error(value: &Value) -> Option<&Value> {
    match value {
        Value::Object(map) => map
            .get("error")
            .filter(|error| !error.is_null())
            .or_else(|| map.values().find_map(find_error)),
        Value::Array(items) => items.iter().find_map(find_error),
        _ => None,
    }
}

fn parse<T: DeserializeOwned>(raw: &Value, family: ProviderFamily) -> Result<T> {
    T::deserialize(raw)
        .map_err(|e| BedrockError::MalformedResponse(format!("{} response: {}", family, e)))
}
