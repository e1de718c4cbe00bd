use adgen::{
    logger::{self, LogLevel, LoggerConfig},
    models::Modality,
    AdapterConfig, ArtifactStorageManager, BedrockClient, BedrockConfig, GenerationRequest,
    GenerationResult, ImageAnalysis, ReferenceImage, RequestDispatcher, TaskType,
};
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let level = env::var("RUST_LOG")
        .ok()
        .and_then(|value| LogLevel::parse(&value))
        .unwrap_or(LogLevel::Info);
    logger::init_with_config(LoggerConfig::development().with_level(level))?;

    if dotenv_loaded {
        log::info!("✅ .env file loaded");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    let adapter_config = AdapterConfig::from_env()?;
    logger::log_config_info(&adapter_config);

    let bedrock_config = BedrockConfig::from_env();
    match (&bedrock_config.access_key, &bedrock_config.profile) {
        (Some(_), _) => log::info!("✅ AWS credentials found in environment"),
        (None, Some(profile)) => log::info!("AWS profile: {}", profile),
        (None, None) => log::warn!("No AWS credentials in environment, using default chain"),
    }

    log::info!("🔄 Creating Bedrock client...");
    let client = BedrockClient::new(bedrock_config).await?;
    let dispatcher = RequestDispatcher::from_config(&adapter_config, Arc::new(client))?;
    let storage = ArtifactStorageManager::from_config(&adapter_config).await?;

    let Ok(model_id) = env::var("ADGEN_MODEL_ID") else {
        log::info!("📚 ADGEN_MODEL_ID not set. Known models:");
        for output in [Modality::Text, Modality::Image] {
            for model in dispatcher.catalog().filtered_models(Modality::Text, output) {
                log::info!("  {} - {} ({})", model.id, model.name, model.provider);
            }
        }
        return Ok(());
    };

    let request = build_request(model_id, &storage).await?;
    let result = dispatcher.dispatch(&request).await?;

    match result {
        GenerationResult::Text { content, .. } => {
            println!("{}", content);
            if let Ok(analysis) = ImageAnalysis::from_model_text(&content) {
                storage.save_as("img_analysis", &analysis).await?;
                log::info!("💾 Saved image analysis artifact");
            }
        }
        GenerationResult::Image { images } => {
            let stamp = chrono::Utc::now().format("%Y%m%d%H%M%S");
            for (index, image) in images.iter().enumerate() {
                let extension = image
                    .format()
                    .and_then(|format| format.extensions_str().first().copied())
                    .unwrap_or("bin");
                let path = adapter_config
                    .artifact_dir
                    .join(format!("generated_{}_{}.{}", stamp, index, extension));
                image.save(&path)?;
                log::info!("🖼️  Saved {}", path.display());
            }
        }
        GenerationResult::Error { code, message } => {
            log::error!("❌ {}", message);
            return Err(adgen::BedrockError::GenerationFailed { code, message }.into());
        }
    }

    Ok(())
}

/// Reads the request from `ADGEN_*` variables. Without `ADGEN_PROMPT` the
/// prompts come from a saved image analysis.
async fn build_request(
    model_id: String,
    storage: &ArtifactStorageManager,
) -> adgen::Result<GenerationRequest> {
    let mut request = match env::var("ADGEN_PROMPT") {
        Ok(prompt) => GenerationRequest::new(model_id, prompt),
        Err(_) => {
            let analysis: ImageAnalysis = storage.load_as("img_analysis").await?;
            log::info!("Using saved image analysis: {}", analysis.prompt);
            GenerationRequest::from_analysis(model_id, &analysis)
        }
    };

    if let Ok(task_type) = env::var("ADGEN_TASK_TYPE") {
        request = request.with_task_type(task_type.parse::<TaskType>()?);
    }
    if let Ok(mask_prompt) = env::var("ADGEN_MASK_PROMPT") {
        request = request.with_mask_prompt(mask_prompt);
    }
    if let Ok(negative_prompt) = env::var("ADGEN_NEGATIVE_PROMPT") {
        request = request.with_negative_prompt(negative_prompt);
    }
    if let Ok(paths) = env::var("ADGEN_IMAGE") {
        for path in paths.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            request = request.with_image(ReferenceImage::from_path(path)?);
        }
    }

    Ok(request)
}
