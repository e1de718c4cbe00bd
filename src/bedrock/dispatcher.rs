use crate::{
    bedrock::transport::ModelInvoker,
    catalog::ProviderCatalog,
    classifier::ResponseClassifier,
    config::AdapterConfig,
    error::{BedrockError, Result},
    logger,
    models::{GenerationRequest, GenerationResult, NormalizedImage, ProviderFamily},
    normalizer::ImageNormalizer,
    payload::PayloadBuilder,
};
use futures::future::try_join_all;
use std::sync::Arc;
use std::time::Duration;

/// Runs one generation request end to end: route, validate, normalize,
/// build, invoke, classify.
///
/// Holds no mutable state, so one dispatcher can serve concurrent requests.
#[derive(Clone)]
pub struct RequestDispatcher {
    catalog: Arc<ProviderCatalog>,
    invoker: Arc<dyn ModelInvoker>,
    normalizer: ImageNormalizer,
    builder: PayloadBuilder,
    classifier: ResponseClassifier,
    timeout: Option<Duration>,
}

impl RequestDispatcher {
    pub fn new(catalog: Arc<ProviderCatalog>, invoker: Arc<dyn ModelInvoker>) -> Self {
        Self {
            normalizer: ImageNormalizer::new(catalog.clone()),
            builder: PayloadBuilder::new(),
            classifier: ResponseClassifier::new(catalog.clone()),
            catalog,
            invoker,
            timeout: None,
        }
    }

    /// Loads the catalog named by the config (built-in when unset) and applies
    /// its timeout and JPEG quality.
    pub fn from_config(config: &AdapterConfig, invoker: Arc<dyn ModelInvoker>) -> Result<Self> {
        let catalog = match &config.catalog_path {
            Some(path) => ProviderCatalog::from_path(path)?,
            None => ProviderCatalog::builtin()?,
        };

        let mut dispatcher =
            Self::new(Arc::new(catalog), invoker).with_jpeg_quality(config.jpeg_quality);
        if let Some(timeout) = config.invoke_timeout {
            dispatcher = dispatcher.with_timeout(timeout);
        }
        Ok(dispatcher)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.normalizer = self.normalizer.with_jpeg_quality(quality);
        self
    }

    pub fn catalog(&self) -> &Arc<ProviderCatalog> {
        &self.catalog
    }

    pub async fn dispatch(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        logger::with_request_id(logger::new_request_id(), self.run(request)).await
    }

    async fn run(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        let _timer = logger::timer(&format!("dispatch {}", request.model_id));

        let family = self.catalog.family_for_model(&request.model_id)?;
        log::info!(
            "Dispatching {} request to {} ({} reference images)",
            request.task_type,
            family,
            request.images.len()
        );

        request.validate(family)?;

        let images = self.normalize_all(request, family).await?;
        let payload = self.builder.build(request, family, &images)?;
        log::debug!("Request payload: {}", payload.summary());

        let raw = self.invoke(&payload.model_id, payload.to_bytes()?).await?;
        let result = self.classifier.classify_bytes(family, &raw)?;

        match &result {
            GenerationResult::Text { output_tokens, .. } => {
                log::info!("Text generated ({} output tokens)", output_tokens)
            }
            GenerationResult::Image { images } => log::info!("{} images generated", images.len()),
            GenerationResult::Error { message, .. } => log::warn!("{}", message),
        }
        Ok(result)
    }

    /// Normalizes every reference image on the blocking pool, keeping input order.
    async fn normalize_all(
        &self,
        request: &GenerationRequest,
        family: ProviderFamily,
    ) -> Result<Vec<NormalizedImage>> {
        if request.images.is_empty() {
            return Ok(Vec::new());
        }

        let jobs = request.images.iter().cloned().map(|image| {
            let normalizer = self.normalizer.clone();
            let model_id = request.model_id.clone();
            let task_type = request.task_type;
            tokio::task::spawn_blocking(move || {
                normalizer.normalize(&image, task_type, family, &model_id)
            })
        });

        try_join_all(jobs)
            .await
            .map_err(|e| BedrockError::ImageDecode(format!("normalization worker failed: {}", e)))?
            .into_iter()
            .collect()
    }

    async fn invoke(&self, model_id: &str, body: Vec<u8>) -> Result<Vec<u8>> {
        let call = self.invoker.invoke(model_id, body);
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                log::error!("Model {} did not answer within {:?}", model_id, limit);
                BedrockError::Timeout(limit)
            })?,
            None => call.await,
        }
    }
}
