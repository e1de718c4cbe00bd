pub mod dispatcher;
pub mod transport;

use crate::{
    config::BedrockConfig,
    error::{BedrockError, Result},
};
use async_trait::async_trait;
use aws_sdk_bedrockruntime::{
    config::{Credentials, Region},
    error::ProvideErrorMetadata,
    primitives::Blob,
    Client,
};

pub use dispatcher::RequestDispatcher;
pub use transport::ModelInvoker;

const DEFAULT_REGION: &str = "us-east-1";

/// `ModelInvoker` backed by the Bedrock runtime `InvokeModel` API.
#[derive(Clone)]
pub struct BedrockClient {
    client: Client,
}

impl BedrockClient {
    pub async fn new(bedrock_config: BedrockConfig) -> Result<Self> {
        let mut loader = aws_config::from_env();

        if let Some(profile) = &bedrock_config.profile {
            loader = loader.profile_name(profile);
        }

        if let (Some(access_key), Some(secret_key)) =
            (&bedrock_config.access_key, &bedrock_config.secret_key)
        {
            loader = loader
                .credentials_provider(Credentials::new(
                    access_key,
                    secret_key,
                    None,
                    None,
                    "adgen-client",
                ))
                .region(Region::new(
                    bedrock_config
                        .region
                        .clone()
                        .unwrap_or_else(|| DEFAULT_REGION.to_string()),
                ));
        } else if let Some(region) = &bedrock_config.region {
            loader = loader.region(Region::new(region.clone()));
        }

        let aws_config = loader.load().await;
        if aws_config.region().is_none() {
            return Err(BedrockError::ConfigError(
                "no AWS region configured; set AWS_REGION or BedrockConfig::with_region".into(),
            ));
        }

        Ok(Self::from_client(Client::new(&aws_config)))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ModelInvoker for BedrockClient {
    async fn invoke(&self, model_id: &str, body: Vec<u8>) -> Result<Vec<u8>> {
        log::info!("Invoking model: {}", model_id);

        let response = self
            .client
            .invoke_model()
            .model_id(model_id)
            .content_type("application/json")
            .accept("application/json")
            .body(Blob::new(body))
            .send()
            .await
            .map_err(|e| {
                if let Some(service_error) = e.as_service_error() {
                    log::error!(
                        "Bedrock service error {}: {}",
                        service_error.code().unwrap_or("unknown"),
                        service_error.message().unwrap_or("no message")
                    );
                    BedrockError::AwsServiceError(format!(
                        "Bedrock service error: {} - {}",
                        service_error.code().unwrap_or("unknown"),
                        service_error.message().unwrap_or("no message")
                    ))
                } else {
                    log::error!("AWS SDK error: {:?}", e);
                    BedrockError::AwsError(format!("AWS SDK error: {}", e))
                }
            })?;

        Ok(response.body.into_inner())
    }
}
