//! Text-to-image synthesis against a Clipdrop-style endpoint that accepts a
//! multipart `prompt` field and returns raw PNG bytes.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::Form;
use reqwest::Client;
use tracing::debug;

use super::ProviderError;

/// Synthesizes one image from a prompt, returning the encoded image bytes.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn synthesize(&self, prompt: &str) -> Result<Bytes, ProviderError>;
}

#[derive(Clone)]
pub struct ImageSynthesisClient {
    client: Client,
    api_url: String,
    api_key: String,
}

impl ImageSynthesisClient {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            api_url,
            api_key,
        }
    }
}

#[async_trait]
impl ImageGenerator for ImageSynthesisClient {
    async fn synthesize(&self, prompt: &str) -> Result<Bytes, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::NotConfigured("image synthesis API key"));
        }

        let form = Form::new().text("prompt", prompt.to_string());

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let bytes = response.bytes().await?;
        debug!("Image synthesis succeeded ({} bytes)", bytes.len());
        Ok(bytes)
    }
}
