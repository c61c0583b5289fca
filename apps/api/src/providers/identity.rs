//! Identity and quota collaborator. The vendor owns user records, sessions,
//! subscription plans and the per-user free-usage counter; this service only
//! verifies bearer tokens and bumps the counter after a metered generation.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::ProviderError;
use crate::models::caller::Caller;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verifies a bearer credential. `Ok(None)` means the credential is
    /// missing/expired/forged; `Err` is a provider outage.
    async fn authenticate(&self, bearer_token: &str) -> Result<Option<Caller>, ProviderError>;

    /// Increments the user's free-tier usage counter by one.
    async fn increment_free_usage(&self, user_id: &str) -> Result<(), ProviderError>;
}

#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    token: &'a str,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    caller: Option<Caller>,
}

#[derive(Debug, Serialize)]
struct UsageDelta {
    increment_free_usage: i64,
}

#[derive(Clone)]
pub struct HttpIdentityProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpIdentityProvider {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            base_url,
            api_key,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn authenticate(&self, bearer_token: &str) -> Result<Option<Caller>, ProviderError> {
        let response = self
            .client
            .post(self.endpoint("/v1/tokens/verify"))
            .bearer_auth(&self.api_key)
            .json(&VerifyRequest {
                token: bearer_token,
            })
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 404 {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Identity verification returned {status}: {body}");
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let verified: VerifyResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;
        Ok(verified.caller)
    }

    async fn increment_free_usage(&self, user_id: &str) -> Result<(), ProviderError> {
        let response = self
            .client
            .patch(self.endpoint(&format!("/v1/users/{user_id}/metadata")))
            .bearer_auth(&self.api_key)
            .json(&UsageDelta {
                increment_free_usage: 1,
            })
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
        Ok(())
    }
}
