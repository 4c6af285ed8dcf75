use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, Proxy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{EgressIdentity, Translator};
use crate::errors::ProviderError;

/// Client for a DeepLX-compatible `/translate` endpoint
#[derive(Debug, Clone)]
pub struct DeepLx {
    /// Full URL of the translate endpoint
    endpoint: String,
    /// Per-request timeout
    timeout: Duration,
    /// Client for direct egress, reused across requests
    direct_client: Client,
}

/// Request body for the translate endpoint
#[derive(Debug, Serialize)]
struct DeepLxRequest<'a> {
    text: &'a str,
    source_lang: &'a str,
    target_lang: &'a str,
}

/// Response body from the translate endpoint
#[derive(Debug, Deserialize)]
struct DeepLxResponse {
    code: u16,
    #[serde(default)]
    data: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl DeepLx {
    /// Create a new client for `endpoint`
    pub fn new(endpoint: impl Into<String>, timeout_secs: u64) -> Self {
        let timeout = Duration::from_secs(timeout_secs);
        Self {
            endpoint: endpoint.into(),
            timeout,
            direct_client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn client_for(&self, egress: Option<&EgressIdentity>) -> Result<Client, ProviderError> {
        match egress {
            None => Ok(self.direct_client.clone()),
            Some(identity) => {
                let proxy = Proxy::all(identity.proxy_url())
                    .map_err(|e| ProviderError::ConnectionError(format!("Invalid proxy {}: {}", identity, e)))?;
                Client::builder()
                    .timeout(self.timeout)
                    .proxy(proxy)
                    .build()
                    .map_err(|e| ProviderError::ConnectionError(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl Translator for DeepLx {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
        egress: Option<&EgressIdentity>,
    ) -> Result<String, ProviderError> {
        let client = self.client_for(egress)?;
        let request = DeepLxRequest {
            text,
            source_lang: source_language,
            target_lang: target_language,
        };

        debug!(
            "Sending {} chars to {} via {}",
            text.chars().count(),
            self.endpoint,
            egress.map_or_else(|| "direct".to_string(), |e| e.to_string())
        );

        let response = client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(ProviderError::RateLimitExceeded(format!("{} returned 429", self.endpoint)));
        }
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("DeepLX error ({}): {}", status, message);
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        let body: DeepLxResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        if body.code != 200 {
            return Err(ProviderError::ApiError {
                status_code: body.code,
                message: body.message.unwrap_or_default(),
            });
        }

        body.data
            .ok_or_else(|| ProviderError::ParseError("response has no 'data' field".to_string()))
    }
}
