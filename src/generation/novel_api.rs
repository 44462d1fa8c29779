//! Secondary Transport
//!
//! The backend's specialized long-form endpoint (`/novel/write`). A
//! narrower contract than the chat endpoint: only the prompt and an
//! optional template name travel over the wire.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{GenerationRequest, SourceTier, Transport};
use crate::constants::network;
use crate::types::{NovelError, Result};

pub struct NovelApiTransport {
    base_url: String,
    template: Option<String>,
    client: reqwest::Client,
}

impl std::fmt::Debug for NovelApiTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NovelApiTransport")
            .field("base_url", &self.base_url)
            .field("template", &self.template)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct WriteRequest<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    template: Option<&'a str>,
}

impl NovelApiTransport {
    pub fn new(
        base_url: impl Into<String>,
        template: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(network::CONNECTION_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                NovelError::Config(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            template,
            client,
        })
    }
}

#[async_trait]
impl Transport for NovelApiTransport {
    fn tier(&self) -> SourceTier {
        SourceTier::Secondary
    }

    async fn send(&self, request: &GenerationRequest) -> Result<Value> {
        let url = format!("{}/novel/write", self.base_url);
        let body = WriteRequest {
            message: &request.prompt,
            template: self.template.as_deref(),
        };

        debug!(url = %url, "Sending secondary tier request");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| NovelError::transport(SourceTier::Secondary, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(NovelError::transport(
                SourceTier::Secondary,
                format!("HTTP {}: {}", status, text),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| NovelError::transport(SourceTier::Secondary, e.to_string()))
    }
}
