//! Primary Transport
//!
//! The backend's chat endpoint. First tier in the chain: cheapest to
//! reach and the common case, so its direct-field response shape is
//! trusted first by extraction.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

use super::{GenerationRequest, SourceTier, Transport};
use crate::constants::network;
use crate::types::{NovelError, Result};

/// Backend chat transport. Tracks the conversation id handed back by
/// the backend so consecutive segments stay in one conversation.
pub struct PrimaryTransport {
    base_url: String,
    /// Operator credential forwarded to the backend when configured
    api_key: Option<String>,
    client: reqwest::Client,
    conversation_id: Mutex<Option<String>>,
}

impl std::fmt::Debug for PrimaryTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrimaryTransport")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    conversation_id: Option<String>,
}

impl PrimaryTransport {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
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
            api_key,
            client,
            conversation_id: Mutex::new(None),
        })
    }

    fn current_conversation(&self) -> Option<String> {
        self.conversation_id.lock().ok().and_then(|g| g.clone())
    }

    fn remember_conversation(&self, body: &Value) {
        if let Some(id) = body.get("conversation_id").and_then(Value::as_str)
            && let Ok(mut guard) = self.conversation_id.lock()
        {
            *guard = Some(id.to_string());
        }

        if let Some(tokens) = body
            .get("usage")
            .and_then(|u| u.get("total_tokens"))
            .and_then(Value::as_u64)
        {
            debug!(total_tokens = tokens, "Backend reported token usage");
        }
    }
}

#[async_trait]
impl Transport for PrimaryTransport {
    fn tier(&self) -> SourceTier {
        SourceTier::Primary
    }

    async fn send(&self, request: &GenerationRequest) -> Result<Value> {
        let url = format!("{}/api/chat", self.base_url);
        let body = ChatRequest {
            message: &request.prompt,
            model: Some(&request.model),
            max_tokens: Some(request.max_tokens),
            temperature: Some(request.temperature),
            system_message: request.system_instruction.as_deref(),
            api_key: self.api_key.as_deref(),
            conversation_id: self.current_conversation(),
        };

        debug!(url = %url, model = %request.model, "Sending primary tier request");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| NovelError::transport(SourceTier::Primary, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(NovelError::transport(
                SourceTier::Primary,
                format!("HTTP {}: {}", status, text),
            ));
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| NovelError::transport(SourceTier::Primary, e.to_string()))?;

        self.remember_conversation(&value);
        Ok(value)
    }
}
