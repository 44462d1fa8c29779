//! Direct Transport
//!
//! Last-resort tier: the third-party completions API called directly
//! from the client, requiring an operator-supplied bearer credential.
//! Without a credential the tier reports itself unavailable and the
//! chain skips it instead of failing.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{GenerationRequest, SourceTier, Transport};
use crate::constants::{generation, network};
use crate::types::{NovelError, Result};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Direct third-party completions transport with secure credential
/// handling. The key is never exposed in logs or debug output.
pub struct DirectTransport {
    api_key: Option<SecretString>,
    api_base: String,
    model: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for DirectTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectTransport")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: usize,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

impl DirectTransport {
    pub fn new(
        api_key: Option<String>,
        api_base: Option<String>,
        model: Option<String>,
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
            api_key: api_key.map(SecretString::from),
            api_base: api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            model: model.unwrap_or_else(|| generation::DEFAULT_DIRECT_MODEL.to_string()),
            client,
        })
    }
}

#[async_trait]
impl Transport for DirectTransport {
    fn tier(&self) -> SourceTier {
        SourceTier::Direct
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn send(&self, request: &GenerationRequest) -> Result<Value> {
        let api_key = self.api_key.as_ref().ok_or(NovelError::CredentialMissing {
            tier: SourceTier::Direct,
        })?;

        let url = format!("{}/chat/completions", self.api_base);
        let system = request
            .system_instruction
            .as_deref()
            .unwrap_or(generation::DIRECT_SYSTEM_INSTRUCTION);

        let body = CompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        debug!(url = %url, model = %self.model, "Sending direct tier request");

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", api_key.expose_secret()),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| NovelError::transport(SourceTier::Direct, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(NovelError::transport(
                SourceTier::Direct,
                format!("HTTP {}: {}", status, text),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| NovelError::transport(SourceTier::Direct, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_without_credential() {
        let transport = DirectTransport::new(None, None, None, 10).unwrap();
        assert!(!transport.is_available());
    }

    #[test]
    fn test_available_with_credential() {
        let transport =
            DirectTransport::new(Some("sk-test".to_string()), None, None, 10).unwrap();
        assert!(transport.is_available());
    }

    #[test]
    fn test_debug_redacts_credential() {
        let transport =
            DirectTransport::new(Some("sk-secret-value".to_string()), None, None, 10).unwrap();
        let debug = format!("{:?}", transport);
        assert!(!debug.contains("sk-secret-value"));
        assert!(debug.contains("[REDACTED]"));
    }
}
