//! Generation Client Abstraction
//!
//! Defines the transport and client seams for chapter text generation.
//! One logical generation call cascades through a prioritized chain of
//! transports; the scheduler only ever sees a `GenerationResult`.
//!
//! ## Modules
//!
//! - `chain`: Tiered client cascading primary -> secondary -> direct
//! - `extract`: Response shape normalization to plain text
//! - `length`: Single bounded retry for under-length output
//! - `prompt`: Opening/continuation/closing prompt construction
//! - `primary`, `novel_api`, `direct`: Production transports

pub mod chain;
pub mod direct;
pub mod extract;
pub mod length;
pub mod novel_api;
pub mod primary;
pub mod prompt;

pub use chain::TieredClient;
pub use direct::DirectTransport;
pub use extract::{ResponseShape, extract_text};
pub use length::ensure_minimum_length;
pub use novel_api::NovelApiTransport;
pub use primary::PrimaryTransport;
pub use prompt::{PromptKind, build_prompt};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::types::Result;
use crate::types::project::count_words;

// =============================================================================
// Source Tier
// =============================================================================

/// Which transport produced a generation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTier {
    /// Backend chat endpoint
    Primary,
    /// Specialized long-form endpoint
    Secondary,
    /// Third-party completions API, operator credential required
    Direct,
    /// Total failure: no tier produced content
    None,
}

impl std::fmt::Display for SourceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Secondary => write!(f, "secondary"),
            Self::Direct => write!(f, "direct"),
            Self::None => write!(f, "none"),
        }
    }
}

// =============================================================================
// Request / Result Values
// =============================================================================

/// One generation call. Pure value, constructed fresh per call and
/// never mutated.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub model: String,
    pub max_tokens: usize,
    pub temperature: f32,
    pub system_instruction: Option<String>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            max_tokens: crate::constants::generation::DEFAULT_MAX_TOKENS,
            temperature: crate::constants::generation::DEFAULT_TEMPERATURE,
            system_instruction: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }
}

/// One entry on the diagnostic trail: what a tier did with the call.
#[derive(Debug, Clone)]
pub struct TierAttempt {
    pub tier: SourceTier,
    pub outcome: String,
}

impl std::fmt::Display for TierAttempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.tier, self.outcome)
    }
}

/// Outcome of one logical generation call. A result with empty text and
/// source `None` represents total failure; it is a value, never an error.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub text: String,
    pub source: SourceTier,
    pub trail: Vec<TierAttempt>,
}

impl GenerationResult {
    /// Successful extraction from a tier.
    pub fn from_tier(text: impl Into<String>, source: SourceTier, trail: Vec<TierAttempt>) -> Self {
        Self {
            text: text.into(),
            source,
            trail,
        }
    }

    /// Total failure across all tiers.
    pub fn exhausted(trail: Vec<TierAttempt>) -> Self {
        Self {
            text: String::new(),
            source: SourceTier::None,
            trail,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.source == SourceTier::None
    }

    pub fn word_count(&self) -> usize {
        count_words(&self.text)
    }

    /// Human-readable summary of every tier attempt, for logs and the
    /// operator-facing status line.
    pub fn trail_summary(&self) -> String {
        self.trail
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

// =============================================================================
// Client / Transport Traits
// =============================================================================

/// One logical generation call. Implemented by the production
/// `TieredClient` and by test doubles injected into the scheduler.
///
/// Tier errors never escape this seam: exhaustion is reported through
/// the result's `source`, not an `Err`.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> GenerationResult;

    /// Client name for logging
    fn name(&self) -> &str;
}

/// Shared client handle for the scheduler and CLI.
pub type SharedClient = Arc<dyn GenerationClient + Send + Sync>;

/// A single transport in the chain. Returns the raw JSON body; shape
/// normalization happens in `extract` so every tier shares one policy.
#[async_trait]
pub trait Transport: Send + Sync {
    fn tier(&self) -> SourceTier;

    /// Whether this tier can be attempted at all. The direct tier
    /// reports false without an operator credential and is skipped,
    /// not failed.
    fn is_available(&self) -> bool {
        true
    }

    async fn send(&self, request: &GenerationRequest) -> Result<Value>;
}

/// Shared transport handle used when assembling the chain.
pub type SharedTransport = Arc<dyn Transport + Send + Sync>;

// =============================================================================
// Production Chain Assembly
// =============================================================================

/// Create the production client from configuration: primary backend
/// chat endpoint, then the long-form endpoint, then the direct
/// third-party API when a credential is configured.
pub fn create_client(config: &crate::config::GenerationConfig) -> Result<SharedClient> {
    let transports: Vec<SharedTransport> = vec![
        Arc::new(primary::PrimaryTransport::new(
            &config.backend_url,
            config.api_key.clone(),
            config.timeout_secs,
        )?),
        Arc::new(novel_api::NovelApiTransport::new(
            &config.backend_url,
            config.template.clone(),
            config.timeout_secs,
        )?),
        Arc::new(direct::DirectTransport::new(
            config.api_key.clone(),
            config.direct_api_base.clone(),
            config.direct_model.clone(),
            config.timeout_secs,
        )?),
    ];

    Ok(Arc::new(chain::TieredClient::new(transports)))
}
