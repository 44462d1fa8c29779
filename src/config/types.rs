//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/novelpilot/) and project (.novelpilot/)
//! level configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{chapter, generation, network, scheduler};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Generation transport and model settings
    pub generation: GenerationConfig,

    /// Autopilot scheduler settings
    pub scheduler: SchedulerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            generation: GenerationConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `NovelError::Config` on validation failure.
    pub fn validate(&self) -> crate::types::Result<()> {
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(crate::types::NovelError::Config(format!(
                "Generation temperature must be between 0.0 and 2.0, got {}",
                self.generation.temperature
            )));
        }

        if self.generation.timeout_secs == 0 {
            return Err(crate::types::NovelError::Config(
                "Generation timeout_secs must be greater than 0".to_string(),
            ));
        }

        url::Url::parse(&self.generation.backend_url).map_err(|e| {
            crate::types::NovelError::Config(format!(
                "Invalid backend_url '{}': {}",
                self.generation.backend_url, e
            ))
        })?;

        if let Some(base) = &self.generation.direct_api_base {
            url::Url::parse(base).map_err(|e| {
                crate::types::NovelError::Config(format!(
                    "Invalid direct_api_base '{}': {}",
                    base, e
                ))
            })?;
        }

        if self.scheduler.tick_interval_secs == 0 {
            return Err(crate::types::NovelError::Config(
                "Scheduler tick_interval_secs must be greater than 0".to_string(),
            ));
        }

        if self.scheduler.min_segment_words >= self.scheduler.target_words {
            return Err(crate::types::NovelError::Config(format!(
                "min_segment_words ({}) must be below target_words ({})",
                self.scheduler.min_segment_words, self.scheduler.target_words
            )));
        }

        Ok(())
    }
}

// =============================================================================
// Generation Configuration
// =============================================================================

/// Settings shared by the prompt builder and the transport chain.
///
/// Note: the direct-tier API key is handled securely - it is never
/// serialized back out and the transport wraps it in SecretString.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Base URL of the backend serving the primary and secondary tiers
    pub backend_url: String,

    /// Model requested from the backend
    pub model: String,

    /// Output language interpolated into every prompt variant
    pub language: String,

    /// Prose style directive (e.g. "immersive third-person")
    pub style: String,

    /// Sampling temperature (0.0 = deterministic, higher = creative)
    pub temperature: f32,

    /// Maximum tokens per generation call
    pub max_tokens: usize,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Optional template name for the secondary long-form endpoint
    pub template: Option<String>,

    /// Operator-supplied credential for the direct tier.
    /// Never serialized to output for security.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Base URL for the direct third-party completions API
    pub direct_api_base: Option<String>,

    /// Model for the direct tier (falls back to a creative default)
    pub direct_model: Option<String>,
}

impl std::fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("backend_url", &self.backend_url)
            .field("model", &self.model)
            .field("language", &self.language)
            .field("style", &self.style)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .field("template", &self.template)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("direct_api_base", &self.direct_api_base)
            .field("direct_model", &self.direct_model)
            .finish()
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8080".to_string(),
            model: generation::DEFAULT_MODEL.to_string(),
            language: "English".to_string(),
            style: "immersive third-person narration".to_string(),
            temperature: generation::DEFAULT_TEMPERATURE,
            max_tokens: generation::DEFAULT_MAX_TOKENS,
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
            template: None,
            api_key: None,
            direct_api_base: None,
            direct_model: None,
        }
    }
}

// =============================================================================
// Scheduler Configuration
// =============================================================================

/// What the scheduler does when every generation tier fails on a tick.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ExhaustionPolicy {
    /// Stop autopilot rather than loop on a broken connection
    #[default]
    StopAutopilot,
    /// Log, append nothing, and try again next tick
    SkipTick,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Delay between generation ticks (seconds)
    pub tick_interval_secs: u64,

    /// Word count at which a chapter is marked complete
    pub target_words: usize,

    /// Minimum words per generated segment before the length retry
    pub min_segment_words: usize,

    /// Behavior when all tiers fail. Content is never fabricated
    /// under either policy.
    pub exhaustion_policy: ExhaustionPolicy,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: scheduler::DEFAULT_TICK_INTERVAL_SECS,
            target_words: chapter::DEFAULT_TARGET_WORDS,
            min_segment_words: chapter::DEFAULT_MIN_SEGMENT_WORDS,
            exhaustion_policy: ExhaustionPolicy::default(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
