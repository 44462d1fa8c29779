//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//!
//! ## Error Taxonomy
//!
//! - **Transport**: network/HTTP failure at a generation tier (fall through)
//! - **ExtractionMiss**: 2xx response with no extractable text (fall through)
//! - **CredentialMissing**: direct tier skipped, not failed
//! - **Exhausted**: every tier failed or yielded nothing
//! - **Storage**: persistence failure, never propagated into generation
//!
//! ## Design Principles
//!
//! - Single unified error type (NovelError) for the entire application
//! - Tier errors never escape the generation client; exhaustion is a
//!   result value, not an exception
//! - No panic/unwrap - all errors are recoverable

use thiserror::Error;

use crate::generation::SourceTier;

#[derive(Debug, Error)]
pub enum NovelError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Generation Errors
    // -------------------------------------------------------------------------
    /// Network or HTTP failure at a single tier
    #[error("Transport failure on {tier} tier: {message}")]
    Transport { tier: SourceTier, message: String },

    /// A 2xx response whose body could not be mapped to text
    #[error("No extractable content in {tier} tier response")]
    ExtractionMiss { tier: SourceTier },

    /// The direct tier has no operator-supplied credential
    #[error("No API credential available for {tier} tier")]
    CredentialMissing { tier: SourceTier },

    /// Every tier failed or yielded no content
    #[error("All generation tiers exhausted after {attempts} attempts")]
    Exhausted { attempts: usize },

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Project error: {0}")]
    Project(String),

    #[error("Publish failed for '{chapter}': {reason}")]
    Publish { chapter: String, reason: String },
}

impl NovelError {
    /// Create a transport error for a tier
    pub fn transport(tier: SourceTier, message: impl Into<String>) -> Self {
        Self::Transport {
            tier,
            message: message.into(),
        }
    }

    /// Check if this error is local to one tier and recoverable by
    /// falling through to the next
    pub fn is_tier_local(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::ExtractionMiss { .. } | Self::CredentialMissing { .. }
        )
    }

    /// True for credential absence, which skips a tier rather than
    /// counting as a failed attempt
    pub fn is_tier_skip(&self) -> bool {
        matches!(self, Self::CredentialMissing { .. })
    }
}

pub type Result<T> = std::result::Result<T, NovelError>;

// =============================================================================
// Helper Functions
// =============================================================================

/// Context extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn with_context<C: Into<String>>(self, context: C) -> Result<T>;

    /// Add context using a closure (lazy evaluation)
    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<C: Into<String>>(self, context: C) -> Result<T> {
        self.map_err(|e| NovelError::Storage(format!("{}: {}", context.into(), e)))
    }

    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| NovelError::Storage(format!("{}: {}", f().into(), e)))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_local_errors() {
        assert!(NovelError::transport(SourceTier::Primary, "connection refused").is_tier_local());
        assert!(
            NovelError::ExtractionMiss {
                tier: SourceTier::Secondary
            }
            .is_tier_local()
        );
        assert!(
            NovelError::CredentialMissing {
                tier: SourceTier::Direct
            }
            .is_tier_local()
        );
        assert!(!NovelError::Exhausted { attempts: 3 }.is_tier_local());
        assert!(!NovelError::Storage("disk full".to_string()).is_tier_local());
    }

    #[test]
    fn test_tier_skip() {
        assert!(
            NovelError::CredentialMissing {
                tier: SourceTier::Direct
            }
            .is_tier_skip()
        );
        assert!(!NovelError::transport(SourceTier::Direct, "timeout").is_tier_skip());
    }

    #[test]
    fn test_display_includes_tier() {
        let err = NovelError::transport(SourceTier::Primary, "HTTP 500");
        assert_eq!(err.to_string(), "Transport failure on primary tier: HTTP 500");
    }

    #[test]
    fn test_with_context() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing file",
        ));
        let wrapped = result.with_context("loading snapshot");
        let err = wrapped.unwrap_err();
        assert!(err.to_string().contains("loading snapshot"));
        assert!(err.to_string().contains("missing file"));
    }
}
