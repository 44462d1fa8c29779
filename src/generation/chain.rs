//! Tiered Generation Chain
//!
//! Cascading transport attempts with a single pass through the tiers.
//!
//! ## Strategy
//!
//! 1. Skip a tier that reports itself unavailable (direct tier without
//!    a credential)
//! 2. Send the request; a transport failure is local to that tier
//! 3. Run extraction on a 2xx body; empty extraction falls through the
//!    same way a transport failure does
//! 4. First non-empty extraction wins and short-circuits the chain
//! 5. If every tier fails or yields nothing, return an exhausted
//!    result; the caller sees a value, never an error
//!
//! No partial state is committed here; callers decide what to do with
//! the result.

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use super::extract::extract_text;
use super::{
    GenerationClient, GenerationRequest, GenerationResult, SharedTransport, SourceTier,
    TierAttempt, Transport,
};

/// Prioritized transport chain. The production client behind the
/// scheduler; tests swap in doubles at the `GenerationClient` seam
/// instead of patching globals.
pub struct TieredClient {
    transports: Vec<SharedTransport>,
}

impl TieredClient {
    pub fn new(transports: Vec<SharedTransport>) -> Self {
        Self { transports }
    }

    /// Chain with a single transport, mostly useful in tests.
    pub fn single(transport: impl Transport + 'static) -> Self {
        Self {
            transports: vec![std::sync::Arc::new(transport)],
        }
    }
}

#[async_trait]
impl GenerationClient for TieredClient {
    #[instrument(skip(self, request), fields(tiers = self.transports.len()))]
    async fn generate(&self, request: &GenerationRequest) -> GenerationResult {
        let mut trail: Vec<TierAttempt> = Vec::new();

        for transport in &self.transports {
            let tier = transport.tier();

            if !transport.is_available() {
                debug!(tier = %tier, "Skipping unavailable tier");
                trail.push(TierAttempt {
                    tier,
                    outcome: "skipped (no credential)".to_string(),
                });
                continue;
            }

            match transport.send(request).await {
                Ok(body) => {
                    let text = extract_text(&body);
                    if text.is_empty() {
                        warn!(tier = %tier, "Tier returned no extractable content");
                        trail.push(TierAttempt {
                            tier,
                            outcome: "no extractable content".to_string(),
                        });
                        continue;
                    }

                    info!(tier = %tier, words = crate::types::count_words(&text), "Tier succeeded");
                    trail.push(TierAttempt {
                        tier,
                        outcome: "ok".to_string(),
                    });
                    return GenerationResult::from_tier(text, tier, trail);
                }
                Err(err) => {
                    warn!(tier = %tier, error = %err, "Tier failed");
                    trail.push(TierAttempt {
                        tier,
                        outcome: err.to_string(),
                    });
                }
            }
        }

        warn!(trail = %summarize(&trail), "All generation tiers exhausted");
        GenerationResult::exhausted(trail)
    }

    fn name(&self) -> &str {
        "tiered-client"
    }
}

fn summarize(trail: &[TierAttempt]) -> String {
    trail
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

// =============================================================================
// Tests
// =============================================================================
