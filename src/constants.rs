//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Chapter sizing constants
pub mod chapter {
    /// Default word count at which a chapter is considered complete
    pub const DEFAULT_TARGET_WORDS: usize = 2000;

    /// Lower bound of the completion band quoted in prompts
    pub const TARGET_BAND_LOW: usize = 1800;

    /// Upper bound of the completion band quoted in prompts
    pub const TARGET_BAND_HIGH: usize = 2000;

    /// Remaining-word budget at or below which the closing prompt is used
    pub const CLOSING_BUDGET_WORDS: usize = 400;

    /// Lower bound of the per-segment word range requested from the model
    pub const SEGMENT_WORDS_LOW: usize = 400;

    /// Upper bound of the per-segment word range requested from the model
    pub const SEGMENT_WORDS_HIGH: usize = 600;

    /// Minimum acceptable words per generated segment before a retry
    pub const DEFAULT_MIN_SEGMENT_WORDS: usize = 400;
}

/// Prompt construction constants
pub mod prompt {
    /// Maximum characters of the current chapter quoted back as context
    pub const EXCERPT_MAX_CHARS: usize = 1500;

    /// Maximum characters of the previous chapter quoted in an opening prompt
    pub const PREVIOUS_EXCERPT_MAX_CHARS: usize = 600;
}

/// Autopilot scheduler constants
pub mod scheduler {
    /// Default delay between generation ticks (seconds)
    pub const DEFAULT_TICK_INTERVAL_SECS: u64 = 15;

    /// Delay before the first tick on a freshly created chapter (seconds)
    pub const CHAPTER_ROLLOVER_DELAY_SECS: u64 = 3;

    /// Maximum jitter added to each tick delay (milliseconds)
    pub const TICK_JITTER_MS: u64 = 500;
}

/// Generation defaults
pub mod generation {
    /// Default model requested from the backend
    pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

    /// Default model for the direct third-party tier
    pub const DEFAULT_DIRECT_MODEL: &str = "gpt-4o-mini";

    /// Default sampling temperature for creative prose
    pub const DEFAULT_TEMPERATURE: f32 = 0.8;

    /// Default maximum tokens per generation call
    pub const DEFAULT_MAX_TOKENS: usize = 2048;

    /// System instruction used by the direct tier
    pub const DIRECT_SYSTEM_INSTRUCTION: &str =
        "You are a professional novelist. Write vivid, coherent long-form fiction \
         and respond only with story prose, never with commentary.";
}

/// HTTP/Network constants
pub mod network {
    /// Default request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

    /// Connection timeout (seconds)
    pub const CONNECTION_TIMEOUT_SECS: u64 = 30;
}
