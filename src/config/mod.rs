//! Configuration
//!
//! Layered configuration (defaults → global → project → environment)
//! and the operator-facing settings consumed by the prompt builder,
//! transports and scheduler.

pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::{Config, ExhaustionPolicy, GenerationConfig, SchedulerConfig};
