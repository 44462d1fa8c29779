//! Novelpilot - Long-Form Content Autopilot Engine
//!
//! Grows novel chapters toward a target word count by repeatedly
//! calling a remote text-generation service, tolerating an unreliable
//! multi-shaped API surface and persisting incremental progress.
//!
//! ## Core Features
//!
//! - **Tiered Generation**: primary backend → long-form endpoint →
//!   direct third-party API, falling through on failure or empty
//!   extraction
//! - **Length Enforcement**: one strengthened retry for under-length
//!   segments
//! - **Autopilot**: cooperative timer loop with an in-flight guard and
//!   stale-result protection
//! - **Snapshot Persistence**: best-effort SQLite snapshots that never
//!   block the generation path
//!
//! ## Quick Start
//!
//! ```ignore
//! use novelpilot::{AutopilotScheduler, ChapterStateStore, Project};
//! use novelpilot::config::ConfigLoader;
//! use novelpilot::generation::create_client;
//!
//! let config = ConfigLoader::load()?;
//! let client = create_client(&config.generation)?;
//! let store = ChapterStateStore::new(
//!     Project::new("Harbor Lights", "mystery"),
//!     config.scheduler.target_words,
//! );
//! let scheduler = AutopilotScheduler::new(
//!     store, client, persistence, config.generation, config.scheduler,
//! );
//! scheduler.run().await;
//! ```
//!
//! ## Modules
//!
//! - [`generation`]: transport chain, extraction, prompts, length retry
//! - [`autopilot`]: scheduler state machine and chapter state store
//! - [`storage`]: SQLite persistence for projects and publish history
//! - [`config`]: layered configuration
//! - [`publish`]: chapter submission with append-only history

pub mod autopilot;
pub mod cli;
pub mod config;
pub mod constants;
pub mod generation;
pub mod publish;
pub mod storage;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader, ExhaustionPolicy, GenerationConfig, SchedulerConfig};

// Error Types
pub use types::error::{NovelError, Result, ResultExt};

// Entities
pub use types::{Chapter, Project, PublishRecord, PublishStatus, count_words};

// Storage
pub use storage::{Database, ProjectStore, SharedDatabase};

// =============================================================================
// Engine Re-exports
// =============================================================================

pub use autopilot::{
    AppendOutcome, AutopilotScheduler, ChapterStateStore, SchedulerState, TickOutcome,
};

pub use generation::{
    GenerationClient, GenerationRequest, GenerationResult, SharedClient, SourceTier, TieredClient,
    create_client, ensure_minimum_length,
};

pub use publish::Publisher;
