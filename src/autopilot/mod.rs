//! Autopilot Scheduler
//!
//! Timer-driven loop that grows the active chapter toward its target
//! word count: build prompt -> tiered generation -> length enforcement
//! -> append -> best-effort persist, until the chapter completes or the
//! operator stops the run.
//!
//! ## State machine
//!
//! ```text
//! Idle --start--> Running --stop--> Stopped --start--> Running
//! ```
//!
//! ## Re-entrancy and staleness
//!
//! The timer is a single-shot sleep rescheduled only after each tick
//! completes, never a fixed-period interval that fires regardless of
//! prior completion. An in-flight flag additionally guarantees at most
//! one outstanding generation, and an epoch counter discards results
//! that resolve after the active chapter was switched away.
//!
//! Stopping cancels the timer but lets an in-flight generation finish
//! and commit; exhaustion of all tiers is a soft failure that never
//! fabricates content.

pub mod state;

pub use state::{AppendOutcome, ChapterStateStore};

use rand::Rng;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::{ExhaustionPolicy, GenerationConfig, SchedulerConfig};
use crate::constants::scheduler as scheduler_constants;
use crate::generation::{
    GenerationRequest, SharedClient, SourceTier, build_prompt, ensure_minimum_length,
};
use crate::storage::ProjectStore;
use crate::types::{Project, Result};

// =============================================================================
// Scheduler State
// =============================================================================

/// Lifecycle of one autopilot run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SchedulerState {
    Idle = 0,
    Running = 1,
    Stopped = 2,
}

impl SchedulerState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Running,
            2 => Self::Stopped,
            _ => Self::Idle,
        }
    }
}

impl std::fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// What one tick did. Returned for logging and tests; the scheduler
/// itself only branches on completion and exhaustion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// A segment was appended to the active chapter
    Appended {
        tier: SourceTier,
        words: usize,
        chapter_complete: bool,
    },
    /// The active chapter had already reached its target; it was
    /// finalized and (unless stopped) a fresh chapter was created
    ChapterCompleted { chapter_title: String },
    /// A generation was already in flight; nothing was started
    SkippedInFlight,
    /// The result resolved after the active chapter changed; discarded
    SkippedStale,
    /// Every tier failed; nothing was appended
    Exhausted,
}

// =============================================================================
// Scheduler
// =============================================================================

struct SchedulerInner {
    store: Mutex<ChapterStateStore>,
    client: SharedClient,
    persistence: Arc<ProjectStore>,
    generation: GenerationConfig,
    config: SchedulerConfig,
    state: AtomicU8,
    in_flight: AtomicBool,
    /// Bumped whenever the active chapter target changes; a tick only
    /// commits if the epoch it captured is still current
    epoch: AtomicU64,
    stop_signal: Notify,
}

/// Cooperative autopilot loop. Cheap to clone; all clones drive the
/// same run.
#[derive(Clone)]
pub struct AutopilotScheduler {
    inner: Arc<SchedulerInner>,
}

impl AutopilotScheduler {
    pub fn new(
        store: ChapterStateStore,
        client: SharedClient,
        persistence: Arc<ProjectStore>,
        generation: GenerationConfig,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                store: Mutex::new(store),
                client,
                persistence,
                generation,
                config,
                state: AtomicU8::new(SchedulerState::Idle as u8),
                in_flight: AtomicBool::new(false),
                epoch: AtomicU64::new(0),
                stop_signal: Notify::new(),
            }),
        }
    }

    pub fn state(&self) -> SchedulerState {
        SchedulerState::from_u8(self.inner.state.load(Ordering::SeqCst))
    }

    /// Clone of the current project state.
    pub fn snapshot(&self) -> Project {
        self.lock_store().project().clone()
    }

    /// Request a stop. The timer is cancelled; an in-flight generation
    /// finishes and still commits, but no further ticks are scheduled.
    pub fn stop(&self) {
        let previous = self
            .inner
            .state
            .swap(SchedulerState::Stopped as u8, Ordering::SeqCst);
        if SchedulerState::from_u8(previous) == SchedulerState::Running {
            info!("Autopilot stop requested");
            self.inner.stop_signal.notify_waiters();
        }
    }

    /// Change the chapter subsequent ticks generate into. Persists the
    /// snapshot being left, then bumps the epoch so any in-flight
    /// result for the old chapter is discarded instead of committed.
    pub fn switch_chapter(&self, index: usize) -> Result<()> {
        let mut store = self.lock_store();
        self.inner.persistence.save_best_effort(store.project_mut());
        store.switch_active_chapter(index)?;
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
        info!(chapter = index, "Switched active chapter");
        Ok(())
    }

    /// Drive the loop until the operator stops it or the exhaustion
    /// policy does. The first tick runs immediately on start.
    pub async fn run(&self) {
        self.inner
            .state
            .store(SchedulerState::Running as u8, Ordering::SeqCst);
        info!(
            interval_secs = self.inner.config.tick_interval_secs,
            target_words = self.inner.config.target_words,
            "Autopilot started"
        );

        loop {
            if self.state() != SchedulerState::Running {
                break;
            }

            let outcome = self.tick().await;
            debug!(?outcome, "Tick finished");

            let delay = match outcome {
                TickOutcome::Exhausted
                    if self.inner.config.exhaustion_policy == ExhaustionPolicy::StopAutopilot =>
                {
                    warn!("Generation exhausted; stopping autopilot");
                    self.stop();
                    break;
                }
                TickOutcome::ChapterCompleted { chapter_title } => {
                    info!(chapter = %chapter_title, "Chapter finished, rolling over");
                    Duration::from_secs(scheduler_constants::CHAPTER_ROLLOVER_DELAY_SECS)
                }
                _ => Duration::from_secs(self.inner.config.tick_interval_secs) + tick_jitter(),
            };

            if !self.sleep_unless_stopped(delay).await {
                break;
            }
        }

        self.inner
            .state
            .store(SchedulerState::Stopped as u8, Ordering::SeqCst);
        info!("Autopilot stopped");
    }

    /// One generation tick. Public so operators can drive a single
    /// manual step without arming the timer.
    pub async fn tick(&self) -> TickOutcome {
        if self.inner.in_flight.swap(true, Ordering::SeqCst) {
            debug!("Generation already in flight, skipping tick");
            return TickOutcome::SkippedInFlight;
        }

        let outcome = self.tick_inner().await;
        self.inner.in_flight.store(false, Ordering::SeqCst);
        outcome
    }

    async fn tick_inner(&self) -> TickOutcome {
        let epoch = self.inner.epoch.load(Ordering::SeqCst);

        // Completion check and prompt construction are synchronous and
        // happen under the store lock; the lock is released before any
        // network suspension point.
        let (request, chapter_id) = {
            let mut store = self.lock_store();

            if store.active_reached_target() {
                store.complete_active();
                let chapter_title = store.active_chapter().title.clone();
                self.inner.persistence.save_best_effort(store.project_mut());

                if self.state() != SchedulerState::Stopped {
                    store.create_chapter();
                    self.inner.persistence.save_best_effort(store.project_mut());
                }
                return TickOutcome::ChapterCompleted { chapter_title };
            }

            let prompt = build_prompt(
                store.project(),
                store.active_chapter(),
                &self.inner.generation,
                self.inner.config.target_words,
            );
            let request = GenerationRequest::new(prompt, self.inner.generation.model.clone())
                .with_max_tokens(self.inner.generation.max_tokens)
                .with_temperature(self.inner.generation.temperature);
            (request, store.active_chapter().id)
        };

        let first = self.inner.client.generate(&request).await;
        let result = ensure_minimum_length(
            self.inner.client.as_ref(),
            &request,
            first,
            self.inner.config.min_segment_words,
        )
        .await;

        if result.is_exhausted() {
            warn!(trail = %result.trail_summary(), "All tiers failed, nothing appended");
            return TickOutcome::Exhausted;
        }

        if self.inner.epoch.load(Ordering::SeqCst) != epoch {
            info!("Active chapter changed mid-generation, discarding result");
            return TickOutcome::SkippedStale;
        }

        let mut store = self.lock_store();
        match store.append_generated(chapter_id, &result.text) {
            Ok(outcome) => {
                self.inner.persistence.save_best_effort(store.project_mut());
                info!(
                    tier = %result.source,
                    words = outcome.words_added,
                    total = outcome.total_words,
                    "Segment committed"
                );
                TickOutcome::Appended {
                    tier: result.source,
                    words: outcome.words_added,
                    chapter_complete: outcome.newly_completed,
                }
            }
            Err(err) => {
                warn!(error = %err, "Result no longer applies, discarding");
                TickOutcome::SkippedStale
            }
        }
    }

    /// Sleep for `delay`, returning false if a stop arrived first or
    /// the run is no longer Running.
    async fn sleep_unless_stopped(&self, delay: Duration) -> bool {
        tokio::select! {
            _ = sleep(delay) => self.state() == SchedulerState::Running,
            _ = self.inner.stop_signal.notified() => false,
        }
    }

    fn lock_store(&self) -> std::sync::MutexGuard<'_, ChapterStateStore> {
        self.inner
            .store
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn tick_jitter() -> Duration {
    let ms = rand::rng().random_range(0..scheduler_constants::TICK_JITTER_MS);
    Duration::from_millis(ms)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{GenerationClient, GenerationResult};
    use crate::storage::Database;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicU32;

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    /// Client returning a fixed word count, optionally gated on a
    /// notify so tests can hold a generation in flight.
    struct ScriptedClient {
        words_per_call: usize,
        calls: AtomicU32,
        gate: Option<Arc<Notify>>,
    }

    impl ScriptedClient {
        fn fixed(words_per_call: usize) -> Arc<Self> {
            Arc::new(Self {
                words_per_call,
                calls: AtomicU32::new(0),
                gate: None,
            })
        }

        fn gated(words_per_call: usize, gate: Arc<Notify>) -> Arc<Self> {
            Arc::new(Self {
                words_per_call,
                calls: AtomicU32::new(0),
                gate: Some(gate),
            })
        }

        fn exhausted() -> Arc<Self> {
            Arc::new(Self {
                words_per_call: 0,
                calls: AtomicU32::new(0),
                gate: None,
            })
        }
    }

    #[async_trait]
    impl GenerationClient for ScriptedClient {
        async fn generate(&self, _request: &GenerationRequest) -> GenerationResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.words_per_call == 0 {
                GenerationResult::exhausted(vec![])
            } else {
                GenerationResult::from_tier(words(self.words_per_call), SourceTier::Primary, vec![])
            }
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn persistence() -> Arc<ProjectStore> {
        Arc::new(ProjectStore::new(Arc::new(
            Database::open_in_memory().unwrap(),
        )))
    }

    fn scheduler_with(client: SharedClient, config: SchedulerConfig) -> AutopilotScheduler {
        let store = ChapterStateStore::new(
            Project::new("Harbor Lights", "mystery"),
            config.target_words,
        );
        AutopilotScheduler::new(
            store,
            client,
            persistence(),
            GenerationConfig::default(),
            config,
        )
    }

    fn config() -> SchedulerConfig {
        SchedulerConfig {
            tick_interval_secs: 1,
            target_words: 2000,
            min_segment_words: 400,
            exhaustion_policy: ExhaustionPolicy::StopAutopilot,
        }
    }

    #[tokio::test]
    async fn test_tick_appends_primary_segment() {
        // Empty chapter, 550-word primary result: content equals the
        // generated text, count 550, not complete
        let client = ScriptedClient::fixed(550);
        let scheduler = scheduler_with(client.clone(), config());

        let outcome = scheduler.tick().await;

        assert_eq!(
            outcome,
            TickOutcome::Appended {
                tier: SourceTier::Primary,
                words: 550,
                chapter_complete: false,
            }
        );
        let project = scheduler.snapshot();
        assert_eq!(project.chapters[0].content, words(550));
        assert_eq!(project.chapters[0].word_count, 550);
        assert!(!project.chapters[0].is_complete);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_tick_persists_committed_segment() {
        let scheduler = scheduler_with(ScriptedClient::fixed(550), config());
        let id = scheduler.snapshot().id;

        scheduler.tick().await;

        let loaded = scheduler
            .inner
            .persistence
            .load(id)
            .unwrap()
            .expect("snapshot saved");
        assert_eq!(loaded.chapters[0].word_count, 550);
    }

    #[tokio::test]
    async fn test_exhausted_tick_appends_nothing() {
        let scheduler = scheduler_with(ScriptedClient::exhausted(), config());

        let outcome = scheduler.tick().await;

        assert_eq!(outcome, TickOutcome::Exhausted);
        assert_eq!(scheduler.snapshot().chapters[0].word_count, 0);
    }

    #[tokio::test]
    async fn test_run_stops_on_exhaustion_policy() {
        let scheduler = scheduler_with(ScriptedClient::exhausted(), config());

        scheduler.run().await;

        assert_eq!(scheduler.state(), SchedulerState::Stopped);
        assert_eq!(scheduler.snapshot().chapters[0].word_count, 0);
    }

    #[tokio::test]
    async fn test_run_skips_exhaustion_under_skip_policy() {
        let mut cfg = config();
        cfg.exhaustion_policy = ExhaustionPolicy::SkipTick;
        let client = ScriptedClient::exhausted();
        let scheduler = scheduler_with(client.clone(), cfg);

        let runner = scheduler.clone();
        let handle = tokio::spawn(async move { runner.run().await });

        // Let a couple of ticks fail, then stop explicitly
        tokio::time::sleep(Duration::from_millis(50)).await;
        scheduler.stop();
        handle.await.unwrap();

        assert_eq!(scheduler.state(), SchedulerState::Stopped);
        assert!(client.calls.load(Ordering::SeqCst) >= 1);
        assert_eq!(scheduler.snapshot().chapters[0].word_count, 0);
    }

    #[tokio::test]
    async fn test_overlapping_tick_is_skipped() {
        let gate = Arc::new(Notify::new());
        let client = ScriptedClient::gated(550, gate.clone());
        let scheduler = scheduler_with(client.clone(), config());

        let first = scheduler.clone();
        let in_flight = tokio::spawn(async move { first.tick().await });
        while client.calls.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        // Second tick while the first is suspended on the network call
        let overlapped = scheduler.tick().await;
        assert_eq!(overlapped, TickOutcome::SkippedInFlight);

        gate.notify_one();
        let outcome = in_flight.await.unwrap();
        assert!(matches!(outcome, TickOutcome::Appended { .. }));
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stale_result_discarded_after_chapter_switch() {
        let gate = Arc::new(Notify::new());
        let client = ScriptedClient::gated(550, gate.clone());
        let scheduler = scheduler_with(client.clone(), config());

        // A second chapter to switch into while generation is in flight
        scheduler.lock_store().create_chapter();
        scheduler.switch_chapter(0).unwrap();

        let ticking = scheduler.clone();
        let in_flight = tokio::spawn(async move { ticking.tick().await });
        while client.calls.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        scheduler.switch_chapter(1).unwrap();
        gate.notify_one();

        let outcome = in_flight.await.unwrap();
        assert_eq!(outcome, TickOutcome::SkippedStale);
        let project = scheduler.snapshot();
        assert_eq!(project.chapters[0].word_count, 0);
        assert_eq!(project.chapters[1].word_count, 0);
    }

    #[tokio::test]
    async fn test_completed_chapter_rolls_over() {
        let scheduler = scheduler_with(ScriptedClient::fixed(550), config());
        {
            let mut store = scheduler.lock_store();
            let id = store.active_chapter().id;
            store.append_generated(id, &words(2000)).unwrap();
        }

        let outcome = scheduler.tick().await;

        assert_eq!(
            outcome,
            TickOutcome::ChapterCompleted {
                chapter_title: "Chapter 1".to_string()
            }
        );
        let project = scheduler.snapshot();
        assert!(project.chapters[0].is_complete);
        assert_eq!(project.chapters.len(), 2);
        assert_eq!(project.active_chapter, 1);
    }

    #[tokio::test]
    async fn test_stop_prevents_further_ticks() {
        let client = ScriptedClient::fixed(550);
        let scheduler = scheduler_with(client.clone(), config());

        let runner = scheduler.clone();
        let handle = tokio::spawn(async move { runner.run().await });

        // Wait for the immediate first tick to land
        for _ in 0..100 {
            if scheduler.snapshot().chapters[0].word_count > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        scheduler.stop();
        handle.await.unwrap();
        assert_eq!(scheduler.state(), SchedulerState::Stopped);

        let calls_after_stop = client.calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(client.calls.load(Ordering::SeqCst), calls_after_stop);
    }
}
