//! `novelpilot run` - drive the autopilot loop for one project.

use console::style;
use tracing::info;

use crate::autopilot::{AutopilotScheduler, ChapterStateStore, TickOutcome};
use crate::cli::open_store;
use crate::config::ConfigLoader;
use crate::generation::create_client;
use crate::types::Result;

/// Operator overrides layered on top of the loaded configuration.
#[derive(Debug, Default)]
pub struct RunOptions {
    pub project: String,
    pub interval_secs: Option<u64>,
    pub target_words: Option<usize>,
    pub model: Option<String>,
    pub language: Option<String>,
    /// Perform a single manual tick instead of arming the timer
    pub once: bool,
}

pub async fn run(opts: RunOptions) -> Result<()> {
    let mut config = ConfigLoader::load()?;
    if let Some(interval) = opts.interval_secs {
        config.scheduler.tick_interval_secs = interval;
    }
    if let Some(target) = opts.target_words {
        config.scheduler.target_words = target;
    }
    if let Some(model) = opts.model {
        config.generation.model = model;
    }
    if let Some(language) = opts.language {
        config.generation.language = language;
    }
    config.validate()?;

    let store = open_store()?;
    let project = store.find(&opts.project)?;
    info!(project = %project.title, "Loaded project");

    let client = create_client(&config.generation)?;
    let state = ChapterStateStore::new(project, config.scheduler.target_words);
    let scheduler = AutopilotScheduler::new(
        state,
        client,
        store,
        config.generation.clone(),
        config.scheduler.clone(),
    );

    if opts.once {
        let outcome = scheduler.tick().await;
        report_tick(&outcome);
        return Ok(());
    }

    println!(
        "{} every {}s toward {} words per chapter (Ctrl-C to stop)",
        style("Autopilot running").green().bold(),
        config.scheduler.tick_interval_secs,
        config.scheduler.target_words
    );

    let runner = scheduler.clone();
    let mut handle = tokio::spawn(async move { runner.run().await });

    tokio::select! {
        _ = &mut handle => {}
        _ = tokio::signal::ctrl_c() => {
            scheduler.stop();
            let _ = handle.await;
        }
    }

    let project = scheduler.snapshot();
    println!(
        "{}: {} chapters, {} words total",
        style("Autopilot stopped").yellow().bold(),
        project.chapters.len(),
        project.total_words()
    );
    Ok(())
}

fn report_tick(outcome: &TickOutcome) {
    match outcome {
        TickOutcome::Appended { tier, words, chapter_complete } => {
            println!(
                "{} {} words from the {} tier{}",
                style("Appended").green().bold(),
                words,
                tier,
                if *chapter_complete {
                    " (chapter complete)"
                } else {
                    ""
                }
            );
        }
        TickOutcome::ChapterCompleted { chapter_title } => {
            println!(
                "{} {}",
                style("Completed").green().bold(),
                chapter_title
            );
        }
        TickOutcome::Exhausted => {
            println!(
                "{}: all generation tiers failed, nothing was appended",
                style("Exhausted").red().bold()
            );
        }
        TickOutcome::SkippedInFlight | TickOutcome::SkippedStale => {
            println!("{}: tick skipped", style("Skipped").yellow());
        }
    }
}
