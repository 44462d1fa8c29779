use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "novelpilot")]
#[command(
    version,
    about = "Autopilot engine for long-form AI-assisted novel writing"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long)]
    verbose: bool,

    #[arg(long, short)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new novel project
    New {
        #[arg(help = "Project title")]
        title: String,
        #[arg(long, short, default_value = "fiction", help = "Genre")]
        genre: String,
    },

    /// Run the autopilot loop on a project
    Run {
        #[arg(help = "Project title or id prefix")]
        project: String,
        #[arg(long, short, help = "Seconds between generation ticks")]
        interval: Option<u64>,
        #[arg(long, short, help = "Target words per chapter")]
        target: Option<usize>,
        #[arg(long, help = "Model to request from the backend")]
        model: Option<String>,
        #[arg(long, help = "Output language")]
        language: Option<String>,
        #[arg(long, help = "Perform a single generation tick and exit")]
        once: bool,
    },

    /// Show projects, chapters and progress
    Status {
        #[arg(long, help = "Include publish history")]
        history: bool,
    },

    /// Publish a chapter to the backend
    Publish {
        #[arg(help = "Project title or id prefix")]
        project: String,
        #[arg(help = "Chapter number (1-based)")]
        chapter: usize,
    },

    /// Delete projects or clear publish history
    Clean {
        #[arg(long, help = "Project title or id prefix to delete")]
        project: Option<String>,
        #[arg(long, help = "Clear the publish history")]
        publish_history: bool,
        #[arg(long, help = "Remove all novelpilot data")]
        all: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mNovelpilot encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }

        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    use novelpilot::cli::commands;

    match cli.command {
        Commands::New { title, genre } => {
            commands::new_project::run(&title, &genre)?;
        }
        Commands::Run {
            project,
            interval,
            target,
            model,
            language,
            once,
        } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::run::run(commands::run::RunOptions {
                project,
                interval_secs: interval,
                target_words: target,
                model,
                language,
                once,
            }))?;
        }
        Commands::Status { history } => {
            commands::status::run(history)?;
        }
        Commands::Publish { project, chapter } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::publish::run(&project, chapter))?;
        }
        Commands::Clean {
            project,
            publish_history,
            all,
        } => {
            commands::clean::run(project.as_deref(), publish_history, all)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { json } => {
                commands::config::show(json)?;
            }
            ConfigAction::Path => {
                commands::config::path()?;
            }
            ConfigAction::Init { global, force } => {
                if global {
                    commands::config::init_global(force)?;
                } else {
                    commands::config::init_project()?;
                }
            }
        },
    }

    Ok(())
}
