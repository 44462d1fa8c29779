//! `novelpilot publish` - submit a chapter to the backend.

use console::style;

use crate::cli::open_store;
use crate::config::ConfigLoader;
use crate::publish::Publisher;
use crate::types::{NovelError, PublishStatus, Result};

pub async fn run(project: &str, chapter_number: usize) -> Result<()> {
    let config = ConfigLoader::load()?;
    let store = open_store()?;
    let project = store.find(project)?;

    let chapter = chapter_number
        .checked_sub(1)
        .and_then(|i| project.chapters.get(i))
        .ok_or_else(|| {
            NovelError::Project(format!(
                "Chapter {} does not exist ({} chapters)",
                chapter_number,
                project.chapters.len()
            ))
        })?;

    let publisher = Publisher::new(&config.generation.backend_url, store)?;
    let record = publisher.publish_chapter(&project, chapter).await?;

    match record.status {
        PublishStatus::Succeeded => {
            println!(
                "{} {}",
                style("Published").green().bold(),
                record.chapter_title
            );
        }
        _ => {
            println!(
                "{} {}: {}",
                style("Publish failed").red().bold(),
                record.chapter_title,
                record.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}
