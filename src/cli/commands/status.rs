//! `novelpilot status` - projects, chapters and publish history.

use console::style;

use crate::cli::open_store;
use crate::types::{PublishStatus, Result};

pub fn run(history: bool) -> Result<()> {
    let store = open_store()?;
    let projects = store.list()?;

    if projects.is_empty() {
        println!("No projects yet. Create one with: novelpilot new <title>");
    }

    for project in &projects {
        println!(
            "{} ({}) - {} words across {} chapters",
            style(&project.title).bold(),
            project.genre,
            project.total_words(),
            project.chapters.len()
        );
        println!("  id: {}", project.id);

        for (index, chapter) in project.chapters.iter().enumerate() {
            let marker = if index == project.active_chapter {
                "▶"
            } else {
                " "
            };
            let state = if chapter.is_complete {
                style("complete").green()
            } else {
                style("in progress").yellow()
            };
            println!(
                "  {} {}. {} - {} words [{}]",
                marker,
                index + 1,
                chapter.title,
                chapter.word_count,
                state
            );
        }
    }

    if history {
        let records = store.publish_history()?;
        println!();
        println!("{}", style("Publish history").bold());
        if records.is_empty() {
            println!("  (empty)");
        }
        for record in records {
            let status = match record.status {
                PublishStatus::Succeeded => style("succeeded").green(),
                PublishStatus::Failed => style("failed").red(),
                PublishStatus::Pending => style("pending").yellow(),
            };
            print!(
                "  {} {} [{}]",
                record.submitted_at.format("%Y-%m-%d %H:%M"),
                record.chapter_title,
                status
            );
            if let Some(error) = &record.error {
                print!(" - {}", error);
            }
            println!();
        }
    }

    Ok(())
}
