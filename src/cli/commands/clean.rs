//! `novelpilot clean` - explicit operator deletion.
//!
//! Projects are never deleted automatically; this command is the only
//! path that removes them from durable storage.

use console::style;

use crate::cli::open_store;
use crate::types::Result;

pub fn run(project: Option<&str>, publish_history: bool, all: bool) -> Result<()> {
    let store = open_store()?;

    if let Some(needle) = project {
        let found = store.find(needle)?;
        store.delete(found.id)?;
        println!("{} {}", style("Deleted").red().bold(), found.title);
    }

    if publish_history || all {
        let cleared = store.clear_publish_history()?;
        println!(
            "{} {} publish records",
            style("Cleared").red().bold(),
            cleared
        );
    }

    if all {
        let mut deleted = 0usize;
        for project in store.list()? {
            store.delete(project.id)?;
            deleted += 1;
        }
        println!("{} {} projects", style("Deleted").red().bold(), deleted);
    }

    Ok(())
}
