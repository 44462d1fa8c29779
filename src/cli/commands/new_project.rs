//! `novelpilot new` - create a project with its first empty chapter.

use console::style;

use crate::cli::open_store;
use crate::types::{Project, Result};

pub fn run(title: &str, genre: &str) -> Result<()> {
    let store = open_store()?;
    let mut project = Project::new(title, genre);
    store.save(&mut project)?;

    println!(
        "{} {} ({})",
        style("Created").green().bold(),
        style(&project.title).bold(),
        project.genre
    );
    println!("  id: {}", project.id);
    println!(
        "  run autopilot with: novelpilot run \"{}\"",
        project.title
    );
    Ok(())
}
