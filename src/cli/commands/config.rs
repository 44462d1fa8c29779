//! `novelpilot config` - show, locate and scaffold configuration.

use crate::config::ConfigLoader;
use crate::types::Result;

pub fn show(as_json: bool) -> Result<()> {
    ConfigLoader::show_config(as_json)
}

pub fn path() -> Result<()> {
    ConfigLoader::show_path();
    Ok(())
}

pub fn init_global(force: bool) -> Result<()> {
    let dir = ConfigLoader::init_global(force)?;
    println!("Global config directory: {}", dir.display());
    Ok(())
}

pub fn init_project() -> Result<()> {
    let dir = ConfigLoader::init_project()?;
    println!("Project config directory: {}", dir.display());
    Ok(())
}
