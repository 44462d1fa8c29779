pub mod clean;
pub mod config;
pub mod new_project;
pub mod publish;
pub mod run;
pub mod status;
