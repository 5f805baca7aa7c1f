//! CLI module - argument parsing, prompts, the `clean` subcommand and the
//! interactive dashboard

pub mod args;
pub mod clean;
pub mod dashboard;
pub mod prompts;

pub use args::{Cli, Commands};
pub use dashboard::run_dashboard;
pub use prompts::*;
