//! Command-line interface: argument parsing and the top-level run

pub mod args;
mod run;

pub use args::Cli;
pub use run::{execute, load_config, resolve_options};
