//! cadir - directory cache for CI
//!
//! CLI entry point. The process exit status identifies the failing stage;
//! see `cadir --help` for the table.

use cadir::cli::{self, Cli};
use cadir::error::{exit_status, CadirError, CadirResult};
use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version also arrive here, as non-errors
            let code = if e.use_stderr() {
                exit_status::ARGUMENT_PARSING
            } else {
                exit_status::OK
            };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> CadirResult<()> {
    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = EnvFilter::try_from_env("CADIR_LOG").unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("cadir=warn"),
        1 => EnvFilter::new("cadir=info"),
        _ => EnvFilter::new("cadir=debug"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    let cwd = std::env::current_dir().map_err(|e| CadirError::Arguments(format!(
        "cannot determine current directory: {}",
        e
    )))?;

    // a config `verbose = true` only switches command output to streaming
    let config = cli::load_config(&cli, &cwd).await?;
    let options = cli::resolve_options(&cli, &config, &cwd)?;
    cli::execute(&options).await?;

    Ok(())
}
