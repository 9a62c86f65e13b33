//! Top-level run: hash the identity file, then store or restore

use crate::cache::{CacheKey, CacheOptions, CacheStore, Outcome};
use crate::cli::args::Cli;
use crate::command::{OutputMode, DEFAULT_SHELL};
use crate::config::{Config, ConfigManager};
use crate::error::{CadirError, CadirResult};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Load the global config and, unless disabled, the nearest local one
pub async fn load_config(cli: &Cli, cwd: &Path) -> CadirResult<Config> {
    let manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };

    let local = if cli.no_local {
        debug!("Local config discovery disabled (--no-local)");
        None
    } else {
        let found = ConfigManager::find_local_config(cwd);
        if let Some(ref path) = found {
            debug!("Found local config: {}", path.display());
        }
        found
    };

    manager.load_merged(local.as_deref()).await
}

/// Combine arguments and config into the options for this run
///
/// Command-line values win over config values.
pub fn resolve_options(cli: &Cli, config: &Config, cwd: &Path) -> CadirResult<CacheOptions> {
    let cache_root = cli
        .cache_destination
        .clone()
        .or_else(|| config.cache.destination.clone())
        .ok_or_else(|| {
            CadirError::Arguments(
                "--cache-destination is required (or set cache.destination in config)"
                    .to_string(),
            )
        })?;

    if cli.setup.trim().is_empty() {
        return Err(CadirError::Arguments("--setup must not be empty".to_string()));
    }

    let verbose = cli.verbose > 0 || config.general.verbose.unwrap_or(false);

    let mut options = CacheOptions::new(
        cli.identity_file.clone(),
        cli.cache_source.clone(),
        cache_root,
        cli.setup.clone(),
        cwd.to_path_buf(),
    );
    options.finalize_command = cli.finalize.clone();
    options.command_working_directory = cli
        .command_working_directory
        .clone()
        .or_else(|| config.command.working_directory.clone())
        .unwrap_or_else(|| PathBuf::from(cwd));
    options.archive = cli.archive || config.cache.archive.unwrap_or(false);
    options.link = cli.link || config.cache.link.unwrap_or(false);
    options.output = if verbose {
        OutputMode::Stream
    } else {
        OutputMode::Quiet
    };
    options.shell = config
        .command
        .shell
        .clone()
        .unwrap_or_else(|| DEFAULT_SHELL.to_string());

    Ok(options)
}

/// Run the cache for one set of options
pub async fn execute(options: &CacheOptions) -> CadirResult<Outcome> {
    let key = CacheKey::from_identity_file(&options.identity_file)?;
    info!("Identity file hash is: {}", key);

    let outcome = CacheStore::new(options, &key).run().await?;

    match outcome {
        Outcome::Stored { ref entry } => info!("Cache stored at {}", entry.display()),
        Outcome::Restored {
            ref entry,
            strategy,
        } => info!("Cache restored from {} ({})", entry.display(), strategy),
    }

    Ok(outcome)
}
