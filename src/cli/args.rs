//! CLI argument definitions using clap derive

use crate::error::exit_status;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// cadir - directory cache for CI
///
/// Hashes the identity file, then restores the cache source from the
/// matching cache entry, or runs the setup command and stores the result
/// when no entry exists.
#[derive(Parser, Debug)]
#[command(name = "cadir")]
#[command(author, version, about, long_about = None)]
#[command(after_help = exit_status::TABLE)]
pub struct Cli {
    /// The directory which should be cached
    #[arg(long, env = "CADIR_CACHE_SOURCE", value_name = "DIR")]
    pub cache_source: PathBuf,

    /// File whose content identifies the cache (e.g. a lockfile)
    #[arg(long, env = "CADIR_IDENTITY_FILE", value_name = "FILE")]
    pub identity_file: PathBuf,

    /// Directory where cache entries are stored
    #[arg(long, env = "CADIR_CACHE_DESTINATION", value_name = "DIR")]
    pub cache_destination: Option<PathBuf>,

    /// Working directory the setup and finalize commands run in
    /// (defaults to the current directory)
    #[arg(long, env = "CADIR_COMMAND_WORKING_DIRECTORY", value_name = "DIR")]
    pub command_working_directory: Option<PathBuf>,

    /// Command which is run if no cache is found
    #[arg(long, env = "CADIR_SETUP", value_name = "COMMAND")]
    pub setup: String,

    /// Command which is run after the cache was copied back
    #[arg(long, env = "CADIR_FINALIZE", value_name = "COMMAND")]
    pub finalize: Option<String>,

    /// Store the cache as a tar.gz archive instead of a directory copy
    #[arg(short, long)]
    pub archive: bool,

    /// Link the cache instead of copying it
    #[arg(short, long)]
    pub link: bool,

    /// Show command output and progress (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, env = "CADIR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local .cadir.toml discovery
    #[arg(long)]
    pub no_local: bool,
}
