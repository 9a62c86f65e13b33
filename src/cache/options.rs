//! Resolved options for one cache invocation

use crate::command::{CommandRunner, OutputMode, DEFAULT_SHELL};
use std::path::PathBuf;

/// Everything the cache store needs, fixed before the run starts
///
/// Built once by the driver from CLI arguments and config files, then only
/// ever borrowed.
#[derive(Debug, Clone)]
pub struct CacheOptions {
    /// File whose bytes determine the cache key
    pub identity_file: PathBuf,

    /// Directory being cached (e.g. `node_modules`)
    pub cache_source: PathBuf,

    /// Directory holding all cache entries
    pub cache_root: PathBuf,

    /// Command that regenerates the cache source on a miss
    pub setup_command: String,

    /// Command run after a plain-copy restore
    pub finalize_command: Option<String>,

    /// Working directory for setup and finalize commands
    pub command_working_directory: PathBuf,

    /// Store entries as `.tar.gz` archives
    pub archive: bool,

    /// Restore by symlinking to the entry instead of copying
    pub link: bool,

    /// Child process output handling
    pub output: OutputMode,

    /// Shell used to run commands
    pub shell: String,

    /// Working directory of the process when it started; relative paths
    /// are anchored here
    pub invocation_dir: PathBuf,
}

impl CacheOptions {
    /// Options with the required fields set and everything else defaulted
    pub fn new(
        identity_file: impl Into<PathBuf>,
        cache_source: impl Into<PathBuf>,
        cache_root: impl Into<PathBuf>,
        setup_command: impl Into<String>,
        invocation_dir: impl Into<PathBuf>,
    ) -> Self {
        let invocation_dir = invocation_dir.into();
        Self {
            identity_file: identity_file.into(),
            cache_source: cache_source.into(),
            cache_root: cache_root.into(),
            setup_command: setup_command.into(),
            finalize_command: None,
            command_working_directory: invocation_dir.clone(),
            archive: false,
            link: false,
            output: OutputMode::Quiet,
            shell: DEFAULT_SHELL.to_string(),
            invocation_dir,
        }
    }

    /// Runner configured with this invocation's shell and output mode
    pub fn runner(&self) -> CommandRunner {
        CommandRunner::new(self.shell.clone(), self.output)
    }

    /// Finalize command, if one was given and is not blank
    pub fn finalize(&self) -> Option<&str> {
        self.finalize_command
            .as_deref()
            .filter(|c| !c.trim().is_empty())
    }
}
