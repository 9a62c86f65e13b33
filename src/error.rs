//! Error types for cadir
//!
//! All modules use `CadirResult<T>` as their return type. Every variant maps
//! to a stable process exit status through [`CadirError::exit_code`], so a
//! calling script can tell exactly which stage failed.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cadir operations
pub type CadirResult<T> = Result<T, CadirError>;

/// Process exit statuses, stable across releases
pub mod exit_status {
    pub const OK: u8 = 0;
    pub const ARGUMENT_PARSING: u8 = 1;
    pub const IDENTITY_FILE: u8 = 2;
    pub const SETUP_COMMAND: u8 = 3;
    pub const FINALIZE_COMMAND: u8 = 4;
    pub const COPY_TO_CACHE: u8 = 5;
    pub const COPY_FROM_CACHE: u8 = 6;
    pub const LINK_FROM_CACHE: u8 = 7;
    pub const CLEANING: u8 = 8;
    pub const CREATE_CACHE_DIRECTORIES: u8 = 9;
    pub const ARCHIVE: u8 = 10;
    pub const CONFIG: u8 = 11;

    /// Exit status table as printed at the end of `--help`
    pub const TABLE: &str = "\
Exit codes:
   0  Success: cache stored or restored
   1  Wrong usage of arguments
   2  Identity file error (not found, no permission)
   3  Setup command failed
   4  Finalize command failed
   5  Cannot copy to cache directory
   6  Cannot copy from cache directory
   7  Cannot create link from cache
   8  Removing existing cache source failed
   9  Cannot create cache directories
  10  Archive (tar/gzip) error
  11  Invalid configuration file";
}

/// All errors that can occur in cadir
#[derive(Error, Debug)]
pub enum CadirError {
    // Argument and configuration errors
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    // Key derivation
    #[error("Cannot read identity file {path}")]
    IdentityFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Miss path
    #[error("Setup command failed: {command}, exit code: {code}")]
    SetupCommand { command: String, code: i32 },

    #[error("Failed to create cache directories {path}")]
    CreateCacheDirectories {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Copy to cache failed: {path}")]
    CopyToCache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Hit path
    #[error("Cleaning cache source {path} failed")]
    Cleaning {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Copy from cache failed: {path}")]
    CopyFromCache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot create symlink {link} -> {target}")]
    LinkFromCache {
        link: PathBuf,
        target: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Finalize command failed: {command}, exit code: {code}")]
    FinalizeCommand { command: String, code: i32 },

    // Both paths
    #[error("Archive error ({context}): {path}")]
    Archive {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Command could not be started: {command}")]
    CommandSpawn {
        command: String,
        stage: CommandStage,
        #[source]
        source: std::io::Error,
    },
}

/// Which user command was being run when spawning failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStage {
    Setup,
    Finalize,
}

impl CadirError {
    /// Create an archive error with context
    pub fn archive(
        context: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Archive {
            context,
            path: path.into(),
            source,
        }
    }

    /// Stable process exit status for this failure
    pub fn exit_code(&self) -> u8 {
        use exit_status::*;

        match self {
            Self::Arguments(_) => ARGUMENT_PARSING,
            Self::ConfigInvalid { .. } => CONFIG,
            Self::IdentityFile { .. } => IDENTITY_FILE,
            Self::SetupCommand { .. } => SETUP_COMMAND,
            Self::CreateCacheDirectories { .. } => CREATE_CACHE_DIRECTORIES,
            Self::CopyToCache { .. } => COPY_TO_CACHE,
            Self::Cleaning { .. } => CLEANING,
            Self::CopyFromCache { .. } => COPY_FROM_CACHE,
            Self::LinkFromCache { .. } => LINK_FROM_CACHE,
            Self::FinalizeCommand { .. } => FINALIZE_COMMAND,
            Self::Archive { .. } => ARCHIVE,
            Self::CommandSpawn { stage, .. } => match stage {
                CommandStage::Setup => SETUP_COMMAND,
                CommandStage::Finalize => FINALIZE_COMMAND,
            },
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Arguments(_) => Some("Run: cadir --help"),
            Self::IdentityFile { .. } => Some("Check that --identity-file points to a readable file"),
            Self::SetupCommand { .. } | Self::FinalizeCommand { .. } => {
                Some("Re-run with -v to see the command output")
            }
            Self::CommandSpawn { .. } => {
                Some("Check the configured shell and --command-working-directory")
            }
            _ => None,
        }
    }
}
