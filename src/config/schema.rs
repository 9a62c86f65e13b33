//! Configuration file schema for cadir
//!
//! Global configuration lives at `~/.config/cadir/config.toml`; a project
//! can add a `.cadir.toml` next to its sources. Every key is optional and
//! command-line flags always win.
//!
//! ```toml
//! [general]
//! verbose = true
//!
//! [cache]
//! destination = "/var/cache/cadir"
//! archive = true
//! link = false
//!
//! [command]
//! shell = "bash"
//! working_directory = "frontend"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache location and storage mode
    pub cache: CacheConfig,

    /// Setup/finalize command execution
    pub command: CommandConfig,
}

/// General application settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Stream command output and log progress
    pub verbose: Option<bool>,
}

/// Cache settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory holding cache entries
    pub destination: Option<PathBuf>,

    /// Store entries as tar.gz archives
    pub archive: Option<bool>,

    /// Restore by symlink instead of copy
    pub link: Option<bool>,
}

/// Command execution settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandConfig {
    /// Shell used to run setup and finalize commands
    pub shell: Option<String>,

    /// Working directory for setup and finalize commands
    pub working_directory: Option<PathBuf>,
}

impl Config {
    /// Overlay `other` on top of `self`; keys set in `other` win
    pub fn merge(self, other: Config) -> Config {
        Config {
            general: GeneralConfig {
                verbose: other.general.verbose.or(self.general.verbose),
            },
            cache: CacheConfig {
                destination: other.cache.destination.or(self.cache.destination),
                archive: other.cache.archive.or(self.cache.archive),
                link: other.cache.link.or(self.cache.link),
            },
            command: CommandConfig {
                shell: other.command.shell.or(self.command.shell),
                working_directory: other
                    .command
                    .working_directory
                    .or(self.command.working_directory),
            },
        }
    }

    /// Anchor relative paths at `base` (the directory of the config file)
    pub fn resolve_paths(mut self, base: &Path) -> Config {
        self.cache.destination = self.cache.destination.map(|p| base.join(p));
        self.command.working_directory = self.command.working_directory.map(|p| base.join(p));
        self
    }
}
