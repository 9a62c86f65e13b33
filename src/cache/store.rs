//! Cache store: decide hit or miss, then store or restore
//!
//! Driven once per invocation:
//!
//! ```text
//! Miss: setup command -> copy or archive cache source into the entry
//! Hit:  remove cache source -> link | extract | copy (+ finalize)
//! ```
//!
//! New entries are written under a `.partial` name and renamed into place,
//! so an interrupted store never leaves something that looks like a hit.

use crate::archive;
use crate::cache::key::CacheKey;
use crate::cache::options::CacheOptions;
use crate::cache::path::CacheEntryPath;
use crate::cache::tree;
use crate::command::CommandRunner;
use crate::error::{CadirError, CadirResult, CommandStage};
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Suffix of an entry that is still being written
const STAGING_SUFFIX: &str = ".partial";

/// Result of the existence check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// Entry exists and will be restored
    Hit,
    /// No entry; the setup command will regenerate it
    Miss,
}

impl fmt::Display for CacheState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hit => write!(f, "hit"),
            Self::Miss => write!(f, "miss"),
        }
    }
}

/// How a hit was materialized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreStrategy {
    Copy,
    Link,
    Extract,
}

impl fmt::Display for RestoreStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Copy => write!(f, "copy"),
            Self::Link => write!(f, "link"),
            Self::Extract => write!(f, "extract"),
        }
    }
}

/// What a successful run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Miss: setup ran and the cache source was stored
    Stored { entry: PathBuf },
    /// Hit: the cache source was restored from the entry
    Restored {
        entry: PathBuf,
        strategy: RestoreStrategy,
    },
}

/// Stores and restores one cache entry
pub struct CacheStore<'a> {
    options: &'a CacheOptions,
    entry: CacheEntryPath,
    cache_source: PathBuf,
    runner: CommandRunner,
}

impl<'a> CacheStore<'a> {
    pub fn new(options: &'a CacheOptions, key: &CacheKey) -> Self {
        let entry = CacheEntryPath::resolve(&options.cache_root, key, options.archive);
        let cache_source = options.invocation_dir.join(&options.cache_source);

        Self {
            options,
            entry,
            cache_source,
            runner: options.runner(),
        }
    }

    pub fn entry(&self) -> &CacheEntryPath {
        &self.entry
    }

    /// Hit or miss, judged purely by existence of the entry
    pub fn state(&self) -> CacheState {
        if self.entry.exists() {
            CacheState::Hit
        } else {
            CacheState::Miss
        }
    }

    /// Check the cache and store or restore accordingly
    pub async fn run(&self) -> CadirResult<Outcome> {
        let state = self.state();
        debug!("Cache {} for {}", state, self.entry);

        match state {
            CacheState::Miss => {
                info!("No cache exists at {}", self.entry);
                self.store().await
            }
            CacheState::Hit => {
                info!("Cache found at {}", self.entry);
                self.restore().await
            }
        }
    }

    // -- miss path --

    async fn store(&self) -> CadirResult<Outcome> {
        self.run_command(&self.options.setup_command, CommandStage::Setup)
            .await?;

        self.ensure_cache_root()?;

        if self.entry.is_archive() {
            self.store_archive().await?;
        } else {
            self.store_copy().await?;
        }

        Ok(Outcome::Stored {
            entry: self.entry.as_path().to_path_buf(),
        })
    }

    fn ensure_cache_root(&self) -> CadirResult<()> {
        let root = &self.options.cache_root;
        debug!("Create cache directory: {}", root.display());

        fs::create_dir_all(root).map_err(|e| CadirError::CreateCacheDirectories {
            path: root.clone(),
            source: e,
        })
    }

    async fn store_archive(&self) -> CadirResult<()> {
        let entry = self.entry.as_path().to_path_buf();
        let staging = self.staging_path();
        let source_root = self.source_root()?;

        info!(
            "Archive {} to {}",
            self.cache_source.display(),
            entry.display()
        );

        let source = self.cache_source.clone();
        let files = blocking(move || tree::collect_entries(&source))
            .await
            .map_err(|e| CadirError::archive("reading cache source", &self.cache_source, e))?;
        for file in &files {
            debug!("add: {}", file.display());
        }

        tree::remove_path(&staging).map_err(|e| {
            CadirError::archive("removing stale partial archive", &staging, e)
        })?;
        let target = staging.clone();
        tokio::task::spawn_blocking(move || archive::write_archive(&source_root, &files, &target))
            .await
            .map_err(|e| CadirError::archive("archive task", &entry, io::Error::other(e)))??;

        fs::rename(&staging, &entry)
            .map_err(|e| CadirError::archive("moving archive into place", &entry, e))
    }

    async fn store_copy(&self) -> CadirResult<()> {
        let entry = self.entry.as_path().to_path_buf();
        let staging = self.staging_path();

        if fs::symlink_metadata(&entry).is_ok() {
            return Err(CadirError::CreateCacheDirectories {
                path: entry,
                source: io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    "a non-directory is in the way of the cache entry",
                ),
            });
        }

        tree::remove_path(&staging).map_err(|e| CadirError::CreateCacheDirectories {
            path: staging.clone(),
            source: e,
        })?;
        debug!("Create cache directory: {}", staging.display());
        fs::create_dir(&staging).map_err(|e| CadirError::CreateCacheDirectories {
            path: staging.clone(),
            source: e,
        })?;

        info!(
            "Copy data from {} to {}",
            self.cache_source.display(),
            entry.display()
        );
        let source = self.cache_source.clone();
        let target = staging.clone();
        blocking(move || tree::copy_tree(&source, &target))
            .await
            .map_err(|e| CadirError::CopyToCache {
                path: self.cache_source.clone(),
                source: e,
            })?;

        fs::rename(&staging, &entry).map_err(|e| CadirError::CopyToCache {
            path: entry.clone(),
            source: e,
        })
    }

    // -- hit path --

    async fn restore(&self) -> CadirResult<Outcome> {
        self.clean_cache_source().await?;

        let strategy = if self.options.link {
            if self.entry.is_archive() {
                warn!(
                    "Link and archive both set; linking to archive file {}",
                    self.entry
                );
            }
            self.restore_link()?;
            RestoreStrategy::Link
        } else if self.entry.is_archive() {
            self.restore_archive().await?;
            RestoreStrategy::Extract
        } else {
            self.restore_copy().await?;
            RestoreStrategy::Copy
        };

        Ok(Outcome::Restored {
            entry: self.entry.as_path().to_path_buf(),
            strategy,
        })
    }

    async fn clean_cache_source(&self) -> CadirResult<()> {
        if fs::symlink_metadata(&self.cache_source).is_err() {
            return Ok(());
        }

        debug!("Removing existing {}", self.cache_source.display());
        let source = self.cache_source.clone();
        blocking(move || tree::remove_path(&source))
            .await
            .map_err(|e| CadirError::Cleaning {
                path: self.cache_source.clone(),
                source: e,
            })
    }

    fn restore_link(&self) -> CadirResult<()> {
        let target = self.entry.link_target(&self.options.invocation_dir);
        info!(
            "Create link from {} to {}",
            target.display(),
            self.cache_source.display()
        );

        tree::create_symlink(&target, &self.cache_source).map_err(|e| {
            CadirError::LinkFromCache {
                link: self.cache_source.clone(),
                target: target.clone(),
                source: e,
            }
        })?;

        mark_used(&self.cache_source);
        Ok(())
    }

    async fn restore_archive(&self) -> CadirResult<()> {
        let entry = self.entry.as_path().to_path_buf();
        let destination = self.source_root()?;
        info!(
            "Extract data from {} to {}",
            entry.display(),
            self.cache_source.display()
        );

        let archive_path = entry.clone();
        tokio::task::spawn_blocking(move || archive::extract_archive(&archive_path, &destination))
            .await
            .map_err(|e| CadirError::archive("extract task", &entry, io::Error::other(e)))??;

        if self.options.finalize().is_some() {
            debug!("Finalize command skipped after archive extraction");
        }
        mark_used(&entry);
        Ok(())
    }

    async fn restore_copy(&self) -> CadirResult<()> {
        let entry = self.entry.as_path().to_path_buf();
        info!(
            "Copy data from {} to {}",
            entry.display(),
            self.cache_source.display()
        );

        let target = self.cache_source.clone();
        blocking(move || tree::copy_tree(&entry, &target))
            .await
            .map_err(|e| CadirError::CopyFromCache {
                path: self.entry.as_path().to_path_buf(),
                source: e,
            })?;
        mark_used(&self.cache_source);

        if let Some(finalize) = self.options.finalize() {
            self.run_command(finalize, CommandStage::Finalize).await?;
        }
        Ok(())
    }

    // -- helpers --

    async fn run_command(&self, command: &str, stage: CommandStage) -> CadirResult<()> {
        let working_dir = &self.options.command_working_directory;
        info!("Execute: {} (in {})", command, working_dir.display());

        let code = self
            .runner
            .run(command, working_dir)
            .await
            .map_err(|e| CadirError::CommandSpawn {
                command: command.to_string(),
                stage,
                source: e,
            })?;

        if code == 0 {
            return Ok(());
        }

        let command = command.to_string();
        Err(match stage {
            CommandStage::Setup => CadirError::SetupCommand { command, code },
            CommandStage::Finalize => CadirError::FinalizeCommand { command, code },
        })
    }

    /// Directory the archive's entry names are relative to
    fn source_root(&self) -> CadirResult<PathBuf> {
        self.cache_source
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| {
                CadirError::archive(
                    "cache source has no parent directory",
                    &self.cache_source,
                    io::Error::new(io::ErrorKind::InvalidInput, "cannot archive a root"),
                )
            })
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = OsString::from(self.entry.as_path().as_os_str());
        name.push(STAGING_SUFFIX);
        PathBuf::from(name)
    }
}

/// Record last use of `path`; failures are only logged
fn mark_used(path: &Path) {
    if let Err(e) = tree::mark_used(path) {
        warn!("Could not update access time of {}: {}", path.display(), e);
    }
}

/// Run blocking filesystem work off the async runtime and wait for it
async fn blocking<T, F>(f: F) -> io::Result<T>
where
    F: FnOnce() -> io::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(io::Error::other)?
}
