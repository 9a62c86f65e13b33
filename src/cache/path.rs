//! Cache entry path resolution
//!
//! On-disk layout is one entry per distinct identity file content:
//!
//! ```text
//! <cache-root>/<key>          directory entry (copy and link mode)
//! <cache-root>/<key>.tar.gz   archive entry (archive mode)
//! ```

use crate::cache::key::CacheKey;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

/// Suffix appended to the entry path in archive mode
pub const ARCHIVE_EXTENSION: &str = ".tar.gz";

/// Location of a cache entry for one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntryPath {
    path: PathBuf,
    archive: bool,
}

impl CacheEntryPath {
    /// Resolve the entry path for `key` under `cache_root`
    ///
    /// Pure: no filesystem access. A trailing separator on `cache_root`
    /// makes no difference.
    pub fn resolve(cache_root: &Path, key: &CacheKey, archive: bool) -> Self {
        let mut name = OsString::from(key.as_str());
        if archive {
            name.push(ARCHIVE_EXTENSION);
        }

        Self {
            path: cache_root.join(name),
            archive,
        }
    }

    pub fn as_path(&self) -> &Path {
        &self.path
    }

    /// Whether this entry is a single archive file rather than a directory
    pub fn is_archive(&self) -> bool {
        self.archive
    }

    /// Entry is present: the hit/miss oracle
    ///
    /// Directory entries must be directories and archive entries must be
    /// files; anything else at the path counts as a miss.
    pub fn exists(&self) -> bool {
        if self.archive {
            self.path.is_file()
        } else {
            self.path.is_dir()
        }
    }

    /// Target for a symlink to this entry
    ///
    /// Relative entry paths are anchored at `base` so the link resolves no
    /// matter where it is followed from.
    pub fn link_target(&self, base: &Path) -> PathBuf {
        if self.path.is_absolute() {
            self.path.clone()
        } else {
            base.join(&self.path)
        }
    }
}

impl AsRef<Path> for CacheEntryPath {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for CacheEntryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}
