//! Identity file hashing for content-addressed caching
//!
//! The cache key is derived from the raw bytes of the identity file
//! (typically a lockfile). Same bytes = same key; nothing is normalized.

use crate::error::{CadirError, CadirResult};
use md5::{Digest, Md5};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Hex digest of an identity file's contents
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Hash an identity file's contents, returning the 32 hex chars of its
    /// MD5 digest (the layout existing cache directories use)
    pub fn from_identity_file(path: &Path) -> CadirResult<Self> {
        let contents = fs::read(path).map_err(|e| CadirError::IdentityFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        let key = Self::from_bytes(&contents);
        debug!("Identity file {} hashed to {}", path.display(), key);
        Ok(key)
    }

    /// Hash raw identity bytes
    pub fn from_bytes(contents: &[u8]) -> Self {
        let mut hasher = Md5::new();
        hasher.update(contents);
        let result = hasher.finalize();

        Self(hex::encode(result))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
