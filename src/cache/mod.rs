//! Content-addressed directory cache
//!
//! A cache entry is keyed by the hash of an identity file (usually a
//! lockfile). Same identity file = same entry.
//!
//! # Cache States
//!
//! | State | Action |
//! |-------|--------|
//! | Miss | run setup command, then copy or archive the cache source |
//! | Hit | replace the cache source by a copy of, link to, or extraction of the entry |
//!
//! Entries are never modified or evicted once written.

pub mod key;
pub mod options;
pub mod path;
pub mod store;
pub mod tree;

pub use key::CacheKey;
pub use options::CacheOptions;
pub use path::{CacheEntryPath, ARCHIVE_EXTENSION};
pub use store::{CacheState, CacheStore, Outcome, RestoreStrategy};
