//! cadir - content-addressed directory cache for CI
//!
//! Restores an expensive-to-build directory (installed dependencies, build
//! output) from a cache keyed by the hash of an identity file, or runs a
//! setup command and stores the result when no cache exists yet.

pub mod archive;
pub mod cache;
pub mod cli;
pub mod command;
pub mod config;
pub mod error;

pub use error::{CadirError, CadirResult};
