// ABOUTME: Application-wide error types for image-sync.
// ABOUTME: Uses thiserror for ergonomic error handling.

use crate::purge::PurgeError;
use crate::runtime::RuntimeError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("nothing to purge: give image names, --id or --dangling")]
    NoPurgeTarget,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("purge failed: {0}")]
    Purge(#[from] PurgeError),
}

pub type Result<T> = std::result::Result<T, Error>;
