//! Error types shared across the library.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while building, rendering or persisting the outline view.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("file watcher error: {0}")]
    Watch(#[from] notify::Error),
    #[error("transform failed: {0}")]
    Transform(String),
    #[error("render failed: {0}")]
    Render(String),
    #[error("invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
    #[error("could not determine config directory")]
    NoConfigDir,
}

pub type Result<T> = std::result::Result<T, Error>;
