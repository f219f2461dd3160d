//! Error types for the conversion pipeline.
//!
//! Only [`BatchError`] and [`ConfigError`] reject a whole batch; [`ConvertError`]
//! is always confined to a single task and ends up as a failed outcome.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Quality must be between 1 and 100, got {0}")]
    InvalidQuality(u8),

    #[error("Worker count must be at least 1")]
    NoWorkers,

    #[error("Invalid resize format '{0}'. Use WIDTHxHEIGHT (e.g., 1920x1080).")]
    InvalidResize(String),

    #[error("Unknown source format '{0}'")]
    UnknownFormat(String),

    #[error(transparent)]
    UnsafeDeleteTarget(#[from] shared_utils::UnsafeTarget),
}

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Directory '{}' does not exist.", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),

    #[error("Failed to prepare output directory '{}': {source}", path.display())]
    OutputDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to resolve directory '{}': {source}", path.display())]
    Resolve {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to start worker pool: {0}")]
    WorkerPool(String),
}

impl From<shared_utils::DiscoveryError> for BatchError {
    fn from(e: shared_utils::DiscoveryError) -> Self {
        match e {
            shared_utils::DiscoveryError::DirectoryNotFound(path) => {
                BatchError::DirectoryNotFound(path)
            }
            shared_utils::DiscoveryError::Resolve { path, source } => {
                BatchError::Resolve { path, source }
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Cannot read source '{}': {reason}", path.display())]
    UnreadableSource { path: PathBuf, reason: String },

    #[error("Failed to decode '{}': {reason}", path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("JPEG encoding failed: {0}")]
    Encode(#[from] jpeg_encoder::EncodingError),

    #[error("{width}x{height} exceeds the JPEG size limit of 65535x65535")]
    DimensionsTooLarge { width: u32, height: u32 },

    #[error("Failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to copy timestamps onto '{}': {source}", path.display())]
    Timestamps {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Worker panicked: {0}")]
    Panicked(String),
}

pub type Result<T> = std::result::Result<T, ConvertError>;
