//! Error types for tablediff

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while staging, merging or comparing rows
#[derive(Error, Debug)]
pub enum DiffError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to decode staging field '{field}': {reason}")]
    StagingDecode { field: String, reason: String },

    #[error("Malformed staging record in {path}: {reason}")]
    StagingRecord { path: PathBuf, reason: String },

    #[error(
        "Arity mismatch for key {key}: left row has {left} columns, right row has {right}"
    )]
    ArityMismatch {
        key: String,
        left: usize,
        right: usize,
    },

    #[error(
        "Key arity mismatch: left key {left_key} has {left} parts, right key {right_key} has {right}"
    )]
    KeyArityMismatch {
        left_key: String,
        right_key: String,
        left: usize,
        right: usize,
    },

    #[error("Cannot order an exhausted sequence")]
    EmptySequence,

    #[error("Key column '{0}' not found in header")]
    MissingKeyColumn(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for DiffError {
    fn from(err: toml::de::Error) -> Self {
        DiffError::Config(err.to_string())
    }
}

/// Result alias used throughout tablediff-core
pub type Result<T> = std::result::Result<T, DiffError>;
