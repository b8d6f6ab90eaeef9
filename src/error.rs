//! Error types for urban-explore

use std::path::PathBuf;

use thiserror::Error;

use crate::profile::Profile;

#[derive(Error, Debug)]
pub enum Error {
    /// A required upstream file is absent. Fatal for the offline batch.
    #[error("Input file not found: {}", .0.display())]
    InputMissing(PathBuf),

    /// An upstream file exists but holds no records.
    #[error("Input file has no features: {}", .0.display())]
    EmptyInput(PathBuf),

    #[error("Profile '{0}' does not exist")]
    ProfileUnknown(String),

    #[error("No sets available for '{0}'")]
    NoSetsAvailable(Profile),

    #[error("No sets left for '{0}'")]
    SetsExhausted(Profile),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
