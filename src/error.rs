//! Error types for npm-hostrules.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when loading host rules or rendering registry config.
#[derive(Error, Debug)]
pub enum Error {
    /// Host rules file not found.
    #[error("host rules file not found: {0}")]
    FileNotFound(PathBuf),

    /// Failed to read a host rules file.
    #[error("failed to read host rules file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Host rules content is not valid JSON or has the wrong shape.
    #[error("failed to parse host rules: {0}")]
    ParseJson(#[from] serde_json::Error),

    /// YAML (de)serialization failure.
    #[error("failed to process yarnrc YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Existing `.yarnrc.yml` content has an unexpected structure.
    #[error("invalid .yarnrc.yml content: {message}")]
    InvalidYarnrc { message: String },
}

/// Result type alias for npm-hostrules operations.
pub type Result<T> = std::result::Result<T, Error>;
