//! Error types for configdrive

use thiserror::Error;

/// Main error type for config drive assembly
#[derive(Error, Debug)]
pub enum ConfigDriveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Command execution failed: {0}")]
    Command(String),
}
