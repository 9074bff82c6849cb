use thiserror::Error;

use crate::migration::{Direction, Version};

/// Core error type for shift operations.
#[derive(Error, Debug)]
pub enum ShiftError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Bad migration file: {file_name}")]
    BadMigrationFile { file_name: String },

    #[error("Duplicate {direction} migration for version {version}")]
    DuplicateMigration {
        version: Version,
        direction: Direction,
    },

    #[error("Migration {migration} failed: {message}")]
    Execution { migration: String, message: String },

    #[error("Migration {migration} was executed but its checkpoint could not be written: {message}")]
    Checkpoint { migration: String, message: String },

    #[error("Migration {0} is disabled from options")]
    Disabled(&'static str),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),
}

impl From<serde_json::Error> for ShiftError {
    fn from(e: serde_json::Error) -> Self {
        ShiftError::Serialization(e.to_string())
    }
}

/// Result type alias using ShiftError.
pub type Result<T> = std::result::Result<T, ShiftError>;
