use std::path::PathBuf;

use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Error during file I/O operations
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// Error during JSON serialization or deserialization
    #[error("json error: {0}")]
    SerdeJson(#[from] serde_json::Error),
    /// Error when user input fails.
    #[error("inquire error: {0}")]
    Inquire(#[from] inquire::InquireError),
    /// Error when executing Git commands
    #[error("git command failed: {0}")]
    GitCommand(String),
    /// Another process holds the lock on the global Git config
    #[error("git config is locked by another process: '{}'", .lock_path.display())]
    ConfigLocked {
        /// Lock file left next to the config file
        lock_path: PathBuf,
    },
    /// Error during input validation.
    #[error("validation error: {0}")]
    Validation(String),
    /// Error when specific account login is not found.
    #[error("account not found: '{0}'")]
    AccountNotFound(String),
    /// Error during UTF-8 conversion.
    #[error("UTF-8 error: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),
}

impl AppError {
    /// Lock file path when this error is a config lock conflict
    pub fn lock_path(&self) -> Option<&PathBuf> {
        match self {
            AppError::ConfigLocked { lock_path } => Some(lock_path),
            _ => None,
        }
    }
}
