//! # Application Errors
//!
//! Startup failures. Per-frame conditions (stale handles, full types) are
//! handled inside the modules and never surface here.

use std::path::PathBuf;

use prototype_core::ObjectError;
use thiserror::Error;

/// Result type for application startup.
pub type AppResult<T> = Result<T, AppError>;

/// Errors that stop the application before or during initialization.
#[derive(Debug, Error)]
pub enum AppError {
    /// Config file could not be read.
    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        /// Path that was requested
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this application.
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Config parsed but holds unusable values.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A module refused to initialize.
    #[error("module {module} failed to initialize: {reason}")]
    ModuleInit {
        /// Module name
        module: &'static str,
        /// What went wrong
        reason: String,
    },

    /// Object creation failed during initialization.
    #[error(transparent)]
    Object(#[from] ObjectError),
}
