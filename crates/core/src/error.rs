// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Workspace setup failed: {0}")]
    WorkspaceSetup(String),

    #[error("Separation error: {0}")]
    Separation(#[from] crate::port::SeparationError),

    #[error("Separator process exited with code {exit_code}")]
    ProcessFailure { exit_code: i32 },

    #[error("Publish error: {0}")]
    Publish(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
