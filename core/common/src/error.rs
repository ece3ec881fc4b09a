//! Common error types for VaultFS.

use thiserror::Error;

/// Top-level error type for VaultFS operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Addressing string could not be parsed into a vault locator.
    #[error("Malformed locator: {0}")]
    MalformedLocator(String),

    /// A live vault instance is already registered for the root.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// No live vault instance is registered for the root.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A required permission bit is absent under an exposed POSIX view.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// The requested operation has no defined handling.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Neither this layer nor the vault filesystem collaborator implements
    /// the operation.
    #[error("Not implemented: {0}")]
    Unimplemented(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
