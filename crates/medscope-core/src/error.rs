//! Error types for medscope.

use thiserror::Error;

/// The main error type for medscope operations.
#[derive(Error, Debug)]
pub enum MedscopeError {
    /// Every identity code has already been handed out.
    #[error("entity registry is full ({capacity} pickable entities max)")]
    RegistryFull { capacity: usize },

    /// An entity with the given name already exists.
    #[error("entity '{0}' already exists")]
    DuplicateName(String),

    /// No entity with the given name is registered.
    #[error("entity '{0}' not found")]
    EntityNotFound(String),

    /// The identity buffer could not be read back.
    ///
    /// This is fatal for the frame; the picking layer never retries.
    #[error("identity readback failed: {0}")]
    Readback(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for medscope operations.
pub type Result<T> = std::result::Result<T, MedscopeError>;
