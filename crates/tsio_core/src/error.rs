//! Error types for tsio core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An input had a shape that cannot build an entity or collection.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the rejected input.
        message: String,
    },

    /// No entity with this name is in the collection.
    #[error("entity not found: {name}")]
    NotFound {
        /// The name that was looked up.
        name: String,
    },

    /// A position is past the end of the collection.
    #[error("index {index} out of range for collection of length {len}")]
    IndexOutOfRange {
        /// The requested position.
        index: usize,
        /// The collection length.
        len: usize,
    },

    /// A value could not be converted.
    #[error("codec error: {0}")]
    Codec(#[from] tsio_codec::CodecError),
}

impl CoreError {
    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }
}
