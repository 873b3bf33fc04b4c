//! Error types for store operations.

use crate::write::{BulkWriteResult, WriteError};
use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A snapshot could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] tsio_codec::CodecError),

    /// A document or update was rejected as a whole.
    #[error("invalid document: {message}")]
    InvalidDocument {
        /// Why the document was rejected.
        message: String,
    },

    /// One or more writes of a bulk submission were rejected.
    ///
    /// Writes applied before (or, for unordered submissions, around) the
    /// rejected ones stay applied.
    #[error("bulk write rejected {} write(s)", errors.len())]
    BulkWrite {
        /// The rejected writes.
        errors: Vec<WriteError>,
        /// Counts for the writes that were applied.
        result: BulkWriteResult,
    },

    /// Another process holds the store directory.
    #[error("store locked: another process has exclusive access")]
    Locked,

    /// The on-disk snapshot is unreadable.
    #[error("store corrupted: {0}")]
    Corrupted(String),
}

impl StoreError {
    /// Creates an invalid document error.
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            message: message.into(),
        }
    }
}
