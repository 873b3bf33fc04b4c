//! Error types for the sync engine.

use thiserror::Error;
use tsio_store::{BulkWriteResult, StoreError, WriteError};

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// A write rejected during a bulk submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedWrite {
    /// Name of the entity whose document was rejected.
    pub name: String,
    /// The store's diagnostic.
    pub error: WriteError,
}

/// Errors that can occur during sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Document store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Entity or collection error.
    #[error("core error: {0}")]
    Core(#[from] tsio_core::CoreError),

    /// One or more documents of a bulk submission were rejected.
    ///
    /// Writes applied before the rejection are not rolled back.
    #[error("bulk write failed: {} document(s) rejected", rejected.len())]
    BulkWriteFailure {
        /// The rejected writes.
        rejected: Vec<RejectedWrite>,
        /// Counts for the writes that were applied, across all submissions.
        applied: BulkWriteResult,
    },

    /// The operation is not supported.
    #[error("{operation} is not implemented")]
    NotImplemented {
        /// Name of the operation.
        operation: String,
    },

    /// An external source failed.
    #[error("external source {source_index} failed: {message}")]
    External {
        /// Registration index of the source.
        source_index: usize,
        /// Error message.
        message: String,
    },
}

impl SyncError {
    /// Creates a not implemented error.
    pub fn not_implemented(operation: impl Into<String>) -> Self {
        Self::NotImplemented {
            operation: operation.into(),
        }
    }

    /// Creates an external source error.
    pub fn external(source_index: usize, message: impl Into<String>) -> Self {
        Self::External {
            source_index,
            message: message.into(),
        }
    }

    /// Returns the rejected writes if this is a bulk write failure.
    pub fn rejected(&self) -> &[RejectedWrite] {
        match self {
            SyncError::BulkWriteFailure { rejected, .. } => rejected,
            _ => &[],
        }
    }
}
