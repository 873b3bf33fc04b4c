//! Document store trait definition.

use crate::error::StoreResult;
use crate::query::{Filter, Projection};
use crate::write::{BulkWriteResult, UpdateResult, WriteModel};
use tsio_codec::{Document, Value};

/// A document store holding one collection of flat documents.
///
/// This is the boundary the synchronization engine talks to. Stores own
/// connection handling and persistence; callers only compose filters,
/// projections and write models.
///
/// # Invariants
///
/// - `find` returns documents in insertion order
/// - `bulk_write` applies writes in submission order; with `ordered` set it
///   stops at the first rejected write, otherwise it attempts every write
/// - Writes applied before a rejection are never rolled back
/// - Stores must be `Send + Sync`; each call is atomic on its own
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - For testing and ephemeral use
/// - [`super::FileStore`] - Directory-backed persistent store
pub trait DocumentStore: Send + Sync {
    /// Returns the projected documents matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn find(&self, filter: &Filter, projection: &Projection) -> StoreResult<Vec<Document>>;

    /// Counts documents matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn count(&self, filter: &Filter) -> StoreResult<u64>;

    /// Returns the distinct values of `field` over matching documents.
    ///
    /// Array fields contribute each element. The result is sorted under
    /// [`Value::cmp_total`].
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn distinct(&self, field: &str, filter: &Filter) -> StoreResult<Vec<Value>>;

    /// Sets `set` fields on every document matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::InvalidDocument`] if `set` has an
    /// invalid field name, or an I/O error from the store.
    fn update_many(&self, filter: &Filter, set: &Document) -> StoreResult<UpdateResult>;

    /// Applies a batch of writes as one submission.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::BulkWrite`] carrying every rejected write
    /// and the counts of the applied ones.
    fn bulk_write(&self, writes: &[WriteModel], ordered: bool) -> StoreResult<BulkWriteResult>;

    /// Deletes every document matching `filter` and returns how many.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    fn delete_many(&self, filter: &Filter) -> StoreResult<u64>;

    /// Creates an ascending index on `field` and returns its name.
    ///
    /// Creating an existing index is a no-op returning the same name.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    fn create_index(&self, field: &str) -> StoreResult<String>;
}
