//! A store wrapper that records what it is asked to do.

use parking_lot::Mutex;
use tsio_codec::{Document, Value};
use tsio_core::constants::TS_NAME;
use tsio_store::{
    lookup, BulkWriteResult, DocumentStore, Filter, Projection, StoreResult, UpdateResult,
    WriteModel,
};

/// One bulk submission seen by a [`RecordingStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// `TS_NAME` of every write, in submission order.
    pub names: Vec<String>,
    /// Whether the submission was ordered.
    pub ordered: bool,
}

impl Submission {
    /// Number of writes in the submission.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if the submission held no writes.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Wraps a store and records every bulk submission and query.
///
/// All calls are forwarded unchanged.
pub struct RecordingStore<S> {
    inner: S,
    submissions: Mutex<Vec<Submission>>,
    finds: Mutex<Vec<Filter>>,
}

impl<S: DocumentStore> RecordingStore<S> {
    /// Wraps `inner`.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            submissions: Mutex::new(Vec::new()),
            finds: Mutex::new(Vec::new()),
        }
    }

    /// Returns the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Returns every bulk submission so far.
    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().clone()
    }

    /// Returns the size of every bulk submission so far.
    pub fn submission_sizes(&self) -> Vec<usize> {
        self.submissions.lock().iter().map(Submission::len).collect()
    }

    /// Returns every `TS_NAME` submitted so far, across submissions.
    pub fn submitted_names(&self) -> Vec<String> {
        self.submissions
            .lock()
            .iter()
            .flat_map(|s| s.names.iter().cloned())
            .collect()
    }

    /// Returns the filter of every find so far.
    pub fn finds(&self) -> Vec<Filter> {
        self.finds.lock().clone()
    }

    /// Forgets everything recorded.
    pub fn reset(&self) {
        self.submissions.lock().clear();
        self.finds.lock().clear();
    }
}

impl<S: DocumentStore> DocumentStore for RecordingStore<S> {
    fn find(&self, filter: &Filter, projection: &Projection) -> StoreResult<Vec<Document>> {
        self.finds.lock().push(filter.clone());
        self.inner.find(filter, projection)
    }

    fn count(&self, filter: &Filter) -> StoreResult<u64> {
        self.inner.count(filter)
    }

    fn distinct(&self, field: &str, filter: &Filter) -> StoreResult<Vec<Value>> {
        self.inner.distinct(field, filter)
    }

    fn update_many(&self, filter: &Filter, set: &Document) -> StoreResult<UpdateResult> {
        self.inner.update_many(filter, set)
    }

    fn bulk_write(&self, writes: &[WriteModel], ordered: bool) -> StoreResult<BulkWriteResult> {
        let names = writes
            .iter()
            .map(|write| {
                lookup(&write.set, TS_NAME)
                    .and_then(Value::as_text)
                    .unwrap_or_default()
                    .to_string()
            })
            .collect();
        self.submissions.lock().push(Submission { names, ordered });
        self.inner.bulk_write(writes, ordered)
    }

    fn delete_many(&self, filter: &Filter) -> StoreResult<u64> {
        self.inner.delete_many(filter)
    }

    fn create_index(&self, field: &str) -> StoreResult<String> {
        self.inner.create_index(field)
    }
}
