//! In-memory document store.

use crate::error::{StoreError, StoreResult};
use crate::query::{lookup, Filter, Projection};
use crate::store::DocumentStore;
use crate::write::{
    invalid_field_name, BulkWriteResult, UpdateResult, WriteError, WriteErrorKind, WriteModel,
};
use parking_lot::RwLock;
use std::collections::BTreeSet;
use tsio_codec::{Document, Value, ID_FIELD};
use uuid::Uuid;

/// An in-memory document store.
///
/// This store keeps every document in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral working sets that don't need persistence
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across threads. Every call
/// holds the document lock for its whole duration.
///
/// # Example
///
/// ```rust
/// use tsio_codec::{Document, Value};
/// use tsio_store::{DocumentStore, Filter, InMemoryStore, Projection, WriteModel};
///
/// let store = InMemoryStore::new();
/// let mut set = Document::new();
/// set.insert("PRICE".into(), Value::Integer(10));
/// store
///     .bulk_write(&[WriteModel::upsert_set(Filter::eq("TS_NAME", "BOND"), set)], true)
///     .unwrap();
///
/// let found = store.find(&Filter::eq("PRICE", 10i64), &Projection::All).unwrap();
/// assert_eq!(found[0]["TS_NAME"], Value::from("BOND"));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    documents: RwLock<Vec<Document>>,
    indexes: RwLock<BTreeSet<String>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the given documents.
    ///
    /// Documents without an `_id` get one assigned.
    #[must_use]
    pub fn with_documents(documents: Vec<Document>) -> Self {
        let documents = documents
            .into_iter()
            .map(|mut doc| {
                doc.entry(ID_FIELD.to_string())
                    .or_insert_with(|| Value::Text(Uuid::new_v4().to_string()));
                doc
            })
            .collect();
        Self {
            documents: RwLock::new(documents),
            indexes: RwLock::new(BTreeSet::new()),
        }
    }

    /// Returns a copy of every stored document.
    #[must_use]
    pub fn documents(&self) -> Vec<Document> {
        self.documents.read().clone()
    }

    /// Returns the names of the created indexes.
    #[must_use]
    pub fn indexes(&self) -> Vec<String> {
        self.indexes.read().iter().cloned().collect()
    }

    /// Returns the number of stored documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    /// Returns true if the store holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    pub(crate) fn restore_indexes(&self, names: impl IntoIterator<Item = String>) {
        self.indexes.write().extend(names);
    }
}

/// Index name for a single ascending field.
fn index_name(field: &str) -> String {
    format!("{field}_1")
}

/// Applies `set` to `doc`, returning whether anything changed.
fn apply_set(doc: &mut Document, set: &Document) -> Result<bool, (WriteErrorKind, String)> {
    if let (Some(current), Some(requested)) = (doc.get(ID_FIELD), set.get(ID_FIELD)) {
        if !current.loose_eq(requested) {
            return Err((
                WriteErrorKind::ImmutableField,
                format!("the {ID_FIELD} field cannot be modified"),
            ));
        }
    }

    let mut changed = false;
    for (key, value) in set {
        if doc.get(key) != Some(value) {
            doc.insert(key.clone(), value.clone());
            changed = true;
        }
    }
    Ok(changed)
}

impl DocumentStore for InMemoryStore {
    fn find(&self, filter: &Filter, projection: &Projection) -> StoreResult<Vec<Document>> {
        Ok(self
            .documents
            .read()
            .iter()
            .filter(|doc| filter.matches(doc))
            .map(|doc| projection.apply(doc))
            .collect())
    }

    fn count(&self, filter: &Filter) -> StoreResult<u64> {
        Ok(self
            .documents
            .read()
            .iter()
            .filter(|doc| filter.matches(doc))
            .count() as u64)
    }

    fn distinct(&self, field: &str, filter: &Filter) -> StoreResult<Vec<Value>> {
        let documents = self.documents.read();
        let mut values: Vec<Value> = Vec::new();

        for doc in documents.iter().filter(|doc| filter.matches(doc)) {
            match lookup(doc, field) {
                Some(Value::Array(items)) => values.extend(items.iter().cloned()),
                Some(value) => values.push(value.clone()),
                None => {}
            }
        }

        values.sort_by(Value::cmp_total);
        values.dedup_by(|a, b| a.loose_eq(b));
        Ok(values)
    }

    fn update_many(&self, filter: &Filter, set: &Document) -> StoreResult<UpdateResult> {
        if let Some(problem) = invalid_field_name(set) {
            return Err(StoreError::invalid_document(problem));
        }

        let mut documents = self.documents.write();
        let mut result = UpdateResult::default();

        for doc in documents.iter_mut().filter(|doc| filter.matches(doc)) {
            result.matched += 1;
            match apply_set(doc, set) {
                Ok(true) => result.modified += 1,
                Ok(false) => {}
                Err((_, message)) => return Err(StoreError::invalid_document(message)),
            }
        }

        Ok(result)
    }

    fn bulk_write(&self, writes: &[WriteModel], ordered: bool) -> StoreResult<BulkWriteResult> {
        let mut documents = self.documents.write();
        let mut result = BulkWriteResult::default();
        let mut errors = Vec::new();

        for (index, write) in writes.iter().enumerate() {
            let outcome = match invalid_field_name(&write.set) {
                Some(problem) => Err((WriteErrorKind::InvalidFieldName, problem)),
                None => match documents.iter_mut().find(|doc| write.filter.matches(doc)) {
                    Some(existing) => apply_set(existing, &write.set).map(|changed| {
                        result.matched += 1;
                        if changed {
                            result.modified += 1;
                        }
                    }),
                    None if write.upsert => {
                        let mut inserted = write.filter.equality_fields();
                        inserted.extend(write.set.iter().map(|(k, v)| (k.clone(), v.clone())));
                        inserted
                            .entry(ID_FIELD.to_string())
                            .or_insert_with(|| Value::Text(Uuid::new_v4().to_string()));
                        documents.push(inserted);
                        result.upserted += 1;
                        Ok(())
                    }
                    None => Ok(()),
                },
            };

            if let Err((kind, message)) = outcome {
                errors.push(WriteError {
                    index,
                    kind,
                    message,
                });
                if ordered {
                    break;
                }
            }
        }

        if errors.is_empty() {
            Ok(result)
        } else {
            Err(StoreError::BulkWrite { errors, result })
        }
    }

    fn delete_many(&self, filter: &Filter) -> StoreResult<u64> {
        let mut documents = self.documents.write();
        let before = documents.len();
        documents.retain(|doc| !filter.matches(doc));
        Ok((before - documents.len()) as u64)
    }

    fn create_index(&self, field: &str) -> StoreResult<String> {
        let name = index_name(field);
        self.indexes.write().insert(name.clone());
        Ok(name)
    }
}
