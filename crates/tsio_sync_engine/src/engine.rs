//! Graph-expanding reads, batched writes and removal against a store.

use crate::config::{ReadOptions, RemoveOptions, SyncConfig, WriteOptions};
use crate::error::{RejectedWrite, SyncError, SyncResult};
use chrono::Utc;
use parking_lot::RwLock;
use std::sync::Arc;
use tsio_codec::{Document, Value};
use tsio_core::constants::{COMPONENTS, LAST_USE, TS_NAME, VALUE};
use tsio_core::{
    entity_to_document, flatten, merge_document, DocumentScope, Entity, EntityCollection,
    Expansion, LevelWalk,
};
use tsio_store::{BulkWriteResult, DocumentStore, Filter, Projection, StoreError, WriteModel};

/// What a read call did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadReport {
    /// Number of depth levels queried.
    pub levels: usize,
    /// Every entity name visited, in visiting order.
    pub visited: Vec<String>,
    /// Number of store documents merged into entities.
    pub documents: usize,
}

/// What a write call did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    /// Number of bulk submissions issued.
    pub submissions: usize,
    /// Number of documents submitted.
    pub documents: usize,
    /// Store counts summed over all submissions.
    pub result: BulkWriteResult,
}

/// Result of a removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The documents were deleted.
    Deleted {
        /// Every name that was targeted.
        names: Vec<String>,
        /// Number of documents the store deleted.
        deleted: u64,
    },
    /// Confirmation was refused; nothing was deleted.
    Aborted {
        /// Every name that would have been targeted.
        names: Vec<String>,
    },
    /// There was nothing to remove.
    Nothing,
}

impl RemoveOutcome {
    /// Returns true if the removal was refused.
    pub fn is_aborted(&self) -> bool {
        matches!(self, RemoveOutcome::Aborted { .. })
    }
}

/// Running totals over the engine's lifetime.
#[derive(Debug, Clone, Default)]
pub struct EngineStats {
    /// Read calls completed.
    pub reads: u64,
    /// Write calls completed.
    pub writes: u64,
    /// Bulk submissions issued.
    pub bulk_submissions: u64,
    /// Documents submitted for writing.
    pub documents_written: u64,
    /// Documents deleted.
    pub documents_deleted: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadKind {
    Attributes,
    Values,
    Both,
}

/// Synchronizes entity graphs with a [`DocumentStore`].
///
/// Every call builds its working set from its input; nothing is cached
/// between calls. Reads merge into the entities the caller passed in, so
/// results are observed through the caller's own handles.
///
/// # Example
///
/// ```rust
/// use tsio_codec::Value;
/// use tsio_core::Entity;
/// use tsio_store::InMemoryStore;
/// use tsio_sync_engine::{ReadOptions, SyncConfig, SyncEngine, WriteOptions};
///
/// let engine = SyncEngine::new(SyncConfig::default(), InMemoryStore::new());
///
/// let bond = Entity::new("BOND");
/// bond.set_attribute("PRICE", Value::Integer(10));
/// engine.write(&bond, &WriteOptions::default()).unwrap();
///
/// let fresh = Entity::new("BOND");
/// engine.read(&fresh, &ReadOptions::default()).unwrap();
/// assert_eq!(fresh.get_attribute("PRICE"), Some(Value::Integer(10)));
/// ```
pub struct SyncEngine<S: DocumentStore> {
    config: SyncConfig,
    store: Arc<S>,
    stats: RwLock<EngineStats>,
}

impl<S: DocumentStore> SyncEngine<S> {
    /// Creates an engine owning `store`.
    pub fn new(config: SyncConfig, store: S) -> Self {
        Self::with_shared_store(config, Arc::new(store))
    }

    /// Creates an engine over a shared store.
    pub fn with_shared_store(config: SyncConfig, store: Arc<S>) -> Self {
        Self {
            config,
            store,
            stats: RwLock::new(EngineStats::default()),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Returns the store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Returns the running totals.
    pub fn stats(&self) -> EngineStats {
        self.stats.read().clone()
    }

    /// Reads attributes (not values) for the input and its components.
    ///
    /// # Errors
    ///
    /// Returns an error if a store query fails. Entities without a stored
    /// document are left untouched.
    pub fn read_attributes(
        &self,
        input: impl Into<EntityCollection>,
        options: &ReadOptions,
    ) -> SyncResult<ReadReport> {
        self.read_with(input.into(), options, ReadKind::Attributes)
    }

    /// Reads values (not attributes) for the input and its components.
    ///
    /// Components are discovered from what the entities already hold.
    ///
    /// # Errors
    ///
    /// Returns an error if a store query fails.
    pub fn read_values(
        &self,
        input: impl Into<EntityCollection>,
        options: &ReadOptions,
    ) -> SyncResult<ReadReport> {
        self.read_with(input.into(), options, ReadKind::Values)
    }

    /// Reads attributes and values for the input and its components.
    ///
    /// # Errors
    ///
    /// Returns an error if a store query fails.
    pub fn read(
        &self,
        input: impl Into<EntityCollection>,
        options: &ReadOptions,
    ) -> SyncResult<ReadReport> {
        self.read_with(input.into(), options, ReadKind::Both)
    }

    fn read_with(
        &self,
        input: EntityCollection,
        options: &ReadOptions,
        kind: ReadKind,
    ) -> SyncResult<ReadReport> {
        let projection = match (kind, &options.attributes) {
            (ReadKind::Attributes, Some(attributes)) => Projection::include(
                std::iter::once(TS_NAME.to_string()).chain(attributes.iter().map(|a| a.to_uppercase())),
            ),
            (ReadKind::Attributes, None) => Projection::exclude([VALUE]),
            (ReadKind::Values, _) => Projection::include([TS_NAME, VALUE]),
            (ReadKind::Both, _) => Projection::All,
        };

        let mut report = ReadReport::default();
        let mut walk = LevelWalk::new(&input, &options.expansion);

        while let Some(level) = walk.current() {
            let names = level.names();
            let documents = self.store.find(&name_filter(&names), &projection)?;

            let mut merged = 0;
            for doc in documents {
                let Some(name) = doc.get(TS_NAME).and_then(Value::as_text) else {
                    continue;
                };
                if let Ok(entity) = level.get(name) {
                    let entity = entity.clone();
                    merge_document(&entity, doc);
                    merged += 1;
                }
            }

            tracing::debug!(
                level = walk.level(),
                requested = names.len(),
                found = merged,
                ?kind,
                "read level"
            );
            report.documents += merged;
            report.levels += 1;
            walk.advance();
        }

        report.visited = walk.visited().names();
        self.touch(&report.visited)?;
        self.stats.write().reads += 1;
        Ok(report)
    }

    /// Stamps `LAST_USE` on every named document in one update.
    fn touch(&self, names: &[String]) -> SyncResult<()> {
        if !self.config.touch_last_use || names.is_empty() {
            return Ok(());
        }
        let mut set = Document::new();
        set.insert(LAST_USE.to_string(), Value::Timestamp(Utc::now()));
        let touched = self.store.update_many(&name_filter(names), &set)?;
        tracing::trace!(touched = touched.matched, "stamped {LAST_USE}");
        Ok(())
    }

    /// Writes attributes (never values) of the input and its components.
    ///
    /// # Errors
    ///
    /// Returns `BulkWriteFailure` if the store rejects any document, or a
    /// store error.
    pub fn write_attributes(
        &self,
        input: impl Into<EntityCollection>,
        options: &WriteOptions,
    ) -> SyncResult<WriteReport> {
        self.write_with(input.into(), options, DocumentScope::Attributes)
    }

    /// Writes attributes and values of the input and its components.
    ///
    /// # Errors
    ///
    /// Returns `BulkWriteFailure` if the store rejects any document, or a
    /// store error.
    pub fn write(
        &self,
        input: impl Into<EntityCollection>,
        options: &WriteOptions,
    ) -> SyncResult<WriteReport> {
        self.write_with(input.into(), options, DocumentScope::Full)
    }

    fn write_with(
        &self,
        input: EntityCollection,
        options: &WriteOptions,
        scope: DocumentScope,
    ) -> SyncResult<WriteReport> {
        let mut report = WriteReport::default();
        let mut pending = input;

        // Inputs at or above the batch ceiling go out chunk by chunk.
        let chunk = self.config.chunk_size();
        while pending.len() >= self.config.max_batch_size && pending.len() > chunk {
            let head = pending.slice(..chunk)?;
            let rest = pending.slice(chunk..)?;
            tracing::debug!(
                total = pending.len(),
                chunk = head.len(),
                remaining = rest.len(),
                "splitting oversized write"
            );
            self.submit(&head, &options.expansion, scope, &mut report)?;
            pending = rest.into_owned();
        }
        self.submit(&pending, &options.expansion, scope, &mut report)?;

        self.stats.write().writes += 1;
        Ok(report)
    }

    fn submit(
        &self,
        chunk: &EntityCollection,
        expansion: &Expansion,
        scope: DocumentScope,
        report: &mut WriteReport,
    ) -> SyncResult<()> {
        let entities = flatten(chunk, expansion);
        if entities.is_empty() {
            return Ok(());
        }

        let writes: Vec<WriteModel> = entities
            .iter()
            .map(|entity| {
                WriteModel::upsert_set(
                    Filter::eq(TS_NAME, entity.name()),
                    entity_to_document(entity, scope),
                )
            })
            .collect();

        report.submissions += 1;
        report.documents += writes.len();
        {
            let mut stats = self.stats.write();
            stats.bulk_submissions += 1;
            stats.documents_written += writes.len() as u64;
        }

        tracing::info!(
            collection = %self.config.collection,
            documents = writes.len(),
            ?scope,
            "submitting bulk write"
        );

        match self.store.bulk_write(&writes, self.config.ordered_writes) {
            Ok(result) => {
                report.result.absorb(&result);
                Ok(())
            }
            Err(StoreError::BulkWrite { errors, result }) => {
                report.result.absorb(&result);
                let rejected: Vec<RejectedWrite> = errors
                    .into_iter()
                    .map(|error| RejectedWrite {
                        name: entities
                            .get_index(error.index)
                            .map(|e| e.name().to_string())
                            .unwrap_or_default(),
                        error,
                    })
                    .collect();
                tracing::warn!(rejected = rejected.len(), "bulk write partially failed");
                Err(SyncError::BulkWriteFailure {
                    rejected,
                    applied: report.result.clone(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Removes the input (and, if the options say so, its components).
    ///
    /// Nothing is deleted unless `options.confirmed` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the store delete fails.
    pub fn remove(
        &self,
        input: impl Into<EntityCollection>,
        options: &RemoveOptions,
    ) -> SyncResult<RemoveOutcome> {
        let confirmed = options.confirmed;
        self.remove_with(input, &options.expansion, |_| confirmed)
    }

    /// Removes the input after asking `confirm` with every targeted name.
    ///
    /// # Errors
    ///
    /// Returns an error if the store delete fails.
    pub fn remove_with<F>(
        &self,
        input: impl Into<EntityCollection>,
        expansion: &Expansion,
        confirm: F,
    ) -> SyncResult<RemoveOutcome>
    where
        F: FnOnce(&[String]) -> bool,
    {
        let names = flatten(&input.into(), expansion).names();
        if names.is_empty() {
            return Ok(RemoveOutcome::Nothing);
        }

        if !confirm(&names) {
            tracing::info!(count = names.len(), "remove aborted");
            return Ok(RemoveOutcome::Aborted { names });
        }

        let deleted = self.store.delete_many(&name_filter(&names))?;
        self.stats.write().documents_deleted += deleted;
        tracing::info!(
            collection = %self.config.collection,
            requested = names.len(),
            deleted,
            "removed entities"
        );
        Ok(RemoveOutcome::Deleted { names, deleted })
    }

    /// Returns the sorted field names used by stored documents.
    ///
    /// With `names`, only those documents are inspected and the value
    /// payload is left out. `TS_NAME` and `_id` are never reported.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub fn attribute_names(&self, names: Option<&[String]>) -> SyncResult<Vec<String>> {
        let documents = match names {
            Some(names) if !names.is_empty() => self
                .store
                .find(&name_filter(names), &Projection::exclude([VALUE]))?,
            _ => self.store.find(&Filter::All, &Projection::All)?,
        };

        let mut fields: Vec<String> = documents
            .into_iter()
            .flat_map(|doc| doc.into_keys())
            .filter(|key| !tsio_core::constants::is_reserved(key))
            .collect();
        fields.sort();
        fields.dedup();
        Ok(fields)
    }

    /// Returns every distinct stored value of the given attributes, sorted.
    ///
    /// Defaults to every attribute. `VALUE` and `COMPONENTS` are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if a store query fails.
    pub fn read_all_attribute_values(
        &self,
        attributes: Option<&[String]>,
    ) -> SyncResult<Vec<Value>> {
        let attributes = match attributes {
            Some(attributes) => attributes.iter().map(|a| a.to_uppercase()).collect(),
            None => self.attribute_names(None)?,
        };

        let mut values = Vec::new();
        for attribute in attributes
            .iter()
            .filter(|a| a.as_str() != VALUE && a.as_str() != COMPONENTS)
        {
            values.extend(self.store.distinct(attribute, &Filter::All)?);
        }
        values.sort_by(Value::cmp_total);
        values.dedup_by(|a, b| a.loose_eq(b));
        Ok(values)
    }

    /// Returns true if the store holds a document for this entity.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub fn contains(&self, entity: &Entity) -> SyncResult<bool> {
        Ok(self.store.count(&Filter::eq(TS_NAME, entity.name()))? > 0)
    }

    /// Free-text search over the store. Not supported; use
    /// [`SyncEngine::select`] and search the returned collection instead.
    ///
    /// # Errors
    ///
    /// Always returns `NotImplemented`.
    pub fn search(&self, _query: &str) -> SyncResult<EntityCollection> {
        Err(SyncError::not_implemented("search"))
    }

    /// Creates an index on each attribute and returns the index names.
    ///
    /// # Errors
    ///
    /// Returns an error if index creation fails.
    pub fn ensure_index<A: AsRef<str>>(
        &self,
        attributes: impl IntoIterator<Item = A>,
    ) -> SyncResult<Vec<String>> {
        attributes
            .into_iter()
            .map(|a| {
                self.store
                    .create_index(&a.as_ref().to_uppercase())
                    .map_err(SyncError::from)
            })
            .collect()
    }
}

impl<S: DocumentStore> std::fmt::Debug for SyncEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("config", &self.config)
            .field("stats", &*self.stats.read())
            .finish_non_exhaustive()
    }
}

/// `TS_NAME in names`.
pub(crate) fn name_filter(names: &[String]) -> Filter {
    Filter::is_in(TS_NAME, names.iter().map(String::as_str))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsio_core::{ComponentFilter, Depth};
    use tsio_store::InMemoryStore;

    fn engine() -> SyncEngine<InMemoryStore> {
        SyncEngine::new(SyncConfig::default(), InMemoryStore::new())
    }

    fn stored(engine: &SyncEngine<InMemoryStore>, name: &str) -> Option<Document> {
        engine
            .store()
            .find(&Filter::eq(TS_NAME, name), &Projection::All)
            .unwrap()
            .into_iter()
            .next()
    }

    #[test]
    fn read_of_missing_entity_is_not_an_error() {
        let engine = engine();
        let ghost = Entity::new("GHOST");
        let report = engine.read(&ghost, &ReadOptions::default()).unwrap();

        assert_eq!(report.documents, 0);
        assert_eq!(report.visited, vec!["GHOST"]);
        assert!(ghost.is_empty());
    }

    #[test]
    fn write_attributes_keeps_stored_values() {
        let engine = engine();
        let bond = Entity::new("BOND");
        bond.update_values([(Utc::now(), Some(1.0))]);
        engine.write(&bond, &WriteOptions::default()).unwrap();

        let renamed = Entity::new("BOND");
        renamed.set_attribute("PRICE", Value::Integer(3));
        engine
            .write_attributes(&renamed, &WriteOptions::default())
            .unwrap();

        let doc = stored(&engine, "BOND").unwrap();
        assert_eq!(doc[VALUE].as_map().map(|m| m.len()), Some(1));
        assert_eq!(doc["PRICE"], Value::Integer(3));
    }

    #[test]
    fn attribute_read_projection() {
        let engine = engine();
        let bond = Entity::new("BOND");
        bond.set_attribute("PRICE", Value::Integer(10));
        bond.set_attribute("COUPON", Value::Float(2.0));
        bond.update_values([(Utc::now(), Some(1.0))]);
        engine.write(&bond, &WriteOptions::default()).unwrap();

        let partial = Entity::new("BOND");
        engine
            .read_attributes(&partial, &ReadOptions::default().with_attributes(["price"]))
            .unwrap();
        assert_eq!(partial.get_attribute("PRICE"), Some(Value::Integer(10)));
        assert_eq!(partial.get_attribute("COUPON"), None);
        assert!(partial.values().is_empty());

        let values_only = Entity::new("BOND");
        engine
            .read_values(&values_only, &ReadOptions::default())
            .unwrap();
        assert!(values_only.attributes().is_empty());
        assert_eq!(values_only.values().len(), 1);
    }

    #[test]
    fn reads_touch_last_use_unless_disabled() {
        let engine = engine();
        engine.write(&Entity::new("A"), &WriteOptions::default()).unwrap();
        engine.read(&Entity::new("A"), &ReadOptions::default()).unwrap();
        assert!(stored(&engine, "A").unwrap().contains_key(LAST_USE));

        let quiet = SyncEngine::new(
            SyncConfig::default().with_touch_last_use(false),
            InMemoryStore::new(),
        );
        quiet.write(&Entity::new("A"), &WriteOptions::default()).unwrap();
        quiet.read(&Entity::new("A"), &ReadOptions::default()).unwrap();
        assert!(!stored(&quiet, "A").unwrap().contains_key(LAST_USE));
    }

    #[test]
    fn write_follows_components() {
        let engine = engine();
        let bond = Entity::new("BOND");
        bond.set_component("quote", "BOND(QUOTE)");

        let report = engine.write(&bond, &WriteOptions::default()).unwrap();
        assert_eq!(report.submissions, 1);
        assert_eq!(report.documents, 2);
        assert_eq!(report.result.upserted, 2);

        let doc = stored(&engine, "BOND").unwrap();
        assert_eq!(doc[COMPONENTS].get("QUOTE"), Some(&Value::from("BOND(QUOTE)")));
        assert!(stored(&engine, "BOND(QUOTE)").is_some());
    }

    #[test]
    fn read_resolves_components_level_by_level() {
        let engine = engine();
        let bond = Entity::new("BOND");
        bond.set_component("quote", "BOND(QUOTE)");
        let quote = Entity::new("BOND(QUOTE)");
        quote.set_attribute("SOURCE", Value::from("exchange"));
        engine
            .write(EntityCollection::from(vec![bond, quote]), &WriteOptions::default())
            .unwrap();

        let fresh = Entity::new("BOND");
        let report = engine.read(&fresh, &ReadOptions::default()).unwrap();
        assert_eq!(report.levels, 2);
        assert_eq!(report.visited, vec!["BOND", "BOND(QUOTE)"]);

        let component = fresh.component("QUOTE").and_then(|c| c.entity()).unwrap();
        assert_eq!(component.get_attribute("SOURCE"), Some(Value::from("exchange")));

        let shallow = Entity::new("BOND");
        let report = engine
            .read(&shallow, &ReadOptions::default().with_depth(Depth::Levels(1)))
            .unwrap();
        assert_eq!(report.levels, 1);
        assert!(!shallow.component("QUOTE").unwrap().is_resolved());

        let filtered = Entity::new("BOND");
        let report = engine
            .read(
                &filtered,
                &ReadOptions::default().with_components(ComponentFilter::only(["call"])),
            )
            .unwrap();
        assert_eq!(report.visited, vec!["BOND"]);
    }

    #[test]
    fn remove_with_callback_sees_all_names() {
        let engine = engine();
        let bond = Entity::new("BOND");
        bond.set_component("quote", "BOND(QUOTE)");
        engine.write(&bond, &WriteOptions::default()).unwrap();

        let mut asked = Vec::new();
        let outcome = engine
            .remove_with(&bond, &Expansion::default(), |names| {
                asked = names.to_vec();
                true
            })
            .unwrap();

        assert_eq!(asked, vec!["BOND", "BOND(QUOTE)"]);
        assert_eq!(
            outcome,
            RemoveOutcome::Deleted {
                names: asked.clone(),
                deleted: 2
            }
        );
        assert_eq!(engine.store().len(), 0);
        assert_eq!(engine.stats().documents_deleted, 2);
    }

    #[test]
    fn remove_of_empty_input_is_nothing() {
        let outcome = engine()
            .remove(EntityCollection::new(), &RemoveOptions::default().confirmed())
            .unwrap();
        assert_eq!(outcome, RemoveOutcome::Nothing);
    }

    #[test]
    fn metadata_queries() {
        let engine = engine();
        let a = Entity::new("A");
        a.set_attribute("TYPE", Value::from("bond"));
        a.set_component("quote", "A(QUOTE)");
        let b = Entity::new("B");
        b.set_attribute("TYPE", Value::from(vec!["bond", "callable"]));
        b.set_attribute("ISSUER", Value::from("acme"));
        engine
            .write(EntityCollection::from(vec![a.clone(), b]), &WriteOptions::default())
            .unwrap();

        assert_eq!(
            engine.attribute_names(None).unwrap(),
            vec!["COMPONENTS", "ISSUER", "TYPE", "VALUE"]
        );
        assert_eq!(
            engine.attribute_names(Some(&["A".to_string()])).unwrap(),
            vec!["COMPONENTS", "TYPE"]
        );

        assert_eq!(
            engine.read_all_attribute_values(None).unwrap(),
            vec![
                Value::from("acme"),
                Value::from("bond"),
                Value::from("callable")
            ]
        );
        assert_eq!(
            engine
                .read_all_attribute_values(Some(&["issuer".to_string()]))
                .unwrap(),
            vec![Value::from("acme")]
        );

        assert!(engine.contains(&a).unwrap());
        assert!(!engine.contains(&Entity::new("Z")).unwrap());
        assert!(matches!(
            engine.search("bond"),
            Err(SyncError::NotImplemented { .. })
        ));
        assert_eq!(
            engine.ensure_index(["type", "issuer"]).unwrap(),
            vec!["TYPE_1", "ISSUER_1"]
        );
    }
}
