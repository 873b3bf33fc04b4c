//! Routing reads to external sources.
//!
//! Some entities are not owned by the store: their attributes or values
//! come from elsewhere. An [`ExternalSource`] claims such entities through
//! [`ExternalSource::is_member`]. After the store read, a [`RoutedEngine`]
//! flattens the expanded input and hands each source the entities it
//! claims. Sources merge into the very entities the caller holds, so no
//! stitching is needed afterwards.

use crate::config::{ReadOptions, RemoveOptions, WriteOptions};
use crate::engine::{ReadReport, RemoveOutcome, SyncEngine, WriteReport};
use crate::error::SyncResult;
use std::collections::BTreeMap;
use tsio_core::{flatten, Entity, EntityCollection};
use tsio_store::DocumentStore;

/// A source of attributes and values outside the document store.
pub trait ExternalSource: Send + Sync {
    /// Returns true if this source owns the entity.
    fn is_member(&self, entity: &Entity) -> bool;

    /// Merges attributes into the collection's entities.
    ///
    /// `attributes` restricts which attributes to fetch when given.
    fn read_attributes(
        &self,
        collection: &EntityCollection,
        attributes: Option<&[String]>,
    ) -> SyncResult<()>;

    /// Merges values into the collection's entities.
    fn read_values(&self, collection: &EntityCollection) -> SyncResult<()>;

    /// Merges attributes and values into the collection's entities.
    fn read(&self, collection: &EntityCollection) -> SyncResult<()>;
}

/// Groups entities by the first source claiming them.
///
/// Keys are registration indexes; unclaimed entities are left out.
pub fn partition_by_source(
    collection: &EntityCollection,
    sources: &[Box<dyn ExternalSource>],
) -> BTreeMap<usize, EntityCollection> {
    let mut partitions: BTreeMap<usize, EntityCollection> = BTreeMap::new();
    for entity in collection {
        if let Some(index) = sources.iter().position(|source| source.is_member(entity)) {
            partitions.entry(index).or_default().add(entity);
        }
    }
    partitions
}

#[derive(Debug, Clone, Copy)]
enum Route {
    Attributes,
    Values,
    Both,
}

/// A [`SyncEngine`] whose reads also consult external sources.
///
/// Writes and removal only ever touch the store.
pub struct RoutedEngine<S: DocumentStore> {
    engine: SyncEngine<S>,
    sources: Vec<Box<dyn ExternalSource>>,
}

impl<S: DocumentStore> RoutedEngine<S> {
    /// Wraps an engine with no sources registered.
    pub fn new(engine: SyncEngine<S>) -> Self {
        Self {
            engine,
            sources: Vec::new(),
        }
    }

    /// Registers a source. Earlier sources win when several claim an entity.
    pub fn with_source(mut self, source: impl ExternalSource + 'static) -> Self {
        self.register(source);
        self
    }

    /// Registers a source. See [`RoutedEngine::with_source`].
    pub fn register(&mut self, source: impl ExternalSource + 'static) {
        self.sources.push(Box::new(source));
    }

    /// Returns the wrapped engine.
    pub fn engine(&self) -> &SyncEngine<S> {
        &self.engine
    }

    /// Returns the number of registered sources.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Reads attributes from the store, then from external sources.
    ///
    /// # Errors
    ///
    /// Returns the first store or source error.
    pub fn read_attributes(
        &self,
        input: impl Into<EntityCollection>,
        options: &ReadOptions,
        use_external: bool,
    ) -> SyncResult<ReadReport> {
        let input = input.into();
        let report = self.engine.read_attributes(&input, options)?;
        if use_external {
            self.dispatch(&input, options, Route::Attributes)?;
        }
        Ok(report)
    }

    /// Reads values from the store, then from external sources.
    ///
    /// # Errors
    ///
    /// Returns the first store or source error.
    pub fn read_values(
        &self,
        input: impl Into<EntityCollection>,
        options: &ReadOptions,
        use_external: bool,
    ) -> SyncResult<ReadReport> {
        let input = input.into();
        let report = self.engine.read_values(&input, options)?;
        if use_external {
            self.dispatch(&input, options, Route::Values)?;
        }
        Ok(report)
    }

    /// Reads attributes and values from the store, then from external
    /// sources.
    ///
    /// # Errors
    ///
    /// Returns the first store or source error.
    pub fn read(
        &self,
        input: impl Into<EntityCollection>,
        options: &ReadOptions,
        use_external: bool,
    ) -> SyncResult<ReadReport> {
        let input = input.into();
        let report = self.engine.read(&input, options)?;
        if use_external {
            self.dispatch(&input, options, Route::Both)?;
        }
        Ok(report)
    }

    fn dispatch(&self, input: &EntityCollection, options: &ReadOptions, route: Route) -> SyncResult<()> {
        if self.sources.is_empty() {
            return Ok(());
        }

        let flat = flatten(input, &options.expansion);
        for (index, partition) in partition_by_source(&flat, &self.sources) {
            tracing::debug!(source = index, entities = partition.len(), ?route, "external read");
            let source = &self.sources[index];
            match route {
                Route::Attributes => {
                    source.read_attributes(&partition, options.attributes.as_deref())?;
                }
                Route::Values => source.read_values(&partition)?,
                Route::Both => source.read(&partition)?,
            }
        }
        Ok(())
    }

    /// Writes attributes to the store. See [`SyncEngine::write_attributes`].
    ///
    /// # Errors
    ///
    /// Same as [`SyncEngine::write_attributes`].
    pub fn write_attributes(
        &self,
        input: impl Into<EntityCollection>,
        options: &WriteOptions,
    ) -> SyncResult<WriteReport> {
        self.engine.write_attributes(input, options)
    }

    /// Writes attributes and values to the store. See [`SyncEngine::write`].
    ///
    /// # Errors
    ///
    /// Same as [`SyncEngine::write`].
    pub fn write(
        &self,
        input: impl Into<EntityCollection>,
        options: &WriteOptions,
    ) -> SyncResult<WriteReport> {
        self.engine.write(input, options)
    }

    /// Removes from the store. See [`SyncEngine::remove`].
    ///
    /// # Errors
    ///
    /// Same as [`SyncEngine::remove`].
    pub fn remove(
        &self,
        input: impl Into<EntityCollection>,
        options: &RemoveOptions,
    ) -> SyncResult<RemoveOutcome> {
        self.engine.remove(input, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tsio_codec::Value;
    use tsio_store::InMemoryStore;

    /// Claims names with a prefix and records what it was asked.
    struct Prefix {
        prefix: &'static str,
        calls: Arc<Mutex<Vec<(String, Vec<String>)>>>,
    }

    impl Prefix {
        fn new(prefix: &'static str) -> (Self, Arc<Mutex<Vec<(String, Vec<String>)>>>) {
            let calls = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    prefix,
                    calls: calls.clone(),
                },
                calls,
            )
        }

        fn record(&self, method: &str, collection: &EntityCollection) {
            self.calls
                .lock()
                .push((method.to_string(), collection.names()));
        }
    }

    impl ExternalSource for Prefix {
        fn is_member(&self, entity: &Entity) -> bool {
            entity.name().starts_with(self.prefix)
        }

        fn read_attributes(
            &self,
            collection: &EntityCollection,
            _attributes: Option<&[String]>,
        ) -> SyncResult<()> {
            self.record("read_attributes", collection);
            for entity in collection {
                entity.set_attribute("SOURCE", Value::from(self.prefix));
            }
            Ok(())
        }

        fn read_values(&self, collection: &EntityCollection) -> SyncResult<()> {
            self.record("read_values", collection);
            Ok(())
        }

        fn read(&self, collection: &EntityCollection) -> SyncResult<()> {
            self.record("read", collection);
            Ok(())
        }
    }

    #[test]
    fn first_claiming_source_wins() {
        let (wide, _) = Prefix::new("X");
        let (narrow, _) = Prefix::new("XY");
        let sources: Vec<Box<dyn ExternalSource>> = vec![Box::new(wide), Box::new(narrow)];

        let collection = EntityCollection::from(vec!["XY1", "X2", "Z3"]);
        let partitions = partition_by_source(&collection, &sources);

        assert_eq!(partitions.len(), 1);
        assert_eq!(partitions[&0].names(), vec!["XY1", "X2"]);
    }

    #[test]
    fn reads_dispatch_after_store() {
        let (ext, calls) = Prefix::new("EXT");
        let routed =
            RoutedEngine::new(SyncEngine::new(Default::default(), InMemoryStore::new()))
                .with_source(ext);

        let bond = Entity::new("BOND");
        bond.set_component("quote", "EXT:QUOTE");
        routed.write(&bond, &WriteOptions::default()).unwrap();

        let fresh = Entity::new("BOND");
        routed
            .read_attributes(&fresh, &ReadOptions::default(), true)
            .unwrap();

        let quote = fresh.component("QUOTE").and_then(|c| c.entity()).unwrap();
        assert_eq!(quote.get_attribute("SOURCE"), Some(Value::from("EXT")));

        routed.read_values(&fresh, &ReadOptions::default(), true).unwrap();
        routed.read(&fresh, &ReadOptions::default(), false).unwrap();

        let calls = calls.lock().clone();
        assert_eq!(
            calls,
            vec![
                ("read_attributes".to_string(), vec!["EXT:QUOTE".to_string()]),
                ("read_values".to_string(), vec!["EXT:QUOTE".to_string()]),
            ]
        );
        assert_eq!(routed.source_count(), 1);
    }
}
