//! Entity fixtures and store helpers.
//!
//! Provides ready-made component graphs, dated series and stores for
//! common test scenarios.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::path::Path;
use tempfile::TempDir;
use tsio_codec::{Document, Value};
use tsio_core::constants::TS_NAME;
use tsio_core::{Entity, EntityCollection};
use tsio_store::{FileStore, InMemoryStore};

/// Component kind used by [`chain`] and [`cycle`] links.
pub const NEXT: &str = "NEXT";

/// A file-backed store in a temporary directory with automatic cleanup.
pub struct TempFileStore {
    /// The store instance.
    pub store: FileStore,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: TempDir,
}

impl TempFileStore {
    /// Opens a fresh store in a new temporary directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = FileStore::open(&temp_dir.path().join("timeseries"))
            .expect("Failed to open file store");
        Self {
            store,
            _temp_dir: temp_dir,
        }
    }

    /// Closes the store and opens it again from disk.
    pub fn reopen(self) -> Self {
        let Self { store, _temp_dir } = self;
        let path = store.path().to_path_buf();
        drop(store);
        Self {
            store: FileStore::open(&path).expect("Failed to reopen file store"),
            _temp_dir,
        }
    }

    /// Returns the store directory.
    pub fn path(&self) -> &Path {
        self.store.path()
    }
}

impl Default for TempFileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TempFileStore {
    type Target = FileStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Builds a document with a `TS_NAME` and the given fields.
pub fn document(name: &str, fields: &[(&str, Value)]) -> Document {
    let mut doc = Document::new();
    doc.insert(TS_NAME.to_string(), Value::from(name));
    for (key, value) in fields {
        doc.insert((*key).to_string(), value.clone());
    }
    doc
}

/// Creates an in-memory store holding the given documents.
pub fn seeded_store(documents: impl IntoIterator<Item = Document>) -> InMemoryStore {
    InMemoryStore::with_documents(documents.into_iter().collect())
}

/// Creates `count` bare entities named `PREFIX00000`, `PREFIX00001`, ...
pub fn numbered(prefix: &str, count: usize) -> EntityCollection {
    (0..count).map(|i| Entity::new(format!("{prefix}{i:05}"))).collect()
}

/// Links the named entities into a chain through `NEXT` components.
///
/// The first entity is the head; the last has no components.
pub fn chain(names: &[&str]) -> EntityCollection {
    let entities: EntityCollection = names.iter().map(|name| Entity::new(*name)).collect();
    for pair in entities.iter().collect::<Vec<_>>().windows(2) {
        pair[0].set_component(NEXT, pair[1].clone());
    }
    entities
}

/// Like [`chain`], but the last entity links back to the first.
///
/// The links are owning handles wired by hand, so call [`detach_all`] when
/// done or the entities are never freed.
pub fn cycle(names: &[&str]) -> EntityCollection {
    let entities = chain(names);
    if let (Some(first), Some(last)) = (entities.iter().next(), entities.iter().last()) {
        last.set_component(NEXT, first.clone());
    }
    entities
}

/// Breaks every component link held by the collection's entities.
pub fn detach_all(entities: &EntityCollection) {
    for entity in entities {
        entity.detach_components();
    }
}

/// Creates `root` with `kinds` components named `ROOT(K0)`, `ROOT(K1)`, ...
pub fn fan_out(root: &str, kinds: usize) -> Entity {
    let entity = Entity::new(root);
    for i in 0..kinds {
        entity.set_component(&format!("K{i}"), Entity::new(format!("{root}(K{i})")));
    }
    entity
}

/// Returns midnight UTC of the given day.
pub fn day(year: i32, month: u32, date: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, date, 0, 0, 0)
        .single()
        .expect("Invalid fixture date")
}

/// Returns one observation per day starting at `start`.
pub fn daily(start: DateTime<Utc>, values: &[f64]) -> Vec<(DateTime<Utc>, Option<f64>)> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| (start + Duration::days(i as i64), Some(*v)))
        .collect()
}

/// Creates an entity with a `PRICE` attribute and a daily series.
pub fn priced(name: &str, price: f64, start: DateTime<Utc>, values: &[f64]) -> Entity {
    let entity = Entity::new(name);
    entity.set_attribute("PRICE", Value::Float(price));
    entity.update_values(daily(start, values));
    entity
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsio_store::{DocumentStore, Filter};

    #[test]
    fn chain_links_in_order() {
        let entities = chain(&["A", "B", "C"]);
        let a = entities.get("A").unwrap();
        let next = a.component(NEXT).unwrap();
        assert_eq!(next.name(), "B");
        assert!(entities.get("C").unwrap().components().is_empty());
    }

    #[test]
    fn cycle_closes_the_loop() {
        let entities = cycle(&["A", "B"]);
        assert_eq!(entities.get("B").unwrap().component(NEXT).unwrap().name(), "A");
        let weak_a = entities.get("A").unwrap().downgrade();

        detach_all(&entities);
        let back = entities.get("B").unwrap().component(NEXT).unwrap();
        assert_eq!(back.name(), "A");
        assert!(!back.is_resolved());

        drop(entities);
        assert!(!weak_a.is_alive());
    }

    #[test]
    fn numbered_names_sort_in_order() {
        let entities = numbered("N", 3);
        assert_eq!(entities.names(), vec!["N00000", "N00001", "N00002"]);
    }

    #[test]
    fn daily_steps_by_one_day() {
        let points = daily(day(2024, 1, 30), &[1.0, 2.0, 3.0]);
        assert_eq!(points[2].0, day(2024, 2, 1));
    }

    #[test]
    fn temp_file_store_survives_reopen() {
        let temp = TempFileStore::new();
        temp.update_many(&Filter::All, &Document::new()).unwrap();
        let temp = temp.reopen();
        assert!(temp.is_empty());
        assert!(temp.path().exists());
    }
}
