//! Deduplicating, insertion-ordered entity collection.

use crate::entity::Entity;
use crate::error::{CoreError, CoreResult};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::{Bound, RangeBounds};
use tsio_codec::Value;

/// An ordered set of entities keyed by name.
///
/// Entities keep the position they were added at. Adding a name that is
/// already present is a no-op that returns the existing position and never
/// replaces the held entity. Removing an entity shifts every later position
/// down by one.
///
/// Cloning a collection (or calling [`EntityCollection::copy`]) produces a
/// new collection holding handles to the same entities.
///
/// # Example
///
/// ```rust
/// use tsio_core::EntityCollection;
///
/// let mut collection = EntityCollection::new();
/// assert_eq!(collection.add("A"), 0);
/// assert_eq!(collection.add("B"), 1);
/// assert_eq!(collection.add("A"), 0);
///
/// collection.remove("A");
/// assert_eq!(collection.index_of("B"), Some(0));
/// ```
#[derive(Clone, Default)]
pub struct EntityCollection {
    items: Vec<Entity>,
    index: HashMap<String, usize>,
}

impl EntityCollection {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty collection with room for `capacity` entities.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Returns the number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Adds an entity (or a stub for a name) and returns its position.
    ///
    /// If the name is already present, the held entity is kept and its
    /// position returned.
    pub fn add(&mut self, entity: impl Into<Entity>) -> usize {
        let entity = entity.into();
        if let Some(&position) = self.index.get(entity.name()) {
            return position;
        }
        let position = self.items.len();
        self.index.insert(entity.name().to_string(), position);
        self.items.push(entity);
        position
    }

    /// Adds several entities and returns their positions.
    pub fn add_many<T, I>(&mut self, entities: I) -> Vec<usize>
    where
        T: Into<Entity>,
        I: IntoIterator<Item = T>,
    {
        entities.into_iter().map(|e| self.add(e)).collect()
    }

    /// Removes an entity by name, returning it if it was present.
    pub fn remove(&mut self, key: impl AsRef<str>) -> Option<Entity> {
        let position = self.index.remove(key.as_ref())?;
        let removed = self.items.remove(position);
        for (offset, entity) in self.items[position..].iter().enumerate() {
            if let Some(slot) = self.index.get_mut(entity.name()) {
                *slot = position + offset;
            }
        }
        Some(removed)
    }

    /// Removes several entities by name. Absent names are ignored.
    pub fn remove_many<K, I>(&mut self, keys: I)
    where
        K: AsRef<str>,
        I: IntoIterator<Item = K>,
    {
        for key in keys {
            self.remove(key);
        }
    }

    /// Removes and returns the last-added entity.
    pub fn pop(&mut self) -> Option<Entity> {
        let entity = self.items.pop()?;
        self.index.remove(entity.name());
        Some(entity)
    }

    /// Removes every entity.
    pub fn clear(&mut self) {
        self.items.clear();
        self.index.clear();
    }

    /// Returns true if an entity with this name is present.
    #[must_use]
    pub fn contains(&self, key: impl AsRef<str>) -> bool {
        self.index.contains_key(key.as_ref())
    }

    /// Returns the entity with this name.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no entity has this name.
    pub fn get(&self, name: &str) -> CoreResult<&Entity> {
        self.index
            .get(name)
            .map(|&position| &self.items[position])
            .ok_or_else(|| CoreError::not_found(name))
    }

    /// Returns the position of the entity with this name.
    #[must_use]
    pub fn index_of(&self, key: impl AsRef<str>) -> Option<usize> {
        self.index.get(key.as_ref()).copied()
    }

    /// Returns the entity at a position.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` past the end.
    pub fn get_index(&self, position: usize) -> CoreResult<&Entity> {
        self.items.get(position).ok_or(CoreError::IndexOutOfRange {
            index: position,
            len: self.items.len(),
        })
    }

    /// Returns the entities in a position range.
    ///
    /// A range covering the whole collection borrows this collection; any
    /// other range builds a new one holding the same entities.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if the range ends past the collection.
    pub fn slice(&self, range: impl RangeBounds<usize>) -> CoreResult<Cow<'_, EntityCollection>> {
        let len = self.items.len();
        let past = |index: usize| CoreError::IndexOutOfRange { index, len };
        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s.checked_add(1).ok_or_else(|| past(s))?,
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&e) => e.checked_add(1).ok_or_else(|| past(e))?,
            Bound::Excluded(&e) => e,
            Bound::Unbounded => len,
        };
        if end > len {
            return Err(past(end));
        }
        if start > end {
            return Err(past(start));
        }
        if start == 0 && end == len {
            return Ok(Cow::Borrowed(self));
        }
        Ok(Cow::Owned(self.items[start..end].iter().collect()))
    }

    /// Returns a new collection with the entities at the given positions.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` for the first position past the end.
    pub fn select(&self, positions: impl IntoIterator<Item = usize>) -> CoreResult<EntityCollection> {
        let mut selected = EntityCollection::new();
        for position in positions {
            selected.add(self.get_index(position)?);
        }
        Ok(selected)
    }

    /// Returns a new collection holding the same entities.
    #[must_use]
    pub fn copy(&self) -> EntityCollection {
        self.clone()
    }

    /// Returns the member names in order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.items.iter().map(|e| e.name().to_string()).collect()
    }

    /// Returns one attribute of every member, in order.
    #[must_use]
    pub fn attribute_values(&self, attribute: &str) -> Vec<Option<Value>> {
        self.items
            .iter()
            .map(|e| e.get_attribute(attribute))
            .collect()
    }

    /// Iterates members in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.items.iter()
    }

    /// Compares membership by name, ignoring order and duplicates.
    pub fn same_members<K, I>(&self, other: I) -> bool
    where
        K: AsRef<str>,
        I: IntoIterator<Item = K>,
    {
        let other: HashSet<String> = other
            .into_iter()
            .map(|k| k.as_ref().to_string())
            .collect();
        other.len() == self.index.len() && other.iter().all(|name| self.index.contains_key(name))
    }
}

impl PartialEq for EntityCollection {
    fn eq(&self, other: &Self) -> bool {
        self.items.len() == other.items.len()
            && self
                .items
                .iter()
                .zip(&other.items)
                .all(|(a, b)| a.name() == b.name())
    }
}

impl Eq for EntityCollection {}

impl fmt::Debug for EntityCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EntityCollection")
            .field(&self.items)
            .finish()
    }
}

impl fmt::Display for EntityCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entity in &self.items {
            writeln!(f, "{}", entity.name())?;
        }
        Ok(())
    }
}

impl<T: Into<Entity>> FromIterator<T> for EntityCollection {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut collection = EntityCollection::new();
        collection.extend(iter);
        collection
    }
}

impl<T: Into<Entity>> Extend<T> for EntityCollection {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for entity in iter {
            self.add(entity);
        }
    }
}

impl IntoIterator for EntityCollection {
    type Item = Entity;
    type IntoIter = std::vec::IntoIter<Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a EntityCollection {
    type Item = &'a Entity;
    type IntoIter = std::slice::Iter<'a, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl From<Entity> for EntityCollection {
    fn from(entity: Entity) -> Self {
        std::iter::once(entity).collect()
    }
}

impl From<&Entity> for EntityCollection {
    fn from(entity: &Entity) -> Self {
        std::iter::once(entity.clone()).collect()
    }
}

impl From<&EntityCollection> for EntityCollection {
    fn from(collection: &EntityCollection) -> Self {
        collection.copy()
    }
}

impl From<&str> for EntityCollection {
    fn from(name: &str) -> Self {
        std::iter::once(name).collect()
    }
}

impl<T: Into<Entity>> From<Vec<T>> for EntityCollection {
    fn from(entities: Vec<T>) -> Self {
        entities.into_iter().collect()
    }
}
