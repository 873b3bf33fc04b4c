//! Attribute-based selection of stored entities.

use crate::config::ReadOptions;
use crate::engine::SyncEngine;
use crate::error::SyncResult;
use chrono::{DateTime, Utc};
use std::convert::Infallible;
use std::str::FromStr;
use tsio_codec::Value;
use tsio_core::constants::{FIELD, TS_NAME};
use tsio_core::{EntityCollection, Expansion};
use tsio_store::{DocumentStore, Filter, Projection};

/// How predicates of a [`Selection`] combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectMode {
    /// Every predicate must match.
    #[default]
    And,
    /// At least one predicate must match.
    Or,
    /// Predicates are ignored; every document matches.
    All,
}

impl FromStr for SelectMode {
    type Err = Infallible;

    /// Parses `and` / `or` case-insensitively; anything else is `All`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_uppercase().as_str() {
            "AND" => SelectMode::And,
            "OR" => SelectMode::Or,
            _ => SelectMode::All,
        })
    }
}

/// A selection query over stored attributes.
///
/// Each predicate accepts a set of values for one attribute. Unless a
/// `FIELD` predicate is given or [`Selection::all_fields`] is set, entities
/// carrying a `FIELD` attribute are excluded.
///
/// # Example
///
/// ```rust
/// use tsio_sync_engine::{SelectMode, Selection};
///
/// let selection = Selection::new()
///     .matching("status", ["active"])
///     .matching("type", ["bond", "note"])
///     .mode(SelectMode::Or);
/// let _filter = selection.filter();
/// ```
#[derive(Debug, Clone, Default)]
pub struct Selection {
    predicates: Vec<(String, Vec<Value>)>,
    mode: SelectMode,
    all_fields: bool,
    available_on: Option<Vec<DateTime<Utc>>>,
}

impl Selection {
    /// Creates an empty selection in `And` mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts entities whose attribute equals (or, for arrays, contains)
    /// one of `values`.
    ///
    /// Repeating an attribute widens its accepted values.
    pub fn matching<V: Into<Value>>(
        mut self,
        attribute: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let key = attribute.to_uppercase();
        let values = values.into_iter().map(Into::into);
        match self.predicates.iter_mut().find(|(k, _)| *k == key) {
            Some((_, accepted)) => accepted.extend(values),
            None => self.predicates.push((key, values.collect())),
        }
        self
    }

    /// Sets how predicates combine.
    pub fn mode(mut self, mode: SelectMode) -> Self {
        self.mode = mode;
        self
    }

    /// Keeps entities that carry a `FIELD` attribute.
    pub fn all_fields(mut self) -> Self {
        self.all_fields = true;
        self
    }

    /// Keeps only entities with an observation on at least one of `dates`.
    pub fn available_on(mut self, dates: impl IntoIterator<Item = DateTime<Utc>>) -> Self {
        self.available_on = Some(dates.into_iter().collect());
        self
    }

    /// Builds the store filter for this selection.
    pub fn filter(&self) -> Filter {
        if self.mode == SelectMode::All {
            return Filter::All;
        }

        let clauses: Vec<Filter> = self
            .predicates
            .iter()
            .map(|(attribute, values)| Filter::is_in(attribute.as_str(), values.iter().cloned()))
            .collect();
        let field_free = (!self.all_fields && !self.predicates.iter().any(|(k, _)| k == FIELD))
            .then(|| Filter::is_in(FIELD, [Value::Null]));

        let combined = match self.mode {
            SelectMode::Or if !clauses.is_empty() => Some(Filter::or(clauses)),
            SelectMode::And if !clauses.is_empty() => Some(Filter::and(clauses)),
            _ => None,
        };

        match (combined, field_free) {
            (Some(combined), Some(field_free)) => Filter::and([combined, field_free]),
            (Some(combined), None) => combined,
            (None, Some(field_free)) => field_free,
            (None, None) => Filter::All,
        }
    }
}

impl<S: DocumentStore> SyncEngine<S> {
    /// Returns a collection of the stored entities matching `selection`.
    ///
    /// Without a date restriction the returned entities are bare stubs.
    /// With one, their values have been read.
    ///
    /// # Errors
    ///
    /// Returns an error if a store query fails.
    pub fn select(&self, selection: &Selection) -> SyncResult<EntityCollection> {
        let documents = self
            .store()
            .find(&selection.filter(), &Projection::include([TS_NAME]))?;

        let found: EntityCollection = documents
            .iter()
            .filter_map(|doc| doc.get(TS_NAME).and_then(Value::as_text))
            .collect();
        tracing::debug!(mode = ?selection.mode, matched = found.len(), "selected");

        let Some(dates) = &selection.available_on else {
            return Ok(found);
        };

        self.read_values(&found, &ReadOptions::new(Expansion::seed_only()))?;
        let dated: EntityCollection = found
            .iter()
            .filter(|entity| {
                let values = entity.values();
                dates.iter().any(|date| values.contains(date))
            })
            .collect();
        tracing::debug!(dated = dated.len(), "restricted to available dates");
        Ok(dated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parsing() {
        assert_eq!("and".parse::<SelectMode>(), Ok(SelectMode::And));
        assert_eq!(" Or ".parse::<SelectMode>(), Ok(SelectMode::Or));
        assert_eq!("whatever".parse::<SelectMode>(), Ok(SelectMode::All));
    }

    #[test]
    fn and_adds_field_constraint() {
        let filter = Selection::new().matching("status", ["active"]).filter();
        assert_eq!(
            filter,
            Filter::and([
                Filter::and([Filter::is_in("STATUS", ["active"])]),
                Filter::is_in(FIELD, [Value::Null]),
            ])
        );
    }

    #[test]
    fn explicit_field_or_all_fields_drop_constraint() {
        let explicit = Selection::new().matching("field", ["quote"]).filter();
        assert_eq!(explicit, Filter::and([Filter::is_in(FIELD, ["quote"])]));

        let all = Selection::new()
            .matching("status", ["active"])
            .all_fields()
            .filter();
        assert_eq!(all, Filter::and([Filter::is_in("STATUS", ["active"])]));
    }

    #[test]
    fn or_keeps_field_constraint_outside_disjunction() {
        let filter = Selection::new()
            .matching("status", ["active"])
            .matching("type", ["bond"])
            .mode(SelectMode::Or)
            .filter();
        assert_eq!(
            filter,
            Filter::and([
                Filter::or([
                    Filter::is_in("STATUS", ["active"]),
                    Filter::is_in("TYPE", ["bond"]),
                ]),
                Filter::is_in(FIELD, [Value::Null]),
            ])
        );
    }

    #[test]
    fn repeated_attribute_widens() {
        let filter = Selection::new()
            .matching("type", ["bond"])
            .matching("TYPE", ["note"])
            .all_fields()
            .filter();
        assert_eq!(filter, Filter::and([Filter::is_in("TYPE", ["bond", "note"])]));
    }

    #[test]
    fn all_mode_matches_everything() {
        let filter = Selection::new()
            .matching("status", ["x"])
            .mode(SelectMode::All)
            .filter();
        assert_eq!(filter, Filter::All);
        assert_eq!(Selection::new().all_fields().filter(), Filter::All);
    }
}
