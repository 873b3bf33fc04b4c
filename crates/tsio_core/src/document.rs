//! Conversion between entities and store documents.
//!
//! A stored entity looks like:
//!
//! ```text
//! { TS_NAME: <name>,
//!   VALUE: { <epoch-ms>: <number>, ... },
//!   COMPONENTS: { <type>: <name>, ... },
//!   <ATTRIBUTE>: <value>, ... }
//! ```

use crate::constants::{is_reserved, COMPONENTS, TS_NAME, VALUE};
use crate::entity::{components_to_value, Entity, ValueSeries};
use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use tsio_codec::{epoch_millis_key, parse_timestamp, Document, Value};

/// What part of an entity a document carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentScope {
    /// Attributes and components only; `VALUE` is left out entirely.
    Attributes,
    /// Attributes, components and the value series.
    Full,
}

/// Serializes an entity into a store document.
///
/// Values are normalized to portable scalars. Component references are
/// written as names, never as nested documents.
#[must_use]
pub fn entity_to_document(entity: &Entity, scope: DocumentScope) -> Document {
    let mut doc: Document = entity
        .attributes()
        .into_iter()
        .map(|(key, value)| (key, value.normalized()))
        .collect();

    let components = entity.components();
    if !components.is_empty() {
        doc.insert(COMPONENTS.to_string(), components_to_value(&components));
    }

    match scope {
        DocumentScope::Full => {
            doc.insert(VALUE.to_string(), series_to_value(&entity.values()));
        }
        DocumentScope::Attributes => {
            doc.remove(VALUE);
        }
    }

    doc.insert(TS_NAME.to_string(), Value::from(entity.name()));
    doc
}

/// Renders a series as a `{epoch-ms: number}` map.
#[must_use]
pub fn series_to_value(series: &ValueSeries) -> Value {
    Value::Map(
        series
            .iter()
            .map(|(at, value)| (epoch_millis_key(&at), Value::Float(value).normalized()))
            .collect(),
    )
}

/// Parses a stored `VALUE` map strictly.
///
/// # Errors
///
/// Returns `InvalidArgument` if the value is not a map or an observation is
/// not numeric, and a codec error for an unparsable timestamp key.
pub fn series_from_value(value: &Value) -> CoreResult<ValueSeries> {
    let map = value.as_map().ok_or_else(|| {
        CoreError::invalid_argument(format!("{VALUE} must be a map, found {}", value.type_name()))
    })?;

    let mut points = Vec::with_capacity(map.len());
    for (key, observation) in map {
        let at = parse_timestamp(key)?;
        let number = observation_value(observation).ok_or_else(|| {
            CoreError::invalid_argument(format!(
                "observation at {key} is a {}, not a number",
                observation.type_name()
            ))
        })?;
        points.push((at, number));
    }

    let mut series = ValueSeries::new();
    series.merge(points);
    Ok(series)
}

/// `Some(None)` for an explicit null, `Some(Some(x))` for a number.
fn observation_value(value: &Value) -> Option<Option<f64>> {
    if value.is_null() {
        Some(None)
    } else {
        value.as_f64().map(Some)
    }
}

/// Merges a stored document into an entity.
///
/// Reserved keys are stripped, `VALUE` is merged into the value series and
/// everything else into the attributes. Observations with an unparsable
/// timestamp or a non-numeric value are skipped with a warning. Returns the
/// number of observations merged.
pub fn merge_document(entity: &Entity, mut doc: Document) -> usize {
    doc.retain(|key, _| !is_reserved(key));

    let mut merged = 0;
    if let Some(values) = doc.remove(VALUE) {
        let observations = lenient_observations(entity.name(), &values);
        merged = observations.len();
        entity.update_values(observations);
    }

    if !doc.is_empty() {
        entity.update_attributes(doc);
    }
    merged
}

fn lenient_observations(owner: &str, values: &Value) -> Vec<(DateTime<Utc>, Option<f64>)> {
    let Some(map) = values.as_map() else {
        if !values.is_null() {
            tracing::warn!(
                entity = owner,
                found = values.type_name(),
                "ignoring {VALUE} that is not a map"
            );
        }
        return Vec::new();
    };

    map.iter()
        .filter_map(|(key, observation)| {
            let at = match parse_timestamp(key) {
                Ok(at) => at,
                Err(e) => {
                    tracing::warn!(entity = owner, key = %key, error = %e, "skipping observation");
                    return None;
                }
            };
            match observation_value(observation) {
                Some(value) => Some((at, value)),
                None => {
                    tracing::warn!(
                        entity = owner,
                        key = %key,
                        found = observation.type_name(),
                        "skipping non-numeric observation"
                    );
                    None
                }
            }
        })
        .collect()
}

impl Entity {
    /// Builds an entity from a store document.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the document has no text `TS_NAME`.
    pub fn from_document(doc: Document) -> CoreResult<Entity> {
        let name = doc
            .get(TS_NAME)
            .and_then(Value::as_text)
            .ok_or_else(|| CoreError::invalid_argument(format!("document has no text {TS_NAME}")))?;
        let entity = Entity::new(name);
        merge_document(&entity, doc);
        Ok(entity)
    }
}
