//! Property-based test generators using proptest.
//!
//! Provides strategies for generating entities, attributes and series
//! that satisfy the store's naming rules.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use tsio_codec::Value;
use tsio_core::Entity;

/// Strategy for generating entity names.
pub fn entity_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z][A-Z0-9_]{0,11}").expect("Invalid regex")
}

/// Strategy for generating attribute names that the store accepts.
///
/// Reserved names are never produced.
pub fn attribute_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z][A-Z_]{0,9}")
        .expect("Invalid regex")
        .prop_filter("Attribute name must not be reserved", |s| {
            !matches!(s.as_str(), "TS_NAME" | "VALUE" | "COMPONENTS" | "LAST_USE")
        })
}

/// Strategy for generating scalar attribute values.
pub fn scalar_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|i| Value::Integer(i64::from(i))),
        (-1.0e6..1.0e6f64).prop_map(Value::Float),
        prop::string::string_regex("[a-z]{0,8}")
            .expect("Invalid regex")
            .prop_map(Value::Text),
    ]
}

/// Strategy for generating midnight UTC days between 2000 and 2040.
pub fn day_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..14_600).prop_map(|offset| {
        Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0)
            .single()
            .expect("Invalid epoch")
            + Duration::days(offset)
    })
}

/// Strategy for generating observations, some of them deletions.
pub fn observations_strategy(
    max_len: usize,
) -> impl Strategy<Value = Vec<(DateTime<Utc>, Option<f64>)>> {
    prop::collection::vec(
        (
            day_strategy(),
            prop_oneof![
                4 => (-1.0e6..1.0e6f64).prop_map(Some),
                1 => Just(None),
            ],
        ),
        0..max_len,
    )
}

/// Strategy for generating an entity with attributes and values.
///
/// Components are never attached.
pub fn entity_strategy() -> impl Strategy<Value = Entity> {
    (
        entity_name_strategy(),
        prop::collection::btree_map(attribute_name_strategy(), scalar_value_strategy(), 0..6),
        observations_strategy(16),
    )
        .prop_map(|(name, attributes, observations)| {
            let entity = Entity::new(name);
            entity.set_attributes(attributes);
            entity.update_values(observations);
            entity
        })
}

/// Strategy for generating distinct entity names.
pub fn distinct_names_strategy(max_len: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set(entity_name_strategy(), 0..max_len)
        .prop_map(|names| names.into_iter().collect())
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn attribute_names_are_storable(name in attribute_name_strategy()) {
            prop_assert!(!name.is_empty());
            prop_assert!(!name.contains('.'));
            prop_assert!(!name.starts_with('$'));
        }

        #[test]
        fn generated_entities_have_no_components(entity in entity_strategy()) {
            prop_assert!(entity.components().is_empty());
        }

        #[test]
        fn distinct_names_are_distinct(names in distinct_names_strategy(20)) {
            let mut sorted = names.clone();
            sorted.dedup();
            prop_assert_eq!(sorted, names);
        }
    }
}
