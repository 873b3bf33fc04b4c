//! Benchmark utilities.

#![warn(missing_docs)]

use chrono::{Duration, TimeZone, Utc};
use tsio_codec::Value;
use tsio_core::{Entity, EntityCollection};

/// Generate `count` entities with a few attributes and `points` daily values.
pub fn generate_entities(count: usize, points: usize) -> EntityCollection {
    let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).single();
    (0..count)
        .map(|i| {
            let entity = Entity::new(format!("E{i:06}"));
            entity.set_attribute("PRICE", Value::Float(i as f64));
            entity.set_attribute("STATUS", Value::from(if i % 2 == 0 { "active" } else { "inactive" }));
            if let Some(start) = start {
                entity.update_values(
                    (0..points).map(|d| (start + Duration::days(d as i64), Some(d as f64))),
                );
            }
            entity
        })
        .collect()
}

/// Build a component tree `fanout` wide and `depth` levels deep under `root`.
///
/// Returns the root; the tree holds `fanout^0 + ... + fanout^depth` entities.
pub fn component_tree(root: &str, fanout: usize, depth: usize) -> Entity {
    let entity = Entity::new(root);
    if depth > 0 {
        for i in 0..fanout {
            let child = component_tree(&format!("{root}/{i}"), fanout, depth - 1);
            entity.set_component(&format!("C{i}"), child);
        }
    }
    entity
}
