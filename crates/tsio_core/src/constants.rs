//! Reserved document field names.

use tsio_codec::ID_FIELD;

/// Field holding an entity's unique name.
pub const TS_NAME: &str = "TS_NAME";

/// Field holding the value series as a `{timestamp: number}` map.
pub const VALUE: &str = "VALUE";

/// Attribute holding the `{component type: entity name}` map.
pub const COMPONENTS: &str = "COMPONENTS";

/// Attribute stamped with the time of the last read.
pub const LAST_USE: &str = "LAST_USE";

/// Optional attribute naming the field an entity represents.
///
/// Selections exclude entities carrying it unless asked otherwise.
pub const FIELD: &str = "FIELD";

/// Document keys that never become attributes.
pub const RESERVED_KEYS: [&str; 2] = [TS_NAME, ID_FIELD];

/// Returns true if `key` is a reserved document key.
#[must_use]
pub fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}
