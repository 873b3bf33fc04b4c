//! Component references between entities.

use super::{Entity, WeakEntity};
use std::collections::BTreeMap;
use std::fmt;
use tsio_codec::Value;

/// A reference from one entity to another under a component type.
///
/// References start out as bare names and are resolved to entity handles
/// during graph expansion. A resolved reference owns its target. A linked
/// reference does not: expansion uses it for edges that point back to an
/// entity already reached, so a cyclic graph never owns itself.
#[derive(Clone)]
pub enum ComponentRef {
    /// Only the referenced entity's name is known.
    Name(String),
    /// The referenced entity has been materialized.
    Resolved(Entity),
    /// Non-owning link to an entity held elsewhere.
    Linked(WeakEntity),
}

impl ComponentRef {
    /// Returns the referenced entity's name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Resolved(entity) => entity.name(),
            Self::Linked(link) => link.name(),
        }
    }

    /// Returns the referenced entity if it has been resolved and is still
    /// alive.
    #[must_use]
    pub fn entity(&self) -> Option<Entity> {
        match self {
            Self::Name(_) => None,
            Self::Resolved(entity) => Some(entity.clone()),
            Self::Linked(link) => link.upgrade(),
        }
    }

    /// Returns true if the reference points to a live materialized entity.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        match self {
            Self::Name(_) => false,
            Self::Resolved(_) => true,
            Self::Linked(link) => link.is_alive(),
        }
    }

    /// Returns true if the reference keeps its target alive.
    #[must_use]
    pub fn is_owning(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

impl PartialEq for ComponentRef {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name() && self.is_resolved() == other.is_resolved()
    }
}

impl Eq for ComponentRef {}

impl fmt::Debug for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "Name({name:?})"),
            Self::Resolved(entity) => write!(f, "Resolved({:?})", entity.name()),
            Self::Linked(link) => write!(f, "Linked({:?})", link.name()),
        }
    }
}

impl From<&str> for ComponentRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for ComponentRef {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<Entity> for ComponentRef {
    fn from(entity: Entity) -> Self {
        Self::Resolved(entity)
    }
}

impl From<WeakEntity> for ComponentRef {
    fn from(link: WeakEntity) -> Self {
        Self::Linked(link)
    }
}

/// Parses a stored `COMPONENTS` value.
///
/// Entries that are not text are dropped with a warning, as is a value that
/// is not a map at all.
pub(crate) fn parse_components(owner: &str, value: &Value) -> BTreeMap<String, ComponentRef> {
    let Some(map) = value.as_map() else {
        if !value.is_null() {
            tracing::warn!(
                entity = owner,
                found = value.type_name(),
                "ignoring COMPONENTS that is not a map"
            );
        }
        return BTreeMap::new();
    };

    map.iter()
        .filter_map(|(kind, target)| match target.as_text() {
            Some(name) => Some((kind.to_uppercase(), ComponentRef::Name(name.to_string()))),
            None => {
                tracing::warn!(
                    entity = owner,
                    component = %kind,
                    found = target.type_name(),
                    "ignoring component reference that is not a name"
                );
                None
            }
        })
        .collect()
}

/// Renders components as a `{type: name}` map.
pub(crate) fn components_to_value(components: &BTreeMap<String, ComponentRef>) -> Value {
    Value::Map(
        components
            .iter()
            .map(|(kind, target)| (kind.clone(), Value::from(target.name())))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsio_codec::Document;

    #[test]
    fn parse_keeps_names_and_uppercases_types() {
        let mut raw = Document::new();
        raw.insert("quote".into(), Value::from("BOND(QUOTE)"));
        raw.insert("BAD".into(), Value::Integer(3));

        let parsed = parse_components("BOND", &Value::Map(raw));
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed["QUOTE"].name(), "BOND(QUOTE)");
        assert!(!parsed["QUOTE"].is_resolved());
    }

    #[test]
    fn non_map_components_are_dropped() {
        assert!(parse_components("X", &Value::from("nope")).is_empty());
        assert!(parse_components("X", &Value::Null).is_empty());
    }

    #[test]
    fn resolved_references_render_as_names() {
        let mut components = BTreeMap::new();
        components.insert("QUOTE".to_string(), ComponentRef::from(Entity::new("Q")));
        components.insert("CALL".to_string(), ComponentRef::from("C"));

        let rendered = components_to_value(&components);
        assert_eq!(rendered.get("QUOTE"), Some(&Value::from("Q")));
        assert_eq!(rendered.get("CALL"), Some(&Value::from("C")));
    }

    #[test]
    fn linked_references_do_not_own_their_target() {
        let target = Entity::new("Q");
        let link = ComponentRef::from(target.downgrade());

        assert_eq!(link.name(), "Q");
        assert!(link.is_resolved());
        assert!(!link.is_owning());
        assert!(link.entity().unwrap().same_instance(&target));
        assert_eq!(link, ComponentRef::from(target.clone()));

        drop(target);
        assert_eq!(link.name(), "Q");
        assert!(!link.is_resolved());
        assert!(link.entity().is_none());
        assert_eq!(link, ComponentRef::from("Q"));
    }
}
