//! Named entities with attributes, components and a value series.

mod component;
mod series;

pub use component::ComponentRef;
pub use series::ValueSeries;

pub(crate) use component::{components_to_value, parse_components};

use crate::constants::COMPONENTS;
use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};
use tsio_codec::Value;

/// A named record synchronized with the document store.
///
/// `Entity` is a shared handle: cloning it yields another handle to the
/// same record, so a merge through one handle is visible through every
/// other. Use [`Entity::deep_clone`] for an independent copy.
///
/// # Identity
///
/// Equality and hashing use the name only. Two handles to different
/// records with the same name compare equal; use [`Entity::same_instance`]
/// to tell them apart.
///
/// # Attributes
///
/// Attribute names are upper-cased on the way in and looked up
/// case-insensitively. The reserved `COMPONENTS` attribute is held as a
/// typed component map rather than as a plain value.
///
/// # Example
///
/// ```rust
/// use tsio_codec::Value;
/// use tsio_core::Entity;
///
/// let bond = Entity::new("BOND");
/// bond.set_attribute("price", Value::Integer(10));
/// assert_eq!(bond.get_attribute("PRICE"), Some(Value::Integer(10)));
///
/// let alias = bond.clone();
/// alias.set_attribute("coupon", Value::Float(2.5));
/// assert!(bond.get_attribute("coupon").is_some());
/// ```
#[derive(Clone)]
pub struct Entity {
    inner: Arc<EntityInner>,
}

/// A non-owning handle to an [`Entity`].
///
/// Keeps the name, so a link whose target has been dropped can still be
/// written back as a plain reference.
#[derive(Clone)]
pub struct WeakEntity {
    name: String,
    inner: Weak<EntityInner>,
}

impl WeakEntity {
    /// Returns the target's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a handle to the target if it is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Entity> {
        self.inner.upgrade().map(|inner| Entity { inner })
    }

    /// Returns true while some owning handle to the target exists.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl fmt::Debug for WeakEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <WeakEntity>", self.name)
    }
}

struct EntityInner {
    name: String,
    state: RwLock<EntityState>,
}

#[derive(Default)]
struct EntityState {
    attributes: BTreeMap<String, Value>,
    components: BTreeMap<String, ComponentRef>,
    values: ValueSeries,
}

impl Entity {
    /// Creates an entity with no attributes, components or values.
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_state(name.into(), EntityState::default())
    }

    fn from_state(name: String, state: EntityState) -> Self {
        Self {
            inner: Arc::new(EntityInner {
                name,
                state: RwLock::new(state),
            }),
        }
    }

    /// Creates a stub entity from a text value.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for any value that is not text.
    pub fn from_value(value: &Value) -> CoreResult<Self> {
        match value.as_text() {
            Some(name) => Ok(Self::new(name)),
            None => Err(CoreError::invalid_argument(format!(
                "cannot build an entity from a {} value",
                value.type_name()
            ))),
        }
    }

    /// Returns the entity's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns true if both handles point to the same record.
    #[must_use]
    pub fn same_instance(&self, other: &Entity) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns a non-owning handle to this record.
    #[must_use]
    pub fn downgrade(&self) -> WeakEntity {
        WeakEntity {
            name: self.name().to_string(),
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Returns true when there are no attributes, components or values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let state = self.inner.state.read();
        state.attributes.is_empty() && state.components.is_empty() && state.values.is_empty()
    }

    /// Sets one attribute, overwriting any previous value.
    pub fn set_attribute(&self, name: &str, value: Value) {
        let key = name.to_uppercase();
        let mut state = self.inner.state.write();
        if key == COMPONENTS {
            state.components = parse_components(self.name(), &value);
        } else {
            state.attributes.insert(key, value);
        }
    }

    /// Replaces every attribute, components included.
    pub fn set_attributes<K, I>(&self, attributes: I)
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, Value)>,
    {
        {
            let mut state = self.inner.state.write();
            state.attributes.clear();
            state.components.clear();
        }
        self.update_attributes(attributes);
    }

    /// Merges attributes, overwriting on key collision.
    ///
    /// A `COMPONENTS` entry replaces the whole component map.
    pub fn update_attributes<K, I>(&self, attributes: I)
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let mut state = self.inner.state.write();
        for (name, value) in attributes {
            let key = name.as_ref().to_uppercase();
            if key == COMPONENTS {
                state.components = parse_components(self.name(), &value);
            } else {
                state.attributes.insert(key, value);
            }
        }
    }

    /// Looks up an attribute case-insensitively.
    ///
    /// `COMPONENTS` is returned as a `{type: name}` map when the entity has
    /// components.
    #[must_use]
    pub fn get_attribute(&self, name: &str) -> Option<Value> {
        let key = name.to_uppercase();
        let state = self.inner.state.read();
        if key == COMPONENTS {
            return (!state.components.is_empty())
                .then(|| components_to_value(&state.components));
        }
        state.attributes.get(&key).cloned()
    }

    /// Looks up an attribute, returning `default` when absent.
    #[must_use]
    pub fn get_attribute_or(&self, name: &str, default: Value) -> Value {
        self.get_attribute(name).unwrap_or(default)
    }

    /// Returns a snapshot of the plain attributes (components excluded).
    #[must_use]
    pub fn attributes(&self) -> BTreeMap<String, Value> {
        self.inner.state.read().attributes.clone()
    }

    /// Returns a snapshot of the component references.
    #[must_use]
    pub fn components(&self) -> BTreeMap<String, ComponentRef> {
        self.inner.state.read().components.clone()
    }

    /// Returns the reference held under a component type.
    #[must_use]
    pub fn component(&self, kind: &str) -> Option<ComponentRef> {
        self.inner
            .state
            .read()
            .components
            .get(&kind.to_uppercase())
            .cloned()
    }

    /// Sets a component reference.
    pub fn set_component(&self, kind: &str, target: impl Into<ComponentRef>) {
        self.inner
            .state
            .write()
            .components
            .insert(kind.to_uppercase(), target.into());
    }

    /// Turns every resolved or linked component back into a bare name.
    ///
    /// Expansion never builds owning cycles, but a graph wired by hand with
    /// [`Entity::set_component`] can. Detaching breaks such a cycle.
    pub fn detach_components(&self) {
        let mut state = self.inner.state.write();
        for target in state.components.values_mut() {
            if !matches!(target, ComponentRef::Name(_)) {
                *target = ComponentRef::Name(target.name().to_string());
            }
        }
    }

    /// Returns a snapshot of the value series.
    #[must_use]
    pub fn values(&self) -> ValueSeries {
        self.inner.state.read().values.clone()
    }

    /// Merges observations into the value series. See [`ValueSeries::merge`].
    pub fn update_values<I>(&self, incoming: I)
    where
        I: IntoIterator<Item = (DateTime<Utc>, Option<f64>)>,
    {
        self.inner.state.write().values.merge(incoming);
    }

    /// Merges a whole series, its observations winning.
    pub fn update_series(&self, incoming: &ValueSeries) {
        self.inner.state.write().values.merge_series(incoming);
    }

    /// Looks up a value. See [`ValueSeries::value_at`].
    #[must_use]
    pub fn get_value(&self, at: &DateTime<Utc>, last_available: bool, fill: f64) -> f64 {
        self.inner.state.read().values.value_at(at, last_available, fill)
    }

    /// Looks up several values. See [`ValueSeries::values_at`].
    #[must_use]
    pub fn get_values(&self, ats: &[DateTime<Utc>], last_available: bool, fill: f64) -> Vec<f64> {
        self.inner.state.read().values.values_at(ats, last_available, fill)
    }

    /// Returns an independent copy of this entity and its resolved components.
    ///
    /// Component cycles are reproduced in the copy rather than followed
    /// forever.
    #[must_use]
    pub fn deep_clone(&self) -> Entity {
        let mut memo = HashMap::new();
        self.deep_clone_into(&mut memo)
    }

    fn deep_clone_into(&self, memo: &mut HashMap<*const EntityInner, Entity>) -> Entity {
        let key = Arc::as_ptr(&self.inner);
        if let Some(copy) = memo.get(&key) {
            return copy.clone();
        }

        let (attributes, components, values) = {
            let state = self.inner.state.read();
            (
                state.attributes.clone(),
                state.components.clone(),
                state.values.clone(),
            )
        };

        let copy = Self::from_state(
            self.name().to_string(),
            EntityState {
                attributes,
                components: BTreeMap::new(),
                values,
            },
        );
        memo.insert(key, copy.clone());

        let copied: BTreeMap<_, _> = components
            .into_iter()
            .map(|(kind, target)| {
                let target = match target {
                    ComponentRef::Resolved(entity) => {
                        ComponentRef::Resolved(entity.deep_clone_into(memo))
                    }
                    ComponentRef::Linked(link) => match link.upgrade() {
                        Some(entity) => {
                            ComponentRef::Linked(entity.deep_clone_into(memo).downgrade())
                        }
                        None => ComponentRef::Name(link.name().to_string()),
                    },
                    name @ ComponentRef::Name(_) => name,
                };
                (kind, target)
            })
            .collect();
        copy.inner.state.write().components = copied;

        copy
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Eq for Entity {}

impl Hash for Entity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name().hash(state);
    }
}

impl AsRef<str> for Entity {
    fn as_ref(&self) -> &str {
        self.name()
    }
}

impl From<&str> for Entity {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Entity {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<&String> for Entity {
    fn from(name: &String) -> Self {
        Self::new(name.as_str())
    }
}

impl From<&Entity> for Entity {
    fn from(entity: &Entity) -> Self {
        entity.clone()
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <Entity>", self.name())
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(20);
        let state = self.inner.state.read();

        writeln!(f, "{}", "=".repeat(20))?;
        writeln!(f, "{}", self.name())?;
        writeln!(f, "{rule}")?;
        writeln!(f, "attributes:")?;
        for (key, value) in &state.attributes {
            writeln!(f, "  {key}: {value:?}")?;
        }
        for (kind, target) in &state.components {
            writeln!(f, "  {COMPONENTS}.{kind}: {}", target.name())?;
        }
        writeln!(f, "{rule}")?;
        writeln!(f, "values:")?;
        write!(f, "{}", state.values)?;
        writeln!(f, "{}", "=".repeat(20))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn stub_is_empty() {
        let entity = Entity::new("BOND");
        assert!(entity.is_empty());
        assert!(entity.values().is_empty());
        assert_eq!(entity.get_attribute("anything"), None);
    }

    #[test]
    fn attribute_keys_are_uppercased() {
        let entity = Entity::new("BOND");
        entity.set_attribute("Price", Value::Integer(10));
        entity.update_attributes([("coupon", Value::Float(2.0)), ("price", Value::Integer(11))]);

        let attributes = entity.attributes();
        assert_eq!(attributes.keys().collect::<Vec<_>>(), vec!["COUPON", "PRICE"]);
        assert_eq!(entity.get_attribute("pRiCe"), Some(Value::Integer(11)));
        assert_eq!(entity.get_attribute_or("MISSING", Value::Null), Value::Null);
    }

    #[test]
    fn set_attributes_replaces_everything() {
        let entity = Entity::new("BOND");
        entity.set_attribute("A", Value::Integer(1));
        entity.set_component("quote", "BOND(QUOTE)");

        entity.set_attributes([("b", Value::Integer(2))]);
        assert_eq!(entity.get_attribute("A"), None);
        assert_eq!(entity.get_attribute("B"), Some(Value::Integer(2)));
        assert!(entity.components().is_empty());
    }

    #[test]
    fn components_attribute_is_typed() {
        let mut raw = tsio_codec::Document::new();
        raw.insert("quote".into(), Value::from("BOND(QUOTE)"));

        let entity = Entity::new("BOND");
        entity.update_attributes([("components", Value::Map(raw))]);

        assert!(entity.attributes().is_empty());
        assert_eq!(
            entity.component("QUOTE").map(|c| c.name().to_string()),
            Some("BOND(QUOTE)".to_string())
        );
        let rendered = entity.get_attribute(COMPONENTS).unwrap();
        assert_eq!(rendered.get("QUOTE"), Some(&Value::from("BOND(QUOTE)")));
    }

    #[test]
    fn clones_alias_the_same_record() {
        let entity = Entity::new("BOND");
        let alias = entity.clone();
        alias.update_values([(day(1), Some(1.0))]);

        assert!(entity.same_instance(&alias));
        assert_eq!(entity.values().len(), 1);
    }

    #[test]
    fn equality_is_by_name() {
        let a = Entity::new("X");
        let b = Entity::new("X");
        b.set_attribute("A", Value::Integer(1));

        assert_eq!(a, b);
        assert!(!a.same_instance(&b));
        assert_ne!(a, Entity::new("Y"));
    }

    #[test]
    fn from_value_rejects_non_text() {
        assert_eq!(Entity::from_value(&Value::from("A")).unwrap().name(), "A");
        assert!(matches!(
            Entity::from_value(&Value::Integer(1)),
            Err(CoreError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn deep_clone_is_independent_and_cycle_safe() {
        let a = Entity::new("A");
        let b = Entity::new("B");
        a.set_component("next", b.clone());
        b.set_component("next", a.clone());
        a.set_attribute("X", Value::Integer(1));

        let copy = a.deep_clone();
        copy.set_attribute("X", Value::Integer(2));
        assert_eq!(a.get_attribute("X"), Some(Value::Integer(1)));

        let copied_b = copy.component("NEXT").and_then(|c| c.entity()).unwrap();
        assert!(!copied_b.same_instance(&b));
        let back = copied_b.component("NEXT").and_then(|c| c.entity()).unwrap();
        assert!(back.same_instance(&copy));

        a.detach_components();
        b.detach_components();
        copy.detach_components();
        copied_b.detach_components();
    }

    #[test]
    fn detach_keeps_names_of_linked_components() {
        let a = Entity::new("A");
        let b = Entity::new("B");
        a.set_component("next", b.clone());
        a.set_component("peer", b.downgrade());

        a.detach_components();
        let components = a.components();
        assert_eq!(components["NEXT"], ComponentRef::from("B"));
        assert_eq!(components["PEER"], ComponentRef::from("B"));
        assert!(components.values().all(|c| !c.is_resolved()));
    }

    #[test]
    fn downgraded_handles_expire_with_the_record() {
        let entity = Entity::new("BOND");
        let weak = entity.downgrade();
        assert!(weak.upgrade().unwrap().same_instance(&entity));

        drop(entity);
        assert!(!weak.is_alive());
        assert!(weak.upgrade().is_none());
        assert_eq!(weak.name(), "BOND");
    }

    #[test]
    fn value_lookup_goes_through_series() {
        let entity = Entity::new("BOND");
        entity.update_values([(day(2), Some(2.0))]);
        assert_eq!(entity.get_value(&day(3), true, 0.0), 2.0);
        assert_eq!(entity.get_values(&[day(1), day(2)], false, 0.0), vec![0.0, 2.0]);
    }

    #[test]
    fn display_lists_name_and_values() {
        let entity = Entity::new("BOND");
        entity.set_attribute("PRICE", Value::Integer(10));
        entity.update_values([(day(1), Some(1.5))]);

        let text = entity.to_string();
        assert!(text.contains("BOND"));
        assert!(text.contains("PRICE"));
        assert!(text.contains("1.5"));
        assert_eq!(format!("{entity:?}"), "BOND <Entity>");
    }
}
