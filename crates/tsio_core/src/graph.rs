//! Depth-bounded expansion of the component reference graph.
//!
//! Expansion proceeds level by level. Level 0 is the seed collection; level
//! `n + 1` holds the components discovered on the entities of level `n`.
//! The read path interleaves store queries between levels, so discovery is
//! driven explicitly through [`LevelWalk`]:
//!
//! ```rust
//! use tsio_core::{EntityCollection, Expansion, LevelWalk};
//!
//! let seed = EntityCollection::from("BOND");
//! let expansion = Expansion::default();
//! let mut walk = LevelWalk::new(&seed, &expansion);
//! while let Some(level) = walk.current() {
//!     // merge store documents into `level` here
//!     let _ = level.names();
//!     walk.advance();
//! }
//! assert_eq!(walk.visited().names(), vec!["BOND"]);
//! ```

use crate::collection::EntityCollection;
use crate::entity::Entity;
use std::collections::{BTreeSet, HashMap};

/// Which component types expansion follows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ComponentFilter {
    /// Follow every component.
    #[default]
    All,
    /// Follow no components.
    None,
    /// Follow only these (upper-case) component types.
    Only(BTreeSet<String>),
}

impl ComponentFilter {
    /// Follows only the given component types.
    pub fn only<S: AsRef<str>>(kinds: impl IntoIterator<Item = S>) -> Self {
        Self::Only(kinds.into_iter().map(|k| k.as_ref().to_uppercase()).collect())
    }

    /// Returns true if components of this type are followed.
    #[must_use]
    pub fn allows(&self, kind: &str) -> bool {
        match self {
            Self::All => true,
            Self::None => false,
            Self::Only(kinds) => kinds.contains(&kind.to_uppercase()),
        }
    }

    /// Returns true if no component is ever followed.
    #[must_use]
    pub fn is_none(&self) -> bool {
        match self {
            Self::None => true,
            Self::Only(kinds) => kinds.is_empty(),
            Self::All => false,
        }
    }
}

/// How many levels expansion walks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Depth {
    /// Walk at most this many levels. `Levels(1)` touches only the seed.
    Levels(usize),
    /// Walk until no new component is discovered.
    #[default]
    Unbounded,
}

impl Depth {
    /// Returns true if `level` (0-based) is within the bound.
    #[must_use]
    pub fn allows(&self, level: usize) -> bool {
        match self {
            Self::Levels(limit) => level < *limit,
            Self::Unbounded => true,
        }
    }
}

/// A component filter and depth bound.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expansion {
    /// Component types to follow.
    pub components: ComponentFilter,
    /// Level ceiling.
    pub depth: Depth,
}

impl Expansion {
    /// Creates an expansion.
    #[must_use]
    pub fn new(components: ComponentFilter, depth: Depth) -> Self {
        Self { components, depth }
    }

    /// Only the seed level, no components.
    #[must_use]
    pub fn seed_only() -> Self {
        Self::new(ComponentFilter::None, Depth::Levels(1))
    }

    /// Replaces the component filter.
    #[must_use]
    pub fn with_components(mut self, components: ComponentFilter) -> Self {
        self.components = components;
        self
    }

    /// Replaces the depth bound.
    #[must_use]
    pub fn with_depth(mut self, depth: Depth) -> Self {
        self.depth = depth;
        self
    }

    fn follows_after(&self, level: usize) -> bool {
        !self.components.is_none() && self.depth.allows(level + 1)
    }
}

/// Level-by-level walk over the component graph.
///
/// The walk keeps a per-walk registry of every entity it has handed out.
/// A component naming an already registered entity is linked to that
/// instance and not queued again, so an unbounded walk terminates on
/// cyclic graphs.
///
/// Links to entities discovered on the next level own their target. Links
/// back to the same or an earlier level are
/// [`ComponentRef::Linked`](crate::ComponentRef::Linked), so the
/// graph the walk builds has no owning cycle and is freed once the caller
/// drops its handles.
#[derive(Debug)]
pub struct LevelWalk<'e> {
    expansion: &'e Expansion,
    level: usize,
    frontier: EntityCollection,
    visited: EntityCollection,
    registry: HashMap<String, Entity>,
}

impl<'e> LevelWalk<'e> {
    /// Starts a walk at the seed collection.
    #[must_use]
    pub fn new(seed: &EntityCollection, expansion: &'e Expansion) -> Self {
        let registry = seed
            .iter()
            .map(|e| (e.name().to_string(), e.clone()))
            .collect();
        Self {
            expansion,
            level: 0,
            frontier: seed.copy(),
            visited: EntityCollection::new(),
            registry,
        }
    }

    /// Returns the current 0-based level.
    #[must_use]
    pub fn level(&self) -> usize {
        self.level
    }

    /// Returns the entities of the current level, or `None` once the walk
    /// is over.
    #[must_use]
    pub fn current(&self) -> Option<&EntityCollection> {
        (self.expansion.depth.allows(self.level) && !self.frontier.is_empty())
            .then_some(&self.frontier)
    }

    /// Records the current level and discovers the next one.
    ///
    /// Components are inspected on the current level's entities as they are
    /// now, so callers merge fresh data before advancing. Returns true if
    /// another level is available.
    pub fn advance(&mut self) -> bool {
        if self.current().is_none() {
            return false;
        }

        let frontier = std::mem::take(&mut self.frontier);
        self.visited.extend(frontier.iter());

        let mut next = EntityCollection::new();
        if self.expansion.follows_after(self.level) {
            for entity in frontier.iter() {
                self.discover(entity, &mut next);
            }
        }

        tracing::trace!(
            level = self.level,
            walked = frontier.len(),
            discovered = next.len(),
            "expansion level complete"
        );

        self.frontier = next;
        self.level += 1;
        self.current().is_some()
    }

    fn discover(&mut self, entity: &Entity, next: &mut EntityCollection) {
        for (kind, target) in entity.components() {
            if !self.expansion.components.allows(&kind) {
                continue;
            }

            let name = target.name().to_string();
            let linked = match self.registry.get(&name) {
                Some(known) => known.clone(),
                None => {
                    let fresh = target.entity().unwrap_or_else(|| Entity::new(name.as_str()));
                    self.registry.insert(name, fresh.clone());
                    next.add(fresh.clone());
                    fresh
                }
            };

            let already_linked = target.entity().is_some_and(|e| e.same_instance(&linked));
            if already_linked {
                continue;
            }
            if next.contains(linked.name()) {
                entity.set_component(&kind, linked);
            } else {
                entity.set_component(&kind, linked.downgrade());
            }
        }
    }

    /// Returns every entity walked so far, in discovery order.
    #[must_use]
    pub fn visited(&self) -> &EntityCollection {
        &self.visited
    }

    /// Finishes the walk and returns every entity visited.
    #[must_use]
    pub fn into_visited(mut self) -> EntityCollection {
        while self.advance() {}
        self.visited
    }
}

/// Expands `seed` and returns the union of every level.
///
/// Seeds come first, followed by components in discovery order.
#[must_use]
pub fn flatten(seed: &EntityCollection, expansion: &Expansion) -> EntityCollection {
    LevelWalk::new(seed, expansion).into_visited()
}

/// Expands `seed` and returns the names of each level.
#[must_use]
pub fn expand_levels(seed: &EntityCollection, expansion: &Expansion) -> Vec<Vec<String>> {
    let mut walk = LevelWalk::new(seed, expansion);
    let mut levels = Vec::new();
    while let Some(level) = walk.current() {
        levels.push(level.names());
        walk.advance();
    }
    levels
}
