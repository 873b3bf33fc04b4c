//! # tsio Core
//!
//! Entities, ordered collections and component graph expansion for tsio.
//!
//! This crate provides:
//! - [`Entity`], a shared handle to a named record of attributes, component
//!   references and a [`ValueSeries`]
//! - [`EntityCollection`], an insertion-ordered set of entities keyed by name
//! - Depth-bounded component expansion ([`LevelWalk`], [`flatten`])
//! - Conversion between entities and store documents
//!
//! Nothing here talks to a store; see `tsio_sync_engine` for that.
//!
//! ## Example
//!
//! ```rust
//! use tsio_core::{flatten, Entity, EntityCollection, Expansion};
//!
//! let bond = Entity::new("BOND");
//! bond.set_component("quote", "BOND(QUOTE)");
//!
//! let all = flatten(&EntityCollection::from(bond), &Expansion::default());
//! assert_eq!(all.names(), vec!["BOND", "BOND(QUOTE)"]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod constants;
mod collection;
mod document;
mod entity;
mod error;
mod graph;

pub use collection::EntityCollection;
pub use document::{
    entity_to_document, merge_document, series_from_value, series_to_value, DocumentScope,
};
pub use entity::{ComponentRef, Entity, ValueSeries, WeakEntity};
pub use error::{CoreError, CoreResult};
pub use graph::{expand_levels, flatten, ComponentFilter, Depth, Expansion, LevelWalk};
