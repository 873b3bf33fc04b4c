//! # tsio Sync Engine
//!
//! Moves entity graphs between memory and a document store.
//!
//! This crate provides:
//! - Graph-expanding reads, level by level, one query per level
//! - Batched upsert writes, split into chunks under the store's ceiling
//! - Confirmed removal of entities and, optionally, their components
//! - Attribute selection with `And` / `Or` / `All` modes
//! - Routing of reads to external sources
//!
//! ## Key Invariants
//!
//! - Reads merge into the caller's entities; nothing is cached between calls
//! - A name is visited at most once per call, so cyclic graphs terminate
//! - No bulk submission exceeds the configured batch ceiling
//! - Nothing is deleted without confirmation

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod engine;
mod error;
mod external;
mod select;

pub use config::{ReadOptions, RemoveOptions, SyncConfig, WriteOptions};
pub use engine::{EngineStats, ReadReport, RemoveOutcome, SyncEngine, WriteReport};
pub use error::{RejectedWrite, SyncError, SyncResult};
pub use external::{partition_by_source, ExternalSource, RoutedEngine};
pub use select::{SelectMode, Selection};
