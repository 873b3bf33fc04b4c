//! # tsio Store
//!
//! Document store boundary and implementations for tsio.
//!
//! A store holds one collection of flat documents and answers the handful
//! of operations the synchronization engine needs: filtered finds with
//! projections, counts, distinct values, update-many, bulk upserts,
//! delete-many and index creation.
//!
//! ## Design Principles
//!
//! - Stores never interpret entity semantics (names, components, series)
//! - Filters are a small closed algebra, not a query language
//! - Must be `Send + Sync` for concurrent access
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - For testing and ephemeral use
//! - [`FileStore`] - Directory-backed persistent store
//!
//! ## Example
//!
//! ```rust
//! use tsio_codec::{Document, Value};
//! use tsio_store::{DocumentStore, Filter, InMemoryStore};
//!
//! let store = InMemoryStore::new();
//! let mut set = Document::new();
//! set.insert("TS_NAME".into(), Value::from("EURUSD"));
//! store.update_many(&Filter::All, &set).unwrap();
//! assert_eq!(store.count(&Filter::All).unwrap(), 0);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod memory;
mod query;
mod store;
mod write;

pub use error::{StoreError, StoreResult};
pub use file::FileStore;
pub use memory::InMemoryStore;
pub use query::{lookup, Filter, Projection};
pub use store::DocumentStore;
pub use write::{BulkWriteResult, UpdateResult, WriteError, WriteErrorKind, WriteModel};
