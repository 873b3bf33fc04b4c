//! # tsio Testkit
//!
//! Test utilities for tsio.
//!
//! This crate provides:
//! - Entity graph fixtures (chains, cycles, fan-outs) and dated series
//! - Store helpers, including a temporary [`tsio_store::FileStore`]
//! - [`RecordingStore`], a store wrapper that logs every bulk submission
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use tsio_testkit::prelude::*;
//!
//! let entities = chain(&["A", "B", "C"]);
//! assert_eq!(entities.len(), 3);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod recording;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::recording::*;
}

pub use fixtures::*;
pub use generators::*;
pub use recording::*;
