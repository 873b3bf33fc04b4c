//! CLI command implementations.

pub mod attributes;
pub mod import;
pub mod index;
pub mod remove;
pub mod select;
pub mod show;
pub mod values;

use std::path::Path;
use thiserror::Error;
use tsio_codec::{from_json, Value};
use tsio_core::{ComponentFilter, Depth, Expansion};
use tsio_store::FileStore;
use tsio_sync_engine::{SyncConfig, SyncEngine};

/// Errors raised by the commands themselves.
#[derive(Error, Debug)]
pub enum CliError {
    /// A `--where` argument is not `ATTRIBUTE=VALUE`.
    #[error("invalid predicate '{0}', expected ATTRIBUTE=VALUE")]
    InvalidPredicate(String),

    /// The import file is not a JSON array of objects.
    #[error("invalid import file: {0}")]
    InvalidImport(String),
}

/// Opens the engine over the store at `dir`.
pub fn open_engine(
    dir: &Path,
    collection: &str,
) -> Result<SyncEngine<FileStore>, Box<dyn std::error::Error>> {
    let store = FileStore::open(dir)?;
    tracing::debug!(path = %dir.display(), documents = store.len(), "opened store");
    Ok(SyncEngine::new(SyncConfig::new(collection), store))
}

/// Builds an expansion from command-line flags.
///
/// With `follow` unset no components are followed at all.
pub fn expansion(kinds: Option<&[String]>, depth: Option<usize>, follow: bool) -> Expansion {
    let components = match (follow, kinds) {
        (false, _) => ComponentFilter::None,
        (true, Some(kinds)) => ComponentFilter::only(kinds),
        (true, None) => ComponentFilter::All,
    };
    let depth = depth.map_or(Depth::Unbounded, Depth::Levels);
    Expansion::new(components, depth)
}

/// Parses a command-line value: JSON scalars are typed, anything else is text.
pub fn parse_scalar(text: &str) -> Value {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|json| from_json(json).ok())
        .unwrap_or_else(|| Value::from(text))
}

/// Splits `ATTRIBUTE=VALUE`.
pub fn parse_predicate(text: &str) -> Result<(String, Value), CliError> {
    match text.split_once('=') {
        Some((attribute, value)) if !attribute.trim().is_empty() => {
            Ok((attribute.trim().to_uppercase(), parse_scalar(value.trim())))
        }
        _ => Err(CliError::InvalidPredicate(text.to_string())),
    }
}
