//! Index command implementation.

use super::open_engine;
use std::path::Path;

/// Runs the index command.
pub fn run(
    dir: &Path,
    collection: &str,
    attributes: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_engine(dir, collection)?;
    for name in engine.ensure_index(attributes)? {
        println!("Created index {name}");
    }
    Ok(())
}
