//! Values command implementation.

use super::open_engine;
use std::path::Path;
use tsio_codec::to_json;

/// Runs the values command.
pub fn run(
    dir: &Path,
    collection: &str,
    attributes: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_engine(dir, collection)?;
    let scope = (!attributes.is_empty()).then_some(attributes);

    for value in engine.read_all_attribute_values(scope)? {
        println!("{}", to_json(&value));
    }
    Ok(())
}
