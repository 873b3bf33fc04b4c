//! Attributes command implementation.

use super::open_engine;
use std::path::Path;

/// Runs the attributes command.
pub fn run(dir: &Path, collection: &str, names: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_engine(dir, collection)?;
    let scope = (!names.is_empty()).then_some(names);

    for attribute in engine.attribute_names(scope)? {
        println!("{attribute}");
    }
    Ok(())
}
