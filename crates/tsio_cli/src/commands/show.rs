//! Show command implementation.

use super::open_engine;
use std::path::Path;
use tsio_codec::document_to_json;
use tsio_core::{entity_to_document, flatten, DocumentScope, EntityCollection, Expansion};
use tsio_sync_engine::ReadOptions;

/// Runs the show command.
pub fn run(
    dir: &Path,
    collection: &str,
    names: &[String],
    expansion: Expansion,
    with_values: bool,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_engine(dir, collection)?;
    let entities: EntityCollection = names.iter().collect();
    let options = ReadOptions::new(expansion);

    let report = if with_values {
        engine.read(&entities, &options)?
    } else {
        engine.read_attributes(&entities, &options)?
    };
    tracing::debug!(levels = report.levels, documents = report.documents, "read complete");

    let scope = if with_values {
        DocumentScope::Full
    } else {
        DocumentScope::Attributes
    };
    let visited = flatten(&entities, &options.expansion);

    match format {
        "json" => {
            let documents: Vec<_> = visited
                .iter()
                .map(|entity| document_to_json(&entity_to_document(entity, scope)))
                .collect();
            println!("{}", serde_json::to_string_pretty(&documents)?);
        }
        _ => {
            for entity in &visited {
                print!("{entity}");
            }
        }
    }
    Ok(())
}
