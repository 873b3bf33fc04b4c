//! Import command implementation.

use super::{open_engine, CliError};
use std::path::Path;
use tsio_codec::{from_json, Value};
use tsio_core::{Entity, EntityCollection, Expansion};
use tsio_sync_engine::WriteOptions;

/// Runs the import command.
///
/// The file holds a JSON array of documents, each with a `TS_NAME`.
/// Components are referenced by name and are not written unless they have
/// their own document in the file.
pub fn run(
    dir: &Path,
    collection: &str,
    file: &Path,
    attributes_only: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(file)?;
    let entities = parse_entities(&text)?;

    let engine = open_engine(dir, collection)?;
    let options = WriteOptions::new(Expansion::seed_only());
    let report = if attributes_only {
        engine.write_attributes(&entities, &options)?
    } else {
        engine.write(&entities, &options)?
    };

    println!(
        "Imported {} entities in {} submission(s): {} inserted, {} updated",
        report.documents, report.submissions, report.result.upserted, report.result.modified
    );
    Ok(())
}

/// Parses a JSON array of documents into entities.
pub fn parse_entities(text: &str) -> Result<EntityCollection, Box<dyn std::error::Error>> {
    let json: serde_json::Value = serde_json::from_str(text)?;
    let Value::Array(items) = from_json(json)? else {
        return Err(CliError::InvalidImport("expected a JSON array".to_string()).into());
    };

    let mut entities = EntityCollection::with_capacity(items.len());
    for (position, item) in items.into_iter().enumerate() {
        let Value::Map(doc) = item else {
            return Err(CliError::InvalidImport(format!("item {position} is not an object")).into());
        };
        entities.add(Entity::from_document(doc)?);
    }
    Ok(entities)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_become_entities() {
        let entities = parse_entities(
            r#"[
                {"TS_NAME": "BOND", "price": 10, "COMPONENTS": {"quote": "BOND(QUOTE)"},
                 "VALUE": {"2024-01-01": 1.5}},
                {"TS_NAME": "BOND(QUOTE)"}
            ]"#,
        )
        .unwrap();

        assert_eq!(entities.names(), vec!["BOND", "BOND(QUOTE)"]);
        let bond = entities.get("BOND").unwrap();
        assert_eq!(bond.get_attribute("PRICE"), Some(Value::Integer(10)));
        assert_eq!(bond.component("QUOTE").unwrap().name(), "BOND(QUOTE)");
        assert_eq!(bond.values().len(), 1);
    }

    #[test]
    fn non_arrays_are_rejected() {
        assert!(parse_entities(r#"{"TS_NAME": "BOND"}"#).is_err());
        assert!(parse_entities(r#"[1]"#).is_err());
        assert!(parse_entities(r#"[{"price": 1}]"#).is_err());
    }
}
