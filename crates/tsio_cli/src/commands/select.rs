//! Select command implementation.

use super::{open_engine, parse_predicate};
use serde::Serialize;
use std::path::Path;
use tsio_codec::parse_timestamp;
use tsio_sync_engine::{SelectMode, Selection};

/// Selection result.
#[derive(Debug, Serialize)]
pub struct SelectResult {
    /// Mode the predicates were combined with.
    pub mode: String,
    /// Number of matching entities.
    pub count: usize,
    /// Names of the matching entities.
    pub names: Vec<String>,
}

/// Builds a selection from command-line arguments.
pub fn build_selection(
    predicates: &[String],
    mode: &str,
    all_fields: bool,
    dates: &[String],
) -> Result<Selection, Box<dyn std::error::Error>> {
    let mode: SelectMode = mode.parse()?;
    let mut selection = Selection::new().mode(mode);
    for text in predicates {
        let (attribute, value) = parse_predicate(text)?;
        selection = selection.matching(&attribute, [value]);
    }
    if all_fields {
        selection = selection.all_fields();
    }
    if !dates.is_empty() {
        let dates = dates
            .iter()
            .map(|d| parse_timestamp(d))
            .collect::<Result<Vec<_>, _>>()?;
        selection = selection.available_on(dates);
    }
    Ok(selection)
}

/// Runs the select command.
pub fn run(
    dir: &Path,
    collection: &str,
    predicates: &[String],
    mode: &str,
    all_fields: bool,
    dates: &[String],
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let selection = build_selection(predicates, mode, all_fields, dates)?;
    let engine = open_engine(dir, collection)?;
    let found = engine.select(&selection)?;

    let result = SelectResult {
        mode: mode.to_lowercase(),
        count: found.len(),
        names: found.names(),
    };

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => {
            for name in &result.names {
                println!("{name}");
            }
            println!("({} matching)", result.count);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsio_codec::Value;
    use tsio_core::constants::FIELD;
    use tsio_store::Filter;

    #[test]
    fn repeated_predicates_widen() {
        let selection = build_selection(
            &["type=bond".to_string(), "TYPE=note".to_string()],
            "and",
            true,
            &[],
        )
        .unwrap();
        assert_eq!(
            selection.filter(),
            Filter::and([Filter::is_in("TYPE", ["bond", "note"])])
        );
    }

    #[test]
    fn unknown_mode_selects_everything() {
        let selection = build_selection(&["type=bond".to_string()], "any", false, &[]).unwrap();
        assert_eq!(selection.filter(), Filter::All);

        let or = build_selection(&["price=10".to_string()], "or", false, &[]).unwrap();
        assert_eq!(
            or.filter(),
            Filter::and([
                Filter::or([Filter::is_in("PRICE", [Value::Integer(10)])]),
                Filter::is_in(FIELD, [Value::Null]),
            ])
        );
    }

    #[test]
    fn bad_dates_fail() {
        assert!(build_selection(&[], "and", false, &["yesterday".to_string()]).is_err());
    }
}
