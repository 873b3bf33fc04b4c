//! Write models and bulk write results.

use crate::query::Filter;
use tsio_codec::{Document, Value};

/// A single "find, optionally upsert, set fields" write.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteModel {
    /// Selects the document to update (the first match is updated).
    pub filter: Filter,
    /// Fields to set on the matched document.
    pub set: Document,
    /// Insert a new document when nothing matches.
    pub upsert: bool,
}

impl WriteModel {
    /// Creates an upserting set-fields write.
    pub fn upsert_set(filter: Filter, set: Document) -> Self {
        Self {
            filter,
            set,
            upsert: true,
        }
    }
}

/// Why a write was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteErrorKind {
    /// A field name is empty, starts with `$` or contains `.`.
    InvalidFieldName,
    /// The write tried to change a document's `_id`.
    ImmutableField,
}

/// Diagnostic for one rejected write of a bulk submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteError {
    /// Position of the write in the submission.
    pub index: usize,
    /// Rejection category.
    pub kind: WriteErrorKind,
    /// Human readable description.
    pub message: String,
}

/// Counts reported by a bulk submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkWriteResult {
    /// Writes whose filter matched an existing document.
    pub matched: u64,
    /// Matched documents that actually changed.
    pub modified: u64,
    /// Documents inserted by upsert.
    pub upserted: u64,
}

impl BulkWriteResult {
    /// Adds another result's counts into this one.
    pub fn absorb(&mut self, other: &BulkWriteResult) {
        self.matched += other.matched;
        self.modified += other.modified;
        self.upserted += other.upserted;
    }
}

/// Counts reported by an update-many.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateResult {
    /// Documents matched by the filter.
    pub matched: u64,
    /// Matched documents that actually changed.
    pub modified: u64,
}

/// Checks every field name of a document, nested documents included.
///
/// Returns a description of the first offending name.
pub(crate) fn invalid_field_name(doc: &Document) -> Option<String> {
    for (key, value) in doc {
        if key.is_empty() {
            return Some("empty field name".to_string());
        }
        if key.starts_with('$') {
            return Some(format!("field name '{key}' must not start with '$'"));
        }
        if key.contains('.') {
            return Some(format!("field name '{key}' must not contain '.'"));
        }
        if let Value::Map(nested) = value {
            if let Some(problem) = invalid_field_name(nested) {
                return Some(problem);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names_are_checked_recursively() {
        let mut ok = Document::new();
        ok.insert("PRICE".into(), Value::Integer(1));
        assert_eq!(invalid_field_name(&ok), None);

        let mut nested = Document::new();
        nested.insert("$bad".into(), Value::Null);
        let mut outer = Document::new();
        outer.insert("COMPONENTS".into(), Value::Map(nested));
        assert!(invalid_field_name(&outer).unwrap().contains("$bad"));

        let mut dotted = Document::new();
        dotted.insert("A.B".into(), Value::Null);
        assert!(invalid_field_name(&dotted).unwrap().contains("A.B"));
    }

    #[test]
    fn results_accumulate() {
        let mut total = BulkWriteResult::default();
        total.absorb(&BulkWriteResult {
            matched: 2,
            modified: 1,
            upserted: 3,
        });
        total.absorb(&BulkWriteResult {
            matched: 1,
            modified: 1,
            upserted: 0,
        });
        assert_eq!(
            total,
            BulkWriteResult {
                matched: 3,
                modified: 2,
                upserted: 3,
            }
        );
    }
}
