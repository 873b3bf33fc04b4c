//! Composable filters and projections.
//!
//! Matching follows document-database conventions:
//! - equality against an array field matches when any element is equal
//! - equality (or set membership) with `null` also matches a missing field
//! - dotted paths (`COMPONENTS.QUOTE`) address fields of nested documents
//! - range operators only compare values of the same kind

use std::cmp::Ordering;
use tsio_codec::{Document, Value, ID_FIELD};

/// A predicate over documents.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document.
    All,
    /// Field equals the value.
    Eq(String, Value),
    /// Field does not equal the value.
    Ne(String, Value),
    /// Field equals any of the values.
    In(String, Vec<Value>),
    /// Field equals none of the values.
    Nin(String, Vec<Value>),
    /// Field is greater than the value.
    Gt(String, Value),
    /// Field is greater than or equal to the value.
    Gte(String, Value),
    /// Field is less than the value.
    Lt(String, Value),
    /// Field is less than or equal to the value.
    Lte(String, Value),
    /// Field is present (`true`) or absent (`false`).
    Exists(String, bool),
    /// All clauses match.
    And(Vec<Filter>),
    /// At least one clause matches.
    Or(Vec<Filter>),
    /// No clause matches.
    Nor(Vec<Filter>),
    /// The inner filter does not match.
    Not(Box<Filter>),
}

impl Filter {
    /// `field == value`.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    /// `field != value`.
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Ne(field.into(), value.into())
    }

    /// `field in values`.
    pub fn is_in<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Filter::In(field.into(), values.into_iter().map(Into::into).collect())
    }

    /// `field not in values`.
    pub fn not_in<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Filter::Nin(field.into(), values.into_iter().map(Into::into).collect())
    }

    /// `field > value`.
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Gt(field.into(), value.into())
    }

    /// `field >= value`.
    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Gte(field.into(), value.into())
    }

    /// `field < value`.
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Lt(field.into(), value.into())
    }

    /// `field <= value`.
    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Lte(field.into(), value.into())
    }

    /// Field presence test.
    pub fn exists(field: impl Into<String>, present: bool) -> Self {
        Filter::Exists(field.into(), present)
    }

    /// Conjunction of clauses.
    pub fn and(clauses: impl IntoIterator<Item = Filter>) -> Self {
        Filter::And(clauses.into_iter().collect())
    }

    /// Disjunction of clauses.
    pub fn or(clauses: impl IntoIterator<Item = Filter>) -> Self {
        Filter::Or(clauses.into_iter().collect())
    }

    /// Negated disjunction of clauses.
    pub fn nor(clauses: impl IntoIterator<Item = Filter>) -> Self {
        Filter::Nor(clauses.into_iter().collect())
    }

    /// Negation.
    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: Filter) -> Self {
        Filter::Not(Box::new(inner))
    }

    /// Evaluates this filter against a document.
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(field, operand) => equals(lookup(doc, field), operand),
            Filter::Ne(field, operand) => !equals(lookup(doc, field), operand),
            Filter::In(field, operands) => {
                let found = lookup(doc, field);
                operands.iter().any(|operand| equals(found, operand))
            }
            Filter::Nin(field, operands) => {
                let found = lookup(doc, field);
                !operands.iter().any(|operand| equals(found, operand))
            }
            Filter::Gt(field, operand) => compares(lookup(doc, field), operand, |o| o.is_gt()),
            Filter::Gte(field, operand) => compares(lookup(doc, field), operand, |o| o.is_ge()),
            Filter::Lt(field, operand) => compares(lookup(doc, field), operand, |o| o.is_lt()),
            Filter::Lte(field, operand) => compares(lookup(doc, field), operand, |o| o.is_le()),
            Filter::Exists(field, present) => lookup(doc, field).is_some() == *present,
            Filter::And(clauses) => clauses.iter().all(|c| c.matches(doc)),
            Filter::Or(clauses) => clauses.iter().any(|c| c.matches(doc)),
            Filter::Nor(clauses) => !clauses.iter().any(|c| c.matches(doc)),
            Filter::Not(inner) => !inner.matches(doc),
        }
    }

    /// Collects the top-level equality constraints of this filter.
    ///
    /// These seed a document inserted by an upsert.
    pub fn equality_fields(&self) -> Document {
        let mut fields = Document::new();
        self.collect_equalities(&mut fields);
        fields
    }

    fn collect_equalities(&self, fields: &mut Document) {
        match self {
            Filter::Eq(field, value) if !field.contains('.') => {
                fields.insert(field.clone(), value.clone());
            }
            Filter::In(field, values) if values.len() == 1 && !field.contains('.') => {
                fields.insert(field.clone(), values[0].clone());
            }
            Filter::And(clauses) => {
                for clause in clauses {
                    clause.collect_equalities(fields);
                }
            }
            _ => {}
        }
    }
}

/// Resolves a possibly dotted field path inside a document.
pub fn lookup<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        current = current.as_map()?.get(part)?;
    }
    Some(current)
}

fn equals(found: Option<&Value>, operand: &Value) -> bool {
    match found {
        None => operand.is_null(),
        Some(Value::Array(items)) => {
            items.iter().any(|item| item.loose_eq(operand))
                || Value::Array(items.clone()).loose_eq(operand)
        }
        Some(value) => value.loose_eq(operand),
    }
}

fn compares(found: Option<&Value>, operand: &Value, accept: fn(Ordering) -> bool) -> bool {
    let same_kind = |value: &Value| {
        (value.as_f64().is_some() && operand.as_f64().is_some())
            || std::mem::discriminant(value) == std::mem::discriminant(operand)
    };
    match found {
        None => false,
        Some(Value::Array(items)) => items
            .iter()
            .any(|item| same_kind(item) && accept(item.cmp_total(operand))),
        Some(value) => same_kind(value) && accept(value.cmp_total(operand)),
    }
}

/// Which fields a query returns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Projection {
    /// Every field.
    #[default]
    All,
    /// Only the listed top-level fields (plus `_id`).
    Include(Vec<String>),
    /// Every field except the listed ones.
    Exclude(Vec<String>),
}

impl Projection {
    /// Builds an inclusion projection.
    pub fn include<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Projection::Include(fields.into_iter().map(Into::into).collect())
    }

    /// Builds an exclusion projection.
    pub fn exclude<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Projection::Exclude(fields.into_iter().map(Into::into).collect())
    }

    /// Applies this projection to a document.
    pub fn apply(&self, doc: &Document) -> Document {
        match self {
            Projection::All => doc.clone(),
            Projection::Include(fields) => doc
                .iter()
                .filter(|(k, _)| k.as_str() == ID_FIELD || fields.iter().any(|f| f == *k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            Projection::Exclude(fields) => doc
                .iter()
                .filter(|(k, _)| !fields.iter().any(|f| f == *k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(pairs: &[(&str, Value)]) -> Document {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn equality_reaches_into_arrays() {
        let d = doc(&[("STATUS", Value::from(vec!["active", "listed"]))]);
        assert!(Filter::eq("STATUS", "active").matches(&d));
        assert!(!Filter::eq("STATUS", "retired").matches(&d));
        assert!(Filter::is_in("STATUS", ["retired", "listed"]).matches(&d));
    }

    #[test]
    fn null_matches_missing_field() {
        let with_field = doc(&[("FIELD", Value::from("QUOTE"))]);
        let without_field = doc(&[("TYPE", Value::from("bond"))]);
        let null_field = doc(&[("FIELD", Value::Null)]);

        let filter = Filter::is_in("FIELD", [Value::Null]);
        assert!(!filter.matches(&with_field));
        assert!(filter.matches(&without_field));
        assert!(filter.matches(&null_field));
    }

    #[test]
    fn numbers_match_across_representations() {
        let d = doc(&[("PRICE", Value::Float(10.0))]);
        assert!(Filter::eq("PRICE", 10i64).matches(&d));
        assert!(Filter::gt("PRICE", 9i64).matches(&d));
        assert!(!Filter::lt("PRICE", 10i64).matches(&d));
        assert!(Filter::lte("PRICE", 10i64).matches(&d));
    }

    #[test]
    fn ranges_do_not_cross_kinds() {
        let d = doc(&[("PRICE", Value::from("cheap"))]);
        assert!(!Filter::gt("PRICE", 0i64).matches(&d));
        assert!(!Filter::lt("PRICE", 0i64).matches(&d));
    }

    #[test]
    fn dotted_paths_address_nested_documents() {
        let components = doc(&[("QUOTE", Value::from("BOND(QUOTE)"))]);
        let d = doc(&[("COMPONENTS", Value::Map(components))]);

        assert!(Filter::eq("COMPONENTS.QUOTE", "BOND(QUOTE)").matches(&d));
        assert!(Filter::exists("COMPONENTS.QUOTE", true).matches(&d));
        assert!(Filter::exists("COMPONENTS.CALL", false).matches(&d));
    }

    #[test]
    fn boolean_combinators() {
        let d = doc(&[("TYPE", Value::from("bond")), ("STATUS", Value::from("active"))]);
        let bond = Filter::eq("TYPE", "bond");
        let equity = Filter::eq("TYPE", "equity");

        assert!(Filter::and([bond.clone(), Filter::eq("STATUS", "active")]).matches(&d));
        assert!(!Filter::and([bond.clone(), equity.clone()]).matches(&d));
        assert!(Filter::or([bond.clone(), equity.clone()]).matches(&d));
        assert!(Filter::nor([equity.clone()]).matches(&d));
        assert!(Filter::not(equity).matches(&d));
        assert!(Filter::ne("TYPE", "equity").matches(&d));
        assert!(Filter::not_in("TYPE", ["equity", "fx"]).matches(&d));
        assert!(Filter::And(vec![]).matches(&d));
    }

    #[test]
    fn equality_fields_seed_upserts() {
        let filter = Filter::and([
            Filter::eq("TS_NAME", "BOND"),
            Filter::gt("PRICE", 1i64),
            Filter::is_in("TYPE", ["bond"]),
        ]);
        let seed = filter.equality_fields();
        assert_eq!(seed.len(), 2);
        assert_eq!(seed["TS_NAME"], Value::from("BOND"));
        assert_eq!(seed["TYPE"], Value::from("bond"));
    }

    #[test]
    fn projections() {
        let d = doc(&[
            (ID_FIELD, Value::from("id-1")),
            ("TS_NAME", Value::from("BOND")),
            ("VALUE", Value::Map(Document::new())),
            ("PRICE", Value::Integer(3)),
        ]);

        let included = Projection::include(["TS_NAME"]).apply(&d);
        assert_eq!(included.len(), 2);
        assert!(included.contains_key(ID_FIELD));

        let excluded = Projection::exclude(["VALUE"]).apply(&d);
        assert_eq!(excluded.len(), 3);
        assert!(!excluded.contains_key("VALUE"));

        assert_eq!(Projection::All.apply(&d), d);
    }
}
