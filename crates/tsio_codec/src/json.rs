//! Conversion between document values and JSON.
//!
//! Timestamps use the extended-JSON form `{"$date": "<rfc3339>"}` so that
//! they survive a round trip through plain JSON files.

use crate::error::CodecResult;
use crate::time::parse_timestamp;
use crate::value::{Document, Value};
use serde_json::{Map, Number, Value as Json};

const DATE_KEY: &str = "$date";

/// Convert a value into JSON.
///
/// NaN floats become `null`.
pub fn to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Integer(n) => Json::Number(Number::from(*n)),
        Value::Float(f) => Number::from_f64(*f).map_or(Json::Null, Json::Number),
        Value::Text(s) => Json::String(s.clone()),
        Value::Timestamp(t) => {
            let mut map = Map::new();
            map.insert(DATE_KEY.to_string(), Json::String(t.to_rfc3339()));
            Json::Object(map)
        }
        Value::Array(items) => Json::Array(items.iter().map(to_json).collect()),
        Value::Map(doc) => document_to_json(doc),
    }
}

/// Convert a document into a JSON object.
pub fn document_to_json(doc: &Document) -> Json {
    Json::Object(doc.iter().map(|(k, v)| (k.clone(), to_json(v))).collect())
}

/// Convert JSON into a value.
///
/// # Errors
///
/// Returns an error if a `{"$date": ...}` object holds an unparsable timestamp.
pub fn from_json(json: Json) -> CodecResult<Value> {
    match json {
        Json::Null => Ok(Value::Null),
        Json::Bool(b) => Ok(Value::Bool(b)),
        Json::Number(n) => Ok(number_to_value(&n)),
        Json::String(s) => Ok(Value::Text(s)),
        Json::Array(items) => items
            .into_iter()
            .map(from_json)
            .collect::<CodecResult<Vec<_>>>()
            .map(Value::Array),
        Json::Object(map) => {
            if map.len() == 1 {
                if let Some(Json::String(s)) = map.get(DATE_KEY) {
                    return parse_timestamp(s).map(Value::Timestamp);
                }
            }
            map.into_iter()
                .map(|(k, v)| from_json(v).map(|v| (k, v)))
                .collect::<CodecResult<Document>>()
                .map(Value::Map)
        }
    }
}

fn number_to_value(n: &Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::Integer(i)
    } else if let Some(u) = n.as_u64() {
        Value::from(u)
    } else {
        n.as_f64().map_or(Value::Null, Value::Float)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn timestamps_use_extended_json() {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let json = to_json(&Value::Timestamp(t));
        assert_eq!(json, json!({"$date": "2024-03-01T12:00:00+00:00"}));
        assert_eq!(from_json(json).unwrap(), Value::Timestamp(t));
    }

    #[test]
    fn objects_become_documents() {
        let value = from_json(json!({
            "TS_NAME": "BOND",
            "PRICE": 10,
            "RATE": 0.5,
            "TAGS": ["a", "b"],
            "FIELD": null
        }))
        .unwrap();

        let doc = value.as_map().unwrap();
        assert_eq!(doc["PRICE"], Value::Integer(10));
        assert_eq!(doc["RATE"], Value::Float(0.5));
        assert_eq!(doc["FIELD"], Value::Null);
        assert_eq!(doc["TAGS"], Value::from(vec!["a", "b"]));
    }

    #[test]
    fn nan_serializes_as_null() {
        assert_eq!(to_json(&Value::Float(f64::NAN)), Json::Null);
    }
}
