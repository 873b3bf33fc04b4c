//! CBOR decoding for persisted documents.

use crate::encoder::{TAG_DATETIME_EPOCH, TAG_DATETIME_TEXT};
use crate::error::{CodecError, CodecResult};
use crate::value::{Document, Value};
use chrono::{DateTime, Utc};
use ciborium::value::Value as Cbor;

/// Decode a value from CBOR bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not valid CBOR or contain a shape
/// that has no document representation (byte strings, non-text map keys).
pub fn from_cbor(bytes: &[u8]) -> CodecResult<Value> {
    let cbor: Cbor =
        ciborium::from_reader(bytes).map_err(|e| CodecError::decoding_failed(e.to_string()))?;
    from_cbor_value(cbor)
}

/// Decode a CBOR array of documents written by [`crate::encode_documents`].
///
/// # Errors
///
/// Returns an error if the payload is not an array of maps.
pub fn decode_documents(bytes: &[u8]) -> CodecResult<Vec<Document>> {
    match from_cbor(bytes)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Map(doc) => Ok(doc),
                other => Err(CodecError::invalid_structure(format!(
                    "expected a document, found {}",
                    other.type_name()
                ))),
            })
            .collect(),
        other => Err(CodecError::invalid_structure(format!(
            "expected an array of documents, found {}",
            other.type_name()
        ))),
    }
}

fn from_cbor_value(cbor: Cbor) -> CodecResult<Value> {
    match cbor {
        Cbor::Null => Ok(Value::Null),
        Cbor::Bool(b) => Ok(Value::Bool(b)),
        Cbor::Integer(n) => {
            let wide = i128::from(n);
            #[allow(clippy::cast_precision_loss)]
            let value = i64::try_from(wide).map_or(Value::Float(wide as f64), Value::Integer);
            Ok(value)
        }
        Cbor::Float(f) => Ok(Value::Float(f)),
        Cbor::Text(s) => Ok(Value::Text(s)),
        Cbor::Array(items) => items
            .into_iter()
            .map(from_cbor_value)
            .collect::<CodecResult<Vec<_>>>()
            .map(Value::Array),
        Cbor::Map(pairs) => {
            let mut doc = Document::new();
            for (key, value) in pairs {
                let Cbor::Text(key) = key else {
                    return Err(CodecError::invalid_structure("map keys must be text"));
                };
                doc.insert(key, from_cbor_value(value)?);
            }
            Ok(Value::Map(doc))
        }
        Cbor::Tag(TAG_DATETIME_TEXT, inner) => match *inner {
            Cbor::Text(s) => parse_rfc3339(&s).map(Value::Timestamp),
            _ => Err(CodecError::invalid_structure(
                "tag 0 must wrap a text string",
            )),
        },
        Cbor::Tag(TAG_DATETIME_EPOCH, inner) => {
            let seconds = match *inner {
                Cbor::Integer(n) => i128::from(n) as f64,
                Cbor::Float(f) => f,
                _ => {
                    return Err(CodecError::invalid_structure(
                        "tag 1 must wrap a number",
                    ))
                }
            };
            #[allow(clippy::cast_possible_truncation)]
            let millis = (seconds * 1000.0).round() as i64;
            DateTime::<Utc>::from_timestamp_millis(millis)
                .map(Value::Timestamp)
                .ok_or_else(|| CodecError::invalid_timestamp(seconds.to_string()))
        }
        Cbor::Tag(_, inner) => from_cbor_value(*inner),
        Cbor::Bytes(_) => Err(CodecError::unsupported_type("bytes")),
        _ => Err(CodecError::unsupported_type("unknown CBOR item")),
    }
}

fn parse_rfc3339(s: &str) -> CodecResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| CodecError::invalid_timestamp(s))
}
