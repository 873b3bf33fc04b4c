//! CBOR encoding for persisted documents.

use crate::error::{CodecError, CodecResult};
use crate::value::{Document, Value};
use ciborium::value::{Integer, Value as Cbor};

/// CBOR tag for an RFC 3339 date/time string (RFC 8949 section 3.4.1).
pub(crate) const TAG_DATETIME_TEXT: u64 = 0;
/// CBOR tag for an epoch-based date/time (RFC 8949 section 3.4.2).
pub(crate) const TAG_DATETIME_EPOCH: u64 = 1;

/// Encode a value to CBOR bytes.
///
/// Timestamps are written as tag 0 RFC 3339 strings so they survive a round
/// trip with full precision.
///
/// # Errors
///
/// Returns an error if the underlying writer fails.
pub fn to_cbor(value: &Value) -> CodecResult<Vec<u8>> {
    let mut buffer = Vec::new();
    ciborium::into_writer(&to_cbor_value(value), &mut buffer)
        .map_err(|e| CodecError::encoding_failed(e.to_string()))?;
    Ok(buffer)
}

/// Encode a sequence of documents as a single CBOR array.
///
/// # Errors
///
/// Returns an error if the underlying writer fails.
pub fn encode_documents<'a>(documents: impl IntoIterator<Item = &'a Document>) -> CodecResult<Vec<u8>> {
    let array = Cbor::Array(documents.into_iter().map(document_to_cbor).collect());
    let mut buffer = Vec::new();
    ciborium::into_writer(&array, &mut buffer)
        .map_err(|e| CodecError::encoding_failed(e.to_string()))?;
    Ok(buffer)
}

pub(crate) fn to_cbor_value(value: &Value) -> Cbor {
    match value {
        Value::Null => Cbor::Null,
        Value::Bool(b) => Cbor::Bool(*b),
        Value::Integer(n) => Cbor::Integer(Integer::from(*n)),
        Value::Float(f) => Cbor::Float(*f),
        Value::Text(s) => Cbor::Text(s.clone()),
        Value::Timestamp(t) => Cbor::Tag(
            TAG_DATETIME_TEXT,
            Box::new(Cbor::Text(t.to_rfc3339())),
        ),
        Value::Array(items) => Cbor::Array(items.iter().map(to_cbor_value).collect()),
        Value::Map(doc) => document_to_cbor(doc),
    }
}

fn document_to_cbor(doc: &Document) -> Cbor {
    Cbor::Map(
        doc.iter()
            .map(|(k, v)| (Cbor::Text(k.clone()), to_cbor_value(v)))
            .collect(),
    )
}
