//! # tsio Codec
//!
//! Document value model and persistence encodings for tsio.
//!
//! This crate provides:
//! - [`Value`] and [`Document`], the dynamic shapes stored in a document store
//! - A total order over values, used for sorting and range filters
//! - Numeric normalization (portable integers, NaN as explicit null)
//! - CBOR encoding for on-disk snapshots
//! - Extended-JSON conversion for import/export
//! - Timestamp parsing for value payload keys
//!
//! ## Usage
//!
//! ```
//! use tsio_codec::{from_cbor, to_cbor, Value};
//!
//! let value = Value::Float(1.5);
//! let bytes = to_cbor(&value).unwrap();
//! assert_eq!(from_cbor(&bytes).unwrap(), value);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
mod json;
mod time;
mod value;

pub use decoder::{decode_documents, from_cbor};
pub use encoder::{encode_documents, to_cbor};
pub use error::{CodecError, CodecResult};
pub use json::{document_to_json, from_json, to_json};
pub use time::{epoch_millis_key, parse_timestamp};
pub use value::{Document, Value, ID_FIELD};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn cbor_keeps_timestamps_and_floats() {
        let mut doc = Document::new();
        doc.insert("TS_NAME".into(), Value::from("BOND"));
        doc.insert(
            "LAST_USE".into(),
            Value::Timestamp(Utc.with_ymd_and_hms(2024, 5, 2, 8, 30, 0).unwrap()),
        );
        doc.insert("PRICE".into(), Value::Float(99.5));
        doc.insert("COUPON".into(), Value::Integer(-3));

        let value = Value::Map(doc);
        let bytes = to_cbor(&value).unwrap();
        assert_eq!(from_cbor(&bytes).unwrap(), value);
    }

    #[test]
    fn document_arrays_decode() {
        let mut a = Document::new();
        a.insert("TS_NAME".into(), Value::from("A"));
        let mut b = Document::new();
        b.insert("TS_NAME".into(), Value::from("B"));
        b.insert("VALUE".into(), Value::Map(Document::new()));

        let bytes = encode_documents([&a, &b]).unwrap();
        let decoded = decode_documents(&bytes).unwrap();
        assert_eq!(decoded, vec![a, b]);
    }

    #[test]
    fn non_array_payload_is_rejected() {
        let bytes = to_cbor(&Value::Integer(1)).unwrap();
        assert!(matches!(
            decode_documents(&bytes),
            Err(CodecError::InvalidStructure { .. })
        ));
    }
}
