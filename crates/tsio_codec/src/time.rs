//! Timestamp parsing and formatting shared by value payloads and the CLI.

use crate::error::{CodecError, CodecResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parse a timestamp key as found in a stored value payload.
///
/// Accepts, in order: integer epoch milliseconds, RFC 3339,
/// `YYYY-MM-DDTHH:MM:SS[.f]` (taken as UTC) and bare `YYYY-MM-DD` dates.
///
/// # Errors
///
/// Returns [`CodecError::InvalidTimestamp`] if no format matches.
pub fn parse_timestamp(input: &str) -> CodecResult<DateTime<Utc>> {
    let trimmed = input.trim();

    if let Ok(millis) = trimmed.parse::<i64>() {
        return DateTime::<Utc>::from_timestamp_millis(millis)
            .ok_or_else(|| CodecError::invalid_timestamp(input));
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(t.with_timezone(&Utc));
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(t.and_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(t) = d.and_hms_opt(0, 0, 0) {
            return Ok(t.and_utc());
        }
    }

    Err(CodecError::invalid_timestamp(input))
}

/// Format a timestamp as an epoch-milliseconds key.
pub fn epoch_millis_key(t: &DateTime<Utc>) -> String {
    t.timestamp_millis().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_all_supported_shapes() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        assert_eq!(parse_timestamp("1704067200000").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-01-01T00:00:00Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-01-01T00:00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-01-01").unwrap(), expected);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(CodecError::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn epoch_key_is_milliseconds() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(epoch_millis_key(&t), "1704067200000");
        assert_eq!(parse_timestamp(&epoch_millis_key(&t)).unwrap(), t);
    }
}
