use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, SecondsFormat, Utc};

use super::error::DomainError;

/// Cursors encode the timestamp of the last event on a page, nothing else.
/// base64 keeps them opaque and transport-safe; they are never compared as
/// strings, only decoded back into timestamps.
///
/// The payload is RFC 3339 at microsecond precision, the precision storage
/// assigns, so `decode_cursor(encode_cursor(t)) == t` for every stored
/// timestamp.
pub(crate) fn encode_cursor(timestamp: DateTime<Utc>) -> String {
    BASE64.encode(timestamp.to_rfc3339_opts(SecondsFormat::Micros, true))
}

pub(crate) fn decode_cursor(cursor: &str) -> Result<DateTime<Utc>, DomainError> {
    let bytes = BASE64
        .decode(cursor.as_bytes())
        .map_err(|_| DomainError::MalformedCursor)?;
    let raw = String::from_utf8(bytes).map_err(|_| DomainError::MalformedCursor)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_| DomainError::MalformedCursor)
}
