//! Error classification logic

use crate::protocol::response::parse_error_message;
use crate::Error;

/// Map a non-success HTTP status (and its error body) into the taxonomy.
///
/// - 401 is always an invalid credential, whatever the body says
/// - 429 is rate limiting, carrying `Retry-After` when it parses
/// - everything else is an HTTP error with the structured message if available
pub(crate) fn classify_status(status: u16, retry_after: Option<&str>, body: &str) -> Error {
    match status {
        401 => Error::InvalidCredential,
        429 => Error::rate_limited(parse_retry_after(retry_after)),
        _ => Error::http(i32::from(status), parse_error_message(body)),
    }
}

/// Best-effort parsing of `Retry-After`.
///
/// Only the delta-seconds form is supported; fractional values round up.
pub(crate) fn parse_retry_after(raw: Option<&str>) -> Option<u64> {
    let raw = raw?.trim();
    if let Ok(secs) = raw.parse::<u64>() {
        return Some(secs);
    }
    let secs: f64 = raw.parse().ok()?;
    (secs.is_finite() && secs >= 0.0).then(|| secs.ceil() as u64)
}

/// Map an in-band stream `error` event into the taxonomy.
pub(crate) fn classify_stream_error(kind: Option<&str>, message: Option<String>) -> Error {
    match kind {
        Some("authentication_error") => Error::InvalidCredential,
        Some("rate_limit_error") => Error::rate_limited(None),
        Some("overloaded_error") => Error::http(529, message),
        _ => Error::http(500, message),
    }
}
