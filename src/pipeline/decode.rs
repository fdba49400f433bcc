//! SSE line decoder (line -> StreamEvent)
//!
//! Framing rules, applied to one trimmed line at a time:
//! - lines without the `data:` marker are ignored (comments, `event:` names, blanks)
//! - `data: [DONE]` ends the stream
//! - a `data:` payload that is not JSON is skipped
//! - anything else is classified by [`super::event_map::classify`]

use serde_json::Value;
use tracing::debug;

use crate::types::StreamEvent;

pub const DATA_PREFIX: &str = "data:";
pub const DONE_SENTINEL: &str = "[DONE]";

/// What a single line means to the stream consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// Nothing to do; keep reading.
    Skip,
    /// The terminal sentinel was seen.
    Done,
    Event(StreamEvent),
}

pub fn decode_line(line: &str) -> LineOutcome {
    let trimmed = line.trim();
    let Some(payload) = trimmed.strip_prefix(DATA_PREFIX) else {
        return LineOutcome::Skip;
    };
    let payload = payload.trim_start();
    if payload == DONE_SENTINEL {
        return LineOutcome::Done;
    }
    if payload.is_empty() {
        return LineOutcome::Skip;
    }
    match serde_json::from_str::<Value>(payload) {
        Ok(v) => LineOutcome::Event(super::event_map::classify(&v)),
        Err(e) => {
            debug!(error = %e, "skipping malformed stream data line");
            LineOutcome::Skip
        }
    }
}
