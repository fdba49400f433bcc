//! Event mapping (JSON Value -> StreamEvent)
//!
//! Classification is driven by the event's `type` field. Unrecognized types map
//! to [`StreamEvent::Unknown`] rather than failing.

use serde_json::Value;

use crate::types::StreamEvent;

pub fn classify(v: &Value) -> StreamEvent {
    let event_type = v.get("type").and_then(Value::as_str).unwrap_or("");

    match event_type {
        "message_start" => StreamEvent::MessageStart,
        "content_block_delta" => {
            let delta_type = v.pointer("/delta/type").and_then(Value::as_str);
            match (delta_type, v.pointer("/delta/text").and_then(Value::as_str)) {
                (Some("text_delta"), Some(text)) => StreamEvent::ContentDelta(text.to_string()),
                _ => StreamEvent::Unknown,
            }
        }
        "content_block_stop" => StreamEvent::ContentStop,
        "message_delta" => StreamEvent::MessageDelta {
            stop_reason: v
                .pointer("/delta/stop_reason")
                .and_then(Value::as_str)
                .map(String::from),
        },
        "message_stop" => StreamEvent::MessageStop,
        "error" => StreamEvent::Error {
            kind: v
                .pointer("/error/type")
                .and_then(Value::as_str)
                .map(String::from),
            message: v
                .pointer("/error/message")
                .and_then(Value::as_str)
                .map(String::from),
        },
        _ => StreamEvent::Unknown,
    }
}
