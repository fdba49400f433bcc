//! Wire-level streaming events.
//!
//! These are transient: produced by [`crate::pipeline::event_map`] for each
//! `data:` line and discarded once the client has acted on them.

/// One parsed server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    MessageStart,
    /// A `text_delta` fragment of assistant text.
    ContentDelta(String),
    ContentStop,
    MessageDelta {
        stop_reason: Option<String>,
    },
    MessageStop,
    /// An in-band `error` event.
    Error {
        kind: Option<String>,
        message: Option<String>,
    },
    Unknown,
}

impl StreamEvent {
    /// Whether this event ends the stream cleanly.
    ///
    /// `message_stop`, `content_block_stop` and a `message_delta` carrying a
    /// non-empty stop reason all terminate the exchange.
    pub fn is_stop(&self) -> bool {
        match self {
            StreamEvent::MessageStop | StreamEvent::ContentStop => true,
            StreamEvent::MessageDelta { stop_reason } => {
                stop_reason.as_deref().is_some_and(|r| !r.is_empty())
            }
            _ => false,
        }
    }

    /// Text carried by the event, when non-empty.
    pub fn text(&self) -> Option<&str> {
        match self {
            StreamEvent::ContentDelta(t) if !t.is_empty() => Some(t),
            _ => None,
        }
    }
}
