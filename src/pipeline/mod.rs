//! 流式解析管线：将 SSE 行转换为流式事件。
//!
//! # Streaming Pipeline
//!
//! Line-oriented decoding of a server-sent-event body:
//!
//! ```text
//! raw line ──decode::decode_line──▶ LineOutcome ──event_map::classify──▶ StreamEvent
//! ```
//!
//! Malformed or unknown input never fails the stream; it is skipped so that
//! forward-incompatible event types pass through harmlessly.

pub mod decode;
pub mod event_map;

pub use decode::{decode_line, LineOutcome, DATA_PREFIX, DONE_SENTINEL};
pub use event_map::classify;
