//! 类型系统模块：对话轮次与流式事件。
//!
//! # Types Module
//!
//! Core data types shared by the codec and the client.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ChatTurn`] | One message in a conversation, attributed to user or assistant |
//! | [`TurnRole`] | Turn author (user, assistant) |
//! | [`AssistantDraft`] | Assistant turn being built while a reply streams in |
//! | [`StreamEvent`] | Wire-level streaming event, consumed while parsing |
//!
//! ## Example
//!
//! ```rust
//! use coach_chat::types::{ChatTurn, TurnRole};
//!
//! let history = vec![
//!     ChatTurn::user("How do I stay consistent with running?"),
//!     ChatTurn::assistant("Start with three short runs a week."),
//! ];
//! assert_eq!(history[1].role, TurnRole::Assistant);
//! ```

pub mod events;
pub mod message;

pub use events::StreamEvent;
pub use message::{AssistantDraft, ChatTurn, TurnRole};
