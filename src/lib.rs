//! # coach-chat
//!
//! 面向托管大模型消息接口的流式对话客户端，附带空闲时段调度器。
//!
//! Streaming chat client for a hosted LLM message API, plus a small free-slot
//! scheduler for finding open time in a day's calendar.
//!
//! ## Overview
//!
//! The client sends a conversation (ordered user/assistant turns plus an
//! optional system prompt) and returns either the completed reply or an
//! incremental stream of text chunks. Credentials are fetched from an injected
//! store before every call; failures are reported through one closed
//! [`Error`] taxonomy that can always be rendered as a user-facing message.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use coach_chat::{collect_reply, ChatClient, ChatTurn};
//! use coach_chat::credentials::EnvCredentialProvider;
//!
//! #[tokio::main]
//! async fn main() -> coach_chat::Result<()> {
//!     let client = ChatClient::builder()
//!         .credentials(EnvCredentialProvider::default())
//!         .build()?;
//!
//!     let turns = vec![ChatTurn::user("Plan a 20 minute mobility session.")];
//!     let stream = client.stream_conversation(&turns, None, "claude-sonnet-4-5", 1024);
//!     let reply = collect_reply(stream).await.into_result()?;
//!     println!("{}", reply.content);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Chat client, builder, streaming and reply helpers |
//! | [`config`] | Endpoint, timeouts and retry configuration |
//! | [`credentials`] | Credential store abstraction and implementations |
//! | [`protocol`] | Request encoding and completed-response decoding |
//! | [`pipeline`] | Line-level stream decoding |
//! | [`transport`] | HTTP transport seam and the reqwest implementation |
//! | [`types`] | Conversation turns and stream events |
//! | [`scheduler`] | Free-slot computation and session booking |

pub mod client;
pub mod config;
pub mod credentials;
pub mod pipeline;
pub mod protocol;
pub mod scheduler;
pub mod transport;
pub mod types;

pub mod error;

pub use client::{
    collect_reply, suggest_title, CancelHandle, ChatClient, ChatClientBuilder, ChatStream,
    ReplyOutcome, StreamPhase,
};
pub use config::ClientConfig;
pub use error::Error;
pub use protocol::{CompletedResponse, Usage};
pub use scheduler::{find_free_slots, BusyEvent, FreeInterval};
pub use types::{ChatTurn, StreamEvent, TurnRole};

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A boxed stream of fallible items.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = Result<T>> + Send + 'a>>;
