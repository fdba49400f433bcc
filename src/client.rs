//! Streaming chat client.
//!
//! Keep the public surface small and predictable: one client type, three
//! exchange operations, and a couple of caller-side conveniences.
//! Implementation details are split into submodules under `src/client/`.

pub mod builder;
pub mod core;
mod error_classification;
mod execution;
mod policy;
pub mod reply;
pub mod stream;
pub mod title;
pub mod types;

pub use builder::ChatClientBuilder;
pub use self::core::ChatClient;
pub use reply::{collect_reply, ReplyOutcome};
pub use stream::ChatStream;
pub use title::suggest_title;
pub use types::{CancelHandle, StreamPhase};
