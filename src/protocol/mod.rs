//! 协议编解码层：消息 API 的请求编码与响应解码。
//!
//! # Protocol Codec
//!
//! Wire format of the remote message API.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`request`] | [`OutboundRequest`] and its JSON encoding |
//! | [`response`] | [`CompletedResponse`] decoding and structured error bodies |
//!
//! Streaming bodies are decoded line by line in [`crate::pipeline`].

pub mod request;
pub mod response;

pub use request::OutboundRequest;
pub use response::{parse_error_message, CompletedResponse, Usage};
