//! Outbound request payloads.

use serde::Serialize;

use crate::types::ChatTurn;
use crate::{Error, Result};

/// A fully composed request, built fresh for each call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub model: String,
    pub max_output_tokens: u32,
    pub system_prompt: Option<String>,
    pub turns: Vec<ChatTurn>,
    pub streaming: bool,
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: &'a [ChatTurn],
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

impl OutboundRequest {
    pub fn new(
        model: impl Into<String>,
        max_output_tokens: u32,
        system_prompt: Option<&str>,
        turns: &[ChatTurn],
        streaming: bool,
    ) -> Self {
        Self {
            model: model.into(),
            max_output_tokens,
            system_prompt: system_prompt.map(str::to_owned),
            turns: turns.to_vec(),
            streaming,
        }
    }

    /// Serialize to the JSON body expected by the message API:
    /// `{model, max_tokens, system?, messages: [{role, content}], stream?}`.
    ///
    /// A zero `max_output_tokens` is rejected before anything goes on the wire.
    pub fn encode(&self) -> Result<Vec<u8>> {
        if self.max_output_tokens == 0 {
            return Err(Error::UnexpectedShape(
                "max_tokens must be greater than zero".into(),
            ));
        }
        let wire = WireRequest {
            model: &self.model,
            max_tokens: self.max_output_tokens,
            system: self.system_prompt.as_deref().filter(|s| !s.is_empty()),
            messages: &self.turns,
            stream: self.streaming,
        };
        serde_json::to_vec(&wire).map_err(|e| Error::UnexpectedShape(e.to_string()))
    }
}
