//! Whole-body response decoding.

use serde::Deserialize;

use crate::{Error, Result};

/// Token accounting reported by the API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

impl Usage {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// Result of one non-streaming exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedResponse {
    pub id: String,
    pub model_used: String,
    pub stop_reason: Option<String>,
    /// Concatenation, in array order, of every `text` content segment.
    pub text_content: String,
    pub usage: Usage,
}

#[derive(Deserialize)]
struct WireResponse {
    id: String,
    model: String,
    #[serde(default)]
    stop_reason: Option<String>,
    content: Vec<WireContent>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum WireContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

impl CompletedResponse {
    /// Decode a full JSON body.
    ///
    /// Content segments of unrecognized type contribute nothing.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let wire: WireResponse =
            serde_json::from_slice(body).map_err(|e| Error::DecodingFailed(e.to_string()))?;

        let text_content = wire
            .content
            .into_iter()
            .filter_map(|c| match c {
                WireContent::Text { text } => Some(text),
                WireContent::Other => None,
            })
            .collect::<String>();

        Ok(Self {
            id: wire.id,
            model_used: wire.model,
            stop_reason: wire.stop_reason,
            text_content,
            usage: wire.usage,
        })
    }
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Parse a structured `{type, error: {type, message}}` error body.
///
/// Returns `None` when the body does not have that shape.
pub fn parse_error_message(body: &str) -> Option<String> {
    parse_error_detail(body).and_then(|(_, message)| message)
}

/// Like [`parse_error_message`] but also returns the error `type`.
pub(crate) fn parse_error_detail(body: &str) -> Option<(Option<String>, Option<String>)> {
    let parsed: ApiErrorBody = serde_json::from_str(body).ok()?;
    Some((parsed.error.kind, parsed.error.message))
}
