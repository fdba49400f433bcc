//! HTTP transport abstraction.
//!
//! The client needs exactly two capabilities from its host: a buffered
//! request/response exchange and a line-oriented streaming response. Both are
//! expressed by [`HttpTransport`]; [`ReqwestTransport`] is the default
//! implementation and tests substitute scripted fakes.

pub mod http;

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

pub use crate::error::TransportError;
pub use http::ReqwestTransport;

/// A lazy, finite sequence of text lines. Dropping it closes the connection.
pub type LineItems = Pin<Box<dyn Stream<Item = Result<String, TransportError>> + Send + 'static>>;

/// One outbound HTTP call.
#[derive(Clone)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub timeout: Duration,
}

// Headers may carry the credential; keep them out of debug output.
impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field(
                "headers",
                &self.headers.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
            )
            .field("body_len", &self.body.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HttpRequest {
    /// First header value with the given (case-insensitive) name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Buffered response. Header names are lower-cased.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Streaming response: status and headers arrive first, lines follow lazily.
pub struct LineStream {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub lines: LineItems,
}

impl LineStream {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

impl fmt::Debug for LineStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineStream")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Pluggable HTTP client used by [`crate::ChatClient`].
///
/// Implementations enforce `request.timeout` and translate connectivity
/// failures into [`TransportError::NoConnection`] / [`TransportError::Timeout`];
/// anything else becomes [`TransportError::Other`].
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn perform_request(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;

    async fn open_stream(&self, request: &HttpRequest) -> Result<LineStream, TransportError>;
}
