use crate::transport::{HttpRequest, HttpResponse, HttpTransport, LineItems, LineStream};
use crate::error::TransportError;
use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream, Stream, StreamExt, TryStreamExt};
use reqwest::header::HeaderMap;
use reqwest::Method;
use std::collections::HashMap;
use std::env;
use std::time::Duration;
use reqwest::Proxy;
use tracing::warn;

/// [`HttpTransport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(
                env::var("COACH_CHAT_POOL_MAX_IDLE_PER_HOST")
                    .ok()
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(8),
            )
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            // Long-lived streams ride on HTTP/2 when the server offers it.
            .http2_adaptive_window(true)
            .http2_keep_alive_interval(Some(Duration::from_secs(30)))
            .http2_keep_alive_timeout(Duration::from_secs(10));

        if let Some(proxy) = proxy_from(env::var("COACH_CHAT_PROXY_URL").ok().as_deref()) {
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wrap an already configured client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn build(&self, request: &HttpRequest) -> Result<reqwest::RequestBuilder, TransportError> {
        let method = Method::from_bytes(request.method.to_uppercase().as_bytes())
            .map_err(|e| TransportError::Other(e.to_string()))?;
        let mut req = self
            .client
            .request(method, &request.url)
            .timeout(request.timeout)
            .body(request.body.clone());
        for (k, v) in &request.headers {
            req = req.header(k, v);
        }
        Ok(req)
    }
}

/// Proxy for the configured URL. An unparsable URL is logged and ignored.
fn proxy_from(url: Option<&str>) -> Option<Proxy> {
    let url = url?.trim();
    if url.is_empty() {
        return None;
    }
    match Proxy::all(url) {
        Ok(proxy) => Some(proxy),
        Err(e) => {
            warn!(proxy_url = url, error = %e, "ignoring invalid COACH_CHAT_PROXY_URL");
            None
        }
    }
}

fn lowercase_headers(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(k, v)| {
            v.to_str()
                .ok()
                .map(|s| (k.as_str().to_ascii_lowercase(), s.trim().to_string()))
        })
        .collect()
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn perform_request(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let resp = self.build(request)?.send().await?;
        let status = resp.status().as_u16();
        let headers = lowercase_headers(resp.headers());
        let body = resp.bytes().await?;
        Ok(HttpResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }

    async fn open_stream(&self, request: &HttpRequest) -> Result<LineStream, TransportError> {
        let resp = self.build(request)?.send().await?;
        let status = resp.status().as_u16();
        let headers = lowercase_headers(resp.headers());
        let bytes = resp.bytes_stream().map_err(TransportError::from);
        Ok(LineStream {
            status,
            headers,
            lines: split_lines(bytes),
        })
    }
}

/// Longest line [`split_lines`] will buffer before failing the stream.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Incrementally split a byte stream into lines.
///
/// Lines may straddle chunk boundaries (including inside a multi-byte UTF-8
/// sequence); a trailing `\r` is stripped and a final unterminated line is
/// flushed at EOF. The returned stream owns `input`, so dropping it closes the
/// underlying connection.
pub fn split_lines<S>(input: S) -> LineItems
where
    S: Stream<Item = Result<Bytes, TransportError>> + Send + 'static,
{
    split_lines_with_limit(input, MAX_LINE_BYTES)
}

/// [`split_lines`] with an explicit cap on buffered bytes per line.
///
/// A line longer than `max_line` ends the stream with [`TransportError::Other`].
pub fn split_lines_with_limit<S>(input: S, max_line: usize) -> LineItems
where
    S: Stream<Item = Result<Bytes, TransportError>> + Send + 'static,
{
    let input = Box::pin(input);
    let stream = stream::unfold(
        (Some(input), Vec::<u8>::new()),
        move |(mut input, mut buf)| async move {
            loop {
                if let Some(idx) = buf.iter().position(|b| *b == b'\n') {
                    let mut line: Vec<u8> = buf.drain(..=idx).collect();
                    line.pop();
                    if line.last() == Some(&b'\r') {
                        line.pop();
                    }
                    let text = String::from_utf8_lossy(&line).into_owned();
                    return Some((Ok(text), (input, buf)));
                }

                if buf.len() > max_line {
                    return Some((
                        Err(TransportError::Other(format!(
                            "stream line exceeds {} bytes",
                            max_line
                        ))),
                        (None, Vec::new()),
                    ));
                }

                // Need more data.
                let Some(source) = input.as_mut() else {
                    return None;
                };
                match source.next().await {
                    Some(Ok(bytes)) => {
                        buf.extend_from_slice(&bytes);
                        continue;
                    }
                    Some(Err(e)) => {
                        return Some((Err(e), (None, Vec::new())));
                    }
                    None => {
                        // EOF: flush whatever is left once.
                        if buf.is_empty() {
                            return None;
                        }
                        let mut line = std::mem::take(&mut buf);
                        if line.last() == Some(&b'\r') {
                            line.pop();
                        }
                        let text = String::from_utf8_lossy(&line).into_owned();
                        return Some((Ok(text), (None, buf)));
                    }
                }
            }
        },
    );
    Box::pin(stream)
}
