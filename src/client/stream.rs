//! Streaming exchange.
//!
//! A [`ChatStream`] is a lazy producer: nothing happens until it is first
//! polled, and at most one network read is in flight ahead of the consumer.
//! It ends either cleanly (possibly with no chunks) or with exactly one error.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use futures::{stream, Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::client::core::{build_http_request, fetch_credential, ChatClient};
use crate::client::error_classification::{classify_status, classify_stream_error};
use crate::client::types::{CancelHandle, PhaseCell, StreamPhase};
use crate::config::ClientConfig;
use crate::credentials::CredentialProvider;
use crate::error::{ErrorKind, TransportError};
use crate::pipeline::{decode_line, LineOutcome};
use crate::protocol::OutboundRequest;
use crate::transport::{HttpTransport, LineItems};
use crate::types::StreamEvent;
use crate::{BoxStream, Error, Result};

/// Text chunks of one streamed assistant reply.
pub struct ChatStream {
    inner: Option<BoxStream<'static, String>>,
    phase: Arc<PhaseCell>,
    cancel: CancellationToken,
}

impl ChatStream {
    pub(crate) fn spawn(client: &ChatClient, request: OutboundRequest) -> Self {
        let phase = Arc::new(PhaseCell::new());
        let cancel = CancellationToken::new();
        let driver = StreamDriver {
            transport: client.transport.clone(),
            credentials: client.credentials.clone(),
            config: client.config.clone(),
            request,
            phase: phase.clone(),
            cancel: cancel.clone(),
            lines: None,
            finished: false,
            client_request_id: Uuid::new_v4().to_string(),
            started: Instant::now(),
            chunks: 0,
        };
        let inner = stream::unfold(driver, |mut driver| async move {
            let item = driver.next_chunk().await?;
            Some((item, driver))
        });
        Self {
            inner: Some(Box::pin(inner)),
            phase,
            cancel,
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> StreamPhase {
        self.phase.get()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle::new(self.cancel.clone())
    }

    /// Stop the stream and release its connection now.
    pub fn cancel(&mut self) {
        self.cancel.cancel();
        self.release();
    }

    fn release(&mut self) {
        if self.inner.take().is_some() {
            self.phase.advance(StreamPhase::Cancelled);
        }
    }
}

impl Stream for ChatStream {
    type Item = Result<String>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.cancel.is_cancelled() {
            this.release();
            return Poll::Ready(None);
        }
        let Some(inner) = this.inner.as_mut() else {
            return Poll::Ready(None);
        };
        match inner.as_mut().poll_next(cx) {
            Poll::Ready(None) => {
                this.inner = None;
                Poll::Ready(None)
            }
            other => other,
        }
    }
}

impl Drop for ChatStream {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.release();
    }
}

impl std::fmt::Debug for ChatStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatStream")
            .field("phase", &self.phase.get())
            .finish_non_exhaustive()
    }
}

enum Next {
    Cancelled,
    Line(Option<std::result::Result<String, TransportError>>),
}

struct StreamDriver {
    transport: Arc<dyn HttpTransport>,
    credentials: Arc<dyn CredentialProvider>,
    config: Arc<ClientConfig>,
    request: OutboundRequest,
    phase: Arc<PhaseCell>,
    cancel: CancellationToken,
    lines: Option<LineItems>,
    finished: bool,
    client_request_id: String,
    started: Instant,
    chunks: usize,
}

impl StreamDriver {
    async fn next_chunk(&mut self) -> Option<Result<String>> {
        if self.finished {
            return None;
        }
        if self.lines.is_none() {
            match self.connect().await {
                Ok(Some(lines)) => self.lines = Some(lines),
                Ok(None) => return self.cancelled(),
                Err(e) => return self.fail(e),
            }
        }

        loop {
            let cancel = self.cancel.clone();
            let next = {
                let lines = self.lines.as_mut()?;
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Next::Cancelled,
                    item = lines.next() => Next::Line(item),
                }
            };

            let line = match next {
                Next::Cancelled => return self.cancelled(),
                Next::Line(None) => return self.complete("end of body"),
                Next::Line(Some(Err(e))) => return self.fail(e.into()),
                Next::Line(Some(Ok(line))) => line,
            };

            match decode_line(&line) {
                LineOutcome::Skip => continue,
                LineOutcome::Done => return self.complete("done sentinel"),
                LineOutcome::Event(StreamEvent::Error { kind, message }) => {
                    warn!(
                        client_request_id = self.client_request_id.as_str(),
                        error_type = kind.as_deref().unwrap_or(""),
                        "error event in stream"
                    );
                    return self.fail(classify_stream_error(kind.as_deref(), message));
                }
                LineOutcome::Event(event) => {
                    if let Some(text) = event.text() {
                        self.chunks += 1;
                        return Some(Ok(text.to_string()));
                    }
                    if event.is_stop() {
                        return self.complete("stop event");
                    }
                }
            }
        }
    }

    /// Credential fetch, request and status check. `Ok(None)` means cancelled.
    async fn connect(&mut self) -> Result<Option<LineItems>> {
        let cancel = self.cancel.clone();

        self.phase.advance(StreamPhase::CredentialFetch);
        let credential = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(None),
            c = fetch_credential(self.credentials.as_ref()) => c?,
        };

        let body = self.request.encode()?;
        let request = build_http_request(&self.config, &credential, body, true);

        self.phase.advance(StreamPhase::Connecting);
        debug!(
            client_request_id = self.client_request_id.as_str(),
            model = self.request.model.as_str(),
            turns = self.request.turns.len(),
            "opening message stream"
        );
        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(None),
            r = self.transport.open_stream(&request) => r?,
        };

        if opened.status != 200 {
            let status = opened.status;
            let retry_after = opened.header("retry-after").map(str::to_owned);
            let limit = self.config.error_body_limit;
            let body = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(None),
                b = drain_bounded(opened.lines, limit) => b,
            };
            return Err(classify_status(status, retry_after.as_deref(), &body));
        }

        self.phase.advance(StreamPhase::Streaming);
        Ok(Some(opened.lines))
    }

    fn complete(&mut self, reason: &'static str) -> Option<Result<String>> {
        self.finish(StreamPhase::Completed);
        info!(
            client_request_id = self.client_request_id.as_str(),
            chunks = self.chunks,
            reason,
            duration_ms = self.started.elapsed().as_millis() as u64,
            "message stream completed"
        );
        None
    }

    fn cancelled(&mut self) -> Option<Result<String>> {
        self.finish(StreamPhase::Cancelled);
        debug!(
            client_request_id = self.client_request_id.as_str(),
            chunks = self.chunks,
            "message stream cancelled"
        );
        None
    }

    fn fail(&mut self, err: Error) -> Option<Result<String>> {
        self.finish(StreamPhase::Failed);
        info!(
            client_request_id = self.client_request_id.as_str(),
            error_kind = %ErrorKind(&err),
            chunks = self.chunks,
            duration_ms = self.started.elapsed().as_millis() as u64,
            "message stream failed"
        );
        Some(Err(err))
    }

    fn finish(&mut self, phase: StreamPhase) {
        // Drop the connection before reporting the terminal state.
        self.lines = None;
        self.finished = true;
        self.phase.advance(phase);
    }
}

/// Read at most `limit` bytes of an error body, for diagnostics only.
async fn drain_bounded(mut lines: LineItems, limit: usize) -> String {
    let mut body = String::new();
    while let Some(Ok(line)) = lines.next().await {
        if body.len() + line.len() > limit {
            let room = limit.saturating_sub(body.len());
            let mut cut = room.min(line.len());
            while !line.is_char_boundary(cut) {
                cut -= 1;
            }
            body.push_str(&line[..cut]);
            break;
        }
        if !body.is_empty() {
            body.push('\n');
        }
        body.push_str(&line);
    }
    body
}
