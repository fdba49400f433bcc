//! 请求执行逻辑：非流式请求与重试。
//!
//! Buffered request execution with the retry policy applied.

use crate::error::ErrorKind;
use crate::protocol::CompletedResponse;
use crate::transport::HttpRequest;
use crate::{Error, Result};
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::core::ChatClient;
use super::error_classification::classify_status;
use super::policy::{Decision, RetryPolicy};

impl ChatClient {
    pub(crate) async fn execute_with_retry(
        &self,
        request: &HttpRequest,
    ) -> Result<CompletedResponse> {
        let client_request_id = Uuid::new_v4().to_string();
        let policy = RetryPolicy::from_config(&self.config);
        let start = Instant::now();
        let mut attempt: u32 = 0;

        loop {
            debug!(
                client_request_id = client_request_id.as_str(),
                attempt,
                "sending message request"
            );
            let resp = match self.transport.perform_request(request).await {
                Ok(r) => r,
                Err(e) => {
                    let err = Error::from(e);
                    info!(
                        client_request_id = client_request_id.as_str(),
                        error_kind = %ErrorKind(&err),
                        duration_ms = start.elapsed().as_millis() as u64,
                        "message request failed in transport"
                    );
                    return Err(err);
                }
            };

            match policy.decide(resp.status, attempt) {
                Decision::Accept => {
                    let decoded = CompletedResponse::decode(&resp.body);
                    info!(
                        client_request_id = client_request_id.as_str(),
                        http_status = resp.status,
                        attempt,
                        decoded = decoded.is_ok(),
                        duration_ms = start.elapsed().as_millis() as u64,
                        "message request completed"
                    );
                    return decoded;
                }
                Decision::Retry { delay } => {
                    warn!(
                        client_request_id = client_request_id.as_str(),
                        http_status = resp.status,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "server error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Decision::Fail => {
                    let err = classify_status(
                        resp.status,
                        resp.header("retry-after"),
                        &resp.body_text(),
                    );
                    info!(
                        client_request_id = client_request_id.as_str(),
                        http_status = resp.status,
                        error_kind = %ErrorKind(&err),
                        attempt,
                        duration_ms = start.elapsed().as_millis() as u64,
                        "message request failed"
                    );
                    return Err(err);
                }
            }
        }
    }
}
