use crate::client::builder::ChatClientBuilder;
use crate::client::stream::ChatStream;
use crate::client::types::CancelHandle;
use crate::config::ClientConfig;
use crate::credentials::CredentialProvider;
use crate::protocol::{CompletedResponse, OutboundRequest};
use crate::transport::{HttpRequest, HttpTransport};
use crate::types::ChatTurn;
use crate::{Error, Result};
use std::sync::Arc;
use tracing::debug;

/// Chat client for the remote message API.
///
/// Holds only immutable configuration and the injected collaborators, so one
/// instance can serve many unrelated conversations concurrently. History is
/// supplied by the caller on every call.
#[derive(Clone)]
pub struct ChatClient {
    pub(crate) transport: Arc<dyn HttpTransport>,
    pub(crate) credentials: Arc<dyn CredentialProvider>,
    pub(crate) config: Arc<ClientConfig>,
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ChatClient {
    pub fn builder() -> ChatClientBuilder {
        ChatClientBuilder::new()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Single-turn convenience over [`ChatClient::send_conversation`].
    pub async fn send(
        &self,
        message: &str,
        system_prompt: Option<&str>,
        model: &str,
        max_tokens: u32,
    ) -> Result<CompletedResponse> {
        let turns = [ChatTurn::user(message)];
        self.send_conversation(&turns, system_prompt, model, max_tokens)
            .await
    }

    /// Non-streaming exchange. Retries 5xx responses with exponential backoff.
    pub async fn send_conversation(
        &self,
        turns: &[ChatTurn],
        system_prompt: Option<&str>,
        model: &str,
        max_tokens: u32,
    ) -> Result<CompletedResponse> {
        let credential = fetch_credential(self.credentials.as_ref()).await?;
        let body = OutboundRequest::new(model, max_tokens, system_prompt, turns, false).encode()?;
        let request = build_http_request(&self.config, &credential, body, false);
        self.execute_with_retry(&request).await
    }

    /// Streaming exchange.
    ///
    /// Never fails synchronously: credential, connection and status failures
    /// all surface as the single terminal error of the returned stream.
    pub fn stream_conversation(
        &self,
        turns: &[ChatTurn],
        system_prompt: Option<&str>,
        model: &str,
        max_tokens: u32,
    ) -> ChatStream {
        let request = OutboundRequest::new(model, max_tokens, system_prompt, turns, true);
        ChatStream::spawn(self, request)
    }

    /// Like [`ChatClient::stream_conversation`], plus a handle that can cancel
    /// the stream from another task.
    pub fn stream_conversation_with_cancel(
        &self,
        turns: &[ChatTurn],
        system_prompt: Option<&str>,
        model: &str,
        max_tokens: u32,
    ) -> (ChatStream, CancelHandle) {
        let stream = self.stream_conversation(turns, system_prompt, model, max_tokens);
        let handle = stream.cancel_handle();
        (stream, handle)
    }
}

/// Fetch the credential for one call. Blank or unreadable counts as missing.
pub(crate) async fn fetch_credential(provider: &dyn CredentialProvider) -> Result<String> {
    match provider.get().await {
        Ok(Some(secret)) if !secret.trim().is_empty() => Ok(secret.trim().to_string()),
        Ok(_) => Err(Error::MissingCredential),
        Err(e) => {
            debug!(error = %e, "credential store read failed");
            Err(e.into())
        }
    }
}

pub(crate) fn build_http_request(
    config: &ClientConfig,
    credential: &str,
    body: Vec<u8>,
    streaming: bool,
) -> HttpRequest {
    let mut headers = vec![
        ("content-type".to_string(), "application/json".to_string()),
        ("anthropic-version".to_string(), config.api_version.clone()),
        ("x-api-key".to_string(), credential.to_string()),
    ];
    if streaming {
        headers.push(("accept".to_string(), "text/event-stream".to_string()));
    }
    HttpRequest {
        method: "POST".to_string(),
        url: config.endpoint.clone(),
        headers,
        body,
        timeout: if streaming {
            config.stream_timeout
        } else {
            config.request_timeout
        },
    }
}
