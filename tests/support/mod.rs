//! Scripted transport and fixtures shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream;

use coach_chat::credentials::{CredentialProvider, InMemoryCredentialStore};
use coach_chat::error::CredentialError;
use coach_chat::transport::{
    HttpRequest, HttpResponse, HttpTransport, LineItems, LineStream, TransportError,
};
use coach_chat::{ChatClient, ClientConfig};

pub const MODEL: &str = "claude-test";

/// One scripted reply, consumed in order by either transport method.
pub enum Scripted {
    Response(HttpResponse),
    Stream {
        status: u16,
        headers: HashMap<String, String>,
        lines: LineItems,
    },
    Fail(TransportError),
}

impl Scripted {
    pub fn json(status: u16, body: &str) -> Self {
        Scripted::Response(HttpResponse::new(status, body.as_bytes().to_vec()))
    }

    pub fn sse(lines: &[&str]) -> Self {
        Self::stream_status(200, lines)
    }

    pub fn stream_status(status: u16, lines: &[&str]) -> Self {
        let owned: Vec<Result<String, TransportError>> =
            lines.iter().map(|l| Ok(l.to_string())).collect();
        Scripted::Stream {
            status,
            headers: HashMap::new(),
            lines: Box::pin(stream::iter(owned)),
        }
    }

    pub fn stream_items(items: Vec<Result<String, TransportError>>) -> Self {
        Scripted::Stream {
            status: 200,
            headers: HashMap::new(),
            lines: Box::pin(stream::iter(items)),
        }
    }

    pub fn stream_from(lines: LineItems) -> Self {
        Scripted::Stream {
            status: 200,
            headers: HashMap::new(),
            lines,
        }
    }
}

/// Fake transport that replays a script and records every request it sees.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<HttpRequest>>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Scripted>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            ..Default::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next(&self, request: &HttpRequest) -> Scripted {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .expect("transport called more times than scripted")
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn perform_request(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        match self.next(request) {
            Scripted::Response(resp) => Ok(resp),
            Scripted::Fail(e) => Err(e),
            Scripted::Stream { .. } => panic!("stream scripted for a buffered request"),
        }
    }

    async fn open_stream(&self, request: &HttpRequest) -> Result<LineStream, TransportError> {
        match self.next(request) {
            Scripted::Stream {
                status,
                headers,
                lines,
            } => Ok(LineStream {
                status,
                headers,
                lines,
            }),
            Scripted::Response(resp) => {
                let text = resp.body_text();
                let owned: Vec<Result<String, TransportError>> =
                    text.lines().map(|l| Ok(l.to_string())).collect();
                Ok(LineStream {
                    status: resp.status,
                    headers: resp.headers,
                    lines: Box::pin(stream::iter(owned)),
                })
            }
            Scripted::Fail(e) => Err(e),
        }
    }
}

pub fn client_with(transport: Arc<ScriptedTransport>, secret: Option<&str>) -> ChatClient {
    client_with_config(transport, secret, ClientConfig::default())
}

pub fn client_with_config(
    transport: Arc<ScriptedTransport>,
    secret: Option<&str>,
    config: ClientConfig,
) -> ChatClient {
    let store = match secret {
        Some(s) => InMemoryCredentialStore::with_secret(s),
        None => InMemoryCredentialStore::new(),
    };
    ChatClient::builder()
        .shared_transport(transport)
        .credentials(store)
        .config(config)
        .build()
        .unwrap()
}

pub fn client_with_credentials(
    transport: Arc<ScriptedTransport>,
    credentials: impl CredentialProvider + 'static,
) -> ChatClient {
    ChatClient::builder()
        .shared_transport(transport)
        .credentials(credentials)
        .config(ClientConfig::default())
        .build()
        .unwrap()
}

/// Credential store whose every operation fails, like a locked keychain.
pub struct LockedCredentialStore;

#[async_trait]
impl CredentialProvider for LockedCredentialStore {
    async fn get(&self) -> Result<Option<String>, CredentialError> {
        Err(CredentialError::Unavailable("keychain locked".into()))
    }

    async fn set(&self, _secret: &str) -> Result<(), CredentialError> {
        Err(CredentialError::Unavailable("keychain locked".into()))
    }

    async fn delete(&self) -> Result<bool, CredentialError> {
        Err(CredentialError::Unavailable("keychain locked".into()))
    }
}

pub fn delta(text: &str) -> String {
    format!(
        "data: {}",
        serde_json::json!({
            "type": "content_block_delta",
            "index": 0,
            "delta": { "type": "text_delta", "text": text }
        })
    )
}

pub fn completed_body(text: &str) -> String {
    serde_json::json!({
        "id": "msg_01",
        "type": "message",
        "role": "assistant",
        "model": MODEL,
        "content": [{ "type": "text", "text": text }],
        "stop_reason": "end_turn",
        "usage": { "input_tokens": 12, "output_tokens": 5 }
    })
    .to_string()
}

pub const MESSAGE_STOP: &str = r#"data: {"type":"message_stop"}"#;
