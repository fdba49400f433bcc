use crate::client::core::ChatClient;
use crate::config::ClientConfig;
use crate::credentials::{CredentialProvider, KeyringCredentialStore};
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::Result;
use std::sync::Arc;

/// Builder for creating clients with custom collaborators.
///
/// Anything left unset falls back to: [`ReqwestTransport`], the OS keychain via
/// [`KeyringCredentialStore`], and [`ClientConfig::from_env`].
#[derive(Default)]
pub struct ChatClientBuilder {
    transport: Option<Arc<dyn HttpTransport>>,
    credentials: Option<Arc<dyn CredentialProvider>>,
    config: Option<ClientConfig>,
    endpoint: Option<String>,
}

impl ChatClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transport(mut self, transport: impl HttpTransport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Share one transport (and its connection pool) between clients.
    pub fn shared_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn credentials(mut self, credentials: impl CredentialProvider + 'static) -> Self {
        self.credentials = Some(Arc::new(credentials));
        self
    }

    pub fn shared_credentials(mut self, credentials: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Override only the endpoint (primarily for testing with mock servers).
    ///
    /// Applied on top of whatever configuration `build` resolves, including
    /// the environment overlay when no explicit config is given.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn build(self) -> Result<ChatClient> {
        let mut config = match self.config {
            Some(c) => c,
            None => ClientConfig::from_env()?,
        };
        if let Some(endpoint) = self.endpoint {
            config.endpoint = endpoint;
        }
        config.validate()?;
        let transport = match self.transport {
            Some(t) => t,
            None => Arc::new(ReqwestTransport::new()?),
        };
        let credentials = self
            .credentials
            .unwrap_or_else(|| Arc::new(KeyringCredentialStore::default()));

        Ok(ChatClient {
            transport,
            credentials,
            config: Arc::new(config),
        })
    }
}
