//! Credential collaborators.
//!
//! The client fetches the bearer secret lazily before every call and never
//! caches it. Any store failure is treated as absence by the client.

use std::env;
use std::sync::Mutex;

use async_trait::async_trait;
use keyring::Entry;

use crate::error::CredentialError;

/// Source of the API credential.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn get(&self) -> Result<Option<String>, CredentialError>;

    async fn set(&self, secret: &str) -> Result<(), CredentialError>;

    /// Remove the stored secret. Returns `false` when nothing was stored.
    async fn delete(&self) -> Result<bool, CredentialError>;
}

/// OS keychain store via `keyring`.
#[derive(Debug, Clone)]
pub struct KeyringCredentialStore {
    service: String,
    account: String,
}

impl KeyringCredentialStore {
    pub fn new(service: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            account: account.into(),
        }
    }

    fn entry(&self) -> Result<Entry, CredentialError> {
        Ok(Entry::new(&self.service, &self.account)?)
    }
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new("coach-chat", "anthropic")
    }
}

#[async_trait]
impl CredentialProvider for KeyringCredentialStore {
    async fn get(&self) -> Result<Option<String>, CredentialError> {
        match self.entry()?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, secret: &str) -> Result<(), CredentialError> {
        Ok(self.entry()?.set_password(secret)?)
    }

    async fn delete(&self) -> Result<bool, CredentialError> {
        match self.entry()?.delete_password() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Read-only provider backed by an environment variable.
#[derive(Debug, Clone)]
pub struct EnvCredentialProvider {
    var: String,
}

impl EnvCredentialProvider {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvCredentialProvider {
    fn default() -> Self {
        Self::new("ANTHROPIC_API_KEY")
    }
}

#[async_trait]
impl CredentialProvider for EnvCredentialProvider {
    async fn get(&self) -> Result<Option<String>, CredentialError> {
        Ok(env::var(&self.var).ok())
    }

    async fn set(&self, _secret: &str) -> Result<(), CredentialError> {
        Err(CredentialError::Rejected(format!(
            "environment variable {} is read-only",
            self.var
        )))
    }

    async fn delete(&self) -> Result<bool, CredentialError> {
        Err(CredentialError::Rejected(format!(
            "environment variable {} is read-only",
            self.var
        )))
    }
}

/// Process-local store, mostly for hosts that manage secrets themselves and for tests.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    secret: Mutex<Option<String>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: Mutex::new(Some(secret.into())),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>, CredentialError> {
        self.secret
            .lock()
            .map_err(|_| CredentialError::Unavailable("credential lock poisoned".into()))
    }
}

#[async_trait]
impl CredentialProvider for InMemoryCredentialStore {
    async fn get(&self) -> Result<Option<String>, CredentialError> {
        Ok(self.lock()?.clone())
    }

    async fn set(&self, secret: &str) -> Result<(), CredentialError> {
        *self.lock()? = Some(secret.to_string());
        Ok(())
    }

    async fn delete(&self) -> Result<bool, CredentialError> {
        Ok(self.lock()?.take().is_some())
    }
}
