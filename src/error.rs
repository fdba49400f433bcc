//! Closed error taxonomy for the chat client.
//!
//! Every failure that leaves [`crate::ChatClient`] is one of the [`Error`] variants.
//! Lower layers ([`TransportError`], [`CredentialError`]) are folded into the
//! taxonomy through the `From` impls below, so no raw transport or decode error
//! crosses the public boundary.

use std::fmt;

use thiserror::Error;

/// Status code used for transport failures that are neither a timeout nor a
/// connectivity problem.
pub const GENERIC_FAILURE_STATUS: i32 = -1;

/// Unified error type for the chat client.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("no API credential is configured")]
    MissingCredential,

    #[error("the API rejected the credential")]
    InvalidCredential,

    #[error("rate limited{}", format_retry_after(.retry_after_secs))]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("HTTP {status}{}", format_message(.message))]
    Http {
        status: i32,
        message: Option<String>,
    },

    #[error("no network connection")]
    NoConnection,

    #[error("request timed out")]
    Timeout,

    #[error("failed to decode response: {0}")]
    DecodingFailed(String),

    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),
}

fn format_retry_after(secs: &Option<u64>) -> String {
    match secs {
        Some(s) => format!(" (retry after {}s)", s),
        None => String::new(),
    }
}

fn format_message(message: &Option<String>) -> String {
    match message {
        Some(m) if !m.is_empty() => format!(": {}", m),
        _ => String::new(),
    }
}

impl Error {
    pub fn http(status: i32, message: Option<String>) -> Self {
        Error::Http { status, message }
    }

    pub fn rate_limited(retry_after_secs: Option<u64>) -> Self {
        Error::RateLimited { retry_after_secs }
    }

    /// Short, stable message suitable for showing to an end user.
    ///
    /// Callers never need to inspect variant payloads to render this.
    pub fn user_message(&self) -> &'static str {
        match self {
            Error::MissingCredential => "Add an API key in settings to start chatting.",
            Error::InvalidCredential => "Your API key was rejected. Check it in settings.",
            Error::RateLimited { .. } => "Too many requests right now. Try again shortly.",
            Error::Http { status, .. } if (500..=599).contains(status) => {
                "The assistant service is having trouble. Try again later."
            }
            Error::Http { .. } => "The request could not be completed.",
            Error::NoConnection => "You appear to be offline.",
            Error::Timeout => "The assistant took too long to respond.",
            Error::DecodingFailed(_) | Error::UnexpectedShape(_) => {
                "Received an unreadable response from the assistant."
            }
        }
    }

    /// Whether offering a manual "Retry" action makes sense for this error.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::NoConnection | Error::Timeout | Error::RateLimited { .. } => true,
            Error::Http { status, .. } => {
                *status == GENERIC_FAILURE_STATUS || (500..=599).contains(status)
            }
            Error::MissingCredential
            | Error::InvalidCredential
            | Error::DecodingFailed(_)
            | Error::UnexpectedShape(_) => false,
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<i32> {
        match self {
            Error::Http { status, .. } => Some(*status),
            Error::InvalidCredential => Some(401),
            Error::RateLimited { .. } => Some(429),
            _ => None,
        }
    }
}

// Equality ignores message/detail text but keeps the discriminant and the HTTP status.
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Error::Http { status: a, .. }, Error::Http { status: b, .. }) => a == b,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

impl Eq for Error {}

/// Failures reported by an [`crate::transport::HttpTransport`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("no connection")]
    NoConnection,

    #[error("timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_connect() {
            TransportError::NoConnection
        } else {
            TransportError::Other(e.to_string())
        }
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::NoConnection => Error::NoConnection,
            TransportError::Timeout => Error::Timeout,
            TransportError::Other(message) => Error::Http {
                status: GENERIC_FAILURE_STATUS,
                message: Some(message),
            },
        }
    }
}

/// Failures reported by a [`crate::credentials::CredentialProvider`].
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credential store unavailable: {0}")]
    Unavailable(String),

    #[error("credential store rejected the operation: {0}")]
    Rejected(String),
}

impl From<keyring::Error> for CredentialError {
    fn from(e: keyring::Error) -> Self {
        match e {
            keyring::Error::PlatformFailure(_) | keyring::Error::NoStorageAccess(_) => {
                CredentialError::Unavailable(e.to_string())
            }
            other => CredentialError::Rejected(other.to_string()),
        }
    }
}

// The client never distinguishes "store unreadable" from "not set".
impl From<CredentialError> for Error {
    fn from(_: CredentialError) -> Self {
        Error::MissingCredential
    }
}

/// Compact label used in structured log fields.
pub(crate) struct ErrorKind<'a>(pub &'a Error);

impl fmt::Display for ErrorKind<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.0 {
            Error::MissingCredential => "missing_credential",
            Error::InvalidCredential => "invalid_credential",
            Error::RateLimited { .. } => "rate_limited",
            Error::Http { .. } => "http_error",
            Error::NoConnection => "no_connection",
            Error::Timeout => "timeout",
            Error::DecodingFailed(_) => "decoding_failed",
            Error::UnexpectedShape(_) => "unexpected_shape",
        };
        f.write_str(label)
    }
}
