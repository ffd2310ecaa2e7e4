//! Error handling for the Notion SDK
//!
//! Every failed call is classified into exactly one of three domains:
//! - `Local`: the request could not be built, or the response could not be
//!   interpreted on our side. Nothing can be assumed about server state.
//! - `Transport`: no response was obtained at all.
//! - `Application`: the server answered with a failure status. The decoded
//!   failure payload and the observed status travel with the error.
//!
//! Configuration problems are reported separately through [`ConfigError`].

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

pub mod mapping;

/// Boxed, thread-safe error used as the cause of local and transport failures
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Result type for pipeline operations whose failure payload is `F`
pub type Result<T, F = serde_json::Value> = std::result::Result<T, ClientError<F>>;

/// Classified error returned by [`crate::core::Pipeline`]
#[derive(Error, Debug)]
pub enum ClientError<F = serde_json::Value> {
    /// Building the request or decoding the response failed on our side
    #[error("local error: {reason}")]
    Local {
        reason: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The request never produced a response
    #[error("transport error: request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: BoxError,
    },

    /// The server reported a failure status
    #[error("application error: HTTP {status}")]
    Application { status: u16, failure: F },
}

/// The failure domain of a [`ClientError`], without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Local,
    Transport,
    Application,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Local => write!(f, "local"),
            ErrorKind::Transport => write!(f, "transport"),
            ErrorKind::Application => write!(f, "application"),
        }
    }
}

impl<F> ClientError<F> {
    /// Create a local error with an underlying cause
    pub fn local(reason: impl Into<String>, source: impl Into<BoxError>) -> Self {
        ClientError::Local {
            reason: reason.into(),
            source: Some(source.into()),
        }
    }

    /// Create a local error without a cause
    pub fn local_reason(reason: impl Into<String>) -> Self {
        ClientError::Local {
            reason: reason.into(),
            source: None,
        }
    }

    /// Create a transport error for the given URL
    pub fn transport(url: impl Into<String>, source: impl Into<BoxError>) -> Self {
        ClientError::Transport {
            url: url.into(),
            source: source.into(),
        }
    }

    /// Failure domain of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Local { .. } => ErrorKind::Local,
            ClientError::Transport { .. } => ErrorKind::Transport,
            ClientError::Application { .. } => ErrorKind::Application,
        }
    }

    pub fn is_local(&self) -> bool {
        self.kind() == ErrorKind::Local
    }

    pub fn is_transport(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }

    pub fn is_application(&self) -> bool {
        self.kind() == ErrorKind::Application
    }

    /// HTTP status observed for an application error
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Application { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// URL of the attempted request for a transport error
    pub fn url(&self) -> Option<&str> {
        match self {
            ClientError::Transport { url, .. } => Some(url),
            _ => None,
        }
    }

    /// Decoded failure payload of an application error
    pub fn failure(&self) -> Option<&F> {
        match self {
            ClientError::Application { failure, .. } => Some(failure),
            _ => None,
        }
    }

    /// Consume the error, returning the failure payload if there is one
    pub fn into_failure(self) -> Option<F> {
        match self {
            ClientError::Application { failure, .. } => Some(failure),
            _ => None,
        }
    }

    /// Transform the failure payload, keeping the classification intact
    pub fn map_failure<G>(self, f: impl FnOnce(F) -> G) -> ClientError<G> {
        match self {
            ClientError::Local { reason, source } => ClientError::Local { reason, source },
            ClientError::Transport { url, source } => ClientError::Transport { url, source },
            ClientError::Application { status, failure } => ClientError::Application {
                status,
                failure: f(failure),
            },
        }
    }

    /// Whether repeating the same call may succeed.
    ///
    /// Only transport failures qualify: local failures need a caller fix and
    /// application failures need inspection of the payload.
    pub fn is_retryable(&self) -> bool {
        self.is_transport()
    }

    /// Check if this is a permanent error (not retryable)
    pub fn is_permanent(&self) -> bool {
        !self.is_retryable()
    }
}

/// Causes produced by the pipeline itself when an exchange is aborted
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailure {
    /// The caller's cancel handle fired
    #[error("request cancelled")]
    Cancelled,

    /// The caller's deadline elapsed before the exchange completed
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required key is not set
    #[error("configuration key not found: {0}")]
    Missing(String),

    /// A key is set but its value is unusable
    #[error("invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
}

impl ConfigError {
    pub fn missing(key: impl Into<String>) -> Self {
        ConfigError::Missing(key.into())
    }

    pub fn invalid(key: impl Into<String>, message: impl fmt::Display) -> Self {
        ConfigError::Invalid {
            key: key.into(),
            message: message.to_string(),
        }
    }
}
