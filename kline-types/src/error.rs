use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the kline workspace.
///
/// This wraps capability mismatches, argument validation errors, provider-tagged
/// failures, not-found conditions, and missing credentials for key-gated sources.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum KlineError {
    /// The requested capability is not implemented by the target connector.
    #[error("unsupported capability: {capability}")]
    Unsupported {
        /// A capability string describing what was requested (e.g. "snapshot").
        capability: String,
    },

    /// Issues with the returned or expected data (missing fields, etc.).
    #[error("data issue: {0}")]
    Data(String),

    /// Invalid input argument.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// An individual connector returned an error.
    #[error("{connector} failed: {msg}")]
    Connector {
        /// Connector name that failed.
        connector: String,
        /// Human-readable error message.
        msg: String,
    },

    /// A key-gated source was selected but its credential is not configured.
    #[error("source '{source_name}' is not available: set {env_var}")]
    MissingCredentials {
        /// Source name as given on the command line (e.g. "finnhub").
        source_name: String,
        /// Environment variable that would hold the API key.
        env_var: String,
    },

    /// Unknown/opaque error.
    #[error("unknown error: {0}")]
    Other(String),

    /// A resource or symbol could not be found.
    #[error("not found: {what}")]
    NotFound {
        /// Description of missing resource, e.g. "series for AAPL".
        what: String,
    },
}

impl KlineError {
    /// Helper: build an `Unsupported` error for a capability string.
    #[must_use]
    pub fn unsupported(cap: impl Into<String>) -> Self {
        Self::Unsupported {
            capability: cap.into(),
        }
    }
    /// Helper: build a `Connector` error with the connector name and message.
    pub fn connector(connector: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Connector {
            connector: connector.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `NotFound` error for a description of the missing resource.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Helper: build a `MissingCredentials` error.
    pub fn missing_credentials(source_name: impl Into<String>, env_var: impl Into<String>) -> Self {
        Self::MissingCredentials {
            source_name: source_name.into(),
            env_var: env_var.into(),
        }
    }

    /// Returns true if this error means "nothing to show" rather than a failure.
    ///
    /// Reports treat these as an empty result and print a plain message.
    #[must_use]
    pub const fn is_empty_result(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
