use std::fmt;
use thiserror::Error;

/// Stable error codes surfaced to API clients.
pub mod codes {
    pub const CONFIG_INVALID: &str = "CONFIG_INVALID";
    pub const REMOTE_UNAUTHORIZED: &str = "REMOTE_UNAUTHORIZED";
    pub const REMOTE_NOT_FOUND: &str = "REMOTE_NOT_FOUND";
    pub const REMOTE_TRANSIENT: &str = "REMOTE_TRANSIENT";
    pub const TIMEOUT: &str = "TIMEOUT";
    pub const INVALID_URL: &str = "INVALID_URL";
}

/// Classification of a failed remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteKind {
    /// 401/403: the credential was rejected.
    Unauthorized,
    /// 404: plan, suite or project does not exist (or is not visible).
    NotFound,
    /// Network failure, 5xx, or any other unexpected status.
    Transient,
}

impl RemoteKind {
    /// Classify an HTTP status code.
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Unauthorized,
            404 => Self::NotFound,
            _ => Self::Transient,
        }
    }
}

impl fmt::Display for RemoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unauthorized => "unauthorized",
            Self::NotFound => "not found",
            Self::Transient => "transient failure",
        })
    }
}

/// Core error type for qaboard operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(
        "Remote {kind}{} while {context}",
        .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
    )]
    Remote {
        kind: RemoteKind,
        status: Option<u16>,
        context: String,
    },

    #[error("Timed out while {context}")]
    Timeout { context: String },

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a remote error from an HTTP status.
    pub fn status(status: u16, context: impl Into<String>) -> Self {
        Self::Remote {
            kind: RemoteKind::from_status(status),
            status: Some(status),
            context: context.into(),
        }
    }

    /// Create a transient remote error with no HTTP status (transport or decode failure).
    pub fn transient(context: impl Into<String>) -> Self {
        Self::Remote {
            kind: RemoteKind::Transient,
            status: None,
            context: context.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(context: impl Into<String>) -> Self {
        Self::Timeout {
            context: context.into(),
        }
    }

    /// Convert a reqwest failure, keeping the caller's context.
    pub fn from_reqwest(err: &reqwest::Error, context: impl Into<String>) -> Self {
        let context = context.into();
        if err.is_timeout() {
            return Self::timeout(context);
        }
        match err.status() {
            Some(status) => Self::status(status.as_u16(), context),
            None if err.is_connect() => Self::transient(format!("{context}: connection failed: {err}")),
            None => Self::transient(format!("{context}: {err}")),
        }
    }

    /// Get the stable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => codes::CONFIG_INVALID,
            Self::Remote { kind, .. } => match kind {
                RemoteKind::Unauthorized => codes::REMOTE_UNAUTHORIZED,
                RemoteKind::NotFound => codes::REMOTE_NOT_FOUND,
                RemoteKind::Transient => codes::REMOTE_TRANSIENT,
            },
            Self::Timeout { .. } => codes::TIMEOUT,
            Self::InvalidUrl { .. } => codes::INVALID_URL,
        }
    }

    /// Remote classification, if this is a remote failure.
    #[must_use]
    pub fn remote_kind(&self) -> Option<RemoteKind> {
        match self {
            Self::Remote { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(RemoteKind::from_status(401), RemoteKind::Unauthorized);
        assert_eq!(RemoteKind::from_status(403), RemoteKind::Unauthorized);
        assert_eq!(RemoteKind::from_status(404), RemoteKind::NotFound);
        assert_eq!(RemoteKind::from_status(500), RemoteKind::Transient);
        assert_eq!(RemoteKind::from_status(429), RemoteKind::Transient);
    }

    #[test]
    fn test_remote_message_includes_status_and_context() {
        let err = Error::status(401, "listing suites of plan 7");
        let msg = err.to_string();
        assert!(msg.contains("unauthorized"), "{msg}");
        assert!(msg.contains("HTTP 401"), "{msg}");
        assert!(msg.contains("plan 7"), "{msg}");
        assert_eq!(err.code(), codes::REMOTE_UNAUTHORIZED);
    }

    #[test]
    fn test_transient_has_no_status_suffix() {
        let msg = Error::transient("fetching batch").to_string();
        assert!(!msg.contains("HTTP"), "{msg}");
    }

    #[test]
    fn test_error_codes_uppercase() {
        let all_codes = [
            codes::CONFIG_INVALID,
            codes::REMOTE_UNAUTHORIZED,
            codes::REMOTE_NOT_FOUND,
            codes::REMOTE_TRANSIENT,
            codes::TIMEOUT,
            codes::INVALID_URL,
        ];

        for code in all_codes {
            assert!(
                code.chars().all(|c| c.is_uppercase() || c == '_'),
                "Error code '{code}' should be SCREAMING_SNAKE_CASE"
            );
        }
    }
}
