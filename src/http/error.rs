//! Client error taxonomy

use std::fmt;

/// Errors surfaced by the API client
///
/// Storage failures never show up here; the credential store swallows them.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientError {
    /// Transport failure: DNS, connect, timeout, TLS
    Network(String),
    /// 401 that was not (or could no longer be) recovered by a refresh
    Unauthorized,
    /// Non-success envelope or status, with the server's messages
    Api { status: u16, errors: Vec<String> },
    /// Response body did not match the expected shape
    Decode(String),
    /// Token refresh failed; credentials were cleared
    SessionExpired,
    /// The refresh this request was waiting on was abandoned mid-flight
    RefreshCancelled,
    /// Operation requires a session but none exists
    NotAuthenticated,
    /// Request could not be built (bad header value, bad upload)
    InvalidRequest(String),
}

impl ClientError {
    /// Server-provided messages, or the error's own description
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Api { errors, .. } if !errors.is_empty() => errors.clone(),
            other => vec![other.to_string()],
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::Unauthorized => write!(f, "Unauthorized"),
            Self::Api { status, errors } => {
                if errors.is_empty() {
                    write!(f, "API error ({})", status)
                } else {
                    write!(f, "API error ({}): {}", status, errors.join("; "))
                }
            }
            Self::Decode(msg) => write!(f, "Unexpected response: {}", msg),
            Self::SessionExpired => write!(f, "Session expired, please log in again"),
            Self::RefreshCancelled => write!(f, "Token refresh was cancelled"),
            Self::NotAuthenticated => write!(f, "Not logged in"),
            Self::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {}
