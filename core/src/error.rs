//! Error types for the hypermedia client.
//!
//! # Design
//! Only two failures are ever surfaced to callers: a request that could not
//! be constructed (`InvalidUri`) and a failure reported by the host transport
//! (`Transport`). Everything that goes wrong while reading a document, such
//! as an unknown body format or attributes that fail to serialize, degrades
//! to an empty representor or an absent body instead of an error.
//!
//! Every error carries a `domain` and a numeric `code` so hosts on the other
//! side of the C ABI can branch on them without parsing messages.

use thiserror::Error;

/// Error domain for failures raised by this crate.
pub const ERROR_DOMAIN: &str = "hyperdrive";

/// Message used when an expanded URI template is not a valid URI.
pub const INVALID_URI_MESSAGE: &str = "Creating URI from given URI failed";

/// Errors returned by request construction and by client round-trips.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The expanded URI template could not be parsed as an absolute URI.
    #[error("{}", INVALID_URI_MESSAGE)]
    InvalidUri { uri: String },

    /// The transport failed; the error is passed through unchanged.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ClientError {
    pub fn domain(&self) -> &str {
        match self {
            ClientError::InvalidUri { .. } => ERROR_DOMAIN,
            ClientError::Transport(err) => &err.domain,
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            ClientError::InvalidUri { .. } => 0,
            ClientError::Transport(err) => err.code,
        }
    }
}

/// An opaque failure reported by the host transport, e.g. a DNS failure or a
/// timeout. The core never inspects it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    pub domain: String,
    pub code: i64,
    pub message: String,
}

impl TransportError {
    pub fn new(domain: impl Into<String>, code: i64, message: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            code,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_uri_has_fixed_domain_code_and_message() {
        let err = ClientError::InvalidUri {
            uri: "not a valid ::uri".to_string(),
        };
        assert_eq!(err.domain(), ERROR_DOMAIN);
        assert_eq!(err.code(), 0);
        assert_eq!(err.to_string(), "Creating URI from given URI failed");
    }

    #[test]
    fn transport_error_passes_through() {
        let transport = TransportError::new("NSURLErrorDomain", -1001, "The request timed out.");
        let err = ClientError::from(transport.clone());
        assert_eq!(err.domain(), "NSURLErrorDomain");
        assert_eq!(err.code(), -1001);
        assert_eq!(err.to_string(), "The request timed out.");
        assert_eq!(err, ClientError::Transport(transport));
    }
}
