//! Error types for the janitor domain.
//!
//! [`StoreError`] is what an [`crate::IssueStore`] implementation reports for a
//! single failed call. [`JanitorError`] is what ends a run; every variant is
//! fatal and the binary maps each one to an exit status.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Store-level errors
// ---------------------------------------------------------------------------

/// A single failed call against the remote issue store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The request never produced a response (connection, TLS, timeout).
    #[error("HTTP request failed: {message}")]
    Http { message: String },

    /// The store answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The response body could not be decoded into the expected shape.
    #[error("Malformed response: {message}")]
    Decode { message: String },
}

// ---------------------------------------------------------------------------
// Run-level errors
// ---------------------------------------------------------------------------

/// Conditions that abort a run.
///
/// There is no partial-run recovery: actions already applied to other issues
/// stay applied when one of these is returned.
#[derive(Debug, Error)]
pub enum JanitorError {
    /// A configuration entry is missing a required field or could not be parsed.
    ///
    /// Never retried.
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    /// Listing repositories or listing/searching issues failed.
    ///
    /// Reads are not retried; a transient failure simply ends the run.
    #[error("Transport error while {operation}: {source}")]
    TransportError {
        operation: String,
        #[source]
        source: StoreError,
    },

    /// A label, close, comment, or lock call still failed after every retry.
    #[error("{operation} failed after {attempts} attempts: {source}")]
    MutationError {
        operation: String,
        attempts: u32,
        #[source]
        source: StoreError,
    },
}

impl JanitorError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    pub(crate) fn transport(operation: impl Into<String>, source: StoreError) -> Self {
        Self::TransportError {
            operation: operation.into(),
            source,
        }
    }

    /// Returns `true` for [`JanitorError::ConfigurationError`].
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::ConfigurationError { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutation_error_names_operation_and_cause() {
        let err = JanitorError::MutationError {
            operation: "Locking acme/x#3".to_string(),
            attempts: 5,
            source: StoreError::Api {
                status: 502,
                message: "Bad Gateway".to_string(),
            },
        };
        assert_eq!(
            err.to_string(),
            "Locking acme/x#3 failed after 5 attempts: API error: 502 - Bad Gateway"
        );
        assert!(!err.is_configuration());
    }

    #[test]
    fn configuration_errors_are_identified() {
        assert!(JanitorError::configuration("missing owner").is_configuration());
    }
}
