// src/submit/error.rs

//! Submission error types.

use thiserror::Error;

/// Errors from the one HTTP exchange with the solver endpoint.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The endpoint could not be reached, or the exchange broke off.
    #[error("Transport failure: {message}")]
    Transport {
        /// Transport failure message
        message: String,
    },

    /// The endpoint answered with a success status but the body is not JSON.
    #[error("Malformed response: {message}")]
    MalformedResponse {
        /// MalformedResponse failure message
        message: String,
    },

    /// The endpoint answered with a non-success status.
    #[error("Solver rejected the document ({status}): {message}")]
    Rejected {
        /// HTTP status code returned by the endpoint.
        status: u16,
        /// The body's `error` field, or the raw body text.
        message: String,
    },

    /// The document could not be serialized.
    #[error("Encode Error: {message}")]
    Encode {
        /// Encode failure message
        message: String,
    },
}

impl SubmitError {
    /// Whether the failure happened on the wire rather than at the solver.
    ///
    /// Malformed success bodies count as transport failures; rejections and
    /// encoding problems do not.
    pub fn is_transport(&self) -> bool {
        matches!(self, SubmitError::Transport { .. } | SubmitError::MalformedResponse { .. })
    }

    /// HTTP status of a rejection.
    pub fn status(&self) -> Option<u16> {
        match self {
            SubmitError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SubmitError {
    fn from(err: reqwest::Error) -> Self {
        SubmitError::Transport { message: error_chain(&err) }
    }
}

/// Joins an error with its sources, skipping causes already spelled out above.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !text.is_empty() && !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Layer(&'static str, Option<Box<Layer>>);

    impl fmt::Display for Layer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    impl std::error::Error for Layer {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            self.1.as_deref().map(|inner| inner as &(dyn std::error::Error + 'static))
        }
    }

    #[test]
    fn chain_includes_every_cause() {
        let err = Layer(
            "error sending request",
            Some(Box::new(Layer("client error (Connect)", Some(Box::new(Layer("Connection refused", None)))))),
        );
        assert_eq!(
            error_chain(&err),
            "error sending request: client error (Connect): Connection refused"
        );
    }

    #[test]
    fn repeated_causes_are_not_duplicated() {
        let err = Layer("timed out: operation timed out", Some(Box::new(Layer("operation timed out", None))));
        assert_eq!(error_chain(&err), "timed out: operation timed out");
    }
}
