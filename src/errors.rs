// Error types for checkon

use snafu::Snafu;
use std::io;

#[derive(Debug, Snafu)]
pub enum CheckOnError {
    // User input validation errors, raised before any network call
    #[snafu(display("Invalid user input: {field} - {reason}"))]
    InvalidUserInput { field: String, reason: String },
    #[snafu(display("None of the selected items match the item catalog"))]
    EmptyChecklist,
    #[snafu(display("An authentication token is required for this request"))]
    MissingAuthToken,

    // Errors talking to the Check.On backend
    #[snafu(display("Request to {endpoint} failed: {reason}"))]
    Transport { endpoint: String, reason: String },
    #[snafu(display("Could not build HTTP client"))]
    HttpClient { source: reqwest::Error },
    #[snafu(display("{endpoint} responded with status {status}: {message}"))]
    Server {
        endpoint: String,
        status: u16,
        message: String,
    },
    #[snafu(display("Unexpected response from {endpoint}: {reason}"))]
    InvalidResponse { endpoint: String, reason: String },

    // Config management errors
    #[snafu(display("Could not find application data directory to save config file"))]
    NoConfigDir,
    #[snafu(display("Error accessing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },

    // Errors for the session journal
    #[snafu(display("Error writing session journal"))]
    WriterError { source: io::Error },
    #[snafu(display("Error loading session journal"))]
    JournalLoadError { source: io::Error },

    // Wizard session errors
    #[snafu(display("Wizard session is no longer running"))]
    SessionClosed,
}

impl CheckOnError {
    /// Whether a failed backend call is worth repeating.
    ///
    /// Transport failures, 5xx responses and 429 are transient. Any other
    /// client error or a malformed payload fails immediately, since repeating
    /// the same request would produce the same answer.
    pub fn is_retryable(&self) -> bool {
        match self {
            CheckOnError::Transport { .. } => true,
            CheckOnError::Server { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Human readable message suitable for inline display.
    ///
    /// Server errors surface the backend's own message verbatim.
    pub fn user_message(&self) -> String {
        match self {
            CheckOnError::Server { message, .. } if !message.is_empty() => message.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(status: u16) -> CheckOnError {
        CheckOnError::Server {
            endpoint: "/recommendations".to_string(),
            status,
            message: "nope".to_string(),
        }
    }

    #[test]
    fn test_retry_classification() {
        assert!(
            CheckOnError::Transport {
                endpoint: "/recommendations".to_string(),
                reason: "connection refused".to_string(),
            }
            .is_retryable()
        );
        assert!(server(503).is_retryable());
        assert!(server(500).is_retryable());
        assert!(server(429).is_retryable());
        assert!(!server(400).is_retryable());
        assert!(!server(404).is_retryable());
        assert!(
            !CheckOnError::InvalidResponse {
                endpoint: "/items".to_string(),
                reason: "expected a JSON array".to_string(),
            }
            .is_retryable()
        );
        assert!(!CheckOnError::EmptyChecklist.is_retryable());
    }

    #[test]
    fn test_user_message_prefers_server_message() {
        assert_eq!(server(400).user_message(), "nope");

        let empty = CheckOnError::Server {
            endpoint: "/checklists".to_string(),
            status: 502,
            message: String::new(),
        };
        assert!(empty.user_message().contains("502"));
    }
}
