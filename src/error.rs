//! Error types for the dsk library.

use serde_json::Value;
use thiserror::Error;

/// Main error type for the dsk library.
#[derive(Error, Debug)]
pub enum DskError {
    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid or missing credentials, or HTTP 401
    #[error("Authentication failed: {message}")]
    Authentication {
        /// `Some(401)` when the server rejected the token, `None` when it
        /// was rejected locally
        status: Option<u16>,
        message: String,
    },

    /// HTTP 429
    #[error("RateLimit error: {0}")]
    RateLimit(String),

    /// HTTP 422, with the upstream details appended
    #[error("Validation error: {0}")]
    Validation(String),

    /// HTTP 5xx
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Any other non-success status, or a success payload we could not use
    #[error("API error: {message}")]
    Api {
        status: Option<u16>,
        message: String,
    },

    /// The Cloudflare page kept coming back after refreshing cookies
    #[error("Failed to bypass Cloudflare protection after {attempts} attempts")]
    GatewayBypass { attempts: u32 },

    /// Caller supplied an unusable argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A `data:` line in the completion stream was not valid JSON
    #[error("Invalid JSON in response chunk: {0}")]
    Decode(String),

    /// The completion stream closed before the terminal event
    #[error("Completion stream ended before a stop event")]
    IncompleteStream,

    /// No bytes arrived within the configured idle timeout
    #[error("Completion stream idle for more than {0:?}")]
    StreamTimeout(std::time::Duration),

    /// The server asked for a proof-of-work algorithm we do not implement
    #[error("Unsupported challenge algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The challenge descriptor is inconsistent or unreasonably expensive
    #[error("Malformed challenge: {0}")]
    MalformedChallenge(String),

    /// Every candidate nonce was tried without matching the target digest
    #[error("Proof of work exhausted {iterations} candidates without a solution")]
    PowExhausted { iterations: u64 },

    /// The blocking solver task panicked or was cancelled
    #[error("Solver task failed: {0}")]
    SolverTask(String),
}

impl DskError {
    /// Build the error for a non-success HTTP status.
    ///
    /// The body is read as `{"message": ..., "details": ...}` when it is JSON;
    /// anything else falls back to `HTTP Error <status>`.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = match serde_json::from_str::<Value>(body) {
            Ok(data) => {
                let mut msg = data
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("Unknown error")
                    .to_string();
                if status == 422 {
                    let details = data
                        .get("details")
                        .cloned()
                        .unwrap_or_else(|| Value::Object(Default::default()));
                    msg.push_str(&format!(" | Details: {}", details));
                }
                msg
            }
            Err(_) => format!("HTTP Error {}", status),
        };

        match status {
            401 => DskError::Authentication {
                status: Some(401),
                message,
            },
            422 => DskError::Validation(message),
            429 => DskError::RateLimit(message),
            500..=599 => DskError::Server { status, message },
            _ => DskError::Api {
                status: Some(status),
                message,
            },
        }
    }

    /// Shorthand for an [`DskError::Api`] without a status code.
    pub fn api(message: impl Into<String>) -> Self {
        DskError::Api {
            status: None,
            message: message.into(),
        }
    }

    /// Shorthand for an [`DskError::Authentication`] raised before any request.
    pub fn credentials(message: impl Into<String>) -> Self {
        DskError::Authentication {
            status: None,
            message: message.into(),
        }
    }

    /// HTTP status associated with this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            DskError::Http(e) => e.status().map(|s| s.as_u16()),
            DskError::Authentication { status, .. } => *status,
            DskError::RateLimit(_) => Some(429),
            DskError::Validation(_) => Some(422),
            DskError::Server { status, .. } => Some(*status),
            DskError::Api { status, .. } => *status,
            _ => None,
        }
    }

    /// Whether the request pipeline retries this failure on its own.
    ///
    /// Only transport failures qualify. Status errors propagate immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DskError::Http(_))
    }
}

/// Result type alias for dsk operations.
pub type Result<T> = std::result::Result<T, DskError>;
