//! Access-policy error types.
//!
//! Errors carry a transient/permanent classification consumed by
//! [`RetryPolicy`](crate::retry::RetryPolicy) and a not-found classification
//! consumed by the reconciler to tell "absent" apart from "fatal".

use thiserror::Error;

use crate::models::AuthenticationMethod;

/// Error that can occur while reconciling access-policy assignments.
#[derive(Debug, Error)]
pub enum PolicyError {
    // Transport errors (transient)
    /// The policy API could not be reached.
    #[error("policy API unreachable: {0}")]
    Unreachable(String),

    /// The request timed out.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The policy API is throttling requests.
    #[error("rate limited by policy API (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Any other HTTP client failure.
    #[error("HTTP error: {0}")]
    HttpError(String),

    // Remote responses
    /// Non-success response not covered by a more specific variant.
    #[error("policy API returned {status}: {detail}")]
    Api { status: u16, detail: String },

    /// Credentials were rejected by the policy API.
    #[error("authentication failed: {0}")]
    AuthError(String),

    /// A remote entity (policy, workspace) does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    // Reconciliation errors (permanent)
    /// An assignment expected to exist could not be located.
    #[error("{operation}: assignment {key} not found")]
    AssignmentNotFound { operation: String, key: String },

    /// Create found an existing entry with different content (strict mode only).
    #[error("assignment {key} already exists with different content: {message}")]
    Conflict { key: String, message: String },

    /// The configuration declares a method without its profile block.
    #[error("authentication method '{method}' requires a '{}' block", .method.profile_field())]
    MissingProfileBlock { method: AuthenticationMethod },

    /// A composite identifier does not have the expected shape.
    #[error("malformed identifier '{id}': {reason}")]
    MalformedIdentifier { id: String, reason: String },

    /// Caller-supplied configuration is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A write payload violates the policy API's write contract.
    #[error("invalid write payload: {0}")]
    InvalidPayload(String),

    /// A response body could not be decoded.
    #[error("failed to parse response: {0}")]
    ParseError(String),

    /// JSON serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Retries exhausted on a transient error.
    #[error("max retries exceeded after {attempts} attempt(s): {message}")]
    MaxRetriesExceeded { attempts: u32, message: String },
}

impl PolicyError {
    /// Create a not found error.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create an assignment-not-found error.
    pub fn assignment_not_found(operation: impl Into<String>, key: impl Into<String>) -> Self {
        Self::AssignmentNotFound {
            operation: operation.into(),
            key: key.into(),
        }
    }

    /// Create a conflict error.
    pub fn conflict(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conflict {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a malformed identifier error.
    pub fn malformed_identifier(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedIdentifier {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error is caused by a temporary condition worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PolicyError::Unreachable(_) | PolicyError::Timeout(_) | PolicyError::RateLimited { .. }
        )
    }

    /// Whether the remote side failed with a 5xx status.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, PolicyError::Api { status, .. } if *status >= 500)
    }

    /// Whether the error means "the thing you asked for does not exist".
    ///
    /// Covers remote 404s as well as assignments missing from a policy.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            PolicyError::NotFound { .. } | PolicyError::AssignmentNotFound { .. }
        )
    }

    /// Get an error code for classification.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            PolicyError::Unreachable(_) => "UNREACHABLE",
            PolicyError::Timeout(_) => "TIMEOUT",
            PolicyError::RateLimited { .. } => "RATE_LIMITED",
            PolicyError::HttpError(_) => "HTTP_ERROR",
            PolicyError::Api { .. } => "API_ERROR",
            PolicyError::AuthError(_) => "AUTH_FAILED",
            PolicyError::NotFound { .. } => "NOT_FOUND",
            PolicyError::AssignmentNotFound { .. } => "ASSIGNMENT_NOT_FOUND",
            PolicyError::Conflict { .. } => "CONFLICT",
            PolicyError::MissingProfileBlock { .. } => "MISSING_PROFILE_BLOCK",
            PolicyError::MalformedIdentifier { .. } => "MALFORMED_IDENTIFIER",
            PolicyError::InvalidConfig(_) => "INVALID_CONFIG",
            PolicyError::InvalidPayload(_) => "INVALID_PAYLOAD",
            PolicyError::ParseError(_) => "PARSE_ERROR",
            PolicyError::Serialization(_) => "SERIALIZATION_ERROR",
            PolicyError::MaxRetriesExceeded { .. } => "MAX_RETRIES_EXCEEDED",
        }
    }
}

impl From<reqwest::Error> for PolicyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PolicyError::Timeout(err.to_string())
        } else if err.is_connect() {
            PolicyError::Unreachable(err.to_string())
        } else if err.is_decode() {
            PolicyError::ParseError(err.to_string())
        } else {
            PolicyError::HttpError(err.to_string())
        }
    }
}

/// Result type for access-policy operations.
pub type PolicyResult<T> = Result<T, PolicyError>;
