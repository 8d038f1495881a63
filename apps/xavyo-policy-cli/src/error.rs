//! CLI error types and exit codes

use thiserror::Error;
use xavyo_access_policy::PolicyError;

/// Exit codes for the CLI
/// - 0: Success
/// - 1: General error
/// - 2: Authentication failed
/// - 3: Network error
/// - 4: Validation error
/// - 5: Server error
/// - 6: Assignment removed remotely (read only)
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Assignment {0} no longer exists")]
    Removed(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::AuthenticationFailed(_) => 2,
            CliError::Network(_) => 3,
            CliError::Validation(_) | CliError::Conflict(_) | CliError::NotFound(_) => 4,
            CliError::Server(_) => 5,
            CliError::Api { status, .. } => {
                if *status >= 500 {
                    5
                } else if *status == 401 || *status == 403 {
                    2
                } else {
                    4
                }
            }
            CliError::Removed(_) => 6,
            CliError::Config(_) | CliError::Io(_) => 1,
        }
    }

    /// Print the error to stderr with appropriate formatting
    pub fn print(&self) {
        let use_color = std::env::var("NO_COLOR").is_err();

        if use_color {
            eprintln!("\x1b[31mError:\x1b[0m {self}");
        } else {
            eprintln!("Error: {self}");
        }

        if let Some(suggestion) = self.suggestion() {
            if use_color {
                eprintln!("\n\x1b[33mSuggestion:\x1b[0m {suggestion}");
            } else {
                eprintln!("\nSuggestion: {suggestion}");
            }
        }
    }

    /// Get a suggested action for this error
    fn suggestion(&self) -> Option<&'static str> {
        match self {
            CliError::AuthenticationFailed(_) => {
                Some("Check that ACCESS_POLICY_API_TOKEN holds a valid token.")
            }
            CliError::Config(_) => {
                Some("Set ACCESS_POLICY_API_URL and ACCESS_POLICY_API_TOKEN in the environment.")
            }
            CliError::Removed(_) => Some("Run 'create' again to restore the assignment."),
            _ => None,
        }
    }
}

impl From<PolicyError> for CliError {
    fn from(e: PolicyError) -> Self {
        match e {
            PolicyError::AuthError(msg) => CliError::AuthenticationFailed(msg),
            PolicyError::Unreachable(_)
            | PolicyError::Timeout(_)
            | PolicyError::RateLimited { .. }
            | PolicyError::HttpError(_)
            | PolicyError::MaxRetriesExceeded { .. } => CliError::Network(e.to_string()),
            PolicyError::Api { status, detail } => CliError::Api {
                status,
                message: detail,
            },
            PolicyError::NotFound { .. } | PolicyError::AssignmentNotFound { .. } => {
                CliError::NotFound(e.to_string())
            }
            PolicyError::Conflict { .. } => CliError::Conflict(e.to_string()),
            PolicyError::MissingProfileBlock { .. }
            | PolicyError::MalformedIdentifier { .. }
            | PolicyError::InvalidPayload(_) => CliError::Validation(e.to_string()),
            PolicyError::InvalidConfig(msg) => CliError::Config(msg),
            PolicyError::ParseError(_) | PolicyError::Serialization(_) => {
                CliError::Server(e.to_string())
            }
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Validation(format!("JSON error: {e}"))
    }
}
