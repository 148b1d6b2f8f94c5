//! Error types for github-dl.
//!
//! Provides structured error handling with:
//! - Typed HTTP failures (`Auth`, `NotFound`, `Server`) instead of decoding
//!   error bodies as if they were documents
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=auth, 3=not_found, 4=validation, etc.)
//! - Context-aware recovery hints
//! - Structured JSON output for `--json` consumers

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Result type alias for github-dl operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string and a category-based
/// exit code. Scripts driving periodic archive runs match on either.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Partial (exit 1)
    PartialFailure,

    // Auth / quota (exit 2)
    AuthFailed,
    RateLimited,

    // Not Found (exit 3)
    NotFound,

    // Validation (exit 4)
    InvalidArgument,

    // Remote (exit 5)
    ServerError,
    HttpError,
    RequestFailed,

    // Remote data (exit 6)
    MalformedDocument,

    // Config (exit 7)
    ConfigError,

    // Local I/O (exit 8)
    IoError,
    JsonError,

    // Git (exit 9)
    GitError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::PartialFailure => "PARTIAL_FAILURE",
            Self::AuthFailed => "AUTH_FAILED",
            Self::RateLimited => "RATE_LIMITED",
            Self::NotFound => "NOT_FOUND",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::ServerError => "SERVER_ERROR",
            Self::HttpError => "HTTP_ERROR",
            Self::RequestFailed => "REQUEST_FAILED",
            Self::MalformedDocument => "MALFORMED_DOCUMENT",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::GitError => "GIT_ERROR",
        }
    }

    /// Category-based exit code (1-9).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::PartialFailure => 1,
            Self::AuthFailed | Self::RateLimited => 2,
            Self::NotFound => 3,
            Self::InvalidArgument => 4,
            Self::ServerError | Self::HttpError | Self::RequestFailed => 5,
            Self::MalformedDocument => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
            Self::GitError => 9,
        }
    }

    /// Whether re-running the archive later is likely to succeed unchanged.
    ///
    /// True for quota exhaustion, upstream outages and transport failures.
    /// A partial run is resumable because every persisted unit is idempotent.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited
                | Self::ServerError
                | Self::RequestFailed
                | Self::PartialFailure
                | Self::GitError
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur while archiving a repository.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Authentication failed ({status}) for {url}: {message}")]
    Auth {
        status: u16,
        url: String,
        message: String,
    },

    #[error("Not found: {url}")]
    NotFound { url: String },

    #[error("Server error ({status}) for {url}")]
    Server { status: u16, url: String },

    #[error("HTTP {status} for {url}: {message}")]
    Http {
        status: u16,
        url: String,
        message: String,
    },

    #[error("Rate limit still exhausted after waiting for reset: {url}")]
    RateLimited {
        url: String,
        /// Epoch seconds at which the API said the quota resets.
        reset_at: Option<i64>,
    },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Malformed document from {context}: {message}")]
    MalformedDocument { context: String, message: String },

    #[error("git {operation} failed for {}: {message}", path.display())]
    Git {
        operation: &'static str,
        path: PathBuf,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{failed} of {total} repositories failed to sync")]
    PartialFailure { failed: usize, total: usize },
}

impl Error {
    /// Classify a non-success API response into a typed failure.
    ///
    /// The body is only inspected for GitHub's `message` field; it is never
    /// handed back to callers as a document.
    #[must_use]
    pub fn from_response(status: StatusCode, url: &str, body: &[u8]) -> Self {
        let url = url.to_string();
        let message = serde_json::from_slice::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
            .unwrap_or_else(|| format!("HTTP {} error", status.as_u16()));

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Auth {
                status: status.as_u16(),
                url,
                message,
            },
            StatusCode::NOT_FOUND => Self::NotFound { url },
            s if s.is_server_error() => Self::Server {
                status: s.as_u16(),
                url,
            },
            s => Self::Http {
                status: s.as_u16(),
                url,
                message,
            },
        }
    }

    /// Shorthand for a document that lacks a field the sync depends on.
    pub fn malformed(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedDocument {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Auth { .. } => ErrorCode::AuthFailed,
            Self::RateLimited { .. } => ErrorCode::RateLimited,
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::Server { .. } => ErrorCode::ServerError,
            Self::Http { .. } => ErrorCode::HttpError,
            Self::Request(_) => ErrorCode::RequestFailed,
            Self::MalformedDocument { .. } => ErrorCode::MalformedDocument,
            Self::Git { .. } => ErrorCode::GitError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::PartialFailure { .. } => ErrorCode::PartialFailure,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Whether this error must abort an owner-wide run instead of moving on
    /// to the next repository.
    ///
    /// Local filesystem failures risk an inconsistent snapshot, and a 401
    /// would fail every remaining repository the same way. A 403 only
    /// denies the one resource and is not fatal.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Auth { status: 401, .. })
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::Auth { status: 401, .. } => Some(
                "The token was rejected. Check TOKEN_USER and TOKEN, and that the token has not expired."
                    .to_string(),
            ),
            Self::Auth { .. } => Some(
                "The token lacks access to this resource. Private repositories need the `repo` scope."
                    .to_string(),
            ),

            Self::NotFound { .. } => Some(
                "Check OWNER and REPO spelling. Private repositories report 404 without access."
                    .to_string(),
            ),

            Self::RateLimited { reset_at: Some(reset), .. } => Some(format!(
                "Quota resets at epoch {reset}. Re-run afterwards; completed items are skipped."
            )),

            Self::PartialFailure { .. } | Self::Server { .. } | Self::Request(_) => Some(
                "Re-run the same command; already archived items are skipped.".to_string(),
            ),

            Self::Git { .. } => Some(
                "Make sure `git` is installed and on PATH, or pass --no-git to skip mirrors."
                    .to_string(),
            ),

            Self::RateLimited { reset_at: None, .. }
            | Self::Http { .. }
            | Self::MalformedDocument { .. }
            | Self::Io(_)
            | Self::Json(_)
            | Self::InvalidArgument(_)
            | Self::Config(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    ///
    /// Includes error code, message, retryability, exit code, and
    /// optional recovery hint.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_response_auth() {
        let err = Error::from_response(
            StatusCode::UNAUTHORIZED,
            "https://api.github.com/repos/o/r",
            br#"{"message":"Bad credentials"}"#,
        );
        assert!(matches!(err, Error::Auth { status: 401, .. }));
        assert!(err.to_string().contains("Bad credentials"));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_from_response_not_found() {
        let err = Error::from_response(StatusCode::NOT_FOUND, "https://x/y", b"");
        assert!(matches!(err, Error::NotFound { .. }));
        assert_eq!(err.exit_code(), 3);
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_from_response_server_and_other() {
        let err = Error::from_response(StatusCode::BAD_GATEWAY, "u", b"<html>");
        assert!(matches!(err, Error::Server { status: 502, .. }));

        let err = Error::from_response(StatusCode::UNPROCESSABLE_ENTITY, "u", b"not json");
        match err {
            Error::Http { status, message, .. } => {
                assert_eq!(status, 422);
                assert_eq!(message, "HTTP 422 error");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_exit_codes_by_category() {
        assert_eq!(ErrorCode::PartialFailure.exit_code(), 1);
        assert_eq!(ErrorCode::RateLimited.exit_code(), 2);
        assert_eq!(ErrorCode::InvalidArgument.exit_code(), 4);
        assert_eq!(ErrorCode::IoError.exit_code(), 8);
        assert_eq!(ErrorCode::GitError.exit_code(), 9);
    }

    #[test]
    fn test_forbidden_is_not_fatal() {
        let err = Error::from_response(
            StatusCode::FORBIDDEN,
            "https://api.github.com/repos/o/blocked",
            br#"{"message":"Repository access blocked"}"#,
        );
        assert!(matches!(err, Error::Auth { status: 403, .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_io_is_fatal() {
        let err = Error::Io(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope"));
        assert!(err.is_fatal());
        assert_eq!(err.error_code(), ErrorCode::IoError);
    }

    #[test]
    fn test_structured_json_includes_hint() {
        let err = Error::PartialFailure { failed: 1, total: 3 };
        let json = err.to_structured_json();
        assert_eq!(json["error"]["code"], "PARTIAL_FAILURE");
        assert_eq!(json["error"]["retryable"], true);
        assert_eq!(json["error"]["message"], "1 of 3 repositories failed to sync");
        assert!(json["error"]["hint"].is_string());
    }

    #[test]
    fn test_structured_json_without_hint() {
        let err = Error::InvalidArgument("bad owner".to_string());
        let json = err.to_structured_json();
        assert_eq!(json["error"]["exit_code"], 4);
        assert!(json["error"].get("hint").is_none());
    }
}
