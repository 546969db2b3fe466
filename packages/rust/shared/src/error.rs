//! Error types for the takeaways workflow.
//!
//! Library crates use [`TakeawaysError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::fmt;
use std::path::PathBuf;

/// A labelled step of the change publisher or its cleanup operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PublishStep {
    GetRef,
    CreateBranch,
    WriteFile,
    OpenPullRequest,
    ClosePullRequest,
    DeleteBranch,
}

impl PublishStep {
    /// Stable label used in error messages and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetRef => "get-ref",
            Self::CreateBranch => "create-branch",
            Self::WriteFile => "write-file",
            Self::OpenPullRequest => "open-pull-request",
            Self::ClosePullRequest => "close-pull-request",
            Self::DeleteBranch => "delete-branch",
        }
    }
}

impl fmt::Display for PublishStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level error type for all takeaways operations.
#[derive(Debug, thiserror::Error)]
pub enum TakeawaysError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Invalid input detected before any I/O (empty term, bad field selection).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// The target document does not exist in the source-of-truth store.
    #[error("document not found: {path}")]
    NotFound { path: String },

    /// Malformed front-matter delimiter, YAML, or provider payload.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// The document changed between read and write.
    #[error("conflict: {path} changed since it was read")]
    Conflict { path: String },

    /// Text generation failed. The provider's own error is intentionally dropped.
    #[error("Failed to generate takeaways for term: {term}")]
    Provider { term: String },

    /// A version-control step failed.
    #[error("publish step {step} failed: {message}")]
    Publish { step: PublishStep, message: String },

    /// Transport-level failure talking to a collaborator (connect, timeout, reset).
    #[error("network error: {0}")]
    Network(String),

    /// A collaborator answered with a non-success HTTP status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TakeawaysError>;

impl TakeawaysError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a not-found error for a document path.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create a conflict error for a document path.
    pub fn conflict(path: impl Into<String>) -> Self {
        Self::Conflict { path: path.into() }
    }

    /// Create a step-labelled publish error.
    pub fn publish(step: PublishStep, msg: impl Into<String>) -> Self {
        Self::Publish {
            step,
            message: msg.into(),
        }
    }

    /// Create an HTTP status error.
    pub fn http(status: u16, msg: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether a fresh attempt of the whole task could succeed.
    ///
    /// Conflicts, transport failures, rate limits and server errors may be
    /// transient. Other client errors such as 401 or 403 are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Conflict { .. } | Self::Network(_) => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = TakeawaysError::validation("term required");
        assert_eq!(err.to_string(), "validation error: term required");

        let err = TakeawaysError::Provider {
            term: "MIME types".into(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to generate takeaways for term: MIME types"
        );
    }

    #[test]
    fn publish_error_names_the_step() {
        let err = TakeawaysError::publish(PublishStep::CreateBranch, "HTTP 422");
        assert_eq!(err.to_string(), "publish step create-branch failed: HTTP 422");
    }

    #[test]
    fn transient_failures_are_retryable() {
        assert!(TakeawaysError::conflict("a.mdx").is_retryable());
        assert!(TakeawaysError::Network("reset".into()).is_retryable());
        assert!(!TakeawaysError::validation("x").is_retryable());
        assert!(!TakeawaysError::not_found("a.mdx").is_retryable());
        assert!(!TakeawaysError::parse("x").is_retryable());
        assert!(!TakeawaysError::Provider { term: "x".into() }.is_retryable());
        assert!(!TakeawaysError::publish(PublishStep::WriteFile, "x").is_retryable());
    }

    #[test]
    fn http_status_decides_retry() {
        assert!(TakeawaysError::http(429, "slow down").is_retryable());
        assert!(TakeawaysError::http(502, "bad gateway").is_retryable());
        assert!(!TakeawaysError::http(401, "Bad credentials").is_retryable());
        assert!(!TakeawaysError::http(403, "forbidden").is_retryable());
        assert!(!TakeawaysError::http(422, "invalid").is_retryable());

        let err = TakeawaysError::http(401, "contents/a.mdx: Bad credentials");
        assert_eq!(err.to_string(), "HTTP 401: contents/a.mdx: Bad credentials");
    }
}
