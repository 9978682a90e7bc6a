//! Explain error taxonomy
//!
//! Every failure of an explain call is one of a fixed set of kinds. The
//! rendered message of the policy kinds is part of the external contract:
//! callers compare it verbatim across server releases.
//!
//! Error codes:
//! - EXPLAIN_DECODE_ERROR
//! - EXPLAIN_UNKNOWN_COMMAND
//! - EXPLAIN_NOT_SUPPORTED
//! - EXPLAIN_NOT_SUPPORTED_BY_VERSION
//! - EXPLAIN_DRIVER_ERROR
//! - EXPLAIN_INVALID_SERVER_VERSION

use std::fmt;

use thiserror::Error;

use crate::version::VersionError;

/// Failure reported by the session collaborator
pub type SessionError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for explain operations
pub type ExplainResult<T> = Result<T, ExplainError>;

/// Stable error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Input is not a parseable document
    Decode,
    /// Document matches no known operation
    ClassificationUnknown,
    /// Operation is never explainable
    PolicyRejectedPermanent,
    /// Operation is not explainable on the connected release
    PolicyRejectedByVersion,
    /// Transport or server failure while explaining
    Driver,
    /// Server reported a version that cannot be parsed
    InvalidServerVersion,
}

impl ErrorKind {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Decode => "EXPLAIN_DECODE_ERROR",
            ErrorKind::ClassificationUnknown => "EXPLAIN_UNKNOWN_COMMAND",
            ErrorKind::PolicyRejectedPermanent => "EXPLAIN_NOT_SUPPORTED",
            ErrorKind::PolicyRejectedByVersion => "EXPLAIN_NOT_SUPPORTED_BY_VERSION",
            ErrorKind::Driver => "EXPLAIN_DRIVER_ERROR",
            ErrorKind::InvalidServerVersion => "EXPLAIN_INVALID_SERVER_VERSION",
        }
    }

    /// Returns true if the error was decided without contacting the server
    pub fn is_policy_rejection(&self) -> bool {
        matches!(
            self,
            ErrorKind::ClassificationUnknown
                | ErrorKind::PolicyRejectedPermanent
                | ErrorKind::PolicyRejectedByVersion
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Explain failure
#[derive(Debug, Error)]
pub enum ExplainError {
    #[error("explain: unable to decode query: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Cannot explain cmd: {command}")]
    ClassificationUnknown { command: String },

    #[error("Cannot explain cmd: {command}")]
    PolicyRejectedPermanent { command: String },

    #[error("Only update and delete write ops can be explained")]
    PolicyRejectedByVersion { command: String, version: String },

    #[error("{0}")]
    Driver(#[source] SessionError),

    #[error("invalid server version: {0}")]
    InvalidServerVersion(#[from] VersionError),
}

impl ExplainError {
    /// Wrap a transport or server failure
    pub fn driver(err: impl Into<SessionError>) -> Self {
        ExplainError::Driver(err.into())
    }

    /// Returns the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExplainError::Decode(_) => ErrorKind::Decode,
            ExplainError::ClassificationUnknown { .. } => ErrorKind::ClassificationUnknown,
            ExplainError::PolicyRejectedPermanent { .. } => ErrorKind::PolicyRejectedPermanent,
            ExplainError::PolicyRejectedByVersion { .. } => ErrorKind::PolicyRejectedByVersion,
            ExplainError::Driver(_) => ErrorKind::Driver,
            ExplainError::InvalidServerVersion(_) => ErrorKind::InvalidServerVersion,
        }
    }

    /// Returns the string code
    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    /// Returns true if no server round trip was attempted
    pub fn is_policy_rejection(&self) -> bool {
        self.kind().is_policy_rejection()
    }

    /// The command name carried by policy rejections
    pub fn command(&self) -> Option<&str> {
        match self {
            ExplainError::ClassificationUnknown { command }
            | ExplainError::PolicyRejectedPermanent { command }
            | ExplainError::PolicyRejectedByVersion { command, .. } => Some(command),
            _ => None,
        }
    }
}
