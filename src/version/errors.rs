//! Version engine error types

use thiserror::Error;

/// Result type for version operations
pub type VersionResult<T> = Result<T, VersionError>;

/// Errors raised while parsing versions or constraints
#[derive(Debug, Error)]
pub enum VersionError {
    /// Version string is not `major[.minor[.patch]]`
    #[error("invalid version '{input}': {source}")]
    InvalidVersion {
        input: String,
        #[source]
        source: semver::Error,
    },

    /// Constraint string is not a valid range expression
    #[error("invalid constraint '{input}': {source}")]
    InvalidConstraint {
        input: String,
        #[source]
        source: semver::Error,
    },

    /// Constraint (or one `||` alternative of it) is blank
    #[error("invalid constraint '{input}': empty range")]
    EmptyConstraint { input: String },
}

impl VersionError {
    /// Returns the offending input string
    pub fn input(&self) -> &str {
        match self {
            VersionError::InvalidVersion { input, .. } => input,
            VersionError::InvalidConstraint { input, .. } => input,
            VersionError::EmptyConstraint { input } => input,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_constraint_display() {
        let err = VersionError::EmptyConstraint {
            input: "||".to_string(),
        };
        assert_eq!(err.to_string(), "invalid constraint '||': empty range");
        assert_eq!(err.input(), "||");
    }
}
