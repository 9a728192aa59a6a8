//! Error types for assignment domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing assignment domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AssignmentDomainError {
    /// The repository owner or name is missing or malformed.
    #[error("invalid repository '{0}', expected owner/repo")]
    InvalidRepository(String),

    /// The issue number is invalid.
    #[error("invalid issue number {0}, expected a positive integer")]
    InvalidIssueNumber(u64),

    /// A human-readable duration could not be parsed.
    #[error("invalid duration '{0}', expected '<amount> <unit>' such as '1 Day'")]
    InvalidDuration(String),

    /// An issue or pull request state is not recognised.
    #[error("unknown state '{0}', expected open or closed")]
    UnknownState(String),
}
