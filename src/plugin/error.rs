//! Failures that abort an invocation.

use crate::assignment::{
    domain::AssignmentDomainError,
    ports::{IssueTrackerError, WalletStoreError},
    services::StartStopError,
};
use thiserror::Error;

/// Errors that abort an invocation.
///
/// Refused commands are not errors at this level; they are reported back on
/// the issue.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The event payload does not have the expected shape.
    #[error("invalid {event} payload: {source}")]
    InvalidPayload {
        /// Event name.
        event: String,
        /// Decoding error.
        source: serde_json::Error,
    },

    /// A payload value failed validation.
    #[error("invalid payload data: {0}")]
    InvalidData(#[from] AssignmentDomainError),

    /// The tracker client could not be built.
    #[error("issue tracker setup failed: {0}")]
    Tracker(#[from] IssueTrackerError),

    /// The wallet client could not be built.
    #[error("wallet store setup failed: {0}")]
    Wallet(#[from] WalletStoreError),

    /// A command failed after its preconditions passed.
    #[error("command failed: {0}")]
    Command(#[source] StartStopError),
}
