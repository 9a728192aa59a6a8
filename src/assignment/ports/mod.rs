//! Port contracts for the assignment workflow.
//!
//! Ports define infrastructure-agnostic interfaces to the issue tracker and
//! the wallet registry.

pub mod issue_tracker;
pub mod wallet;

pub use issue_tracker::{CursorPage, IssueTracker, IssueTrackerError, IssueTrackerResult, Page};
pub use wallet::{WalletStore, WalletStoreError, WalletStoreResult};

#[cfg(test)]
pub use wallet::MockWalletStore;
