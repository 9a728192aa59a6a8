//! In-memory adapters for tests and local runs.

mod issue_tracker;
mod wallet;

pub use issue_tracker::{InMemoryIssueTracker, RecordedComment, TrackerOperation};
pub use wallet::{FixedClock, InMemoryWalletStore};
