//! GitHub adapter for the issue tracker port.

mod models;
mod tracker;

pub use tracker::{DEFAULT_GITHUB_API_BASE, GitHubConfig, GitHubIssueTracker};
