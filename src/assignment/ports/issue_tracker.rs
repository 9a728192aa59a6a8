//! Issue tracker port used by the assignment rules.

use crate::assignment::domain::{
    Issue, IssueLocator, IssueNumber, RepositoryRef, Review, SearchItem, TimelineEvent,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for issue tracker operations.
pub type IssueTrackerResult<T> = Result<T, IssueTrackerError>;

/// One page of a paginated listing.
///
/// `next` is the token of the following page, or `None` on the last page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T, C = u32> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Token of the following page.
    pub next: Option<C>,
}

impl<T, C> Page<T, C> {
    /// Creates the final page of a listing.
    #[must_use]
    pub const fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }

    /// Creates a page followed by `next`.
    #[must_use]
    pub const fn with_next(items: Vec<T>, next: C) -> Self {
        Self {
            items,
            next: Some(next),
        }
    }
}

/// Page of a cursor-paginated (GraphQL) listing.
pub type CursorPage<T> = Page<T, String>;

/// Remote issue tracker contract.
///
/// Numbered pages start at 1. Listing methods return one page at a time so
/// callers can stop early.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Searches open items in `organization` assigned to `login`.
    async fn assigned_open_issues(
        &self,
        organization: &str,
        login: &str,
        page: u32,
    ) -> IssueTrackerResult<Page<SearchItem>>;

    /// Searches open pull requests in `organization` authored by `login`.
    async fn open_pull_requests_by(
        &self,
        organization: &str,
        login: &str,
        page: u32,
    ) -> IssueTrackerResult<Page<SearchItem>>;

    /// Lists reviews of a pull request.
    async fn pull_request_reviews(
        &self,
        pull_request: &IssueLocator,
        page: u32,
    ) -> IssueTrackerResult<Page<Review>>;

    /// Returns the membership role name of `login` in `organization`, or
    /// `None` when the user is not a member.
    async fn membership_role(
        &self,
        organization: &str,
        login: &str,
    ) -> IssueTrackerResult<Option<String>>;

    /// Posts a comment on an issue or pull request.
    async fn create_comment(&self, issue: &IssueLocator, body: &str) -> IssueTrackerResult<()>;

    /// Adds assignees to an issue.
    async fn add_assignees(&self, issue: &IssueLocator, logins: &[String])
    -> IssueTrackerResult<()>;

    /// Removes assignees from an issue.
    async fn remove_assignees(
        &self,
        issue: &IssueLocator,
        logins: &[String],
    ) -> IssueTrackerResult<()>;

    /// Closes a pull request.
    async fn close_pull_request(
        &self,
        repository: &RepositoryRef,
        number: IssueNumber,
    ) -> IssueTrackerResult<()>;

    /// Lists timeline events of an issue.
    async fn timeline_events(
        &self,
        issue: &IssueLocator,
        page: u32,
    ) -> IssueTrackerResult<Page<TimelineEvent>>;

    /// Lists the issues a pull request will close, starting after `cursor`.
    async fn closing_issue_references(
        &self,
        pull_request: &IssueLocator,
        cursor: Option<String>,
    ) -> IssueTrackerResult<CursorPage<Issue>>;
}

/// Errors returned by issue tracker implementations.
#[derive(Debug, Clone, Error)]
pub enum IssueTrackerError {
    /// The tracker answered with an unexpected status.
    #[error("{operation} failed with status {status}: {body}")]
    Status {
        /// Operation that failed.
        operation: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// The request could not be sent or the response could not be read.
    #[error("{operation} transport error: {source}")]
    Transport {
        /// Operation that failed.
        operation: &'static str,
        /// Underlying error.
        source: Arc<dyn std::error::Error + Send + Sync>,
    },

    /// The response did not have the expected shape.
    #[error("{operation} returned an unexpected payload: {message}")]
    Decode {
        /// Operation that failed.
        operation: &'static str,
        /// Description of the mismatch.
        message: String,
    },

    /// The tracker is unavailable, e.g. an in-memory fake set to fail.
    #[error("issue tracker unavailable: {0}")]
    Unavailable(String),
}

impl IssueTrackerError {
    /// Wraps a transport error.
    pub fn transport(
        operation: &'static str,
        err: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            operation,
            source: Arc::new(err),
        }
    }

    /// Creates a decode error.
    pub fn decode(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Decode {
            operation,
            message: message.into(),
        }
    }
}
