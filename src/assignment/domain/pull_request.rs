//! Pull request summaries, timeline events and reviews.

use super::{IssueLocator, IssueNumber, IssueState, RepositoryRef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timeline event name recording that another item referenced the issue.
pub const CROSS_REFERENCED_EVENT: &str = "cross-referenced";

/// Review state that makes a pull request available.
pub const APPROVED_REVIEW_STATE: &str = "APPROVED";

/// Pull request linked to an issue through the issue timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedPullRequest {
    /// Pull request number within its repository.
    pub number: IssueNumber,
    /// Author login.
    pub author: String,
    /// Body text, if any.
    pub body: Option<String>,
    /// Owner of the repository holding the pull request.
    pub organization: String,
    /// Name of the repository holding the pull request.
    pub repository: String,
    /// Open or closed.
    pub state: IssueState,
    /// Whether the pull request is a draft.
    pub draft: bool,
    /// HTML locator used in comments.
    pub href: String,
}

impl LinkedPullRequest {
    /// Returns whether the pull request is open and ready for review.
    #[must_use]
    pub fn is_open_and_ready(&self) -> bool {
        self.state == IssueState::Open && !self.draft
    }

    /// Returns the locator of the pull request.
    ///
    /// Returns `None` when the owner or repository is not a valid segment.
    #[must_use]
    pub fn locator(&self) -> Option<IssueLocator> {
        RepositoryRef::new(self.organization.as_str(), self.repository.as_str())
            .ok()
            .map(|repository| IssueLocator::new(repository, self.number))
    }
}

/// Source item of a timeline event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineSource {
    /// Item number.
    pub number: IssueNumber,
    /// Open or closed.
    pub state: IssueState,
    /// Draft flag; only meaningful for pull requests.
    pub draft: bool,
    /// Body text, if any.
    pub body: Option<String>,
    /// HTML locator.
    pub html_url: String,
    /// `owner/repo` of the repository holding the item.
    pub repository_full_name: String,
    /// Author login.
    pub author: String,
    /// Whether the item is a pull request.
    pub is_pull_request: bool,
}

/// Entry of an issue's timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEvent {
    /// Event name such as `cross-referenced` or `labeled`.
    pub event: String,
    /// Item that caused the event, when the event has one.
    pub source: Option<TimelineSource>,
}

impl TimelineEvent {
    /// Returns the source when this event is a cross-reference from a pull
    /// request.
    #[must_use]
    pub fn pull_request_reference(&self) -> Option<&TimelineSource> {
        if self.event != CROSS_REFERENCED_EVENT {
            return None;
        }
        self.source
            .as_ref()
            .filter(|source| source.is_pull_request)
    }
}

/// Issue or pull request returned by a search query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchItem {
    /// Item number.
    pub number: IssueNumber,
    /// HTML locator, used to recover the repository.
    pub html_url: String,
    /// Open or closed.
    pub state: IssueState,
    /// Whether the item is a pull request.
    pub is_pull_request: bool,
    /// Author login.
    pub author: String,
    /// Assignee logins.
    pub assignees: Vec<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl SearchItem {
    /// Returns whether this is an open issue assigned to `login`.
    #[must_use]
    pub fn is_open_issue_assigned_to(&self, login: &str) -> bool {
        self.state == IssueState::Open
            && !self.is_pull_request
            && self
                .assignees
                .iter()
                .any(|assignee| assignee.eq_ignore_ascii_case(login))
    }

    /// Returns whether this is an open pull request.
    #[must_use]
    pub fn is_open_pull_request(&self) -> bool {
        self.state == IssueState::Open && self.is_pull_request
    }
}

/// Review left on a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Reviewer login.
    pub reviewer: String,
    /// Reviewer's association with the repository, e.g. `MEMBER`.
    pub author_association: String,
    /// Review state, e.g. `APPROVED` or `COMMENTED`.
    pub state: String,
}

impl Review {
    /// Returns whether this review approves and comes from one of the
    /// `authorities`, compared upper-cased.
    #[must_use]
    pub fn approves_with_authority(&self, authorities: &[String]) -> bool {
        self.state.eq_ignore_ascii_case(APPROVED_REVIEW_STATE)
            && authorities
                .iter()
                .any(|role| role.eq_ignore_ascii_case(&self.author_association))
    }
}
