//! Issue snapshot as seen when a command arrives.

use super::{AssignmentDomainError, IssueLocator};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::OnceLock;

const PRICE_LABEL_PREFIX: &str = "Price: ";

/// Open or closed state of an issue or pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    /// Accepting work.
    Open,
    /// Resolved or abandoned.
    Closed,
}

impl FromStr for IssueState {
    type Err = AssignmentDomainError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            _ => Err(AssignmentDomainError::UnknownState(raw.to_owned())),
        }
    }
}

#[expect(clippy::expect_used, reason = "pattern is a compile-time constant")]
fn parent_checklist_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"-\s+\[( |x)\]\s+#\d+").expect("valid checklist pattern"))
}

/// Returns whether an issue body contains a sub-issue checklist item such as
/// `- [ ] #12` or `- [x] #12`.
#[must_use]
pub fn is_parent_body(body: &str) -> bool {
    parent_checklist_pattern().is_match(body)
}

/// Snapshot of an issue and the state the assignment rules inspect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    locator: IssueLocator,
    id: u64,
    title: String,
    body: Option<String>,
    state: IssueState,
    created_at: DateTime<Utc>,
    labels: Vec<String>,
    assignees: Vec<String>,
}

impl Issue {
    /// Creates an open issue without body, labels or assignees.
    #[must_use]
    pub fn new(locator: IssueLocator, title: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            locator,
            id: 0,
            title: title.into(),
            body: None,
            state: IssueState::Open,
            created_at,
            labels: Vec::new(),
            assignees: Vec::new(),
        }
    }

    /// Sets the tracker's numeric node identifier.
    #[must_use]
    pub const fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    /// Sets the issue body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the issue state.
    #[must_use]
    pub const fn with_state(mut self, state: IssueState) -> Self {
        self.state = state;
        self
    }

    /// Replaces the label names.
    #[must_use]
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the assignee logins.
    #[must_use]
    pub fn with_assignees<I, S>(mut self, assignees: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.assignees = assignees.into_iter().map(Into::into).collect();
        self
    }

    /// Returns the repository and number of the issue.
    #[must_use]
    pub const fn locator(&self) -> &IssueLocator {
        &self.locator
    }

    /// Returns the tracker's numeric identifier.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Returns the state.
    #[must_use]
    pub const fn state(&self) -> IssueState {
        self.state
    }

    /// Returns the creation time.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the label names.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Returns the assignee logins in tracker order.
    #[must_use]
    pub fn assignees(&self) -> &[String] {
        &self.assignees
    }

    /// Returns whether the issue accepts work.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == IssueState::Open
    }

    /// Returns whether the body tracks sub-issues.
    #[must_use]
    pub fn is_parent(&self) -> bool {
        self.body().is_some_and(is_parent_body)
    }

    /// Returns whether anyone is assigned.
    #[must_use]
    pub fn is_assigned(&self) -> bool {
        !self.assignees.is_empty()
    }

    /// Returns whether `login` is assigned, ignoring case.
    #[must_use]
    pub fn has_assignee(&self, login: &str) -> bool {
        self.assignee(login).is_some()
    }

    /// Returns the assignee login matching `login`, ignoring case.
    #[must_use]
    pub fn assignee(&self, login: &str) -> Option<&str> {
        self.assignees
            .iter()
            .find(|assignee| assignee.eq_ignore_ascii_case(login))
            .map(String::as_str)
    }

    /// Returns whether a `Price:` label is set.
    #[must_use]
    pub fn has_price_label(&self) -> bool {
        self.labels
            .iter()
            .any(|label| label.starts_with(PRICE_LABEL_PREFIX))
    }
}
