//! Invocation inputs and the webhook events this plugin handles.

use crate::assignment::domain::{Issue, IssueLocator, IssueState, RepositoryRef, Sender};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use super::PluginError;

/// Body of a plugin invocation sent by the orchestration host.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginInputs {
    /// Opaque identifier of the host's workflow state.
    pub state_id: String,
    /// Webhook event name such as `issue_comment.created`.
    pub event_name: String,
    /// Raw webhook payload.
    pub event_payload: Value,
    /// Plugin settings as configured for the repository.
    #[serde(default)]
    pub settings: Value,
    /// Installation token used for tracker calls.
    pub auth_token: String,
    /// Git ref the plugin was resolved from.
    #[serde(rename = "ref")]
    pub git_ref: String,
    /// Per-request environment overrides.
    #[serde(default)]
    pub env: Option<Value>,
}

impl fmt::Debug for PluginInputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginInputs")
            .field("state_id", &self.state_id)
            .field("event_name", &self.event_name)
            .field("auth_token", &"<redacted>")
            .field("git_ref", &self.git_ref)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    #[serde(default)]
    id: u64,
    login: String,
}

impl From<UserPayload> for Sender {
    fn from(user: UserPayload) -> Self {
        Self::new(user.id, user.login)
    }
}

#[derive(Debug, Deserialize)]
struct LabelPayload {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RepositoryPayload {
    name: String,
    owner: UserPayload,
}

#[derive(Debug, Deserialize)]
struct IssuePayload {
    #[serde(default)]
    id: u64,
    number: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: Option<String>,
    state: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    labels: Vec<LabelPayload>,
    #[serde(default)]
    assignees: Vec<Option<UserPayload>>,
}

impl IssuePayload {
    fn into_issue(self, repository: &RepositoryPayload) -> Result<Issue, PluginError> {
        let locator =
            IssueLocator::from_parts(&repository.owner.login, &repository.name, self.number)?;
        let state = IssueState::from_str(&self.state)?;
        let mut issue = Issue::new(locator, self.title, self.created_at)
            .with_id(self.id)
            .with_state(state)
            .with_labels(self.labels.into_iter().map(|label| label.name))
            .with_assignees(self.assignees.into_iter().flatten().map(|user| user.login));
        if let Some(body) = self.body {
            issue = issue.with_body(body);
        }
        Ok(issue)
    }
}

#[derive(Debug, Deserialize)]
struct CommentPayload {
    #[serde(default)]
    body: String,
}

#[derive(Debug, Deserialize)]
struct PullRequestPayload {
    number: u64,
    html_url: String,
    #[serde(default)]
    user: Option<UserPayload>,
}

#[derive(Debug, Deserialize)]
struct CommentCreatedPayload {
    issue: IssuePayload,
    comment: CommentPayload,
    sender: UserPayload,
    repository: RepositoryPayload,
}

#[derive(Debug, Deserialize)]
struct IssuesAssignedPayload {
    issue: IssuePayload,
    repository: RepositoryPayload,
}

#[derive(Debug, Deserialize)]
struct PullRequestEventPayload {
    pull_request: PullRequestPayload,
    sender: UserPayload,
}

/// Event name of a new issue comment.
pub const ISSUE_COMMENT_CREATED: &str = "issue_comment.created";
/// Event name of an assignee being added.
pub const ISSUES_ASSIGNED: &str = "issues.assigned";
/// Event name of a pull request being opened.
pub const PULL_REQUEST_OPENED: &str = "pull_request.opened";
/// Event name of a pull request being reopened.
pub const PULL_REQUEST_REOPENED: &str = "pull_request.reopened";

/// Decoded webhook event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginEvent {
    /// A comment was posted on an issue.
    IssueCommentCreated {
        /// Issue commented on.
        issue: Issue,
        /// Comment body.
        comment: String,
        /// Comment author.
        sender: Sender,
    },
    /// Assignees were added to an issue.
    IssuesAssigned {
        /// Issue with its new assignees.
        issue: Issue,
    },
    /// A pull request was opened.
    PullRequestOpened {
        /// The pull request.
        pull_request: IssueLocator,
        /// Its author.
        author: Sender,
    },
    /// A pull request was reopened.
    PullRequestReopened {
        /// The pull request.
        pull_request: IssueLocator,
        /// Its author.
        author: Sender,
    },
    /// Any other event.
    Unsupported(String),
}

impl PluginEvent {
    /// Decodes `payload` according to `event_name`.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::InvalidPayload`] when a supported event's
    /// payload lacks required fields, or [`PluginError::InvalidData`] when a
    /// value fails domain validation.
    pub fn decode(event_name: &str, payload: &Value) -> Result<Self, PluginError> {
        match event_name {
            ISSUE_COMMENT_CREATED => {
                let raw: CommentCreatedPayload = parse(event_name, payload)?;
                Ok(Self::IssueCommentCreated {
                    issue: raw.issue.into_issue(&raw.repository)?,
                    comment: raw.comment.body,
                    sender: raw.sender.into(),
                })
            }
            ISSUES_ASSIGNED => {
                let raw: IssuesAssignedPayload = parse(event_name, payload)?;
                Ok(Self::IssuesAssigned {
                    issue: raw.issue.into_issue(&raw.repository)?,
                })
            }
            PULL_REQUEST_OPENED | PULL_REQUEST_REOPENED => {
                let raw: PullRequestEventPayload = parse(event_name, payload)?;
                let repository = RepositoryRef::from_html_url(&raw.pull_request.html_url)?;
                let pull_request = IssueLocator::from_parts(
                    repository.owner(),
                    repository.name(),
                    raw.pull_request.number,
                )?;
                let author = raw
                    .pull_request
                    .user
                    .map_or_else(|| raw.sender.into(), Sender::from);
                if event_name == PULL_REQUEST_OPENED {
                    Ok(Self::PullRequestOpened {
                        pull_request,
                        author,
                    })
                } else {
                    Ok(Self::PullRequestReopened {
                        pull_request,
                        author,
                    })
                }
            }
            other => Ok(Self::Unsupported(other.to_owned())),
        }
    }

    /// Returns the issue that receives error comments, if the event has one.
    #[must_use]
    pub const fn comment_target(&self) -> Option<&IssueLocator> {
        match self {
            Self::IssueCommentCreated { issue, .. } => Some(issue.locator()),
            Self::IssuesAssigned { .. }
            | Self::PullRequestOpened { .. }
            | Self::PullRequestReopened { .. }
            | Self::Unsupported(_) => None,
        }
    }
}

fn parse<T: DeserializeOwned>(event_name: &str, payload: &Value) -> Result<T, PluginError> {
    T::deserialize(payload).map_err(|source| PluginError::InvalidPayload {
        event: event_name.to_owned(),
        source,
    })
}
