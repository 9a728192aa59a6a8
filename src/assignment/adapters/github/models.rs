//! Wire shapes of the GitHub REST and GraphQL responses this adapter reads.

use crate::assignment::domain::{
    AssignmentDomainError, Issue, IssueLocator, IssueNumber, IssueState, Review, SearchItem,
    TimelineEvent, TimelineSource,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Deserialize)]
pub(super) struct UserRow {
    pub(super) login: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchResponse {
    #[serde(default)]
    pub(super) items: Vec<SearchItemRow>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchItemRow {
    number: u64,
    html_url: String,
    state: String,
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
    #[serde(default)]
    user: Option<UserRow>,
    #[serde(default)]
    assignees: Vec<UserRow>,
    #[serde(default)]
    assignee: Option<UserRow>,
    created_at: DateTime<Utc>,
}

impl TryFrom<SearchItemRow> for SearchItem {
    type Error = AssignmentDomainError;

    fn try_from(row: SearchItemRow) -> Result<Self, Self::Error> {
        let mut assignees: Vec<String> = row.assignees.into_iter().map(|user| user.login).collect();
        if assignees.is_empty()
            && let Some(single) = row.assignee
        {
            assignees.push(single.login);
        }
        Ok(Self {
            number: IssueNumber::new(row.number)?,
            html_url: row.html_url,
            state: IssueState::from_str(&row.state)?,
            is_pull_request: row.pull_request.is_some(),
            author: row.user.map(|user| user.login).unwrap_or_default(),
            assignees,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ReviewRow {
    #[serde(default)]
    user: Option<UserRow>,
    #[serde(default)]
    author_association: String,
    #[serde(default)]
    state: String,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            reviewer: row.user.map(|user| user.login).unwrap_or_default(),
            author_association: row.author_association,
            state: row.state,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct MembershipRow {
    pub(super) role: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct TimelineRow {
    #[serde(default)]
    event: Option<String>,
    #[serde(default)]
    source: Option<TimelineSourceRow>,
}

#[derive(Debug, Deserialize)]
struct TimelineSourceRow {
    #[serde(default)]
    issue: Option<TimelineIssueRow>,
}

#[derive(Debug, Deserialize)]
struct TimelineIssueRow {
    number: u64,
    state: String,
    #[serde(default)]
    draft: bool,
    #[serde(default)]
    body: Option<String>,
    html_url: String,
    #[serde(default)]
    user: Option<UserRow>,
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
    #[serde(default)]
    repository: Option<RepositoryRow>,
}

#[derive(Debug, Deserialize)]
struct RepositoryRow {
    full_name: String,
}

impl TryFrom<TimelineRow> for TimelineEvent {
    type Error = AssignmentDomainError;

    fn try_from(row: TimelineRow) -> Result<Self, Self::Error> {
        let source = row
            .source
            .and_then(|source| source.issue)
            .map(|issue| -> Result<TimelineSource, AssignmentDomainError> {
                Ok(TimelineSource {
                    number: IssueNumber::new(issue.number)?,
                    state: IssueState::from_str(&issue.state)?,
                    draft: issue.draft,
                    body: issue.body,
                    repository_full_name: issue
                        .repository
                        .map(|repository| repository.full_name)
                        .unwrap_or_default(),
                    html_url: issue.html_url,
                    author: issue.user.map(|user| user.login).unwrap_or_default(),
                    is_pull_request: issue.pull_request.is_some(),
                })
            })
            .transpose()?;
        Ok(Self {
            event: row.event.unwrap_or_default(),
            source,
        })
    }
}

pub(super) const CLOSING_ISSUE_REFERENCES_QUERY: &str = r"query collectLinkedIssues($owner: String!, $repo: String!, $issue_number: Int!, $cursor: String) {
  repository(owner: $owner, name: $repo) {
    pullRequest(number: $issue_number) {
      closingIssuesReferences(first: 100, after: $cursor) {
        pageInfo {
          hasNextPage
          endCursor
        }
        nodes {
          databaseId
          number
          title
          body
          state
          createdAt
          labels(first: 100) {
            nodes {
              name
            }
          }
          assignees(first: 100) {
            nodes {
              login
            }
          }
          repository {
            name
            owner {
              login
            }
          }
        }
      }
    }
  }
}";

#[derive(Debug, Deserialize)]
pub(super) struct GraphQlResponse<T> {
    pub(super) data: Option<T>,
    #[serde(default)]
    pub(super) errors: Vec<GraphQlErrorRow>,
}

#[derive(Debug, Deserialize)]
pub(super) struct GraphQlErrorRow {
    pub(super) message: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct ClosingReferencesData {
    pub(super) repository: Option<ClosingRepository>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ClosingRepository {
    pub(super) pull_request: Option<ClosingPullRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ClosingPullRequest {
    pub(super) closing_issues_references: Option<ClosingConnection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ClosingConnection {
    pub(super) page_info: PageInfo,
    #[serde(default)]
    pub(super) nodes: Vec<Option<IssueNode>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PageInfo {
    pub(super) has_next_page: bool,
    pub(super) end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct IssueNode {
    #[serde(default)]
    database_id: Option<u64>,
    number: u64,
    title: String,
    #[serde(default)]
    body: Option<String>,
    state: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    labels: Option<Connection<LabelNode>>,
    #[serde(default)]
    assignees: Option<Connection<UserRow>>,
    repository: NodeRepository,
}

#[derive(Debug, Deserialize)]
struct Connection<T> {
    #[serde(default = "Vec::new")]
    nodes: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct LabelNode {
    name: String,
}

#[derive(Debug, Deserialize)]
struct NodeRepository {
    name: String,
    owner: UserRow,
}

impl TryFrom<IssueNode> for Issue {
    type Error = AssignmentDomainError;

    fn try_from(node: IssueNode) -> Result<Self, Self::Error> {
        let locator = IssueLocator::from_parts(
            &node.repository.owner.login,
            &node.repository.name,
            node.number,
        )?;
        let mut issue = Self::new(locator, node.title, node.created_at)
            .with_id(node.database_id.unwrap_or_default())
            .with_state(IssueState::from_str(&node.state)?)
            .with_labels(
                node.labels
                    .into_iter()
                    .flat_map(|labels| labels.nodes)
                    .map(|label| label.name),
            )
            .with_assignees(
                node.assignees
                    .into_iter()
                    .flat_map(|assignees| assignees.nodes)
                    .map(|user| user.login),
            );
        if let Some(body) = node.body {
            issue = issue.with_body(body);
        }
        Ok(issue)
    }
}
