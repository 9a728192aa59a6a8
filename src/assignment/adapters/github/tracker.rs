//! [`IssueTracker`] backed by the GitHub REST and GraphQL APIs.

use super::models::{
    CLOSING_ISSUE_REFERENCES_QUERY, ClosingReferencesData, GraphQlResponse, IssueNode,
    MembershipRow, ReviewRow, SearchResponse, TimelineRow,
};
use crate::assignment::adapters::http::{
    RetryPolicy, is_retryable_status, is_retryable_transport_error, parse_retry_after,
    truncate_for_error,
};
use crate::assignment::{
    domain::{Issue, IssueLocator, IssueNumber, RepositoryRef, Review, SearchItem, TimelineEvent},
    ports::{CursorPage, IssueTracker, IssueTrackerError, IssueTrackerResult, Page},
    services::next_page_number,
};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

/// Public GitHub REST endpoint.
pub const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";

const PER_PAGE: usize = 100;
const PER_PAGE_PARAM: &str = "100";
const USER_AGENT_VALUE: &str = "start-stop-plugin";
const GITHUB_JSON: &str = "application/vnd.github+json";
const API_VERSION_HEADER: &str = "x-github-api-version";
const API_VERSION: &str = "2022-11-28";

/// Connection settings for [`GitHubIssueTracker`].
#[derive(Clone, PartialEq, Eq)]
pub struct GitHubConfig {
    api_base: String,
    token: String,
    timeout: Duration,
    retry: RetryPolicy,
}

impl GitHubConfig {
    /// Creates settings for `api_base` authenticated with `token`.
    #[must_use]
    pub fn new(api_base: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            token: token.into(),
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl std::fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("api_base", &self.api_base)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

/// GitHub client implementing the issue tracker port.
#[derive(Debug, Clone)]
pub struct GitHubIssueTracker {
    http: reqwest::Client,
    api_base: String,
    retry: RetryPolicy,
}

impl GitHubIssueTracker {
    /// Builds a client with GitHub's JSON headers and bearer authentication.
    ///
    /// # Errors
    ///
    /// Returns [`IssueTrackerError::Transport`] when the token is not a valid
    /// header value or the HTTP client cannot be built.
    pub fn new(config: GitHubConfig) -> IssueTrackerResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_JSON));
        headers.insert(API_VERSION_HEADER, HeaderValue::from_static(API_VERSION));
        let mut authorization = HeaderValue::from_str(&format!("Bearer {}", config.token.trim()))
            .map_err(|err| IssueTrackerError::transport("configure client", err))?;
        authorization.set_sensitive(true);
        headers.insert(AUTHORIZATION, authorization);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|err| IssueTrackerError::transport("configure client", err))?;
        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_owned(),
            retry: config.retry,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_base)
    }

    fn repo_url(&self, repository: &RepositoryRef, rest: &str) -> String {
        self.url(&format!(
            "/repos/{}/{}{rest}",
            repository.owner(),
            repository.name()
        ))
    }

    async fn send<F>(&self, operation: &'static str, build: F) -> IssueTrackerResult<Response>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let mut attempt = 0_usize;
        loop {
            attempt = attempt.saturating_add(1);
            match build().send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status().as_u16();
                    let retry_after = parse_retry_after(response.headers());
                    let body = response.text().await.unwrap_or_default();
                    if self.retry.should_retry(attempt) && is_retryable_status(status) {
                        debug!(operation, status, attempt, "retrying GitHub request");
                        tokio::time::sleep(self.retry.delay(attempt, retry_after)).await;
                        continue;
                    }
                    return Err(IssueTrackerError::Status {
                        operation,
                        status,
                        body: truncate_for_error(&body),
                    });
                }
                Err(err) => {
                    if self.retry.should_retry(attempt) && is_retryable_transport_error(&err) {
                        debug!(operation, attempt, error = %err, "retrying GitHub request");
                        tokio::time::sleep(self.retry.delay(attempt, None)).await;
                        continue;
                    }
                    return Err(IssueTrackerError::transport(operation, err));
                }
            }
        }
    }

    async fn send_json<T, F>(&self, operation: &'static str, build: F) -> IssueTrackerResult<T>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let response = self.send(operation, build).await?;
        response
            .json::<T>()
            .await
            .map_err(|err| IssueTrackerError::decode(operation, err.to_string()))
    }

    async fn search(
        &self,
        operation: &'static str,
        query: &str,
        page: u32,
    ) -> IssueTrackerResult<Page<SearchItem>> {
        let url = self.url("/search/issues");
        let page_param = page.to_string();
        let response: SearchResponse = self
            .send_json(operation, || {
                self.http.get(&url).query(&[
                    ("q", query),
                    ("per_page", PER_PAGE_PARAM),
                    ("order", "desc"),
                    ("sort", "created"),
                    ("page", page_param.as_str()),
                ])
            })
            .await?;
        let len = response.items.len();
        let items = convert_rows(operation, response.items, SearchItem::try_from)?;
        Ok(numbered_page(items, page, len))
    }

    async fn send_without_body<F>(
        &self,
        operation: &'static str,
        build: F,
    ) -> IssueTrackerResult<()>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        self.send(operation, build).await.map(drop)
    }
}

fn numbered_page<T>(items: Vec<T>, page: u32, fetched: usize) -> Page<T> {
    match next_page_number(page, fetched, PER_PAGE) {
        Some(next) => Page::with_next(items, next),
        None => Page::last(items),
    }
}

fn convert_rows<R, T, E, F>(
    operation: &'static str,
    rows: Vec<R>,
    convert: F,
) -> IssueTrackerResult<Vec<T>>
where
    F: Fn(R) -> Result<T, E>,
    E: std::fmt::Display,
{
    rows.into_iter()
        .map(|row| {
            convert(row).map_err(|err| IssueTrackerError::decode(operation, err.to_string()))
        })
        .collect()
}

#[async_trait]
impl IssueTracker for GitHubIssueTracker {
    async fn assigned_open_issues(
        &self,
        organization: &str,
        login: &str,
        page: u32,
    ) -> IssueTrackerResult<Page<SearchItem>> {
        let query = format!("org:{organization} assignee:{login} is:open is:issue");
        self.search("search assigned issues", &query, page).await
    }

    async fn open_pull_requests_by(
        &self,
        organization: &str,
        login: &str,
        page: u32,
    ) -> IssueTrackerResult<Page<SearchItem>> {
        let query = format!("org:{organization} author:{login} state:open is:pr");
        self.search("search open pull requests", &query, page).await
    }

    async fn pull_request_reviews(
        &self,
        pull_request: &IssueLocator,
        page: u32,
    ) -> IssueTrackerResult<Page<Review>> {
        let url = self.repo_url(
            pull_request.repository(),
            &format!("/pulls/{}/reviews", pull_request.number()),
        );
        let page_param = page.to_string();
        let rows: Vec<ReviewRow> = self
            .send_json("list pull request reviews", || {
                self.http
                    .get(&url)
                    .query(&[("per_page", PER_PAGE_PARAM), ("page", page_param.as_str())])
            })
            .await?;
        let len = rows.len();
        Ok(numbered_page(
            rows.into_iter().map(Review::from).collect(),
            page,
            len,
        ))
    }

    async fn membership_role(
        &self,
        organization: &str,
        login: &str,
    ) -> IssueTrackerResult<Option<String>> {
        let url = self.url(&format!("/orgs/{organization}/memberships/{login}"));
        let result: IssueTrackerResult<MembershipRow> = self
            .send_json("get organization membership", || self.http.get(&url))
            .await;
        match result {
            Ok(row) => Ok(Some(row.role)),
            Err(IssueTrackerError::Status { status, .. })
                if status == StatusCode::NOT_FOUND.as_u16() =>
            {
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    async fn create_comment(&self, issue: &IssueLocator, body: &str) -> IssueTrackerResult<()> {
        let url = self.repo_url(
            issue.repository(),
            &format!("/issues/{}/comments", issue.number()),
        );
        let payload = json!({ "body": body });
        self.send_without_body("create comment", || self.http.post(&url).json(&payload))
            .await
    }

    async fn add_assignees(
        &self,
        issue: &IssueLocator,
        logins: &[String],
    ) -> IssueTrackerResult<()> {
        let url = self.repo_url(
            issue.repository(),
            &format!("/issues/{}/assignees", issue.number()),
        );
        let payload = json!({ "assignees": logins });
        self.send_without_body("add assignees", || self.http.post(&url).json(&payload))
            .await
    }

    async fn remove_assignees(
        &self,
        issue: &IssueLocator,
        logins: &[String],
    ) -> IssueTrackerResult<()> {
        let url = self.repo_url(
            issue.repository(),
            &format!("/issues/{}/assignees", issue.number()),
        );
        let payload = json!({ "assignees": logins });
        self.send_without_body("remove assignees", || {
            self.http.request(Method::DELETE, &url).json(&payload)
        })
        .await
    }

    async fn close_pull_request(
        &self,
        repository: &RepositoryRef,
        number: IssueNumber,
    ) -> IssueTrackerResult<()> {
        let url = self.repo_url(repository, &format!("/pulls/{number}"));
        let payload = json!({ "state": "closed" });
        self.send_without_body("close pull request", || self.http.patch(&url).json(&payload))
            .await
    }

    async fn timeline_events(
        &self,
        issue: &IssueLocator,
        page: u32,
    ) -> IssueTrackerResult<Page<TimelineEvent>> {
        let operation = "list timeline events";
        let url = self.repo_url(
            issue.repository(),
            &format!("/issues/{}/timeline", issue.number()),
        );
        let page_param = page.to_string();
        let rows: Vec<TimelineRow> = self
            .send_json(operation, || {
                self.http
                    .get(&url)
                    .query(&[("per_page", PER_PAGE_PARAM), ("page", page_param.as_str())])
            })
            .await?;
        let len = rows.len();
        let events = convert_rows(operation, rows, TimelineEvent::try_from)?;
        Ok(numbered_page(events, page, len))
    }

    async fn closing_issue_references(
        &self,
        pull_request: &IssueLocator,
        cursor: Option<String>,
    ) -> IssueTrackerResult<CursorPage<Issue>> {
        let operation = "query closing issue references";
        let url = self.url("/graphql");
        let payload = json!({
            "query": CLOSING_ISSUE_REFERENCES_QUERY,
            "variables": {
                "owner": pull_request.repository().owner(),
                "repo": pull_request.repository().name(),
                "issue_number": pull_request.number().value(),
                "cursor": cursor,
            },
        });
        let response: GraphQlResponse<ClosingReferencesData> = self
            .send_json(operation, || self.http.post(&url).json(&payload))
            .await?;
        if let Some(first) = response.errors.first() {
            return Err(IssueTrackerError::decode(operation, first.message.clone()));
        }
        let Some(connection) = response
            .data
            .and_then(|data| data.repository)
            .and_then(|repository| repository.pull_request)
            .and_then(|pr| pr.closing_issues_references)
        else {
            warn!(%pull_request, "pull request not found while querying closing references");
            return Ok(CursorPage::last(Vec::new()));
        };

        let nodes: Vec<IssueNode> = connection.nodes.into_iter().flatten().collect();
        let issues = convert_rows(operation, nodes, Issue::try_from)?;
        let next = connection
            .page_info
            .end_cursor
            .filter(|_| connection.page_info.has_next_page);
        Ok(CursorPage { items: issues, next })
    }
}
