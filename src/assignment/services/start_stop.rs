//! Eligibility rules and side effects of `/start` and `/stop`.
//!
//! Provides [`StartStopService`], which checks every precondition against
//! freshly fetched tracker state, mutates the assignees and posts the
//! resulting comments.

use super::comment::{render_assignment_comment, render_closed_pull_requests};
use super::linked_prs::LinkedPullRequestResolver;
use super::pagination::paginate;
use crate::assignment::{
    domain::{
        AssignmentComment, CommandName, Issue, IssueLocator, IssueNumber, LinkedPullRequest,
        RepositoryRef, Role, SearchItem, Sender, TaskLimit, filter_teammates,
        issue_linked_via_pr_body, shortest_duration,
    },
    ports::{IssueTracker, IssueTrackerError, IssueTrackerResult, WalletStore},
};
use crate::config::StartStopSettings;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Request to assign the sender, and optionally teammates, to an issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartRequest {
    issue: Issue,
    sender: Sender,
    teammates: Vec<String>,
}

impl StartRequest {
    /// Creates a request without teammates.
    #[must_use]
    pub const fn new(issue: Issue, sender: Sender) -> Self {
        Self {
            issue,
            sender,
            teammates: Vec::new(),
        }
    }

    /// Adds mentioned teammates. Invalid logins, the sender and duplicates
    /// are dropped.
    #[must_use]
    pub fn with_teammates<S: AsRef<str>>(mut self, mentions: &[S]) -> Self {
        self.teammates = filter_teammates(mentions, &self.sender.login);
        self
    }

    /// Returns the accepted teammates.
    #[must_use]
    pub fn teammates(&self) -> &[String] {
        &self.teammates
    }
}

/// Request to unassign the sender from an issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopRequest {
    issue: Issue,
    sender: Sender,
}

impl StopRequest {
    /// Creates a stop request.
    #[must_use]
    pub const fn new(issue: Issue, sender: Sender) -> Self {
        Self { issue, sender }
    }
}

/// Successful result of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The listed logins were assigned.
    Assigned {
        /// Sender first, then teammates.
        assignees: Vec<String>,
    },
    /// The sender was unassigned.
    Unassigned {
        /// Linked pull requests that were closed.
        closed_pull_requests: Vec<IssueNumber>,
    },
}

impl TaskOutcome {
    /// Returns the summary message for the invocation result.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Assigned { .. } => "Task assigned successfully",
            Self::Unassigned { .. } => "Task unassigned successfully",
        }
    }
}

/// Reasons a command was refused or failed.
///
/// The `Display` text of precondition variants is posted back to the issue.
#[derive(Debug, Clone, Error)]
pub enum StartStopError {
    /// The command is listed in `disabledCommands`.
    #[error("The '/{0}' command is disabled for this repository.")]
    CommandDisabled(CommandName),

    /// The issue is closed.
    #[error("Issue is closed")]
    IssueClosed,

    /// The issue tracks sub-issues.
    #[error("Issue is a parent issue")]
    ParentIssue,

    /// Someone is already assigned.
    #[error("Issue is already assigned")]
    AlreadyAssigned,

    /// No price label, or no time label to derive a deadline from.
    #[error("No price label is set to calculate the duration")]
    MissingPriceLabel,

    /// The sender has no registered wallet.
    #[error("No wallet address found")]
    MissingWallet,

    /// The sender is at their concurrency limit.
    #[error("Too many assigned issues, you have reached your max limit of {limit} issues.")]
    SenderLimitReached {
        /// Limit of the sender's role.
        limit: TaskLimit,
    },

    /// A teammate is at their concurrency limit.
    #[error("{login} has reached their max limit of {limit} issues.")]
    TeammateLimitReached {
        /// Teammate login.
        login: String,
        /// Limit of the teammate's role.
        limit: TaskLimit,
    },

    /// The sender is not among the assignees.
    #[error("You are not assigned to this task")]
    NotAssigned,

    /// A tracker mutation failed.
    #[error(transparent)]
    Tracker(#[from] IssueTrackerError),

    /// The assignment comment could not be rendered.
    #[error("failed to render comment: {0}")]
    Comment(String),
}

impl StartStopError {
    /// Returns whether the error is a refused precondition rather than an
    /// infrastructure failure.
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        !matches!(self, Self::Tracker(_) | Self::Comment(_))
    }
}

/// Result type for start/stop operations.
pub type StartStopResult<T> = Result<T, StartStopError>;

/// Task assignment orchestration service.
pub struct StartStopService<T, W, C>
where
    T: IssueTracker,
    W: WalletStore,
    C: Clock + Send + Sync,
{
    tracker: Arc<T>,
    wallets: Arc<W>,
    clock: Arc<C>,
    settings: Arc<StartStopSettings>,
    resolver: LinkedPullRequestResolver<T>,
}

impl<T, W, C> StartStopService<T, W, C>
where
    T: IssueTracker,
    W: WalletStore,
    C: Clock + Send + Sync,
{
    /// Creates a service for one invocation's settings.
    #[must_use]
    pub fn new(
        tracker: Arc<T>,
        wallets: Arc<W>,
        clock: Arc<C>,
        settings: Arc<StartStopSettings>,
    ) -> Self {
        let resolver = LinkedPullRequestResolver::new(Arc::clone(&tracker));
        Self {
            tracker,
            wallets,
            clock,
            settings,
            resolver,
        }
    }

    /// Returns the settings in effect.
    #[must_use]
    pub fn settings(&self) -> &StartStopSettings {
        &self.settings
    }

    /// Returns the clock used for deadlines.
    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Assigns the sender and teammates after checking every precondition.
    ///
    /// # Errors
    ///
    /// Returns the first failed precondition as a [`StartStopError`], or
    /// [`StartStopError::Tracker`] when adding the assignees fails.
    pub async fn start(&self, request: StartRequest) -> StartStopResult<TaskOutcome> {
        let StartRequest {
            issue,
            sender,
            teammates,
        } = request;
        let locator = issue.locator();

        self.ensure_enabled(CommandName::Start)?;
        if !issue.is_open() {
            return Err(StartStopError::IssueClosed);
        }
        if issue.is_parent() {
            return Err(StartStopError::ParentIssue);
        }
        if issue.is_assigned() {
            return Err(StartStopError::AlreadyAssigned);
        }
        if !issue.has_price_label() || shortest_duration(issue.labels()).is_none() {
            return Err(StartStopError::MissingPriceLabel);
        }

        let wallet = self.wallet_of(&sender, locator.number()).await;
        if wallet.is_none() && self.settings.start_requires_wallet {
            self.post_comment(locator, &self.settings.empty_wallet_text)
                .await;
            return Err(StartStopError::MissingWallet);
        }

        let organization = locator.repository().owner();
        let now = self.clock.utc();
        if let Err(limit) = self.check_limit(organization, &sender.login, now).await {
            return Err(StartStopError::SenderLimitReached { limit });
        }
        for teammate in &teammates {
            if let Err(limit) = self.check_limit(organization, teammate, now).await {
                return Err(StartStopError::TeammateLimitReached {
                    login: teammate.clone(),
                    limit,
                });
            }
        }

        let details = AssignmentComment::generate(
            &issue,
            wallet.as_deref(),
            &self.settings.task_stale_timeout_duration,
            now,
        )
        .ok_or(StartStopError::MissingPriceLabel)?;
        let comment = render_assignment_comment(&details)
            .map_err(|err| StartStopError::Comment(err.to_string()))?;

        let mut assignees = Vec::with_capacity(teammates.len() + 1);
        assignees.push(sender.login.clone());
        assignees.extend(teammates);
        self.tracker.add_assignees(locator, &assignees).await?;
        self.post_comment(locator, &comment).await;

        info!(
            issue = %locator,
            assignees = ?assignees,
            deadline = %details.deadline,
            "task assigned"
        );
        Ok(TaskOutcome::Assigned { assignees })
    }

    /// Unassigns the sender and closes their pull requests linked to the
    /// issue.
    ///
    /// # Errors
    ///
    /// Returns [`StartStopError::NotAssigned`] or
    /// [`StartStopError::CommandDisabled`] when a precondition fails, or
    /// [`StartStopError::Tracker`] when removing the assignee fails.
    pub async fn stop(&self, request: StopRequest) -> StartStopResult<TaskOutcome> {
        let StopRequest { issue, sender } = request;
        let locator = issue.locator();

        let assignee = issue
            .assignee(&sender.login)
            .map(str::to_owned)
            .ok_or(StartStopError::NotAssigned)?;
        self.ensure_enabled(CommandName::Stop)?;

        self.tracker
            .remove_assignees(locator, std::slice::from_ref(&assignee))
            .await?;
        let closed = self.close_linked_pull_requests(&issue, &assignee).await;

        info!(
            issue = %locator,
            assignee = %assignee,
            closed = closed.len(),
            "task unassigned"
        );
        Ok(TaskOutcome::Unassigned {
            closed_pull_requests: closed,
        })
    }

    /// Resolves the concurrency limit of `login` in `organization`.
    ///
    /// Non-members and failed look-ups get the smallest configured limit.
    pub async fn limit_for(&self, organization: &str, login: &str) -> TaskLimit {
        let limits = &self.settings.max_concurrent_tasks;
        match self.tracker.membership_role(organization, login).await {
            Ok(Some(raw)) => limits.limit_for(&Role::from_membership(&raw)),
            Ok(None) => {
                debug!(organization, login, "user is not an organization member");
                limits.smallest()
            }
            Err(err) => {
                warn!(organization, login, error = %err, "fetching membership failed");
                limits.smallest()
            }
        }
    }

    /// Counts open issues in `organization` assigned to `login`.
    ///
    /// Search failures are logged and count as zero.
    pub async fn assigned_issue_count(&self, organization: &str, login: &str) -> usize {
        let tracker = &*self.tracker;
        let result: IssueTrackerResult<Vec<SearchItem>> = paginate(1, move |page| {
            tracker.assigned_open_issues(organization, login, page)
        })
        .try_filter(|item| std::future::ready(item.is_open_issue_assigned_to(login)))
        .try_collect()
        .await;
        match result {
            Ok(items) => items.len(),
            Err(err) => {
                warn!(organization, login, error = %err, "fetching assigned issues failed");
                0
            }
        }
    }

    /// Counts open pull requests of `login` that no longer count as load:
    /// approved by a reviewer with authority, or unreviewed for longer than
    /// the review tolerance.
    pub async fn available_pull_request_count(
        &self,
        organization: &str,
        login: &str,
        now: DateTime<Utc>,
    ) -> usize {
        let tracker = &*self.tracker;
        let result: IssueTrackerResult<Vec<SearchItem>> = paginate(1, move |page| {
            tracker.open_pull_requests_by(organization, login, page)
        })
        .try_filter(|item| std::future::ready(item.is_open_pull_request()))
        .try_collect()
        .await;
        let pull_requests = match result {
            Ok(items) => items,
            Err(err) => {
                warn!(organization, login, error = %err, "fetching open pull requests failed");
                return 0;
            }
        };

        let mut available = 0;
        for pull_request in &pull_requests {
            if self.is_available(pull_request, now).await {
                available += 1;
            }
        }
        available
    }

    async fn is_available(&self, pull_request: &SearchItem, now: DateTime<Utc>) -> bool {
        let Ok(repository) = RepositoryRef::from_html_url(&pull_request.html_url) else {
            debug!(url = %pull_request.html_url, "skipping pull request with unknown repository");
            return false;
        };
        let locator = IssueLocator::new(repository, pull_request.number);
        let tracker = &*self.tracker;
        let reviews = match paginate(1, |page| tracker.pull_request_reviews(&locator, page))
            .try_collect::<Vec<_>>()
            .await
        {
            Ok(reviews) => reviews,
            Err(err) => {
                warn!(pull_request = %locator, error = %err, "fetching reviews failed");
                Vec::new()
            }
        };

        if reviews.is_empty() {
            let waited = now.signed_duration_since(pull_request.created_at);
            return waited >= self.settings.review_delay_tolerance.as_delta();
        }
        let authorities = &self.settings.roles_with_review_authority;
        reviews
            .iter()
            .any(|review| review.approves_with_authority(authorities))
    }

    async fn check_limit(
        &self,
        organization: &str,
        login: &str,
        now: DateTime<Utc>,
    ) -> Result<(), TaskLimit> {
        let limit = self.limit_for(organization, login).await;
        if limit == TaskLimit::Unlimited {
            return Ok(());
        }
        let assigned = self.assigned_issue_count(organization, login).await;
        let available = self
            .available_pull_request_count(organization, login, now)
            .await;
        let load = assigned.saturating_sub(available);
        debug!(organization, login, assigned, available, %limit, "checked assignment load");
        if limit.allows(load) {
            Ok(())
        } else {
            Err(limit)
        }
    }

    async fn close_linked_pull_requests(&self, issue: &Issue, author: &str) -> Vec<IssueNumber> {
        let locator = issue.locator();
        let linked = self.resolver.linked_pull_requests(locator).await;
        if linked.is_empty() {
            info!(issue = %locator, "no linked pull requests to close");
            return Vec::new();
        }

        let organization = locator.repository().owner();
        let issue_number = locator.number().value();
        let mut closed: Vec<LinkedPullRequest> = Vec::new();
        for pull_request in linked {
            if !pull_request.author.eq_ignore_ascii_case(author)
                || !pull_request.organization.eq_ignore_ascii_case(organization)
            {
                continue;
            }
            if !issue_linked_via_pr_body(pull_request.body.as_deref(), issue_number) {
                info!(
                    issue = %locator,
                    pull_request = pull_request.number.value(),
                    "pull request body does not reference the issue"
                );
                continue;
            }
            let Some(pr_locator) = pull_request.locator() else {
                continue;
            };
            match self
                .tracker
                .close_pull_request(pr_locator.repository(), pr_locator.number())
                .await
            {
                Ok(()) => closed.push(pull_request),
                Err(err) => warn!(
                    pull_request = %pr_locator,
                    error = %err,
                    "closing pull request failed"
                ),
            }
        }

        if closed.is_empty() {
            info!(issue = %locator, "no pull requests were closed");
            return Vec::new();
        }
        self.post_comment(locator, &render_closed_pull_requests(&closed))
            .await;
        closed
            .into_iter()
            .map(|pull_request| pull_request.number)
            .collect()
    }

    fn ensure_enabled(&self, command: CommandName) -> StartStopResult<()> {
        if self.settings.is_command_disabled(command) {
            return Err(StartStopError::CommandDisabled(command));
        }
        Ok(())
    }

    async fn wallet_of(&self, sender: &Sender, issue_number: IssueNumber) -> Option<String> {
        match self
            .wallets
            .wallet_for(sender.id, issue_number.value())
            .await
        {
            Ok(wallet) => wallet.filter(|address| !address.trim().is_empty()),
            Err(err) => {
                warn!(user = %sender.login, error = %err, "fetching wallet failed");
                None
            }
        }
    }

    /// Posts `body` on the issue. Failures are logged, not returned.
    pub async fn post_comment(&self, issue: &IssueLocator, body: &str) {
        if let Err(err) = self.tracker.create_comment(issue, body).await {
            warn!(%issue, error = %err, "posting comment failed");
        }
    }
}
