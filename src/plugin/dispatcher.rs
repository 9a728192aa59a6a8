//! Routing of decoded events to the start/stop workflows.

use super::{PluginError, PluginEvent};
use crate::assignment::{
    domain::{CommandName, Issue, IssueLocator, Sender, SlashCommand, deadline_for},
    ports::{IssueTracker, IssueTrackerError, Page, WalletStore},
    services::{
        StartRequest, StartStopResult, StartStopService, StopRequest,
        comment::{render_deadline_notice, render_error_comment},
        paginate,
    },
};
use crate::config::StartStopSettings;
use futures_util::TryStreamExt;
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Result class of an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStatus {
    /// State was changed.
    Ok,
    /// Nothing applied to this event.
    NotModified,
    /// A command was refused or failed; the reason was posted to the issue.
    Rejected,
}

/// What an invocation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Result class.
    pub status: DispatchStatus,
    /// Summary message, if any.
    pub output: Option<String>,
}

impl DispatchOutcome {
    /// Creates a successful outcome with a message.
    #[must_use]
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            status: DispatchStatus::Ok,
            output: Some(output.into()),
        }
    }

    /// Creates an outcome for events that required no action.
    #[must_use]
    pub const fn not_modified() -> Self {
        Self {
            status: DispatchStatus::NotModified,
            output: None,
        }
    }

    /// Creates an outcome for a refused or failed command.
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            status: DispatchStatus::Rejected,
            output: Some(reason.into()),
        }
    }
}

/// Routes events to [`StartStopService`].
pub struct CommandDispatcher<T, W, C>
where
    T: IssueTracker,
    W: WalletStore,
    C: Clock + Send + Sync,
{
    tracker: Arc<T>,
    service: StartStopService<T, W, C>,
}

impl<T, W, C> CommandDispatcher<T, W, C>
where
    T: IssueTracker,
    W: WalletStore,
    C: Clock + Send + Sync,
{
    /// Creates a dispatcher for one invocation.
    #[must_use]
    pub fn new(
        tracker: Arc<T>,
        wallets: Arc<W>,
        clock: Arc<C>,
        settings: Arc<StartStopSettings>,
    ) -> Self {
        let service = StartStopService::new(Arc::clone(&tracker), wallets, clock, settings);
        Self { tracker, service }
    }

    /// Handles `event`, posting refused commands back to the issue as a
    /// `diff` block.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Command`] when a command fails for a reason
    /// other than a refused precondition, such as a failed assignee change.
    /// Nothing is posted to the issue in that case.
    pub async fn handle(&self, event: PluginEvent) -> Result<DispatchOutcome, PluginError> {
        let target = event.comment_target().cloned();
        match self.dispatch(event).await {
            Ok(outcome) => Ok(outcome),
            Err(err) if err.is_precondition() => {
                let reason = err.to_string();
                info!(reason = %reason, "command refused");
                if let Some(issue) = target {
                    self.service
                        .post_comment(&issue, &render_error_comment(&reason))
                        .await;
                }
                Ok(DispatchOutcome::rejected(reason))
            }
            Err(err) => {
                error!(error = %err, "command failed");
                Err(PluginError::Command(err))
            }
        }
    }

    /// Routes `event` to its workflow.
    ///
    /// # Errors
    ///
    /// Returns the [`StartStopError`](crate::assignment::services::StartStopError)
    /// of a refused or failed `/start` or `/stop`.
    pub async fn dispatch(&self, event: PluginEvent) -> StartStopResult<DispatchOutcome> {
        match event {
            PluginEvent::IssueCommentCreated {
                issue,
                comment,
                sender,
            } => self.on_comment(issue, &comment, sender).await,
            PluginEvent::IssuesAssigned { issue } => Ok(self.on_assigned(&issue).await),
            PluginEvent::PullRequestOpened {
                pull_request,
                author,
            }
            | PluginEvent::PullRequestReopened {
                pull_request,
                author,
            } => Ok(self.on_pull_request(&pull_request, &author).await),
            PluginEvent::Unsupported(name) => {
                debug!(event = %name, "ignoring unsupported event");
                Ok(DispatchOutcome::not_modified())
            }
        }
    }

    async fn on_comment(
        &self,
        issue: Issue,
        comment: &str,
        sender: Sender,
    ) -> StartStopResult<DispatchOutcome> {
        let Some(command) = SlashCommand::parse(comment) else {
            return Ok(DispatchOutcome::not_modified());
        };
        match command.command() {
            Some(CommandName::Stop) => {
                let outcome = self.service.stop(StopRequest::new(issue, sender)).await?;
                Ok(DispatchOutcome::ok(outcome.message()))
            }
            Some(CommandName::Start) => {
                let request =
                    StartRequest::new(issue, sender).with_teammates(&command.teammates);
                let outcome = self.service.start(request).await?;
                Ok(DispatchOutcome::ok(outcome.message()))
            }
            None => Ok(DispatchOutcome::not_modified()),
        }
    }

    async fn on_assigned(&self, issue: &Issue) -> DispatchOutcome {
        let Some(deadline) = deadline_for(issue.labels(), self.service.clock().utc()) else {
            debug!(issue = %issue.locator(), "no deadline set, skipping deadline notice");
            return DispatchOutcome::not_modified();
        };
        let notice = render_deadline_notice(issue.assignees(), &deadline);
        self.service.post_comment(issue.locator(), &notice).await;
        DispatchOutcome::ok(notice)
    }

    async fn on_pull_request(
        &self,
        pull_request: &IssueLocator,
        author: &Sender,
    ) -> DispatchOutcome {
        let tracker = &*self.tracker;
        let mut linked_issues = paginate(None, move |cursor: Option<String>| async move {
            let page = tracker.closing_issue_references(pull_request, cursor).await?;
            Ok::<_, IssueTrackerError>(Page {
                items: page.items,
                next: page.next.map(Some),
            })
        });
        let now = self.service.clock().utc();

        loop {
            let issue = match linked_issues.try_next().await {
                Ok(Some(issue)) => issue,
                Ok(None) => break,
                Err(err) => {
                    warn!(%pull_request, error = %err, "fetching linked issues failed");
                    break;
                }
            };
            let locator = issue.locator().clone();
            if issue.has_assignee(&author.login) {
                debug!(issue = %locator, author = %author.login, "author already assigned");
                continue;
            }
            if deadline_for(issue.labels(), now).is_none() {
                debug!(issue = %locator, "no deadline set, skipping linked issue");
                continue;
            }
            match self
                .service
                .start(StartRequest::new(issue, author.clone()))
                .await
            {
                Ok(outcome) => {
                    info!(issue = %locator, %pull_request, "assigned pull request author");
                    return DispatchOutcome::ok(outcome.message());
                }
                Err(err) => {
                    warn!(issue = %locator, error = %err, "failed to assign pull request author");
                }
            }
        }
        info!(%pull_request, "no linked issue could be assigned");
        DispatchOutcome::not_modified()
    }
}
