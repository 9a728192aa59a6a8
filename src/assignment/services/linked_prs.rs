//! Discovery of pull requests linked to an issue through its timeline.

use super::pagination::paginate;
use crate::assignment::{
    domain::{IssueLocator, IssueNumber, LinkedPullRequest, RepositoryRef, TimelineSource},
    ports::{IssueTracker, IssueTrackerResult},
};
use futures_util::TryStreamExt;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves the open, non-draft pull requests that cross-reference an issue.
///
/// The resolver only reports what is linked; deciding whether a pull request
/// may be closed is left to the caller.
#[derive(Clone)]
pub struct LinkedPullRequestResolver<T>
where
    T: IssueTracker,
{
    tracker: Arc<T>,
}

impl<T> LinkedPullRequestResolver<T>
where
    T: IssueTracker,
{
    /// Creates a resolver reading from `tracker`.
    #[must_use]
    pub const fn new(tracker: Arc<T>) -> Self {
        Self { tracker }
    }

    /// Returns the pull requests linked to `issue`.
    ///
    /// Tracker failures are logged and yield an empty list.
    pub async fn linked_pull_requests(&self, issue: &IssueLocator) -> Vec<LinkedPullRequest> {
        match self.collect_linked(issue).await {
            Ok(linked) => linked,
            Err(err) => {
                warn!(%issue, error = %err, "fetching linked pull requests failed");
                Vec::new()
            }
        }
    }

    async fn collect_linked(
        &self,
        issue: &IssueLocator,
    ) -> IssueTrackerResult<Vec<LinkedPullRequest>> {
        let tracker = &*self.tracker;
        let mut events = paginate(1, move |page| tracker.timeline_events(issue, page));
        let mut seen: HashSet<IssueNumber> = HashSet::new();
        let mut linked = Vec::new();

        while let Some(event) = events.try_next().await? {
            let Some(source) = event.pull_request_reference() else {
                continue;
            };
            if !seen.insert(source.number) {
                continue;
            }
            match linked_from_source(source) {
                Some(pull_request) => linked.push(pull_request),
                None => debug!(
                    %issue,
                    source = %source.repository_full_name,
                    "skipping cross-reference with malformed repository name"
                ),
            }
        }

        linked.retain(LinkedPullRequest::is_open_and_ready);
        debug!(%issue, count = linked.len(), "resolved linked pull requests");
        Ok(linked)
    }
}

fn linked_from_source(source: &TimelineSource) -> Option<LinkedPullRequest> {
    let repository = RepositoryRef::from_full_name(&source.repository_full_name).ok()?;
    Some(LinkedPullRequest {
        number: source.number,
        author: source.author.clone(),
        body: source.body.clone(),
        organization: repository.owner().to_owned(),
        repository: repository.name().to_owned(),
        state: source.state,
        draft: source.draft,
        href: source.html_url.clone(),
    })
}
