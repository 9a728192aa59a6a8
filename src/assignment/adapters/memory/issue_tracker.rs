//! In-memory issue tracker for assignment tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::assignment::{
    domain::{
        Issue, IssueLocator, IssueNumber, RepositoryRef, Review, SearchItem, TimelineEvent,
    },
    ports::{CursorPage, IssueTracker, IssueTrackerError, IssueTrackerResult, Page},
};

const DEFAULT_PAGE_SIZE: usize = 100;

/// Tracker operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackerOperation {
    /// [`IssueTracker::assigned_open_issues`].
    SearchAssigned,
    /// [`IssueTracker::open_pull_requests_by`].
    SearchPullRequests,
    /// [`IssueTracker::pull_request_reviews`].
    Reviews,
    /// [`IssueTracker::membership_role`].
    Membership,
    /// [`IssueTracker::create_comment`].
    Comment,
    /// [`IssueTracker::add_assignees`].
    AddAssignees,
    /// [`IssueTracker::remove_assignees`].
    RemoveAssignees,
    /// [`IssueTracker::close_pull_request`].
    ClosePullRequest,
    /// [`IssueTracker::timeline_events`].
    Timeline,
    /// [`IssueTracker::closing_issue_references`].
    ClosingReferences,
}

/// Comment recorded by the fake tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedComment {
    /// Issue the comment was posted on.
    pub issue: IssueLocator,
    /// Comment body.
    pub body: String,
}

/// Thread-safe in-memory issue tracker.
///
/// Listings are served in pages of a configurable size so pagination code
/// paths run against it.
#[derive(Debug, Clone)]
pub struct InMemoryIssueTracker {
    state: Arc<RwLock<TrackerState>>,
}

#[derive(Debug, Default)]
struct TrackerState {
    page_size: usize,
    issues: HashMap<IssueLocator, Issue>,
    assignees: HashMap<IssueLocator, Vec<String>>,
    search_items: Vec<SearchItem>,
    reviews: HashMap<IssueLocator, Vec<Review>>,
    memberships: HashMap<(String, String), String>,
    timelines: HashMap<IssueLocator, Vec<TimelineEvent>>,
    closing_references: HashMap<IssueLocator, Vec<IssueLocator>>,
    comments: Vec<RecordedComment>,
    closed_pull_requests: Vec<IssueLocator>,
    failing: HashSet<TrackerOperation>,
}

impl Default for InMemoryIssueTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryIssueTracker {
    /// Creates an empty tracker serving pages of 100 items.
    #[must_use]
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Creates an empty tracker serving pages of `page_size` items.
    #[must_use]
    pub fn with_page_size(page_size: usize) -> Self {
        let state = TrackerState {
            page_size: page_size.max(1),
            ..TrackerState::default()
        };
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Stores an issue so closing references can resolve it.
    pub fn insert_issue(&self, issue: Issue) {
        self.write_state(|state| {
            state
                .assignees
                .insert(issue.locator().clone(), issue.assignees().to_vec());
            state.issues.insert(issue.locator().clone(), issue);
        });
    }

    /// Adds an item returned by the assignment and pull request searches.
    pub fn insert_search_item(&self, item: SearchItem) {
        self.write_state(|state| state.search_items.push(item));
    }

    /// Adds a review to a pull request.
    pub fn insert_review(&self, pull_request: &IssueLocator, review: Review) {
        self.write_state(|state| {
            state
                .reviews
                .entry(pull_request.clone())
                .or_default()
                .push(review);
        });
    }

    /// Records `login`'s membership role in `organization`.
    pub fn set_membership(&self, organization: &str, login: &str, role: &str) {
        self.write_state(|state| {
            state
                .memberships
                .insert(membership_key(organization, login), role.to_owned());
        });
    }

    /// Appends an event to an issue's timeline.
    pub fn push_timeline_event(&self, issue: &IssueLocator, event: TimelineEvent) {
        self.write_state(|state| {
            state
                .timelines
                .entry(issue.clone())
                .or_default()
                .push(event);
        });
    }

    /// Records that `pull_request` will close `issue`.
    pub fn link_closing_reference(&self, pull_request: &IssueLocator, issue: &IssueLocator) {
        self.write_state(|state| {
            state
                .closing_references
                .entry(pull_request.clone())
                .or_default()
                .push(issue.clone());
        });
    }

    /// Makes every call of `operation` fail.
    pub fn fail(&self, operation: TrackerOperation) {
        self.write_state(|state| {
            state.failing.insert(operation);
        });
    }

    /// Returns posted comments in order.
    #[must_use]
    pub fn comments(&self) -> Vec<RecordedComment> {
        self.read_state(|state| state.comments.clone())
    }

    /// Returns the current assignees of an issue.
    #[must_use]
    pub fn assignees_of(&self, issue: &IssueLocator) -> Vec<String> {
        self.read_state(|state| state.assignees.get(issue).cloned().unwrap_or_default())
    }

    /// Returns closed pull requests in order.
    #[must_use]
    pub fn closed_pull_requests(&self) -> Vec<IssueLocator> {
        self.read_state(|state| state.closed_pull_requests.clone())
    }

    fn read_state<R>(&self, read: impl FnOnce(&TrackerState) -> R) -> R {
        let guard: RwLockReadGuard<'_, TrackerState> = self
            .state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        read(&guard)
    }

    fn write_state<R>(&self, write: impl FnOnce(&mut TrackerState) -> R) -> R {
        let mut guard: RwLockWriteGuard<'_, TrackerState> = self
            .state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        write(&mut guard)
    }

    fn check(&self, operation: TrackerOperation) -> IssueTrackerResult<()> {
        if self.read_state(|state| state.failing.contains(&operation)) {
            return Err(IssueTrackerError::Unavailable(format!(
                "{operation:?} is set to fail"
            )));
        }
        Ok(())
    }

    fn search(
        &self,
        page: u32,
        matches: impl Fn(&SearchItem) -> bool,
    ) -> IssueTrackerResult<Page<SearchItem>> {
        Ok(self.read_state(|state| {
            let found: Vec<SearchItem> = state
                .search_items
                .iter()
                .filter(|item| matches(item))
                .cloned()
                .collect();
            page_of(found, page, state.page_size)
        }))
    }
}

fn membership_key(organization: &str, login: &str) -> (String, String) {
    (
        organization.to_ascii_lowercase(),
        login.to_ascii_lowercase(),
    )
}

fn in_organization(item: &SearchItem, organization: &str) -> bool {
    RepositoryRef::from_html_url(&item.html_url)
        .is_ok_and(|repository| repository.owner().eq_ignore_ascii_case(organization))
}

fn page_of<T>(items: Vec<T>, page: u32, page_size: usize) -> Page<T> {
    let index = usize::try_from(page.saturating_sub(1)).unwrap_or(usize::MAX);
    let skip = index.saturating_mul(page_size);
    let has_more = items.len() > skip.saturating_add(page_size);
    let selected: Vec<T> = items.into_iter().skip(skip).take(page_size).collect();
    if has_more {
        Page::with_next(selected, page.saturating_add(1))
    } else {
        Page::last(selected)
    }
}

#[async_trait]
impl IssueTracker for InMemoryIssueTracker {
    async fn assigned_open_issues(
        &self,
        organization: &str,
        login: &str,
        page: u32,
    ) -> IssueTrackerResult<Page<SearchItem>> {
        self.check(TrackerOperation::SearchAssigned)?;
        self.search(page, |item| {
            in_organization(item, organization) && item.is_open_issue_assigned_to(login)
        })
    }

    async fn open_pull_requests_by(
        &self,
        organization: &str,
        login: &str,
        page: u32,
    ) -> IssueTrackerResult<Page<SearchItem>> {
        self.check(TrackerOperation::SearchPullRequests)?;
        self.search(page, |item| {
            in_organization(item, organization)
                && item.is_open_pull_request()
                && item.author.eq_ignore_ascii_case(login)
        })
    }

    async fn pull_request_reviews(
        &self,
        pull_request: &IssueLocator,
        page: u32,
    ) -> IssueTrackerResult<Page<Review>> {
        self.check(TrackerOperation::Reviews)?;
        Ok(self.read_state(|state| {
            let reviews = state.reviews.get(pull_request).cloned().unwrap_or_default();
            page_of(reviews, page, state.page_size)
        }))
    }

    async fn membership_role(
        &self,
        organization: &str,
        login: &str,
    ) -> IssueTrackerResult<Option<String>> {
        self.check(TrackerOperation::Membership)?;
        Ok(self.read_state(|state| {
            state
                .memberships
                .get(&membership_key(organization, login))
                .cloned()
        }))
    }

    async fn create_comment(&self, issue: &IssueLocator, body: &str) -> IssueTrackerResult<()> {
        self.check(TrackerOperation::Comment)?;
        self.write_state(|state| {
            state.comments.push(RecordedComment {
                issue: issue.clone(),
                body: body.to_owned(),
            });
        });
        Ok(())
    }

    async fn add_assignees(
        &self,
        issue: &IssueLocator,
        logins: &[String],
    ) -> IssueTrackerResult<()> {
        self.check(TrackerOperation::AddAssignees)?;
        self.write_state(|state| {
            let current = state.assignees.entry(issue.clone()).or_default();
            for login in logins {
                if !current.iter().any(|existing| existing.eq_ignore_ascii_case(login)) {
                    current.push(login.clone());
                }
            }
        });
        Ok(())
    }

    async fn remove_assignees(
        &self,
        issue: &IssueLocator,
        logins: &[String],
    ) -> IssueTrackerResult<()> {
        self.check(TrackerOperation::RemoveAssignees)?;
        self.write_state(|state| {
            if let Some(current) = state.assignees.get_mut(issue) {
                current.retain(|existing| {
                    !logins.iter().any(|login| login.eq_ignore_ascii_case(existing))
                });
            }
        });
        Ok(())
    }

    async fn close_pull_request(
        &self,
        repository: &RepositoryRef,
        number: IssueNumber,
    ) -> IssueTrackerResult<()> {
        self.check(TrackerOperation::ClosePullRequest)?;
        self.write_state(|state| {
            state
                .closed_pull_requests
                .push(IssueLocator::new(repository.clone(), number));
        });
        Ok(())
    }

    async fn timeline_events(
        &self,
        issue: &IssueLocator,
        page: u32,
    ) -> IssueTrackerResult<Page<TimelineEvent>> {
        self.check(TrackerOperation::Timeline)?;
        Ok(self.read_state(|state| {
            let events = state.timelines.get(issue).cloned().unwrap_or_default();
            page_of(events, page, state.page_size)
        }))
    }

    async fn closing_issue_references(
        &self,
        pull_request: &IssueLocator,
        cursor: Option<String>,
    ) -> IssueTrackerResult<CursorPage<Issue>> {
        self.check(TrackerOperation::ClosingReferences)?;
        let page = match cursor.as_deref() {
            None => 1,
            Some(raw) => raw.parse::<u32>().map_err(|_| {
                IssueTrackerError::decode("closing_issue_references", format!("bad cursor {raw}"))
            })?,
        };
        Ok(self.read_state(|state| {
            let issues: Vec<Issue> = state
                .closing_references
                .get(pull_request)
                .into_iter()
                .flatten()
                .filter_map(|locator| {
                    state.issues.get(locator).map(|issue| {
                        let assignees = state.assignees.get(locator).cloned().unwrap_or_default();
                        issue.clone().with_assignees(assignees)
                    })
                })
                .collect();
            let numbered = page_of(issues, page, state.page_size);
            CursorPage {
                items: numbered.items,
                next: numbered.next.map(|next| next.to_string()),
            }
        }))
    }
}
