//! Shared test helpers for in-memory start/stop integration tests.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use rstest::fixture;
use serde_json::{Value, json};
use start_stop::assignment::{
    adapters::memory::{FixedClock, InMemoryIssueTracker, InMemoryWalletStore},
    domain::{
        CROSS_REFERENCED_EVENT, Issue, IssueLocator, IssueNumber, IssueState, SearchItem,
        TimelineEvent, TimelineSource,
    },
    services::StartStopService,
};
use start_stop::config::StartStopSettings;
use start_stop::plugin::CommandDispatcher;
use std::sync::Arc;

/// Organisation owning every test repository.
pub const ORG: &str = "ubiquity";
/// Default repository for test issues.
pub const REPO: &str = "test-repo";

/// Service type used by the integration tests.
pub type TestService = StartStopService<InMemoryIssueTracker, InMemoryWalletStore, FixedClock>;
/// Dispatcher type used by the integration tests.
pub type TestDispatcher = CommandDispatcher<InMemoryIssueTracker, InMemoryWalletStore, FixedClock>;

/// Fixed instant all tests run at.
#[must_use]
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 10, 17, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// Returns the locator of `number` in the default repository.
#[must_use]
pub fn locator(number: u64) -> IssueLocator {
    locator_in(REPO, number)
}

/// Returns the locator of `number` in `repository` of the test organisation.
#[must_use]
pub fn locator_in(repository: &str, number: u64) -> IssueLocator {
    IssueLocator::from_parts(ORG, repository, number).expect("valid locator")
}

/// Returns an open, priced issue with a one-day time label created three
/// days ago.
#[must_use]
pub fn priced_issue(number: u64) -> Issue {
    Issue::new(locator(number), "Priced task", now() - TimeDelta::days(3))
        .with_id(number + 1000)
        .with_body("Implement the feature described below.")
        .with_labels(["Time: <1 Day", "Price: 200 USD"])
}

/// Decodes settings from JSON, panicking on invalid input.
#[must_use]
pub fn settings(raw: &Value) -> StartStopSettings {
    StartStopSettings::from_value(raw).expect("valid settings")
}

/// Settings with the role limits used across the suite.
#[must_use]
pub fn standard_settings() -> StartStopSettings {
    settings(&json!({
        "maxConcurrentTasks": { "admin": 6, "member": 4, "contributor": 2 },
    }))
}

/// Returns a cross-reference from an open pull request in `repository_full_name`.
#[must_use]
pub fn cross_reference(
    repository_full_name: &str,
    number: u64,
    author: &str,
    body: &str,
) -> TimelineEvent {
    TimelineEvent {
        event: CROSS_REFERENCED_EVENT.to_owned(),
        source: Some(TimelineSource {
            number: IssueNumber::new(number).expect("valid number"),
            state: IssueState::Open,
            draft: false,
            body: Some(body.to_owned()),
            html_url: format!("https://github.com/{repository_full_name}/pull/{number}"),
            repository_full_name: repository_full_name.to_owned(),
            author: author.to_owned(),
            is_pull_request: true,
        }),
    }
}

/// In-memory collaborators seeded with two registered users.
pub struct Environment {
    /// Fake issue tracker.
    pub tracker: Arc<InMemoryIssueTracker>,
    /// Fake wallet registry.
    pub wallets: Arc<InMemoryWalletStore>,
}

impl Environment {
    /// Creates an environment whose tracker serves pages of `page_size`.
    #[must_use]
    pub fn with_page_size(page_size: usize) -> Self {
        let environment = Self {
            tracker: Arc::new(InMemoryIssueTracker::with_page_size(page_size)),
            wallets: Arc::new(InMemoryWalletStore::new()),
        };
        environment
            .wallets
            .register(1, "0x4007CE2083c7F3E18097aeB3A39bb8eC149a341d");
        environment
            .wallets
            .register(2, "0x4D0704f400D57Ba93eEa88765C3FcDBD826dCFc4");
        environment
    }

    /// Builds a service using `settings`.
    #[must_use]
    pub fn service(&self, settings: StartStopSettings) -> TestService {
        StartStopService::new(
            Arc::clone(&self.tracker),
            Arc::clone(&self.wallets),
            Arc::new(FixedClock::new(now())),
            Arc::new(settings),
        )
    }

    /// Builds a dispatcher using `settings`.
    #[must_use]
    pub fn dispatcher(&self, settings: StartStopSettings) -> TestDispatcher {
        CommandDispatcher::new(
            Arc::clone(&self.tracker),
            Arc::clone(&self.wallets),
            Arc::new(FixedClock::new(now())),
            Arc::new(settings),
        )
    }

    /// Records `count` other open issues assigned to `login`.
    pub fn assign_elsewhere(&self, login: &str, count: u64) {
        for offset in 0..count {
            let number = 100 + offset;
            self.tracker.insert_search_item(SearchItem {
                number: IssueNumber::new(number).expect("valid number"),
                html_url: format!("https://github.com/{ORG}/{REPO}/issues/{number}"),
                state: IssueState::Open,
                is_pull_request: false,
                author: "ubiquity-os".to_owned(),
                assignees: vec![login.to_owned()],
                created_at: now(),
            });
        }
    }

    /// Records an open pull request by `author` opened `age` ago.
    pub fn open_pull_request(&self, number: u64, author: &str, age: TimeDelta) -> IssueLocator {
        self.tracker.insert_search_item(SearchItem {
            number: IssueNumber::new(number).expect("valid number"),
            html_url: format!("https://github.com/{ORG}/{REPO}/pull/{number}"),
            state: IssueState::Open,
            is_pull_request: true,
            author: author.to_owned(),
            assignees: Vec::new(),
            created_at: now() - age,
        });
        locator(number)
    }
}

/// Provides a fresh environment for each test.
#[fixture]
pub fn environment() -> Environment {
    Environment::with_page_size(100)
}
