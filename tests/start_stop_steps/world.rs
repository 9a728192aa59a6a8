//! Shared world state for start/stop BDD scenarios.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rstest::fixture;
use serde_json::json;
use start_stop::assignment::{
    adapters::memory::{FixedClock, InMemoryIssueTracker, InMemoryWalletStore},
    domain::{Issue, IssueLocator, TaskLimit},
};
use start_stop::config::StartStopSettings;
use start_stop::plugin::{CommandDispatcher, DispatchOutcome};

/// Organisation owning the scenario repository.
pub const ORG: &str = "ubiquity";
/// Repository holding the scenario issue.
pub const REPO: &str = "test-repo";

/// Dispatcher type used by the BDD world.
pub type TestDispatcher = CommandDispatcher<InMemoryIssueTracker, InMemoryWalletStore, FixedClock>;

/// Scenario world for start/stop behaviour tests.
pub struct StartStopWorld {
    pub tracker: Arc<InMemoryIssueTracker>,
    pub wallets: Arc<InMemoryWalletStore>,
    pub settings: StartStopSettings,
    pub issue: Option<Issue>,
    pub outcome: Option<DispatchOutcome>,
    pub resolved_limit: Option<TaskLimit>,
}

impl StartStopWorld {
    /// Creates a world with the standard role limits and no issue.
    ///
    /// # Errors
    ///
    /// Returns an error if the standard settings fail to decode.
    pub fn new() -> Result<Self, eyre::Report> {
        let settings = StartStopSettings::from_value(&json!({
            "maxConcurrentTasks": { "admin": 6, "member": 4, "contributor": 2 },
        }))?;
        Ok(Self {
            tracker: Arc::new(InMemoryIssueTracker::new()),
            wallets: Arc::new(InMemoryWalletStore::new()),
            settings,
            issue: None,
            outcome: None,
            resolved_limit: None,
        })
    }

    /// Builds a dispatcher over the world's collaborators and settings.
    #[must_use]
    pub fn dispatcher(&self) -> TestDispatcher {
        CommandDispatcher::new(
            Arc::clone(&self.tracker),
            Arc::clone(&self.wallets),
            Arc::new(FixedClock::new(scenario_now())),
            Arc::new(self.settings.clone()),
        )
    }

    /// Returns the scenario issue.
    ///
    /// # Errors
    ///
    /// Returns an error if no issue was set up.
    pub fn issue(&self) -> Result<&Issue, eyre::Report> {
        self.issue
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing issue in scenario world"))
    }

    /// Replaces the scenario issue and stores it in the tracker.
    pub fn set_issue(&mut self, issue: Issue) {
        self.tracker.insert_issue(issue.clone());
        self.issue = Some(issue);
    }

    /// Returns the recorded invocation outcome.
    ///
    /// # Errors
    ///
    /// Returns an error if no command was run.
    pub fn outcome(&self) -> Result<&DispatchOutcome, eyre::Report> {
        self.outcome
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing invocation outcome in scenario world"))
    }
}

/// Instant every scenario runs at.
#[must_use]
pub fn scenario_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 10, 17, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Returns the locator of `number` in the scenario repository.
///
/// # Errors
///
/// Returns an error if the number is zero.
pub fn scenario_locator(number: u64) -> Result<IssueLocator, eyre::Report> {
    Ok(IssueLocator::from_parts(ORG, REPO, number)?)
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> StartStopWorld {
    StartStopWorld::new().unwrap_or_else(|err| panic!("scenario world setup failed: {err}"))
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
