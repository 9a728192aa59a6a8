//! Deadlines derived from `Time:` labels and the details posted on assignment.

use super::{DurationUnit, HumanDuration, Issue};
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

const TIME_LABEL_PREFIX: &str = "Time:";

/// Format used for deadlines, e.g. `Sat, Oct 17, 2:05 PM UTC`.
pub const DEADLINE_FORMAT: &str = "%a, %b %-d, %-I:%M %p UTC";

/// Shown instead of a wallet when the assignee has not registered one.
pub const WALLET_PROMPT: &str =
    "Register your wallet address using the following slash command: `/wallet 0x0000...0000`";

/// Fixed guidance appended to every assignment comment.
pub const ASSIGNMENT_TIPS: &str = "<h6>Tips:</h6>
<ul>
<li>Use <code>/wallet 0x0000...0000</code> if you want to update your registered payment wallet address.</li>
<li>Be sure to open a draft pull request as soon as possible to communicate updates on your progress.</li>
<li>Be sure to provide timely updates to us when requested, or you will be automatically unassigned from the task.</li>
</ul>";

/// Parses every `Time: <N Unit` label and returns the durations, shortest
/// first. Labels that do not parse are skipped.
#[must_use]
pub fn calculate_durations<S: AsRef<str>>(labels: &[S]) -> Vec<TimeDelta> {
    let mut durations: Vec<TimeDelta> = labels
        .iter()
        .filter_map(|label| label.as_ref().strip_prefix(TIME_LABEL_PREFIX))
        .filter_map(|value| HumanDuration::parse(value).ok())
        .map(|duration| duration.as_delta())
        .collect();
    durations.sort();
    durations
}

/// Returns the shortest labelled duration, if any.
#[must_use]
pub fn shortest_duration<S: AsRef<str>>(labels: &[S]) -> Option<TimeDelta> {
    calculate_durations(labels).into_iter().next()
}

/// Formats an instant the way deadlines are shown to contributors.
#[must_use]
pub fn format_deadline(instant: DateTime<Utc>) -> String {
    instant.format(DEADLINE_FORMAT).to_string()
}

/// Returns the formatted deadline for work starting at `now`, or `None` when
/// no time label applies.
#[must_use]
pub fn deadline_for<S: AsRef<str>>(labels: &[S], now: DateTime<Utc>) -> Option<String> {
    let duration = shortest_duration(labels)?;
    now.checked_add_signed(duration).map(format_deadline)
}

/// Details rendered into the comment posted when a task is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentComment {
    /// Formatted deadline.
    pub deadline: String,
    /// Whole days between issue creation and now.
    pub days_elapsed_since_task_creation: i64,
    /// Registered wallet address or [`WALLET_PROMPT`].
    pub registered_wallet: String,
    /// Fixed guidance block.
    pub tips: String,
    /// Whether the issue is older than the stale threshold.
    pub is_stale: bool,
}

impl AssignmentComment {
    /// Builds the details for `issue` assigned at `now`.
    ///
    /// Returns `None` when the issue has no usable time label.
    #[must_use]
    pub fn generate(
        issue: &Issue,
        wallet: Option<&str>,
        stale_after: &HumanDuration,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        let deadline = deadline_for(issue.labels(), now)?;
        let elapsed = now.signed_duration_since(issue.created_at());
        let registered_wallet = wallet
            .map(str::trim)
            .filter(|address| !address.is_empty())
            .unwrap_or(WALLET_PROMPT)
            .to_owned();
        Some(Self {
            deadline,
            days_elapsed_since_task_creation: elapsed
                .num_seconds()
                .div_euclid(DurationUnit::Day.seconds()),
            registered_wallet,
            tips: ASSIGNMENT_TIPS.to_owned(),
            is_stale: elapsed > stale_after.as_delta(),
        })
    }
}
