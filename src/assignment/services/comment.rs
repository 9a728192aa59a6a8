//! Comment bodies posted back to issues.

use crate::assignment::domain::{AssignmentComment, LinkedPullRequest};
use minijinja::{Environment, context};

const ASSIGNMENT_TEMPLATE: &str = r"{% if is_stale %}> [!WARNING]
> This task was created over {{ days_elapsed_since_task_creation }} days ago. Please confirm that this issue specification is accurate before starting.

{% endif %}<samp>
<table>
<tr><td>Deadline</td><td>{{ deadline }}</td></tr>
<tr><td>Registered Wallet</td><td>{{ registered_wallet }}</td></tr>
</table>
{{ tips }}
</samp>";

/// Heading of the summary posted after closing linked pull requests.
pub const CLOSED_PULL_REQUESTS_HEADING: &str = "# These linked pull requests are closed:";

/// Renders the comment posted when a task is assigned.
///
/// # Errors
///
/// Returns [`minijinja::Error`] when rendering fails.
pub fn render_assignment_comment(details: &AssignmentComment) -> Result<String, minijinja::Error> {
    Environment::new().render_str(
        ASSIGNMENT_TEMPLATE,
        context! {
            deadline => &details.deadline,
            days_elapsed_since_task_creation => details.days_elapsed_since_task_creation,
            registered_wallet => &details.registered_wallet,
            tips => &details.tips,
            is_stale => details.is_stale,
        },
    )
}

/// Renders the summary of closed pull requests as a `diff` block.
#[must_use]
pub fn render_closed_pull_requests(closed: &[LinkedPullRequest]) -> String {
    let mut body = format!("```diff\n{CLOSED_PULL_REQUESTS_HEADING}\n");
    for pull_request in closed {
        body.push_str(&pull_request.href);
        body.push('\n');
    }
    body.push_str("```");
    body
}

/// Renders a failed precondition as a `diff` block with a `!` line.
#[must_use]
pub fn render_error_comment(message: &str) -> String {
    format!("```diff\n! {message}\n```")
}

/// Renders the notice posted when assignees were set outside this plugin.
#[must_use]
pub fn render_deadline_notice(assignees: &[String], deadline: &str) -> String {
    let mentions = assignees
        .iter()
        .map(|login| format!("@{login}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{mentions} the deadline is at {deadline}")
}
