//! Then steps for start/stop BDD scenarios.

use super::world::{StartStopWorld, scenario_locator};
use rstest_bdd_macros::then;
use start_stop::assignment::domain::TaskLimit;
use start_stop::plugin::DispatchStatus;

#[then(r#"the invocation succeeds with "{message}""#)]
fn invocation_succeeds(world: &StartStopWorld, message: String) -> Result<(), eyre::Report> {
    let outcome = world.outcome()?;
    if outcome.status != DispatchStatus::Ok || outcome.output.as_deref() != Some(message.as_str())
    {
        return Err(eyre::eyre!(
            "expected success with {message:?}, got {outcome:?}"
        ));
    }
    Ok(())
}

#[then(r#"the invocation is rejected with "{message}""#)]
fn invocation_rejected(world: &StartStopWorld, message: String) -> Result<(), eyre::Report> {
    let outcome = world.outcome()?;
    if outcome.status != DispatchStatus::Rejected
        || outcome.output.as_deref() != Some(message.as_str())
    {
        return Err(eyre::eyre!(
            "expected rejection with {message:?}, got {outcome:?}"
        ));
    }
    Ok(())
}

#[then(r#""{login}" is assigned to the issue"#)]
fn user_is_assigned(world: &StartStopWorld, login: String) -> Result<(), eyre::Report> {
    let assignees = world.tracker.assignees_of(world.issue()?.locator());
    if !assignees.contains(&login) {
        return Err(eyre::eyre!("expected {login} among assignees {assignees:?}"));
    }
    Ok(())
}

#[then("the issue has no assignees")]
fn issue_has_no_assignees(world: &StartStopWorld) -> Result<(), eyre::Report> {
    let assignees = world.tracker.assignees_of(world.issue()?.locator());
    if !assignees.is_empty() {
        return Err(eyre::eyre!("expected no assignees, found {assignees:?}"));
    }
    Ok(())
}

#[then("pull request #{number:u64} is closed")]
fn pull_request_is_closed(world: &StartStopWorld, number: u64) -> Result<(), eyre::Report> {
    let pull_request = scenario_locator(number)?;
    if !world.tracker.closed_pull_requests().contains(&pull_request) {
        return Err(eyre::eyre!("expected {pull_request} to be closed"));
    }
    Ok(())
}

#[then("pull request #{number:u64} is still open")]
fn pull_request_is_open(world: &StartStopWorld, number: u64) -> Result<(), eyre::Report> {
    let pull_request = scenario_locator(number)?;
    if world.tracker.closed_pull_requests().contains(&pull_request) {
        return Err(eyre::eyre!("expected {pull_request} to stay open"));
    }
    Ok(())
}

#[then("the refusal is posted on the issue")]
fn refusal_is_posted(world: &StartStopWorld) -> Result<(), eyre::Report> {
    let reason = world
        .outcome()?
        .output
        .clone()
        .ok_or_else(|| eyre::eyre!("rejection carries no reason"))?;
    let expected = format!("```diff\n! {reason}\n```");
    let posted = world
        .tracker
        .comments()
        .into_iter()
        .any(|comment| comment.body == expected);
    if !posted {
        return Err(eyre::eyre!("expected refusal comment {expected:?}"));
    }
    Ok(())
}

#[then("the wallet prompt is posted on the issue")]
fn wallet_prompt_is_posted(world: &StartStopWorld) -> Result<(), eyre::Report> {
    let expected = world.settings.empty_wallet_text.as_str();
    let posted = world
        .tracker
        .comments()
        .into_iter()
        .any(|comment| comment.body == expected);
    if !posted {
        return Err(eyre::eyre!("expected wallet prompt {expected:?}"));
    }
    Ok(())
}

#[then("the task limit is {limit:u32}")]
fn task_limit_is(world: &StartStopWorld, limit: u32) -> Result<(), eyre::Report> {
    let resolved = world
        .resolved_limit
        .ok_or_else(|| eyre::eyre!("no task limit was resolved"))?;
    if resolved != TaskLimit::Limited(limit) {
        return Err(eyre::eyre!("expected limit {limit}, got {resolved}"));
    }
    Ok(())
}
