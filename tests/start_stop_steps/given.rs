//! Given steps for start/stop BDD scenarios.

use super::world::{ORG, REPO, StartStopWorld, scenario_locator, scenario_now};
use chrono::TimeDelta;
use eyre::WrapErr;
use rstest_bdd_macros::given;
use start_stop::assignment::domain::{
    CROSS_REFERENCED_EVENT, Issue, IssueNumber, IssueState, TimelineEvent, TimelineSource,
};

fn priced_issue(number: u64) -> Result<Issue, eyre::Report> {
    let locator = scenario_locator(number).wrap_err("construct scenario issue locator")?;
    Ok(
        Issue::new(locator, "Priced task", scenario_now() - TimeDelta::days(3))
            .with_id(number + 1000)
            .with_body("Implement the feature described below.")
            .with_labels(["Time: <1 Day", "Price: 200 USD"]),
    )
}

#[given("an unassigned priced issue #{number:u64}")]
fn unassigned_priced_issue(world: &mut StartStopWorld, number: u64) -> Result<(), eyre::Report> {
    world.set_issue(priced_issue(number)?);
    Ok(())
}

#[given(r#"a priced issue #{number:u64} assigned to "{login}""#)]
fn assigned_priced_issue(
    world: &mut StartStopWorld,
    number: u64,
    login: String,
) -> Result<(), eyre::Report> {
    world.set_issue(priced_issue(number)?.with_assignees([login]));
    Ok(())
}

#[given("the issue has no price label")]
fn issue_without_price(world: &mut StartStopWorld) -> Result<(), eyre::Report> {
    let issue = world.issue()?.clone().with_labels(["Time: <1 Day"]);
    world.set_issue(issue);
    Ok(())
}

#[given("the issue is closed")]
fn issue_is_closed(world: &mut StartStopWorld) -> Result<(), eyre::Report> {
    let issue = world.issue()?.clone().with_state(IssueState::Closed);
    world.set_issue(issue);
    Ok(())
}

#[given("the issue tracks sub-issues")]
fn issue_tracks_sub_issues(world: &mut StartStopWorld) -> Result<(), eyre::Report> {
    let issue = world.issue()?.clone().with_body("- [ ] #5\n- [x] #6");
    world.set_issue(issue);
    Ok(())
}

#[given(r#"the "{command}" command is disabled"#)]
fn command_is_disabled(world: &mut StartStopWorld, command: String) {
    world.settings.disabled_commands.push(command);
}

#[given(r#"user "{login}" with id {id:u64} has a registered wallet"#)]
fn user_has_wallet(world: &mut StartStopWorld, login: String, id: u64) {
    world
        .wallets
        .register(id, format!("0x{login:0>40}"));
}

#[given(r#""{login}" has an open pull request #{number:u64} with body "{body}""#)]
fn user_has_linked_pull_request(
    world: &mut StartStopWorld,
    login: String,
    number: u64,
    body: String,
) -> Result<(), eyre::Report> {
    let issue = world.issue()?.locator().clone();
    let event = TimelineEvent {
        event: CROSS_REFERENCED_EVENT.to_owned(),
        source: Some(TimelineSource {
            number: IssueNumber::new(number).wrap_err("construct pull request number")?,
            state: IssueState::Open,
            draft: false,
            body: Some(body),
            html_url: format!("https://github.com/{ORG}/{REPO}/pull/{number}"),
            repository_full_name: format!("{ORG}/{REPO}"),
            author: login,
            is_pull_request: true,
        }),
    };
    world.tracker.push_timeline_event(&issue, event);
    Ok(())
}

#[given(r#""{login}" is a "{role}" of the organisation"#)]
fn user_has_role(world: &mut StartStopWorld, login: String, role: String) {
    world.tracker.set_membership(ORG, &login, &role);
}
