//! In-memory integration tests for event routing.

use super::helpers::{
    Environment, environment, locator, now, priced_issue, settings, standard_settings,
};
use rstest::rstest;
use serde_json::{Value, json};
use start_stop::assignment::{
    adapters::memory::TrackerOperation,
    domain::{Issue, Sender},
    services::StartStopError,
};
use start_stop::plugin::{
    DispatchOutcome, DispatchStatus, ISSUE_COMMENT_CREATED, PULL_REQUEST_OPENED, PluginError,
    PluginEvent,
};

fn comment_event(body: &str, sender: &str, sender_id: u64) -> PluginEvent {
    let payload = json!({
        "issue": {
            "id": 1001,
            "number": 1,
            "title": "Priced task",
            "body": "Implement the feature described below.",
            "state": "open",
            "created_at": "2024-10-14T12:00:00Z",
            "labels": [{ "name": "Time: <1 Day" }, { "name": "Price: 200 USD" }],
            "assignees": [],
        },
        "comment": { "body": body },
        "sender": { "id": sender_id, "login": sender },
        "repository": { "name": "test-repo", "owner": { "login": "ubiquity" } },
    });
    PluginEvent::decode(ISSUE_COMMENT_CREATED, &payload).expect("payload decodes")
}

fn pull_request_event(number: u64, author: &str, author_id: u64) -> PluginEvent {
    let payload: Value = json!({
        "pull_request": {
            "number": number,
            "html_url": format!("https://github.com/ubiquity/test-repo/pull/{number}"),
            "user": { "id": author_id, "login": author },
        },
        "sender": { "id": author_id, "login": author },
    });
    PluginEvent::decode(PULL_REQUEST_OPENED, &payload).expect("payload decodes")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn start_comment_with_mentions_assigns_team(environment: Environment) {
    let dispatcher = environment.dispatcher(standard_settings());

    let outcome = dispatcher
        .handle(comment_event("/start @user2", "user1", 1))
        .await
        .expect("event handled");

    assert_eq!(outcome, DispatchOutcome::ok("Task assigned successfully"));
    assert_eq!(
        environment.tracker.assignees_of(&locator(1)),
        vec!["user1", "user2"]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn disabled_command_is_explained_on_the_issue(environment: Environment) {
    let dispatcher = environment.dispatcher(settings(&json!({ "disabledCommands": ["start"] })));

    let outcome = dispatcher
        .handle(comment_event("/start", "user1", 1))
        .await
        .expect("event handled");

    assert_eq!(outcome.status, DispatchStatus::Rejected);
    let comments = environment.tracker.comments();
    assert_eq!(
        comments.first().map(|comment| comment.body.as_str()),
        Some("```diff\n! The '/start' command is disabled for this repository.\n```")
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_unassignment_propagates_without_a_comment(environment: Environment) {
    let issue = priced_issue(1).with_assignees(["user1"]);
    environment.tracker.insert_issue(issue.clone());
    environment.tracker.fail(TrackerOperation::RemoveAssignees);
    let dispatcher = environment.dispatcher(standard_settings());

    let result = dispatcher
        .handle(PluginEvent::IssueCommentCreated {
            issue,
            comment: "/stop".to_owned(),
            sender: Sender::new(1, "user1"),
        })
        .await;

    assert!(matches!(
        result,
        Err(PluginError::Command(StartStopError::Tracker(_)))
    ));
    assert!(environment.tracker.comments().is_empty());
    assert_eq!(environment.tracker.assignees_of(&locator(1)), vec!["user1"]);
}

fn untimed_issue(number: u64) -> Issue {
    Issue::new(locator(number), "Untimed task", now()).with_labels(["Price: 200 USD"])
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn pull_request_skips_issues_without_deadline() {
    let environment = Environment::with_page_size(1);
    environment.tracker.insert_issue(untimed_issue(2));
    environment.tracker.insert_issue(priced_issue(3));
    environment
        .tracker
        .link_closing_reference(&locator(10), &locator(2));
    environment
        .tracker
        .link_closing_reference(&locator(10), &locator(3));
    let dispatcher = environment.dispatcher(standard_settings());

    let outcome = dispatcher
        .handle(pull_request_event(10, "user1", 1))
        .await
        .expect("event handled");

    assert_eq!(outcome, DispatchOutcome::ok("Task assigned successfully"));
    assert!(environment.tracker.assignees_of(&locator(2)).is_empty());
    assert_eq!(environment.tracker.assignees_of(&locator(3)), vec!["user1"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn pull_request_without_linked_issues_changes_nothing(environment: Environment) {
    let dispatcher = environment.dispatcher(standard_settings());

    let outcome = dispatcher
        .handle(pull_request_event(10, "user1", 1))
        .await
        .expect("event handled");

    assert_eq!(outcome, DispatchOutcome::not_modified());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn pull_request_author_without_wallet_is_not_assigned(environment: Environment) {
    environment.tracker.insert_issue(priced_issue(3));
    environment
        .tracker
        .link_closing_reference(&locator(10), &locator(3));
    let dispatcher = environment.dispatcher(standard_settings());

    let outcome = dispatcher
        .handle(PluginEvent::PullRequestOpened {
            pull_request: locator(10),
            author: Sender::new(3, "user3"),
        })
        .await
        .expect("event handled");

    assert_eq!(outcome, DispatchOutcome::not_modified());
    assert!(environment.tracker.assignees_of(&locator(3)).is_empty());
}
