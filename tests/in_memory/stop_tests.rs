//! In-memory integration tests for `/stop`.

use super::helpers::{
    Environment, ORG, REPO, cross_reference, environment, locator, locator_in, priced_issue,
    standard_settings,
};
use rstest::rstest;
use start_stop::assignment::{
    domain::{Issue, IssueNumber, Sender},
    services::{StartStopError, StopRequest, TaskOutcome},
};

fn assigned(environment: &Environment, assignees: &[&str]) -> Issue {
    let issue = priced_issue(1).with_assignees(assignees.iter().copied());
    environment.tracker.insert_issue(issue.clone());
    issue
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn user_can_stop_an_issue(environment: Environment) {
    let issue = assigned(&environment, &["user1"]);
    let service = environment.service(standard_settings());

    let outcome = service
        .stop(StopRequest::new(issue, Sender::new(1, "user1")))
        .await
        .expect("stop should succeed");

    assert_eq!(outcome.message(), "Task unassigned successfully");
    assert!(environment.tracker.assignees_of(&locator(1)).is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stop_keeps_other_assignees(environment: Environment) {
    let issue = assigned(&environment, &["user1", "user2"]);
    let service = environment.service(standard_settings());

    service
        .stop(StopRequest::new(issue, Sender::new(2, "USER2")))
        .await
        .expect("stop should succeed");

    assert_eq!(environment.tracker.assignees_of(&locator(1)), vec!["user1"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stop_closes_authors_pull_requests_in_any_org_repository(environment: Environment) {
    let issue = assigned(&environment, &["user1"]);
    let other_repository = format!("{ORG}/another-repo");
    environment.tracker.push_timeline_event(
        &locator(1),
        cross_reference(&format!("{ORG}/{REPO}"), 2, "user1", "Resolves #1"),
    );
    environment.tracker.push_timeline_event(
        &locator(1),
        cross_reference(
            &other_repository,
            7,
            "User1",
            "Fixes https://github.com/ubiquity/test-repo/issues/1",
        ),
    );
    environment.tracker.push_timeline_event(
        &locator(1),
        cross_reference("someone-else/fork", 9, "user1", "Resolves #1"),
    );
    let service = environment.service(standard_settings());

    let outcome = service
        .stop(StopRequest::new(issue, Sender::new(1, "user1")))
        .await
        .expect("stop should succeed");

    assert_eq!(
        outcome,
        TaskOutcome::Unassigned {
            closed_pull_requests: vec![
                IssueNumber::new(2).expect("valid number"),
                IssueNumber::new(7).expect("valid number"),
            ]
        }
    );
    assert_eq!(
        environment.tracker.closed_pull_requests(),
        vec![locator(2), locator_in("another-repo", 7)]
    );
    let comments = environment.tracker.comments();
    let summary = &comments.first().expect("summary comment").body;
    assert_eq!(
        summary,
        "```diff\n# These linked pull requests are closed:\n\
         https://github.com/ubiquity/test-repo/pull/2\n\
         https://github.com/ubiquity/another-repo/pull/7\n```"
    );
}

#[rstest]
#[case::not_assigned(&["user2"])]
#[case::no_assignees(&[])]
#[tokio::test(flavor = "multi_thread")]
async fn user_cannot_stop_an_issue_they_are_not_assigned_to(
    environment: Environment,
    #[case] assignees: &[&str],
) {
    let issue = assigned(&environment, assignees);
    let service = environment.service(standard_settings());

    let err = service
        .stop(StopRequest::new(issue, Sender::new(1, "user1")))
        .await
        .expect_err("stop should be refused");

    assert!(matches!(err, StartStopError::NotAssigned));
    assert!(environment.tracker.closed_pull_requests().is_empty());
}
