//! In-memory integration tests for `/start`.

use super::helpers::{
    Environment, environment, locator, now, priced_issue, settings, standard_settings,
};
use chrono::TimeDelta;
use rstest::rstest;
use serde_json::json;
use start_stop::assignment::{
    domain::{Issue, Sender, WALLET_PROMPT},
    services::{StartRequest, StartStopError, TaskOutcome},
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn user_can_start_an_issue(environment: Environment) {
    let service = environment.service(standard_settings());

    let outcome = service
        .start(StartRequest::new(priced_issue(1), Sender::new(1, "user1")))
        .await
        .expect("start should succeed");

    assert_eq!(outcome.message(), "Task assigned successfully");
    assert_eq!(environment.tracker.assignees_of(&locator(1)), vec!["user1"]);
    let comments = environment.tracker.comments();
    let comment = comments.first().expect("assignment comment");
    assert_eq!(comment.issue, locator(1));
    assert!(comment.body.contains("<td>Fri, Oct 18, 12:00 PM UTC</td>"));
    assert!(
        comment
            .body
            .contains("<td>0x4007CE2083c7F3E18097aeB3A39bb8eC149a341d</td>")
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn user_can_start_with_teammates(environment: Environment) {
    let service = environment.service(standard_settings());
    let request =
        StartRequest::new(priced_issue(1), Sender::new(1, "user1")).with_teammates(&["user2"]);

    let outcome = service.start(request).await.expect("start should succeed");

    assert_eq!(
        outcome,
        TaskOutcome::Assigned {
            assignees: vec!["user1".to_owned(), "user2".to_owned()]
        }
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stale_issue_is_flagged_in_assignment_comment(environment: Environment) {
    let service = environment.service(settings(&json!({ "taskStaleTimeoutDuration": "1 Week" })));
    let old = Issue::new(locator(1), "Old task", now() - TimeDelta::days(40))
        .with_labels(["Time: <1 Day", "Price: 200 USD"]);

    service
        .start(StartRequest::new(old, Sender::new(1, "user1")))
        .await
        .expect("start should succeed");

    let comments = environment.tracker.comments();
    let body = &comments.first().expect("assignment comment").body;
    assert!(body.starts_with("> [!WARNING]"));
    assert!(body.contains("created over 40 days ago"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn custom_empty_wallet_text_is_posted(environment: Environment) {
    let service = environment.service(settings(&json!({
        "emptyWalletText": "Register a wallet first.",
    })));

    let err = service
        .start(StartRequest::new(priced_issue(1), Sender::new(3, "user3")))
        .await
        .expect_err("start should be refused");

    assert!(matches!(err, StartStopError::MissingWallet));
    assert_eq!(err.to_string(), "No wallet address found");
    let bodies: Vec<String> = environment
        .tracker
        .comments()
        .into_iter()
        .map(|comment| comment.body)
        .collect();
    assert_eq!(bodies, vec!["Register a wallet first.".to_owned()]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn wallet_is_optional_when_configured(environment: Environment) {
    let service = environment.service(settings(&json!({ "startRequiresWallet": false })));

    service
        .start(StartRequest::new(priced_issue(1), Sender::new(3, "user3")))
        .await
        .expect("start should succeed");

    let comments = environment.tracker.comments();
    assert!(
        comments
            .first()
            .is_some_and(|comment| comment.body.contains(WALLET_PROMPT))
    );
}
