//! In-memory integration tests for role limits.

use super::helpers::{Environment, ORG, environment, locator, priced_issue, standard_settings};
use chrono::TimeDelta;
use rstest::rstest;
use start_stop::assignment::{
    domain::{Review, Sender, TaskLimit},
    services::{StartRequest, StartStopError},
};

#[rstest]
#[case::admin("admin", TaskLimit::Limited(6))]
#[case::member("member", TaskLimit::Limited(4))]
#[case::contributor("contributor", TaskLimit::Limited(2))]
#[tokio::test(flavor = "multi_thread")]
async fn limits_follow_membership_role(
    environment: Environment,
    #[case] role: &str,
    #[case] expected: TaskLimit,
) {
    environment.tracker.set_membership(ORG, "user1", role);
    let service = environment.service(standard_settings());

    assert_eq!(service.limit_for(ORG, "user1").await, expected);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn undefined_role_gets_the_smallest_limit(environment: Environment) {
    let service = environment.service(standard_settings());

    assert_eq!(service.limit_for(ORG, "user1").await, TaskLimit::Limited(2));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn member_at_limit_cannot_start(environment: Environment) {
    environment.tracker.set_membership(ORG, "user1", "member");
    environment.assign_elsewhere("user1", 4);
    let service = environment.service(standard_settings());

    let err = service
        .start(StartRequest::new(priced_issue(1), Sender::new(1, "user1")))
        .await
        .expect_err("start should be refused");

    assert!(matches!(
        err,
        StartStopError::SenderLimitReached {
            limit: TaskLimit::Limited(4)
        }
    ));
    assert!(environment.tracker.assignees_of(&locator(1)).is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn limits_count_across_search_pages() {
    let environment = Environment::with_page_size(2);
    environment.tracker.set_membership(ORG, "user1", "member");
    environment.assign_elsewhere("user1", 5);
    let service = environment.service(standard_settings());

    assert_eq!(service.assigned_issue_count(ORG, "user1").await, 5);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn approved_and_waiting_pull_requests_free_capacity(environment: Environment) {
    environment.assign_elsewhere("user2", 3);
    let approved = environment.open_pull_request(30, "user2", TimeDelta::hours(1));
    environment.tracker.insert_review(
        &approved,
        Review {
            reviewer: "maintainer".to_owned(),
            author_association: "OWNER".to_owned(),
            state: "APPROVED".to_owned(),
        },
    );
    environment.open_pull_request(31, "user2", TimeDelta::days(3));
    environment.open_pull_request(32, "user2", TimeDelta::minutes(5));
    let service = environment.service(standard_settings());

    service
        .start(StartRequest::new(priced_issue(1), Sender::new(2, "user2")))
        .await
        .expect("two of three pull requests free capacity");

    assert_eq!(environment.tracker.assignees_of(&locator(1)), vec!["user2"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn changes_requested_keeps_load(environment: Environment) {
    environment.assign_elsewhere("user2", 2);
    let reviewed = environment.open_pull_request(30, "user2", TimeDelta::days(3));
    environment.tracker.insert_review(
        &reviewed,
        Review {
            reviewer: "maintainer".to_owned(),
            author_association: "MEMBER".to_owned(),
            state: "CHANGES_REQUESTED".to_owned(),
        },
    );
    let service = environment.service(standard_settings());

    let err = service
        .start(StartRequest::new(priced_issue(1), Sender::new(2, "user2")))
        .await
        .expect_err("start should be refused");

    assert!(matches!(err, StartStopError::SenderLimitReached { .. }));
}
