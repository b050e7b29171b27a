//! Ordering and isolation guarantees of the job coordinator.

use super::helpers::{coordinator, coordinator_with, gated, script};
use crate::test_helpers::{CompletionLog, RecordingStorage, scope};
use rstest::rstest;
use scope_registry::registration::{
    domain::{JobRequest, JobStatus},
    ports::RegistrationStorage,
    services::{CoordinatorConfig, Submission},
};
use std::sync::Arc;
use std::time::Duration;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn one_job_per_scope_touches_storage_at_a_time(gated: Arc<RecordingStorage>) {
    let key = scope("https://example.com/app/").expect("valid scope");
    let coordinator = coordinator(&gated);
    let log = CompletionLog::new();

    let submissions: Vec<Submission> = ["a", "b", "c"]
        .into_iter()
        .map(|body| {
            coordinator.submit(
                JobRequest::register(key.clone(), script(body)),
                log.callback(body),
            )
        })
        .collect();

    gated.wait_for_calls(1).await.expect("head should look up");
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(gated.lookup_count(), 1);
    assert_eq!(coordinator.queue_depth(&key), 3);
    assert_eq!(coordinator.active_job(&key), submissions[0].job_id());

    gated.release(1);
    gated.wait_for_calls(3).await.expect("second job should look up");
    assert_eq!(coordinator.active_job(&key), submissions[1].job_id());
    assert_eq!(coordinator.queue_depth(&key), 2);

    gated.release(2);
    log.wait_for(3).await.expect("every job should finish");
    coordinator.wait_idle().await;

    assert_eq!(log.labels(), vec!["a".to_owned(), "b".to_owned(), "c".to_owned()]);
    let stored = gated
        .find_by_scope(&key)
        .await
        .expect("lookup should succeed")
        .expect("registration should exist");
    assert_eq!(stored.version(), 3);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn distinct_scopes_run_concurrently(gated: Arc<RecordingStorage>) {
    let coordinator = coordinator(&gated);
    let log = CompletionLog::new();
    let first = scope("https://example.com/one/").expect("valid scope");
    let second = scope("https://example.com/two/").expect("valid scope");

    let started_first = coordinator.submit(JobRequest::unregister(first.clone()), log.callback("one"));
    let started_second =
        coordinator.submit(JobRequest::unregister(second.clone()), log.callback("two"));

    assert!(matches!(started_first, Submission::Started(_)));
    assert!(matches!(started_second, Submission::Started(_)));
    gated
        .wait_for_calls(2)
        .await
        .expect("both scopes should reach storage without waiting on each other");
    assert_eq!(coordinator.tracked_scopes(), 2);

    gated.release(2);
    log.wait_for(2).await.expect("both jobs should finish");
    coordinator.wait_idle().await;
    assert_eq!(coordinator.tracked_scopes(), 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn storage_failure_reaches_every_coalesced_caller(gated: Arc<RecordingStorage>) {
    let key = scope("https://example.com/app/").expect("valid scope");
    let coordinator = coordinator(&gated);
    let log = CompletionLog::new();
    gated.fail_next_lookup();

    coordinator.submit(JobRequest::unregister(key.clone()), log.callback("first"));
    coordinator.submit(JobRequest::unregister(key.clone()), log.callback("second"));
    coordinator.submit(
        JobRequest::register(key.clone(), script("a")),
        log.callback("register"),
    );

    gated.release(2);
    log.wait_for(3).await.expect("every callback should fire");
    coordinator.wait_idle().await;

    assert_eq!(
        log.entries(),
        vec![
            ("first".to_owned(), JobStatus::StorageError),
            ("second".to_owned(), JobStatus::StorageError),
            ("register".to_owned(), JobStatus::Success),
        ]
    );
    assert_eq!(gated.delete_count(), 0);
}

#[rstest]
#[case::any_queued(CoordinatorConfig::default(), true)]
#[case::tail_only(CoordinatorConfig::strict_order(), false)]
#[tokio::test(flavor = "multi_thread")]
async fn coalescing_policy_decides_final_registration_state(
    gated: Arc<RecordingStorage>,
    #[case] config: CoordinatorConfig,
    #[case] expect_registered: bool,
) {
    let key = scope("https://example.com/app/").expect("valid scope");
    let coordinator = coordinator_with(&gated, config);
    let log = CompletionLog::new();

    coordinator.submit(
        JobRequest::register(key.clone(), script("a")),
        log.callback("add a"),
    );
    coordinator.submit(JobRequest::unregister(key.clone()), log.callback("remove"));
    coordinator.submit(
        JobRequest::register(key.clone(), script("b")),
        log.callback("add b"),
    );
    let last = coordinator.submit(JobRequest::unregister(key.clone()), log.callback("remove again"));

    assert_eq!(matches!(last, Submission::Coalesced(_)), expect_registered);
    gated.release(4);
    log.wait_for(4).await.expect("every callback should fire");
    coordinator.wait_idle().await;

    let stored = gated.find_by_scope(&key).await.expect("lookup should succeed");
    assert_eq!(stored.is_some(), expect_registered);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn in_flight_unregister_with_work_behind_it_is_not_shared(gated: Arc<RecordingStorage>) {
    let key = scope("https://example.com/app/").expect("valid scope");
    let coordinator = coordinator(&gated);
    let log = CompletionLog::new();

    coordinator.submit(JobRequest::unregister(key.clone()), log.callback("remove"));
    coordinator.submit(
        JobRequest::register(key.clone(), script("a")),
        log.callback("add"),
    );
    let late = coordinator.submit(JobRequest::unregister(key.clone()), log.callback("remove again"));

    assert!(matches!(late, Submission::Queued(_)));
    gated.release(3);
    log.wait_for(3).await.expect("every callback should fire");
    coordinator.wait_idle().await;

    assert_eq!(
        log.labels(),
        vec!["remove".to_owned(), "add".to_owned(), "remove again".to_owned()]
    );
    let stored = gated.find_by_scope(&key).await.expect("lookup should succeed");
    assert_eq!(stored, None);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejected_submission_reports_aborted_without_touching_storage(
    gated: Arc<RecordingStorage>,
) {
    let coordinator = coordinator(&gated);
    let log = CompletionLog::new();
    assert_eq!(coordinator.shutdown(), 0);

    let submission = coordinator.submit(
        JobRequest::unregister(scope("https://example.com/app/").expect("valid scope")),
        log.callback("late"),
    );

    assert_eq!(submission, Submission::Rejected);
    assert_eq!(log.entries(), vec![("late".to_owned(), JobStatus::Aborted)]);
    assert!(gated.calls().is_empty());
    assert!(coordinator.is_idle());
}
