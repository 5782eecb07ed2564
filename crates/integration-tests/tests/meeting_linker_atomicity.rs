mod support;

use chrono::{DateTime, Utc};
use serial_test::serial;
use shared::models::{ClientStatus, ClientType, PrivacyLevel, ProjectStatus};
use shared::repos::StoreError;

async fn seed_two_projects(store: &shared::repos::Store) -> (i64, i64) {
    let client = store
        .create_client("Northwind Co", ClientType::Company, ClientStatus::Active, None, None, &[])
        .await
        .expect("client should create");

    let project_a = store
        .create_project("Project A", client.id, None, None, ProjectStatus::Active, None, None, &[])
        .await
        .expect("project A should create");
    let project_b = store
        .create_project("Project B", client.id, None, None, ProjectStatus::Active, None, None, &[])
        .await
        .expect("project B should create");

    (project_a.id, project_b.id)
}

#[tokio::test]
#[serial]
async fn logging_a_project_bound_meeting_creates_a_linked_work_session() {
    let store = support::test_store().await;
    support::reset_database(store.pool()).await;

    let (project_id, _) = seed_two_projects(&store).await;
    let start: DateTime<Utc> = "2026-02-10T14:00:00Z".parse().unwrap();

    let outcome = store
        .create_meeting(
            "Sprint planning",
            start,
            45,
            None,
            PrivacyLevel::Internal,
            Some(project_id),
            None,
            None,
            &[],
            &[],
            "UTC",
        )
        .await
        .expect("meeting with a bound project should create a linked work session");

    let session = outcome.auto_work_session.expect("work session should be generated");
    assert_eq!(session.linked_meeting_id, Some(outcome.meeting.id));
    assert_eq!(session.duration_hours.to_string(), "1.0");
    assert_eq!(session.project_id, project_id);
}

#[tokio::test]
#[serial]
async fn logging_a_meeting_with_no_project_creates_no_work_session() {
    let store = support::test_store().await;
    support::reset_database(store.pool()).await;

    let start: DateTime<Utc> = "2026-02-10T14:00:00Z".parse().unwrap();
    let outcome = store
        .create_meeting("1:1 catch-up", start, 30, None, PrivacyLevel::Private, None, None, None, &[], &[], "UTC")
        .await
        .expect("meeting with no project should still create");

    assert!(outcome.auto_work_session.is_none());
}

#[tokio::test]
#[serial]
async fn reassigning_a_meetings_project_regenerates_the_linked_session() {
    let store = support::test_store().await;
    support::reset_database(store.pool()).await;

    let (project_a, project_b) = seed_two_projects(&store).await;
    let start: DateTime<Utc> = "2026-02-10T14:00:00Z".parse().unwrap();

    let outcome = store
        .create_meeting("Kickoff", start, 60, None, PrivacyLevel::Internal, Some(project_a), None, None, &[], &[], "UTC")
        .await
        .expect("meeting should create");
    let original_session_id = outcome.auto_work_session.expect("linked session expected").id;

    store
        .update_meeting(
            outcome.meeting.id,
            None,
            None,
            None,
            None,
            None,
            Some(Some(project_b)),
            None,
            None,
            None,
            "UTC",
        )
        .await
        .expect("reassigning project should succeed");

    let old_session = store.get_work_session(original_session_id).await;
    assert!(old_session.is_err(), "the stale linked session should have been deleted");

    let sessions = store
        .list_work_sessions_for_project_in_range(
            project_b,
            chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            chrono::NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
        )
        .await
        .expect("project B sessions should list");
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].linked_meeting_id, Some(outcome.meeting.id));
}

#[tokio::test]
#[serial]
async fn logging_a_meeting_against_a_missing_project_fails_with_not_found() {
    let store = support::test_store().await;
    support::reset_database(store.pool()).await;

    let start: DateTime<Utc> = "2026-02-10T14:00:00Z".parse().unwrap();

    let result = store
        .create_meeting(
            "Doomed sync",
            start,
            30,
            None,
            PrivacyLevel::Internal,
            Some(999_999),
            None,
            None,
            &[],
            &[],
            "UTC",
        )
        .await;

    match result {
        Err(StoreError::NotFound(_)) => {}
        Err(other) => panic!("expected NotFound for a nonexistent project_id, got {other:?}"),
        Ok(_) => panic!("expected NotFound for a nonexistent project_id, meeting creation succeeded"),
    }

    let meetings = store.list_meetings().await.expect("meetings should list");
    assert!(meetings.is_empty(), "no meeting row should remain after a failed project reference");
}

#[tokio::test]
#[serial]
async fn meeting_with_invalid_duration_for_a_bound_project_creates_neither_row() {
    let store = support::test_store().await;
    support::reset_database(store.pool()).await;

    let (project_id, _) = seed_two_projects(&store).await;
    let start: DateTime<Utc> = "2026-02-10T14:00:00Z".parse().unwrap();

    let result = store
        .create_meeting("Bad meeting", start, 0, None, PrivacyLevel::Internal, Some(project_id), None, None, &[], &[], "UTC")
        .await;
    assert!(result.is_err());

    let meetings = store.list_meetings().await.expect("meetings should list");
    assert!(meetings.is_empty(), "the failed meeting row must not have been left behind");
}
