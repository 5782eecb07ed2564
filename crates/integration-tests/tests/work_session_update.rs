mod support;

use chrono::{DateTime, NaiveDate, Utc};
use serial_test::serial;
use shared::models::{ClientStatus, ClientType, PrivacyLevel, ProjectStatus};

#[tokio::test]
#[serial]
async fn changing_the_end_time_recomputes_duration_and_date_together() {
    let store = support::test_store().await;
    support::reset_database(store.pool()).await;

    let client = store
        .create_client("Northwind Co", ClientType::Company, ClientStatus::Active, None, None, &[])
        .await
        .expect("client should create");
    let project = store
        .create_project("Billing integration", client.id, None, None, ProjectStatus::Active, None, None, &[])
        .await
        .expect("project should create");

    let start: DateTime<Utc> = "2026-04-01T09:00:00Z".parse().unwrap();
    let end: DateTime<Utc> = "2026-04-01T10:00:00Z".parse().unwrap();
    let session = store
        .create_work_session(
            project.id,
            NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
            start,
            end,
            shared::rounding::duration_rounded(start, end).unwrap(),
            None,
            PrivacyLevel::Internal,
            &[],
        )
        .await
        .expect("work session should create");
    assert_eq!(session.duration_hours.to_string(), "1.0");

    let new_end: DateTime<Utc> = "2026-04-02T01:45:00Z".parse().unwrap();
    let updated = store
        .update_work_session(session.id, None, None, Some(new_end), None, None, None, "UTC")
        .await
        .expect("update should succeed");

    assert_eq!(updated.end_time, new_end);
    assert_eq!(updated.date, NaiveDate::from_ymd_opt(2026, 4, 1).unwrap());
    assert_eq!(updated.duration_hours.to_string(), "17.0");
}

#[tokio::test]
#[serial]
async fn updating_fields_other_than_times_leaves_duration_untouched() {
    let store = support::test_store().await;
    support::reset_database(store.pool()).await;

    let client = store
        .create_client("Northwind Co", ClientType::Company, ClientStatus::Active, None, None, &[])
        .await
        .expect("client should create");
    let project = store
        .create_project("Billing integration", client.id, None, None, ProjectStatus::Active, None, None, &[])
        .await
        .expect("project should create");

    let start: DateTime<Utc> = "2026-04-01T09:00:00Z".parse().unwrap();
    let end: DateTime<Utc> = "2026-04-01T09:40:00Z".parse().unwrap();
    let session = store
        .create_work_session(
            project.id,
            NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
            start,
            end,
            shared::rounding::duration_rounded(start, end).unwrap(),
            None,
            PrivacyLevel::Internal,
            &[],
        )
        .await
        .expect("work session should create");
    assert_eq!(session.duration_hours.to_string(), "1.0");

    let updated = store
        .update_work_session(session.id, None, None, None, Some(Some("wrapped up the migration")), None, None, "UTC")
        .await
        .expect("summary-only update should succeed");

    assert_eq!(updated.duration_hours, session.duration_hours);
    assert_eq!(updated.start_time, start);
    assert_eq!(updated.end_time, end);
    assert_eq!(updated.summary.as_deref(), Some("wrapped up the migration"));
}
