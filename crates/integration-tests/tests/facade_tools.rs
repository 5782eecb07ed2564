mod support;

use mcp_server::dto::{
    AddClientInput, AddEmploymentHistoryInput, AddProjectInput, GetTimecardInput,
    LogMeetingInput, LogWorkSessionInput, UpdateWorkSessionInput,
};
use mcp_server::facade::Facade;
use serial_test::serial;
use shared::models::{ClientStatus, ClientType, ProjectStatus, User};
use shared::timezone::WeekBoundary;

fn default_user() -> User {
    User {
        id: 1,
        name: "Mosaic user".to_string(),
        email: None,
        timezone: "UTC".to_string(),
        default_week_boundary: WeekBoundary::Monday,
        default_privacy_level: shared::models::PrivacyLevel::Private,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    }
}

#[tokio::test]
#[serial]
async fn log_work_session_rejects_a_naive_datetime() {
    let store = support::test_store().await;
    support::reset_database(store.pool()).await;
    let facade = Facade::new(store, None, "default".to_string(), &default_user());

    let input = LogWorkSessionInput {
        project_id: 1,
        start_time: "2026-05-01 09:00:00".to_string(),
        end_time: "2026-05-01T11:00:00Z".to_string(),
        summary: None,
        privacy_level: None,
        tags: vec![],
    };

    let result = facade.log_work_session(input).await;
    assert!(matches!(result, Err(shared::error::CoreError::InvalidArgument(_))));
}

#[tokio::test]
#[serial]
async fn log_work_session_dedupes_tags_and_applies_the_default_privacy_level() {
    let store = support::test_store().await;
    support::reset_database(store.pool()).await;

    let client = store
        .create_client("Northwind Co", ClientType::Company, ClientStatus::Active, None, None, &[])
        .await
        .expect("client should create");
    let project = store
        .create_project("Reporting", client.id, None, None, ProjectStatus::Active, None, None, &[])
        .await
        .expect("project should create");

    let facade = Facade::new(store, None, "default".to_string(), &default_user());

    let input = LogWorkSessionInput {
        project_id: project.id,
        start_time: "2026-05-01T09:00:00Z".to_string(),
        end_time: "2026-05-01T11:00:00Z".to_string(),
        summary: Some("reporting work".to_string()),
        privacy_level: None,
        tags: vec!["alpha".to_string(), "alpha".to_string(), "beta".to_string()],
    };

    let session = facade.log_work_session(input).await.expect("session should log");
    assert_eq!(session.privacy_level, shared::models::PrivacyLevel::Private);
    assert_eq!(session.tags.len(), 2);
}

#[tokio::test]
#[serial]
async fn log_meeting_against_a_missing_project_fails_with_not_found() {
    let store = support::test_store().await;
    support::reset_database(store.pool()).await;
    let facade = Facade::new(store, None, "default".to_string(), &default_user());

    let input = LogMeetingInput {
        title: "Doomed sync".to_string(),
        start_time: "2026-02-10T14:00:00Z".to_string(),
        duration_minutes: 30,
        summary: None,
        privacy_level: None,
        project_id: Some(999_999),
        meeting_type: None,
        location: None,
        tags: vec![],
        attendee_ids: vec![],
    };

    let result = facade.log_meeting(input).await;
    assert!(
        matches!(result, Err(shared::error::CoreError::NotFound(_))),
        "expected NotFound for a nonexistent project_id"
    );
}

#[tokio::test]
#[serial]
async fn add_project_requires_an_end_date_when_marked_completed() {
    let store = support::test_store().await;
    support::reset_database(store.pool()).await;

    let client = store
        .create_client("Northwind Co", ClientType::Company, ClientStatus::Active, None, None, &[])
        .await
        .expect("client should create");

    let facade = Facade::new(store, None, "default".to_string(), &default_user());

    let input = AddProjectInput {
        name: "Doomed".to_string(),
        client_id: client.id,
        on_behalf_of_id: None,
        description: None,
        status: ProjectStatus::Completed,
        start_date: None,
        end_date: None,
        tags: vec![],
    };

    let result = facade.add_project(input).await;
    assert!(matches!(result, Err(shared::error::CoreError::InvalidArgument(_))));
}

#[tokio::test]
#[serial]
async fn update_work_session_summary_only_change_uses_double_option_null() {
    let store = support::test_store().await;
    support::reset_database(store.pool()).await;

    let client = store
        .create_client("Northwind Co", ClientType::Company, ClientStatus::Active, None, None, &[])
        .await
        .expect("client should create");
    let project = store
        .create_project("Reporting", client.id, None, None, ProjectStatus::Active, None, None, &[])
        .await
        .expect("project should create");

    let facade = Facade::new(store, None, "default".to_string(), &default_user());

    let logged = facade
        .log_work_session(LogWorkSessionInput {
            project_id: project.id,
            start_time: "2026-05-01T09:00:00Z".to_string(),
            end_time: "2026-05-01T11:00:00Z".to_string(),
            summary: Some("initial summary".to_string()),
            privacy_level: None,
            tags: vec![],
        })
        .await
        .expect("session should log");

    let clear_summary: serde_json::Value = serde_json::json!({
        "id": logged.id,
        "summary": null,
    });
    let input: UpdateWorkSessionInput =
        serde_json::from_value(clear_summary).expect("update input should deserialize");

    let updated = facade.update_work_session(input).await.expect("update should succeed");
    assert!(updated.summary.is_none());
}

#[tokio::test]
#[serial]
async fn get_timecard_excludes_private_sessions_by_default() {
    let store = support::test_store().await;
    support::reset_database(store.pool()).await;

    let client = store
        .create_client("Northwind Co", ClientType::Company, ClientStatus::Active, None, None, &[])
        .await
        .expect("client should create");
    let project = store
        .create_project("Reporting", client.id, None, None, ProjectStatus::Active, None, None, &[])
        .await
        .expect("project should create");

    let facade = Facade::new(store, None, "default".to_string(), &default_user());

    facade
        .log_work_session(LogWorkSessionInput {
            project_id: project.id,
            start_time: "2026-05-04T09:00:00Z".to_string(),
            end_time: "2026-05-04T11:00:00Z".to_string(),
            summary: Some("public standup".to_string()),
            privacy_level: Some(shared::models::PrivacyLevel::Public),
            tags: vec![],
        })
        .await
        .expect("session should log");
    facade
        .log_work_session(LogWorkSessionInput {
            project_id: project.id,
            start_time: "2026-05-04T13:00:00Z".to_string(),
            end_time: "2026-05-04T14:00:00Z".to_string(),
            summary: Some("confidential review".to_string()),
            privacy_level: Some(shared::models::PrivacyLevel::Private),
            tags: vec![],
        })
        .await
        .expect("session should log");

    let rows = facade
        .get_timecard(GetTimecardInput {
            project_id: project.id,
            from_date: "2026-05-01".to_string(),
            to_date: "2026-05-31".to_string(),
            include_private: false,
        })
        .await
        .expect("timecard should aggregate");

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].summed_hours, "2.0");
    assert_eq!(rows[0].merged_summary, "public standup");
}

#[tokio::test]
#[serial]
async fn add_employment_history_rejects_a_second_open_record_for_the_same_client() {
    let store = support::test_store().await;
    support::reset_database(store.pool()).await;

    let client = store
        .create_client("Northwind Co", ClientType::Company, ClientStatus::Active, None, None, &[])
        .await
        .expect("client should create");
    let person = store
        .create_person(
            "Alex Rivera",
            None,
            None,
            None,
            None,
            None,
            None,
            &std::collections::BTreeMap::new(),
            false,
            &[],
        )
        .await
        .expect("person should create");

    let facade = Facade::new(store, None, "default".to_string(), &default_user());

    facade
        .add_employment_history(AddEmploymentHistoryInput {
            person_id: person.id,
            client_id: client.id,
            role: "Consultant".to_string(),
            start_date: "2026-01-01".to_string(),
            end_date: None,
        })
        .await
        .expect("first open employment record should succeed");

    let second = facade
        .add_employment_history(AddEmploymentHistoryInput {
            person_id: person.id,
            client_id: client.id,
            role: "Advisor".to_string(),
            start_date: "2026-02-01".to_string(),
            end_date: None,
        })
        .await;

    assert!(second.is_err(), "a second open employment record for the same (person, client) pair should be rejected");
}

#[tokio::test]
#[serial]
async fn add_client_rejects_unknown_fields() {
    let payload = serde_json::json!({
        "name": "Northwind Co",
        "client_type": "company",
        "status": "active",
        "nickname": "not a real field",
    });

    let result: Result<AddClientInput, _> = serde_json::from_value(payload);
    assert!(result.is_err(), "an unknown field should be rejected by deny_unknown_fields");
}
