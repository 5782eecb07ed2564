mod support;

use chrono::NaiveDate;
use serial_test::serial;
use shared::models::{ClientStatus, ClientType, ProjectStatus};

#[tokio::test]
#[serial]
async fn employer_client_project_chain_persists_and_updates() {
    let store = support::test_store().await;
    support::reset_database(store.pool()).await;

    let employer = store
        .create_employer("Acme Staffing", Some("staffing agency"), &["agency".to_string()])
        .await
        .expect("employer should create");

    let client = store
        .create_client("Northwind Co", ClientType::Company, ClientStatus::Active, None, None, &[])
        .await
        .expect("client should create");

    let project = store
        .create_project(
            "Website revamp",
            client.id,
            Some(employer.id),
            Some("Q3 redesign"),
            ProjectStatus::Active,
            Some(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()),
            None,
            &["web".to_string()],
        )
        .await
        .expect("project should create");

    assert_eq!(project.client_id, client.id);
    assert_eq!(project.on_behalf_of_id, Some(employer.id));

    let updated = store
        .update_project(
            project.id,
            None,
            None,
            None,
            None,
            Some(ProjectStatus::Completed),
            None,
            Some(Some(NaiveDate::from_ymd_opt(2026, 6, 30).unwrap())),
            None,
        )
        .await
        .expect("completing with an end_date should succeed");
    assert_eq!(updated.status, ProjectStatus::Completed);
    assert_eq!(updated.end_date, Some(NaiveDate::from_ymd_opt(2026, 6, 30).unwrap()));
}

#[tokio::test]
#[serial]
async fn completed_project_without_end_date_is_rejected_by_the_database() {
    let store = support::test_store().await;
    support::reset_database(store.pool()).await;

    let client = store
        .create_client("Northwind Co", ClientType::Company, ClientStatus::Active, None, None, &[])
        .await
        .expect("client should create");

    let result = store
        .create_project(
            "Doomed project",
            client.id,
            None,
            None,
            ProjectStatus::Completed,
            None,
            None,
            &[],
        )
        .await;

    assert!(result.is_err(), "a completed project with no end_date should violate the CHECK constraint");
}

#[tokio::test]
#[serial]
async fn project_cannot_reference_a_missing_client() {
    let store = support::test_store().await;
    support::reset_database(store.pool()).await;

    let result = store
        .create_project("Orphan project", 999_999, None, None, ProjectStatus::Active, None, None, &[])
        .await;

    assert!(matches!(result, Err(shared::repos::StoreError::ForeignKeyViolation(_))));
}

#[tokio::test]
#[serial]
async fn deleting_a_client_with_an_active_project_is_restricted() {
    let store = support::test_store().await;
    support::reset_database(store.pool()).await;

    let client = store
        .create_client("Northwind Co", ClientType::Company, ClientStatus::Active, None, None, &[])
        .await
        .expect("client should create");

    store
        .create_project("Still running", client.id, None, None, ProjectStatus::Active, None, None, &[])
        .await
        .expect("project should create");

    let result = store.delete_client(client.id).await;
    assert!(result.is_err(), "deleting a client referenced by a project should fail under RESTRICT");
}
