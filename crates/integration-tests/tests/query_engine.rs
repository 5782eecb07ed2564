mod support;

use chrono::{DateTime, NaiveDate, Utc};
use serial_test::serial;
use shared::models::{ClientStatus, ClientType, EntityType, PrivacyLevel, ProjectStatus};
use shared::privacy::AccessMode;
use shared::query::ast::{AggFunction, Aggregation, FilterClause, Literal, Op, OrderDirection, Query};
use shared::query::{QueryOutcome, run_query};
use shared::timezone::WeekBoundary;

async fn seed_project_with_sessions(store: &shared::repos::Store) -> i64 {
    let client = store
        .create_client("Northwind Co", ClientType::Company, ClientStatus::Active, None, None, &[])
        .await
        .expect("client should create");
    let project = store
        .create_project("Reporting", client.id, None, None, ProjectStatus::Active, None, None, &[])
        .await
        .expect("project should create");

    let sessions = [
        ("2026-05-04T09:00:00Z", "2026-05-04T11:00:00Z", PrivacyLevel::Public),
        ("2026-05-05T09:00:00Z", "2026-05-05T13:00:00Z", PrivacyLevel::Private),
    ];
    for (start_raw, end_raw, privacy) in sessions {
        let start: DateTime<Utc> = start_raw.parse().unwrap();
        let end: DateTime<Utc> = end_raw.parse().unwrap();
        store
            .create_work_session(
                project.id,
                NaiveDate::from_ymd_opt(2026, 5, 4).unwrap(),
                start,
                end,
                shared::rounding::duration_rounded(start, end).unwrap(),
                None,
                privacy,
                &[],
            )
            .await
            .expect("work session should create");
    }

    project.id
}

#[tokio::test]
#[serial]
async fn filtering_work_sessions_by_project_returns_matching_entities() {
    let store = support::test_store().await;
    support::reset_database(store.pool()).await;
    let project_id = seed_project_with_sessions(&store).await;

    let query = Query {
        entity_type: EntityType::WorkSession,
        filters: vec![FilterClause { field: "project_id".to_string(), operator: Op::Eq, value: Literal::Int(project_id) }],
        aggregation: None,
        limit: 100,
        offset: 0,
        order_by: vec![("start_time".to_string(), OrderDirection::Asc)],
    };

    let outcome = run_query(&store, query, AccessMode::All, Utc::now(), "UTC", WeekBoundary::Sunday)
        .await
        .expect("query should execute");

    match outcome {
        QueryOutcome::Entities { results, total_count, .. } => {
            assert_eq!(total_count, 2);
            assert_eq!(results.len(), 2);
        }
        _ => panic!("expected an entity projection"),
    }
}

#[tokio::test]
#[serial]
async fn a_public_only_access_mode_excludes_private_sessions_from_the_sum() {
    let store = support::test_store().await;
    support::reset_database(store.pool()).await;
    seed_project_with_sessions(&store).await;

    let query = Query {
        entity_type: EntityType::WorkSession,
        filters: vec![],
        aggregation: Some(Aggregation {
            function: AggFunction::Sum,
            field: Some("duration_hours".to_string()),
            group_by: vec![],
        }),
        limit: 100,
        offset: 0,
        order_by: vec![],
    };

    let outcome = run_query(&store, query, AccessMode::PublicOnly, Utc::now(), "UTC", WeekBoundary::Sunday)
        .await
        .expect("query should execute");

    match outcome {
        QueryOutcome::Scalar { aggregation, .. } => {
            assert_eq!(aggregation.result, shared::query::LiteralOut::String("2.0".to_string()));
        }
        _ => panic!("expected a scalar aggregation"),
    }
}

#[tokio::test]
#[serial]
async fn grouping_by_project_name_rolls_up_hours_per_project() {
    let store = support::test_store().await;
    support::reset_database(store.pool()).await;
    seed_project_with_sessions(&store).await;

    let query = Query {
        entity_type: EntityType::WorkSession,
        filters: vec![],
        aggregation: Some(Aggregation {
            function: AggFunction::Sum,
            field: Some("duration_hours".to_string()),
            group_by: vec!["project.name".to_string()],
        }),
        limit: 100,
        offset: 0,
        order_by: vec![],
    };

    let outcome = run_query(&store, query, AccessMode::All, Utc::now(), "UTC", WeekBoundary::Sunday)
        .await
        .expect("query should execute");

    match outcome {
        QueryOutcome::Grouped { aggregation, total_groups, .. } => {
            assert_eq!(total_groups, 1);
            assert_eq!(aggregation.groups.len(), 1);
        }
        _ => panic!("expected a grouped aggregation"),
    }
}
