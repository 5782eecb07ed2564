mod support;

use chrono::{DateTime, Utc};
use serial_test::serial;
use shared::models::{RecurrenceConfig, RecurrenceFrequency};

#[tokio::test]
#[serial]
async fn completing_a_one_off_reminder_creates_no_next_occurrence() {
    let store = support::test_store().await;
    support::reset_database(store.pool()).await;

    let reminder_time: DateTime<Utc> = "2026-03-01T09:00:00Z".parse().unwrap();
    let reminder = store
        .create_reminder(reminder_time, "Send invoice", None, None, &[])
        .await
        .expect("reminder should create");

    let next_id = store
        .complete_reminder(reminder.id, "UTC")
        .await
        .expect("completion should succeed");
    assert!(next_id.is_none());

    let completed = store.get_reminder(reminder.id).await.expect("reminder should still exist");
    assert!(completed.is_completed);
}

#[tokio::test]
#[serial]
async fn completing_a_weekly_reminder_atomically_schedules_the_next_occurrence() {
    let store = support::test_store().await;
    support::reset_database(store.pool()).await;

    let reminder_time: DateTime<Utc> = "2026-03-01T09:00:00Z".parse().unwrap();
    let reminder = store
        .create_reminder(
            reminder_time,
            "Weekly check-in",
            Some(RecurrenceConfig { frequency: RecurrenceFrequency::Weekly }),
            None,
            &[],
        )
        .await
        .expect("reminder should create");

    let next_id = store
        .complete_reminder(reminder.id, "UTC")
        .await
        .expect("completion should succeed")
        .expect("a recurring reminder should schedule its next occurrence");

    let completed = store.get_reminder(reminder.id).await.expect("original should still exist");
    assert!(completed.is_completed);

    let next = store.get_reminder(next_id).await.expect("next occurrence should exist");
    assert!(!next.is_completed);
    assert_eq!(next.reminder_time, reminder_time + chrono::Duration::days(7));
    assert_eq!(next.message, "Weekly check-in");
}

#[tokio::test]
#[serial]
async fn a_reminder_due_now_is_not_redispatched_once_marked() {
    let store = support::test_store().await;
    support::reset_database(store.pool()).await;

    let now: DateTime<Utc> = "2026-03-01T09:00:00Z".parse().unwrap();
    let reminder = store
        .create_reminder(now, "Follow up", None, None, &[])
        .await
        .expect("reminder should create");

    let due = store.list_due_reminders(now).await.expect("due scan should succeed");
    assert_eq!(due.len(), 1);
    assert!(due[0].reminder.is_due(now));
    assert!(!due[0].reminder.already_dispatched_for_current_time());

    store
        .mark_reminder_dispatched(reminder.id, now, reminder.reminder_time)
        .await
        .expect("dispatch marker should record");

    let refetched = store.get_reminder(reminder.id).await.expect("reminder should refetch");
    assert!(refetched.already_dispatched_for_current_time());
}
