//! The reminder scheduler's check-due tick (spec §4.7). Reads due
//! reminders from the entity store and drives the notification
//! dispatcher; it never computes recurrence itself (recurrence is
//! materialized by `complete_reminder`, a tool operation).

use chrono::{DateTime, Utc};
use shared::models::Reminder;
use shared::notifier::Notifier;
use shared::repos::Store;
use tracing::{info, warn};

/// One check-due pass (spec §4.7 steps 1-3). Each due reminder is
/// dispatched independently: a failed dispatch never blocks the rest
/// of the batch.
pub async fn run_check_due(
    store: &Store,
    notifier: Option<&Notifier>,
    notification_sound: &str,
    now: DateTime<Utc>,
) {
    let due = match store.list_due_reminders(now).await {
        Ok(due) => due,
        Err(err) => {
            warn!("failed to scan due reminders: {err}");
            return;
        }
    };

    let mut dispatched = 0u32;
    for due_reminder in due {
        let reminder = due_reminder.reminder;
        if reminder.already_dispatched_for_current_time() {
            continue;
        }

        dispatch_one(store, notifier, notification_sound, now, &reminder).await;
        dispatched += 1;
    }

    if dispatched > 0 {
        info!("check-due dispatched {dispatched} reminder(s)");
    }
}

async fn dispatch_one(
    store: &Store,
    notifier: Option<&Notifier>,
    notification_sound: &str,
    now: DateTime<Utc>,
    reminder: &Reminder,
) {
    match notifier {
        Some(notifier) => {
            let outcome = notifier
                .notify(
                    "Mosaic reminder",
                    &reminder.message,
                    Some(notification_sound),
                    None,
                )
                .await;
            if !outcome.delivered {
                warn!(
                    reminder_id = reminder.id,
                    attempts = outcome.attempts,
                    "reminder dispatch exhausted retries"
                );
            }
        }
        None => {
            info!(reminder_id = reminder.id, "notifications disabled, skipping dispatch");
        }
    };

    // Bookkeeping is recorded regardless of delivery success: a
    // reminder is "dispatched" once the scheduler has attempted it for
    // this reminder_time (spec §4.7 step 3); the bridge's own failure
    // is logged, not propagated, since the scheduler runs out-of-band.
    if let Err(err) = store
        .mark_reminder_dispatched(reminder.id, now, reminder.reminder_time)
        .await
    {
        warn!(reminder_id = reminder.id, "failed to record dispatch: {err}");
    }
}
