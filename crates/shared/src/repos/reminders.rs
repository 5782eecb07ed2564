use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::postgres::PgRow;

use crate::models::{EntityId, EntityRefType, RecurrenceConfig, RecurrenceFrequency, Reminder};
use crate::recurrence::next_occurrence;

use super::{Store, StoreError, classify_sqlx_error};

/// A due reminder paired with whether it has already been dispatched
/// for its current `reminder_time` (spec §4.7 step 3).
pub struct DueReminder {
    pub reminder: Reminder,
}

impl Store {
    pub async fn create_reminder(
        &self,
        reminder_time: DateTime<Utc>,
        message: &str,
        recurrence_config: Option<RecurrenceConfig>,
        related_entity_ref: Option<(EntityRefType, EntityId)>,
        tags: &[String],
    ) -> Result<Reminder, StoreError> {
        let recurrence_frequency = recurrence_config.map(|c| c.frequency.as_str());
        let (related_entity_type, related_entity_id) = match related_entity_ref {
            Some((t, id)) => (Some(t.as_str()), Some(id)),
            None => (None, None),
        };

        let row = sqlx::query(
            "INSERT INTO reminders (
                reminder_time, message, is_completed, recurrence_frequency,
                related_entity_type, related_entity_id, tags
             ) VALUES ($1, $2, false, $3, $4, $5, $6)
             RETURNING id, reminder_time, message, is_completed, recurrence_frequency,
                       related_entity_type, related_entity_id, snoozed_until,
                       last_dispatched_at, dispatched_for_reminder_time, tags,
                       created_at, updated_at",
        )
        .bind(reminder_time)
        .bind(message)
        .bind(recurrence_frequency)
        .bind(related_entity_type)
        .bind(related_entity_id)
        .bind(tags)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| classify_sqlx_error(err, "reminder.related_entity_id"))?;

        row_to_reminder(&row)
    }

    pub async fn get_reminder(&self, id: EntityId) -> Result<Reminder, StoreError> {
        let row = sqlx::query(
            "SELECT id, reminder_time, message, is_completed, recurrence_frequency,
                    related_entity_type, related_entity_id, snoozed_until,
                    last_dispatched_at, dispatched_for_reminder_time, tags,
                    created_at, updated_at
             FROM reminders WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("reminder {id}")))?;

        row_to_reminder(&row)
    }

    /// Spec §4.7 step 1: not completed, `reminder_time <= now`, and
    /// not presently snoozed.
    pub async fn list_due_reminders(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<DueReminder>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, reminder_time, message, is_completed, recurrence_frequency,
                    related_entity_type, related_entity_id, snoozed_until,
                    last_dispatched_at, dispatched_for_reminder_time, tags,
                    created_at, updated_at
             FROM reminders
             WHERE is_completed = false
               AND reminder_time <= $1
               AND (snoozed_until IS NULL OR snoozed_until <= $1)
             ORDER BY reminder_time",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| row_to_reminder(row).map(|reminder| DueReminder { reminder }))
            .collect()
    }

    /// Unscoped snapshot for the query engine (spec §4.5/§4.6);
    /// `list_due_reminders` is the dispatch-scan lister.
    pub async fn list_all_reminders(&self) -> Result<Vec<Reminder>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, reminder_time, message, is_completed, recurrence_frequency,
                    related_entity_type, related_entity_id, snoozed_until,
                    last_dispatched_at, dispatched_for_reminder_time, tags,
                    created_at, updated_at
             FROM reminders ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_reminder).collect()
    }

    /// Records the dispatch instant so the next scan does not
    /// re-dispatch for the same `reminder_time` (spec §4.7 step 3,
    /// SPEC_FULL.md §C).
    pub async fn mark_reminder_dispatched(
        &self,
        id: EntityId,
        dispatched_at: DateTime<Utc>,
        reminder_time: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE reminders SET
               last_dispatched_at = $2,
               dispatched_for_reminder_time = $3
             WHERE id = $1",
        )
        .bind(id)
        .bind(dispatched_at)
        .bind(reminder_time)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Atomic per spec §4.7 "Completion with recurrence": sets
    /// `is_completed = true`, and for a recurring reminder inserts the
    /// next occurrence in the same transaction. Returns the next
    /// occurrence's id when one was created.
    pub async fn complete_reminder(
        &self,
        id: EntityId,
        time_zone: &str,
    ) -> Result<Option<EntityId>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "SELECT reminder_time, message, recurrence_frequency, related_entity_type,
                    related_entity_id, tags
             FROM reminders WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("reminder {id}")))?;

        let result = sqlx::query(
            "UPDATE reminders SET is_completed = true, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(StoreError::NotFound(format!("reminder {id}")));
        }

        let recurrence_frequency: Option<String> = row.try_get("recurrence_frequency")?;
        let next_id = match recurrence_frequency {
            Some(frequency_raw) => {
                let frequency = RecurrenceFrequency::from_str(&frequency_raw).ok_or_else(|| {
                    StoreError::InvalidData(format!(
                        "unknown recurrence frequency persisted: {frequency_raw}"
                    ))
                })?;
                let reminder_time: DateTime<Utc> = row.try_get("reminder_time")?;
                let message: String = row.try_get("message")?;
                let related_entity_type: Option<String> = row.try_get("related_entity_type")?;
                let related_entity_id: Option<EntityId> = row.try_get("related_entity_id")?;
                let tags: Vec<String> = row.try_get("tags")?;

                let next_time = next_occurrence(reminder_time, frequency, time_zone);

                let next_id: EntityId = sqlx::query_scalar(
                    "INSERT INTO reminders (
                        reminder_time, message, is_completed, recurrence_frequency,
                        related_entity_type, related_entity_id, tags
                     ) VALUES ($1, $2, false, $3, $4, $5, $6)
                     RETURNING id",
                )
                .bind(next_time)
                .bind(&message)
                .bind(&frequency_raw)
                .bind(&related_entity_type)
                .bind(related_entity_id)
                .bind(&tags)
                .fetch_one(&mut *tx)
                .await?;

                Some(next_id)
            }
            None => None,
        };

        tx.commit().await?;
        Ok(next_id)
    }

    /// Does not alter `reminder_time` or recurrence (spec §4.7
    /// "Snoozing").
    pub async fn snooze_reminder(
        &self,
        id: EntityId,
        until: DateTime<Utc>,
    ) -> Result<Reminder, StoreError> {
        let result = sqlx::query(
            "UPDATE reminders SET snoozed_until = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(until)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("reminder {id}")));
        }

        self.get_reminder(id).await
    }

    pub async fn update_reminder(
        &self,
        id: EntityId,
        reminder_time: Option<DateTime<Utc>>,
        message: Option<&str>,
        recurrence_config: Option<Option<RecurrenceConfig>>,
        tags: Option<&[String]>,
    ) -> Result<Reminder, StoreError> {
        let recurrence_frequency = recurrence_config.map(|c| c.map(|c| c.frequency.as_str()));

        sqlx::query(
            "UPDATE reminders SET
               reminder_time = COALESCE($2, reminder_time),
               message = COALESCE($3, message),
               recurrence_frequency = CASE WHEN $4 THEN $5 ELSE recurrence_frequency END,
               tags = COALESCE($6, tags),
               updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(reminder_time)
        .bind(message)
        .bind(recurrence_frequency.is_some())
        .bind(recurrence_frequency.flatten())
        .bind(tags)
        .execute(&self.pool)
        .await?;

        self.get_reminder(id).await
    }

    pub async fn delete_reminder(&self, id: EntityId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM reminders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("reminder {id}")));
        }
        Ok(())
    }
}

fn row_to_reminder(row: &PgRow) -> Result<Reminder, StoreError> {
    let recurrence_frequency: Option<String> = row.try_get("recurrence_frequency")?;
    let related_entity_type: Option<String> = row.try_get("related_entity_type")?;
    let tags: Vec<String> = row.try_get("tags")?;

    let recurrence_config = recurrence_frequency
        .map(|raw| {
            RecurrenceFrequency::from_str(&raw)
                .ok_or_else(|| {
                    StoreError::InvalidData(format!(
                        "unknown recurrence frequency persisted: {raw}"
                    ))
                })
                .map(|frequency| RecurrenceConfig { frequency })
        })
        .transpose()?;

    let related_entity_type = related_entity_type
        .map(|value| {
            EntityRefType::from_str(&value).ok_or_else(|| {
                StoreError::InvalidData(format!("unknown entity_type persisted: {value}"))
            })
        })
        .transpose()?;

    Ok(Reminder {
        id: row.try_get("id")?,
        reminder_time: row.try_get("reminder_time")?,
        message: row.try_get("message")?,
        is_completed: row.try_get("is_completed")?,
        recurrence_config,
        related_entity_type,
        related_entity_id: row.try_get("related_entity_id")?,
        snoozed_until: row.try_get("snoozed_until")?,
        last_dispatched_at: row.try_get("last_dispatched_at")?,
        dispatched_for_reminder_time: row.try_get("dispatched_for_reminder_time")?,
        tags: tags.into_iter().collect(),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
