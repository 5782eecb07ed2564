use chrono::{DateTime, NaiveDate, Utc};
use sqlx::Row;
use sqlx::postgres::PgRow;

use crate::models::{EntityId, PrivacyLevel, WorkSession};
use crate::rounding::{Decimal1dp, duration_rounded};

use super::{Store, StoreError, classify_sqlx_error};

impl Store {
    #[allow(clippy::too_many_arguments)]
    pub async fn create_work_session(
        &self,
        project_id: EntityId,
        date: NaiveDate,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        duration_hours: Decimal1dp,
        summary: Option<&str>,
        privacy_level: PrivacyLevel,
        tags: &[String],
    ) -> Result<WorkSession, StoreError> {
        let row = sqlx::query(
            "INSERT INTO work_sessions (
                project_id, date, start_time, end_time, duration_hours, summary,
                privacy_level, tags
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING id, project_id, date, start_time, end_time, duration_hours, summary,
                       privacy_level, linked_meeting_id, tags, created_at, updated_at",
        )
        .bind(project_id)
        .bind(date)
        .bind(start_time)
        .bind(end_time)
        .bind(duration_hours.inner())
        .bind(summary)
        .bind(privacy_level.as_str())
        .bind(tags)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| classify_sqlx_error(err, "work_session.project_id"))?;

        row_to_work_session(&row)
    }

    /// Used by the meeting linker (spec §4.3); stamps `linked_meeting_id`
    /// so a later project reassignment can find and delete this row.
    #[allow(clippy::too_many_arguments)]
    pub(super) async fn create_linked_work_session(
        executor: impl sqlx::PgExecutor<'_>,
        project_id: EntityId,
        date: NaiveDate,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        duration_hours: Decimal1dp,
        summary: &str,
        privacy_level: PrivacyLevel,
        tags: &[String],
        meeting_id: EntityId,
    ) -> Result<WorkSession, StoreError> {
        let row = sqlx::query(
            "INSERT INTO work_sessions (
                project_id, date, start_time, end_time, duration_hours, summary,
                privacy_level, linked_meeting_id, tags
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING id, project_id, date, start_time, end_time, duration_hours, summary,
                       privacy_level, linked_meeting_id, tags, created_at, updated_at",
        )
        .bind(project_id)
        .bind(date)
        .bind(start_time)
        .bind(end_time)
        .bind(duration_hours.inner())
        .bind(summary)
        .bind(privacy_level.as_str())
        .bind(meeting_id)
        .bind(tags)
        .fetch_one(executor)
        .await
        .map_err(|err| classify_sqlx_error(err, "work_session.project_id"))?;

        row_to_work_session(&row)
    }

    pub async fn get_work_session(&self, id: EntityId) -> Result<WorkSession, StoreError> {
        let row = sqlx::query(
            "SELECT id, project_id, date, start_time, end_time, duration_hours, summary,
                    privacy_level, linked_meeting_id, tags, created_at, updated_at
             FROM work_sessions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("work_session {id}")))?;

        row_to_work_session(&row)
    }

    pub async fn list_work_sessions_for_project_in_range(
        &self,
        project_id: EntityId,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> Result<Vec<WorkSession>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, project_id, date, start_time, end_time, duration_hours, summary,
                    privacy_level, linked_meeting_id, tags, created_at, updated_at
             FROM work_sessions
             WHERE project_id = $1 AND date BETWEEN $2 AND $3
             ORDER BY date, start_time",
        )
        .bind(project_id)
        .bind(from_date)
        .bind(to_date)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_work_session).collect()
    }

    /// Unscoped snapshot for the query engine (spec §4.5/§4.6); ordinary
    /// callers want `list_work_sessions_for_project_in_range` instead.
    pub async fn list_work_sessions(&self) -> Result<Vec<WorkSession>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, project_id, date, start_time, end_time, duration_hours, summary,
                    privacy_level, linked_meeting_id, tags, created_at, updated_at
             FROM work_sessions
             ORDER BY date, start_time",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_work_session).collect()
    }

    /// Deletes the work session auto-generated for `meeting_id`, if
    /// any (SPEC_FULL.md §D.3). Intended for use inside the same
    /// transaction as a meeting's project reassignment.
    pub(super) async fn delete_linked_work_session(
        executor: impl sqlx::PgExecutor<'_>,
        meeting_id: EntityId,
    ) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM work_sessions WHERE linked_meeting_id = $1")
            .bind(meeting_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Partial update. When either time field changes, `duration_hours`
    /// and `date` are recomputed in the same transaction (spec §5: "All
    /// updates that modify start/end times on a WorkSession ... must
    /// recompute `duration_hours` and `date` in the same commit").
    #[allow(clippy::too_many_arguments)]
    pub async fn update_work_session(
        &self,
        id: EntityId,
        project_id: Option<EntityId>,
        start_time: Option<DateTime<Utc>>,
        end_time: Option<DateTime<Utc>>,
        summary: Option<Option<&str>>,
        privacy_level: Option<PrivacyLevel>,
        tags: Option<&[String]>,
        time_zone: &str,
    ) -> Result<WorkSession, StoreError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query(
            "SELECT start_time, end_time FROM work_sessions WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("work_session {id}")))?;

        let times_changed = start_time.is_some() || end_time.is_some();
        let new_start: DateTime<Utc> = start_time.unwrap_or(current.try_get("start_time")?);
        let new_end: DateTime<Utc> = end_time.unwrap_or(current.try_get("end_time")?);

        let recomputed = if times_changed {
            let duration = duration_rounded(new_start, new_end)
                .map_err(|err| StoreError::InvalidData(err.message()))?;
            let date = crate::timezone::user_local_date(new_start, time_zone);
            Some((new_start, new_end, duration, date))
        } else {
            None
        };

        sqlx::query(
            "UPDATE work_sessions SET
               project_id = COALESCE($2, project_id),
               start_time = COALESCE($3, start_time),
               end_time = COALESCE($4, end_time),
               duration_hours = COALESCE($5, duration_hours),
               date = COALESCE($6, date),
               summary = CASE WHEN $7 THEN $8 ELSE summary END,
               privacy_level = COALESCE($9, privacy_level),
               tags = COALESCE($10, tags),
               updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(project_id)
        .bind(recomputed.as_ref().map(|(s, _, _, _)| *s))
        .bind(recomputed.as_ref().map(|(_, e, _, _)| *e))
        .bind(recomputed.as_ref().map(|(_, _, d, _)| d.inner()))
        .bind(recomputed.as_ref().map(|(_, _, _, d)| *d))
        .bind(summary.is_some())
        .bind(summary.flatten())
        .bind(privacy_level.map(|p| p.as_str()))
        .bind(tags)
        .execute(&mut *tx)
        .await
        .map_err(|err| classify_sqlx_error(err, "work_session.project_id"))?;

        let row = sqlx::query(
            "SELECT id, project_id, date, start_time, end_time, duration_hours, summary,
                    privacy_level, linked_meeting_id, tags, created_at, updated_at
             FROM work_sessions WHERE id = $1",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        let work_session = row_to_work_session(&row)?;
        tx.commit().await?;
        Ok(work_session)
    }

    pub async fn delete_work_session(&self, id: EntityId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM work_sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("work_session {id}")));
        }
        Ok(())
    }
}

pub(super) fn row_to_work_session(row: &PgRow) -> Result<WorkSession, StoreError> {
    let privacy_level: String = row.try_get("privacy_level")?;
    let tags: Vec<String> = row.try_get("tags")?;
    let duration_decimal: rust_decimal::Decimal = row.try_get("duration_hours")?;

    Ok(WorkSession {
        id: row.try_get("id")?,
        project_id: row.try_get("project_id")?,
        date: row.try_get("date")?,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        duration_hours: Decimal1dp::from_decimal(duration_decimal),
        summary: row.try_get("summary")?,
        privacy_level: PrivacyLevel::from_str(&privacy_level).ok_or_else(|| {
            StoreError::InvalidData(format!("unknown privacy_level persisted: {privacy_level}"))
        })?,
        linked_meeting_id: row.try_get("linked_meeting_id")?,
        tags: tags.into_iter().collect(),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
