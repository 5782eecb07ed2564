use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::postgres::PgRow;

use crate::meeting_linker::derive_work_session;
use crate::models::{EntityId, Meeting, PrivacyLevel, WorkSession};

use super::{Store, StoreError, classify_sqlx_error};

/// Result of `log_meeting`: the persisted Meeting, plus the
/// auto-generated WorkSession when `project_id` was supplied (spec
/// §4.3, §6 "auto_work_session_id").
pub struct LogMeetingOutcome {
    pub meeting: Meeting,
    pub auto_work_session: Option<WorkSession>,
}

impl Store {
    /// Atomic per spec §4.3/§5: either both rows persist or neither
    /// does. `project_id = None` skips the linker entirely.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_meeting(
        &self,
        title: &str,
        start_time: DateTime<Utc>,
        duration_minutes: i32,
        summary: Option<&str>,
        privacy_level: PrivacyLevel,
        project_id: Option<EntityId>,
        meeting_type: Option<&str>,
        location: Option<&str>,
        tags: &[String],
        attendee_ids: &[EntityId],
        time_zone: &str,
    ) -> Result<LogMeetingOutcome, StoreError> {
        let derived = match project_id {
            Some(_) => Some(
                derive_work_session(title, start_time, duration_minutes, time_zone)
                    .map_err(|err| StoreError::InvalidData(err.message()))?,
            ),
            None => {
                if duration_minutes <= 0 {
                    return Err(StoreError::InvalidData(
                        "duration_minutes must be positive".to_string(),
                    ));
                }
                None
            }
        };

        let mut tx = self.pool.begin().await?;

        let meeting_row = sqlx::query(
            "INSERT INTO meetings (
                title, start_time, duration_minutes, summary, privacy_level,
                project_id, meeting_type, location, tags
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING id, title, start_time, duration_minutes, summary, privacy_level,
                       project_id, meeting_type, location, tags, created_at, updated_at",
        )
        .bind(title)
        .bind(start_time)
        .bind(duration_minutes)
        .bind(summary)
        .bind(privacy_level.as_str())
        .bind(project_id)
        .bind(meeting_type)
        .bind(location)
        .bind(tags)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| classify_sqlx_error(err, "meeting.project_id"))?;

        let meeting = row_to_meeting(&meeting_row)?;

        for person_id in attendee_ids {
            sqlx::query(
                "INSERT INTO meeting_attendees (meeting_id, person_id) VALUES ($1, $2)
                 ON CONFLICT DO NOTHING",
            )
            .bind(meeting.id)
            .bind(person_id)
            .execute(&mut *tx)
            .await
            .map_err(|err| classify_sqlx_error(err, "meeting_attendee.person_id"))?;
        }

        let auto_work_session = if let Some(derived) = derived {
            let project_id = project_id.expect("derived implies project_id is set");
            Some(
                Store::create_linked_work_session(
                    &mut *tx,
                    project_id,
                    derived.date,
                    derived.start_time,
                    derived.end_time,
                    derived.duration_hours,
                    &derived.summary,
                    privacy_level,
                    tags,
                    meeting.id,
                )
                .await?,
            )
        } else {
            None
        };

        tx.commit().await?;

        Ok(LogMeetingOutcome {
            meeting,
            auto_work_session,
        })
    }

    pub async fn get_meeting(&self, id: EntityId) -> Result<Meeting, StoreError> {
        let row = sqlx::query(
            "SELECT id, title, start_time, duration_minutes, summary, privacy_level,
                    project_id, meeting_type, location, tags, created_at, updated_at
             FROM meetings WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("meeting {id}")))?;

        row_to_meeting(&row)
    }

    /// Unscoped snapshot for the query engine (spec §4.5/§4.6).
    pub async fn list_meetings(&self) -> Result<Vec<Meeting>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, title, start_time, duration_minutes, summary, privacy_level,
                    project_id, meeting_type, location, tags, created_at, updated_at
             FROM meetings ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_meeting).collect()
    }

    /// All `(meeting_id, person_id)` attendee links, for the query
    /// engine's `MeetingAttendee` join node (spec §4.5).
    pub async fn list_all_meeting_attendees(
        &self,
    ) -> Result<Vec<(EntityId, EntityId)>, StoreError> {
        let rows = sqlx::query("SELECT meeting_id, person_id FROM meeting_attendees ORDER BY meeting_id, person_id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                Ok((
                    row.try_get("meeting_id")?,
                    row.try_get("person_id")?,
                ))
            })
            .collect()
    }

    pub async fn list_attendees(&self, meeting_id: EntityId) -> Result<Vec<EntityId>, StoreError> {
        let rows = sqlx::query(
            "SELECT person_id FROM meeting_attendees WHERE meeting_id = $1 ORDER BY person_id",
        )
        .bind(meeting_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| row.try_get("person_id").map_err(StoreError::from))
            .collect()
    }

    /// Partial update, atomic per spec §5. When `project_id` changes,
    /// the previously auto-generated work session (if any) is deleted
    /// and, if the new `project_id` is non-null, regenerated against
    /// the updated meeting fields in the same transaction
    /// (SPEC_FULL.md §D.3).
    #[allow(clippy::too_many_arguments)]
    pub async fn update_meeting(
        &self,
        id: EntityId,
        title: Option<&str>,
        start_time: Option<DateTime<Utc>>,
        duration_minutes: Option<i32>,
        summary: Option<Option<&str>>,
        privacy_level: Option<PrivacyLevel>,
        project_id: Option<Option<EntityId>>,
        meeting_type: Option<Option<&str>>,
        location: Option<Option<&str>>,
        tags: Option<&[String]>,
        time_zone: &str,
    ) -> Result<Meeting, StoreError> {
        if let Some(minutes) = duration_minutes {
            if minutes <= 0 {
                return Err(StoreError::InvalidData(
                    "duration_minutes must be positive".to_string(),
                ));
            }
        }

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "UPDATE meetings SET
               title = COALESCE($2, title),
               start_time = COALESCE($3, start_time),
               duration_minutes = COALESCE($4, duration_minutes),
               summary = CASE WHEN $5 THEN $6 ELSE summary END,
               privacy_level = COALESCE($7, privacy_level),
               project_id = CASE WHEN $8 THEN $9 ELSE project_id END,
               meeting_type = CASE WHEN $10 THEN $11 ELSE meeting_type END,
               location = CASE WHEN $12 THEN $13 ELSE location END,
               tags = COALESCE($14, tags),
               updated_at = NOW()
             WHERE id = $1
             RETURNING id, title, start_time, duration_minutes, summary, privacy_level,
                       project_id, meeting_type, location, tags, created_at, updated_at",
        )
        .bind(id)
        .bind(title)
        .bind(start_time)
        .bind(duration_minutes)
        .bind(summary.is_some())
        .bind(summary.flatten())
        .bind(privacy_level.map(|p| p.as_str()))
        .bind(project_id.is_some())
        .bind(project_id.flatten())
        .bind(meeting_type.is_some())
        .bind(meeting_type.flatten())
        .bind(location.is_some())
        .bind(location.flatten())
        .bind(tags)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|err| classify_sqlx_error(err, "meeting.project_id"))?
        .ok_or_else(|| StoreError::NotFound(format!("meeting {id}")))?;

        let meeting = row_to_meeting(&row)?;

        if let Some(new_project_id) = project_id {
            Store::delete_linked_work_session(&mut *tx, id).await?;

            if let Some(new_project_id) = new_project_id {
                let derived = derive_work_session(
                    &meeting.title,
                    meeting.start_time,
                    meeting.duration_minutes,
                    time_zone,
                )
                .map_err(|err| StoreError::InvalidData(err.message()))?;

                let tags: Vec<String> = meeting.tags.iter().cloned().collect();
                Store::create_linked_work_session(
                    &mut *tx,
                    new_project_id,
                    derived.date,
                    derived.start_time,
                    derived.end_time,
                    derived.duration_hours,
                    &derived.summary,
                    meeting.privacy_level,
                    &tags,
                    meeting.id,
                )
                .await?;
            }
        }

        tx.commit().await?;

        Ok(meeting)
    }

    pub async fn delete_meeting(&self, id: EntityId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM meetings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("meeting {id}")));
        }
        Ok(())
    }
}

fn row_to_meeting(row: &PgRow) -> Result<Meeting, StoreError> {
    let privacy_level: String = row.try_get("privacy_level")?;
    let tags: Vec<String> = row.try_get("tags")?;

    Ok(Meeting {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        start_time: row.try_get("start_time")?,
        duration_minutes: row.try_get("duration_minutes")?,
        summary: row.try_get("summary")?,
        privacy_level: PrivacyLevel::from_str(&privacy_level).ok_or_else(|| {
            StoreError::InvalidData(format!("unknown privacy_level persisted: {privacy_level}"))
        })?,
        project_id: row.try_get("project_id")?,
        meeting_type: row.try_get("meeting_type")?,
        location: row.try_get("location")?,
        tags: tags.into_iter().collect(),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
