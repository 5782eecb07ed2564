//! The tool façade (spec §4.10): one method per MCP tool. Each method
//! parses/validates its typed input, delegates to the entity store or
//! the query engine, and returns a typed output record — never a
//! partial result (spec §7 "User-visible behavior").

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};

use shared::error::CoreError;
use shared::models::{
    Client, Employer, EmploymentHistory, EntityId, EntityRefType, Meeting, Note, Person,
    PrivacyLevel, Project, ProjectStatus, Reminder, User, WorkSession,
};
use shared::notifier::Notifier;
use shared::privacy::AccessMode;
use shared::query::{QueryOutcome, run_query};
use shared::repos::Store;
use shared::timezone::WeekBoundary;

use crate::dto::*;

/// Holds the store handle, the optional notification client, and the
/// user profile loaded once at startup (spec §3 "User" singleton).
/// Stateless beyond that: every tool call opens its own store session
/// (spec §5 "each operation acquires its own database session").
pub struct Facade {
    store: Store,
    notifier: Option<Notifier>,
    notification_sound: String,
    time_zone: String,
    week_boundary: WeekBoundary,
    default_privacy_level: PrivacyLevel,
}

impl Facade {
    pub fn new(store: Store, notifier: Option<Notifier>, notification_sound: String, user: &User) -> Self {
        Self {
            store,
            notifier,
            notification_sound,
            time_zone: user.timezone.clone(),
            week_boundary: user.default_week_boundary,
            default_privacy_level: user.default_privacy_level,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    // -----------------------------------------------------------
    // Logging tools
    // -----------------------------------------------------------

    pub async fn log_work_session(&self, input: LogWorkSessionInput) -> Result<WorkSession, CoreError> {
        let start_time = parse_datetime("start_time", &input.start_time)?;
        let end_time = parse_datetime("end_time", &input.end_time)?;
        let date = shared::timezone::user_local_date(start_time, &self.time_zone);
        let duration = shared::rounding::duration_rounded(start_time, end_time)?;
        let privacy_level = input.privacy_level.unwrap_or(self.default_privacy_level);
        let tags = dedupe_tags(input.tags);

        Ok(self
            .store
            .create_work_session(
                input.project_id,
                date,
                start_time,
                end_time,
                duration,
                input.summary.as_deref(),
                privacy_level,
                &tags,
            )
            .await?)
    }

    pub async fn log_meeting(&self, input: LogMeetingInput) -> Result<LogMeetingOutput, CoreError> {
        let start_time = parse_datetime("start_time", &input.start_time)?;
        let privacy_level = input.privacy_level.unwrap_or(self.default_privacy_level);
        let tags = dedupe_tags(input.tags);

        let outcome = self
            .store
            .create_meeting(
                &input.title,
                start_time,
                input.duration_minutes,
                input.summary.as_deref(),
                privacy_level,
                input.project_id,
                input.meeting_type.as_deref(),
                input.location.as_deref(),
                &tags,
                &input.attendee_ids,
                &self.time_zone,
            )
            .await?;

        Ok(LogMeetingOutput {
            auto_work_session_id: outcome.auto_work_session.as_ref().map(|ws| ws.id),
            meeting: outcome.meeting,
        })
    }

    pub async fn add_person(&self, input: AddPersonInput) -> Result<Person, CoreError> {
        let tags = dedupe_tags(input.tags);
        Ok(self
            .store
            .create_person(
                &input.full_name,
                input.email.as_deref(),
                input.phone.as_deref(),
                input.linkedin_url.as_deref(),
                input.company.as_deref(),
                input.title.as_deref(),
                input.notes.as_deref(),
                &input.additional_info,
                input.is_stakeholder,
                &tags,
            )
            .await?)
    }

    pub async fn add_client(&self, input: AddClientInput) -> Result<Client, CoreError> {
        let tags = dedupe_tags(input.tags);
        Ok(self
            .store
            .create_client(
                &input.name,
                input.client_type,
                input.status,
                input.contact_person_id,
                input.notes.as_deref(),
                &tags,
            )
            .await?)
    }

    pub async fn add_project(&self, input: AddProjectInput) -> Result<Project, CoreError> {
        let start_date = input.start_date.as_deref().map(|s| parse_date("start_date", s)).transpose()?;
        let end_date = input.end_date.as_deref().map(|s| parse_date("end_date", s)).transpose()?;
        validate_project_completion(input.status, end_date)?;
        let tags = dedupe_tags(input.tags);

        Ok(self
            .store
            .create_project(
                &input.name,
                input.client_id,
                input.on_behalf_of_id,
                input.description.as_deref(),
                input.status,
                start_date,
                end_date,
                &tags,
            )
            .await?)
    }

    pub async fn add_employer(&self, input: AddEmployerInput) -> Result<Employer, CoreError> {
        let tags = dedupe_tags(input.tags);
        Ok(self.store.create_employer(&input.name, input.notes.as_deref(), &tags).await?)
    }

    /// Not itemized in spec §6's tool list, but the `EmploymentHistory`
    /// entity (spec §3) has no other creation path, and the query DSL's
    /// relationship-path traversal only has rows to walk if something
    /// writes them (SPEC_FULL.md §C).
    pub async fn add_employment_history(&self, input: AddEmploymentHistoryInput) -> Result<EmploymentHistory, CoreError> {
        let start_date = parse_date("start_date", &input.start_date)?;
        let end_date = input.end_date.as_deref().map(|s| parse_date("end_date", s)).transpose()?;

        Ok(self
            .store
            .create_employment_history(input.person_id, input.client_id, &input.role, start_date, end_date)
            .await?)
    }

    pub async fn add_note(&self, input: AddNoteInput) -> Result<Note, CoreError> {
        let entity_ref = resolve_entity_ref(input.entity_type, input.entity_id)?;
        let privacy_level = input.privacy_level.unwrap_or(self.default_privacy_level);
        let tags = dedupe_tags(input.tags);

        Ok(self
            .store
            .create_note(&input.text, privacy_level, entity_ref, &tags)
            .await?)
    }

    pub async fn add_reminder(&self, input: AddReminderInput) -> Result<Reminder, CoreError> {
        let reminder_time = parse_datetime("reminder_time", &input.reminder_time)?;
        let related_ref = resolve_entity_ref(input.related_entity_type, input.related_entity_id)?;
        let tags = dedupe_tags(input.tags);

        Ok(self
            .store
            .create_reminder(reminder_time, &input.message, input.recurrence, related_ref, &tags)
            .await?)
    }

    // -----------------------------------------------------------
    // Update tools
    // -----------------------------------------------------------

    pub async fn update_work_session(&self, input: UpdateWorkSessionInput) -> Result<WorkSession, CoreError> {
        let start_time = input.start_time.as_deref().map(|s| parse_datetime("start_time", s)).transpose()?;
        let end_time = input.end_time.as_deref().map(|s| parse_datetime("end_time", s)).transpose()?;
        let tags = input.tags.map(dedupe_tags);

        Ok(self
            .store
            .update_work_session(
                input.id,
                input.project_id,
                start_time,
                end_time,
                input.summary.as_ref().map(|inner| inner.as_deref()),
                input.privacy_level,
                tags.as_deref(),
                &self.time_zone,
            )
            .await?)
    }

    pub async fn update_meeting(&self, input: UpdateMeetingInput) -> Result<Meeting, CoreError> {
        let start_time = input.start_time.as_deref().map(|s| parse_datetime("start_time", s)).transpose()?;
        let tags = input.tags.map(dedupe_tags);

        Ok(self
            .store
            .update_meeting(
                input.id,
                input.title.as_deref(),
                start_time,
                input.duration_minutes,
                input.summary.as_ref().map(|inner| inner.as_deref()),
                input.privacy_level,
                input.project_id,
                input.meeting_type.as_ref().map(|inner| inner.as_deref()),
                input.location.as_ref().map(|inner| inner.as_deref()),
                tags.as_deref(),
                &self.time_zone,
            )
            .await?)
    }

    pub async fn update_person(&self, input: UpdatePersonInput) -> Result<Person, CoreError> {
        let tags = input.tags.map(dedupe_tags);

        Ok(self
            .store
            .update_person(
                input.id,
                input.full_name.as_deref(),
                input.email.as_ref().map(|inner| inner.as_deref()),
                input.phone.as_ref().map(|inner| inner.as_deref()),
                input.linkedin_url.as_ref().map(|inner| inner.as_deref()),
                input.company.as_ref().map(|inner| inner.as_deref()),
                input.title.as_ref().map(|inner| inner.as_deref()),
                input.notes.as_ref().map(|inner| inner.as_deref()),
                input.additional_info.as_ref(),
                input.is_stakeholder,
                tags.as_deref(),
            )
            .await?)
    }

    pub async fn update_client(&self, input: UpdateClientInput) -> Result<Client, CoreError> {
        let tags = input.tags.map(dedupe_tags);

        Ok(self
            .store
            .update_client(
                input.id,
                input.name.as_deref(),
                input.client_type,
                input.status,
                input.contact_person_id,
                input.notes.as_ref().map(|inner| inner.as_deref()),
                tags.as_deref(),
            )
            .await?)
    }

    pub async fn update_project(&self, input: UpdateProjectInput) -> Result<Project, CoreError> {
        let start_date = parse_optional_nested_date("start_date", input.start_date)?;
        let end_date = parse_optional_nested_date("end_date", input.end_date)?;
        let tags = input.tags.map(dedupe_tags);

        Ok(self
            .store
            .update_project(
                input.id,
                input.name.as_deref(),
                input.client_id,
                input.on_behalf_of_id,
                input.description.as_ref().map(|inner| inner.as_deref()),
                input.status,
                start_date,
                end_date,
                tags.as_deref(),
            )
            .await?)
    }

    pub async fn update_employer(&self, input: UpdateEmployerInput) -> Result<Employer, CoreError> {
        let tags = input.tags.map(dedupe_tags);
        Ok(self
            .store
            .update_employer(
                input.id,
                input.name.as_deref(),
                input.notes.as_ref().map(|inner| inner.as_deref()),
                tags.as_deref(),
            )
            .await?)
    }

    pub async fn update_note(&self, input: UpdateNoteInput) -> Result<Note, CoreError> {
        let tags = input.tags.map(dedupe_tags);
        Ok(self
            .store
            .update_note(input.id, input.text.as_deref(), input.privacy_level, tags.as_deref())
            .await?)
    }

    pub async fn update_reminder(&self, input: UpdateReminderInput) -> Result<Reminder, CoreError> {
        let reminder_time = input
            .reminder_time
            .as_deref()
            .map(|s| parse_datetime("reminder_time", s))
            .transpose()?;
        let tags = input.tags.map(dedupe_tags);

        Ok(self
            .store
            .update_reminder(
                input.id,
                reminder_time,
                input.message.as_deref(),
                input.recurrence,
                tags.as_deref(),
            )
            .await?)
    }

    pub async fn complete_reminder(&self, input: CompleteReminderInput) -> Result<CompleteReminderOutput, CoreError> {
        let next_reminder_id = self.store.complete_reminder(input.id, &self.time_zone).await?;
        let reminder = self.store.get_reminder(input.id).await?;
        Ok(CompleteReminderOutput { reminder, next_reminder_id })
    }

    pub async fn snooze_reminder(&self, input: SnoozeReminderInput) -> Result<Reminder, CoreError> {
        let until = parse_datetime("until", &input.until)?;
        Ok(self.store.snooze_reminder(input.id, until).await?)
    }

    // -----------------------------------------------------------
    // Timecard aggregator
    // -----------------------------------------------------------

    /// Spec §4.2: privacy-filtered sum of rounded hours by project/day.
    /// Distinct from the general query engine's aggregation support —
    /// this also merges distinct summaries per day, which `query` does
    /// not attempt.
    pub async fn get_timecard(&self, input: GetTimecardInput) -> Result<Vec<TimecardRowOutput>, CoreError> {
        let from_date = parse_date("from_date", &input.from_date)?;
        let to_date = parse_date("to_date", &input.to_date)?;

        let sessions = self
            .store
            .list_work_sessions_for_project_in_range(input.project_id, from_date, to_date)
            .await?;

        Ok(shared::timecard::aggregate_timecard(&sessions, input.include_private)
            .into_iter()
            .map(|row| TimecardRowOutput {
                date: row.date,
                summed_hours: row.summed_hours.to_string(),
                merged_summary: row.merged_summary,
            })
            .collect())
    }

    // -----------------------------------------------------------
    // Query tools
    // -----------------------------------------------------------

    pub async fn query(&self, input: QueryInput, now: DateTime<Utc>) -> Result<QueryOutcome, CoreError> {
        run_query(
            &self.store,
            input.structured_query,
            AccessMode::All,
            now,
            &self.time_zone,
            self.week_boundary,
        )
        .await
    }

    /// Spec §6: a thin adapter over the structured engine, not a
    /// general natural-language interface (spec §9 Open Question: its
    /// output shape "should not be relied upon for programmatic
    /// consumers").
    pub async fn query_loose(&self, input: LooseQueryInput, now: DateTime<Utc>) -> Result<QueryOutcome, CoreError> {
        let structured_query = loose::translate(&input.text)?;
        self.query(QueryInput { structured_query }, now).await
    }

    // -----------------------------------------------------------
    // Notification tool
    // -----------------------------------------------------------

    pub async fn trigger_notification(&self, input: TriggerNotificationInput) -> Result<TriggerNotificationOutput, CoreError> {
        let notifier = self
            .notifier
            .as_ref()
            .ok_or_else(|| CoreError::DeliveryFailed("notification bridge is not configured".to_string()))?;

        let sound = input.sound.unwrap_or_else(|| self.notification_sound.clone());
        let outcome = notifier
            .notify(&input.title, &input.message, Some(&sound), input.metadata.as_ref())
            .await;

        if !outcome.delivered {
            return Err(CoreError::DeliveryFailed(format!(
                "bridge did not accept the notification after {} attempt(s)",
                outcome.attempts
            )));
        }

        Ok(TriggerNotificationOutput {
            delivered: outcome.delivered,
            attempts: outcome.attempts,
        })
    }
}

fn dedupe_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}

fn resolve_entity_ref(
    entity_type: Option<EntityRefType>,
    entity_id: Option<EntityId>,
) -> Result<Option<(EntityRefType, EntityId)>, CoreError> {
    match (entity_type, entity_id) {
        (Some(t), Some(id)) => Ok(Some((t, id))),
        (None, None) => Ok(None),
        _ => Err(CoreError::InvalidArgument(
            "entity_type and entity_id must both be set or both be absent".to_string(),
        )),
    }
}

/// Spec §4.10: "All inputs carrying datetimes require ISO-8601 with
/// explicit offset; naive datetimes are rejected." RFC 3339 parsing
/// enforces exactly that, since an offset-less string fails to parse.
fn parse_datetime(field: &str, raw: &str) -> Result<DateTime<Utc>, CoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| CoreError::InvalidArgument(format!("{field} is not an ISO-8601 datetime with an explicit offset: {raw}")))
}

fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| CoreError::InvalidArgument(format!("{field} is not an ISO-8601 date (YYYY-MM-DD): {raw}")))
}

fn parse_optional_nested_date(
    field: &str,
    value: Option<Option<String>>,
) -> Result<Option<Option<NaiveDate>>, CoreError> {
    match value {
        None => Ok(None),
        Some(None) => Ok(Some(None)),
        Some(Some(raw)) => parse_date(field, &raw).map(|d| Some(Some(d))),
    }
}

/// A project cannot be created already completed without an end date
/// (spec §3). `update_project` relies on the `projects_completed_has_end_date`
/// database constraint instead, since validating it fully here would
/// require reading the row's current `status`/`end_date` first.
fn validate_project_completion(status: ProjectStatus, end_date: Option<NaiveDate>) -> Result<(), CoreError> {
    if status == ProjectStatus::Completed && end_date.is_none() {
        return Err(CoreError::InvalidArgument(
            "status=completed requires end_date to be set".to_string(),
        ));
    }
    Ok(())
}

mod loose {
    use shared::models::EntityType;
    use shared::query::ast::{AggFunction, Aggregation, FilterClause, Literal, Op, Query};

    use super::CoreError;

    /// Translates a small, fixed set of phrases into a [`Query`] (spec
    /// §6/§9). Anything else is `InvalidArgument` rather than a guess.
    pub fn translate(text: &str) -> Result<Query, CoreError> {
        let lowered = text.to_ascii_lowercase();

        let shortcut = if lowered.contains("this week") {
            Some("this_week")
        } else if lowered.contains("this month") {
            Some("this_month")
        } else if lowered.contains("this year") {
            Some("this_year")
        } else if lowered.contains("today") {
            Some("today")
        } else {
            None
        };

        let wants_hours = lowered.contains("hour") || lowered.contains("work");

        match (shortcut, wants_hours) {
            (Some(shortcut), true) => Ok(Query {
                entity_type: EntityType::WorkSession,
                filters: vec![FilterClause {
                    field: "date".to_string(),
                    operator: Op::Gte,
                    value: Literal::String(shortcut.to_string()),
                }],
                aggregation: Some(Aggregation {
                    function: AggFunction::Sum,
                    field: Some("duration_hours".to_string()),
                    group_by: vec!["project.name".to_string()],
                }),
                limit: 100,
                offset: 0,
                order_by: vec![],
            }),
            _ => Err(CoreError::InvalidArgument(format!(
                "cannot translate loose query text into a structured query: {text:?}"
            ))),
        }
    }
}
