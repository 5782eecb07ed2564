//! Typed input/output records for the tool façade (spec §4.10, §6).
//!
//! Every input rejects unknown fields so a caller's typo surfaces as
//! `InvalidArgument` rather than a silently ignored field. Partial
//! update inputs distinguish "field absent" from "field present and
//! explicitly null" with [`double_option`], since `Option<T>` alone
//! cannot express both shapes serde needs for `CASE WHEN ... THEN ...`
//! style store updates (SPEC_FULL.md §D.4).

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use shared::models::{
    ClientStatus, ClientType, EntityId, EntityRefType, Meeting, PrivacyLevel, ProjectStatus,
    RecurrenceConfig, Reminder,
};
use shared::query::Query;

/// Distinguishes "key absent" (`None`) from "key present with value
/// `null`" (`Some(None)`) from "key present with a value" (`Some(Some(v))`).
/// The standard serde community pattern for nullable partial updates.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

// ---------------------------------------------------------------
// Logging tools
// ---------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogWorkSessionInput {
    pub project_id: EntityId,
    pub start_time: String,
    pub end_time: String,
    pub summary: Option<String>,
    pub privacy_level: Option<PrivacyLevel>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogMeetingInput {
    pub title: String,
    pub start_time: String,
    pub duration_minutes: i32,
    pub summary: Option<String>,
    pub privacy_level: Option<PrivacyLevel>,
    pub project_id: Option<EntityId>,
    pub meeting_type: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub attendee_ids: Vec<EntityId>,
}

#[derive(Debug, Serialize)]
pub struct LogMeetingOutput {
    #[serde(flatten)]
    pub meeting: Meeting,
    pub auto_work_session_id: Option<EntityId>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddPersonInput {
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin_url: Option<String>,
    pub company: Option<String>,
    pub title: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub additional_info: BTreeMap<String, String>,
    #[serde(default)]
    pub is_stakeholder: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddClientInput {
    pub name: String,
    pub client_type: ClientType,
    pub status: ClientStatus,
    pub contact_person_id: Option<EntityId>,
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddProjectInput {
    pub name: String,
    pub client_id: EntityId,
    pub on_behalf_of_id: Option<EntityId>,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddEmployerInput {
    pub name: String,
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddEmploymentHistoryInput {
    pub person_id: EntityId,
    pub client_id: EntityId,
    pub role: String,
    pub start_date: String,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddNoteInput {
    pub text: String,
    pub privacy_level: Option<PrivacyLevel>,
    pub entity_type: Option<EntityRefType>,
    pub entity_id: Option<EntityId>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddReminderInput {
    pub reminder_time: String,
    pub message: String,
    pub recurrence: Option<RecurrenceConfig>,
    pub related_entity_type: Option<EntityRefType>,
    pub related_entity_id: Option<EntityId>,
    #[serde(default)]
    pub tags: Vec<String>,
}

// ---------------------------------------------------------------
// Update tools
// ---------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateWorkSessionInput {
    pub id: EntityId,
    pub project_id: Option<EntityId>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub summary: Option<Option<String>>,
    pub privacy_level: Option<PrivacyLevel>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateMeetingInput {
    pub id: EntityId,
    pub title: Option<String>,
    pub start_time: Option<String>,
    pub duration_minutes: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    pub summary: Option<Option<String>>,
    pub privacy_level: Option<PrivacyLevel>,
    #[serde(default, deserialize_with = "double_option")]
    pub project_id: Option<Option<EntityId>>,
    #[serde(default, deserialize_with = "double_option")]
    pub meeting_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub location: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdatePersonInput {
    pub id: EntityId,
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub linkedin_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub company: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
    pub additional_info: Option<BTreeMap<String, String>>,
    pub is_stakeholder: Option<bool>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateClientInput {
    pub id: EntityId,
    pub name: Option<String>,
    pub client_type: Option<ClientType>,
    pub status: Option<ClientStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub contact_person_id: Option<Option<EntityId>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProjectInput {
    pub id: EntityId,
    pub name: Option<String>,
    pub client_id: Option<EntityId>,
    #[serde(default, deserialize_with = "double_option")]
    pub on_behalf_of_id: Option<Option<EntityId>>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub status: Option<ProjectStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub start_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub end_date: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateEmployerInput {
    pub id: EntityId,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateNoteInput {
    pub id: EntityId,
    pub text: Option<String>,
    pub privacy_level: Option<PrivacyLevel>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateReminderInput {
    pub id: EntityId,
    pub reminder_time: Option<String>,
    pub message: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub recurrence: Option<Option<RecurrenceConfig>>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompleteReminderInput {
    pub id: EntityId,
}

#[derive(Debug, Serialize)]
pub struct CompleteReminderOutput {
    pub reminder: Reminder,
    pub next_reminder_id: Option<EntityId>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnoozeReminderInput {
    pub id: EntityId,
    pub until: String,
}

// ---------------------------------------------------------------
// Query tools
// ---------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryInput {
    pub structured_query: Query,
}

/// Spec §6: "not required for correctness"; a thin, best-effort
/// translation of a handful of fixed phrases into a structured
/// [`Query`]. Never the only way to reach the executor.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LooseQueryInput {
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetTimecardInput {
    pub project_id: EntityId,
    pub from_date: String,
    pub to_date: String,
    #[serde(default)]
    pub include_private: bool,
}

#[derive(Debug, Serialize)]
pub struct TimecardRowOutput {
    pub date: chrono::NaiveDate,
    pub summed_hours: String,
    pub merged_summary: String,
}

// ---------------------------------------------------------------
// Notification tool
// ---------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TriggerNotificationInput {
    pub title: String,
    pub message: String,
    pub sound: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct TriggerNotificationOutput {
    pub delivered: bool,
    pub attempts: u32,
}
