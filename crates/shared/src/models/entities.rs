use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{
    ClientStatus, ClientType, EntityRefType, PrivacyLevel, ProjectStatus, RecurrenceFrequency,
};

/// Monotonic integer surrogate key (spec §3: "id (monotonic integer
/// surrogate key)").
pub type EntityId = i64;

pub type Tags = BTreeSet<String>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employer {
    pub id: EntityId,
    pub name: String,
    pub notes: Option<String>,
    pub tags: Tags,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: EntityId,
    pub name: String,
    pub client_type: ClientType,
    pub status: ClientStatus,
    pub contact_person_id: Option<EntityId>,
    pub notes: Option<String>,
    pub tags: Tags,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: EntityId,
    pub name: String,
    pub client_id: EntityId,
    pub on_behalf_of_id: Option<EntityId>,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub tags: Tags,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: EntityId,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin_url: Option<String>,
    pub company: Option<String>,
    pub title: Option<String>,
    pub notes: Option<String>,
    pub additional_info: BTreeMap<String, String>,
    pub is_stakeholder: bool,
    pub tags: Tags,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmploymentHistory {
    pub id: EntityId,
    pub person_id: EntityId,
    pub client_id: EntityId,
    pub role: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkSession {
    pub id: EntityId,
    pub project_id: EntityId,
    pub date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_hours: crate::rounding::Decimal1dp,
    pub summary: Option<String>,
    pub privacy_level: PrivacyLevel,
    /// Set when this row was auto-generated by `log_meeting`/
    /// `update_meeting` (spec §4.3); drives the delete+regenerate
    /// policy on meeting project reassignment (SPEC_FULL.md §D.3).
    pub linked_meeting_id: Option<EntityId>,
    pub tags: Tags,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    pub id: EntityId,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub summary: Option<String>,
    pub privacy_level: PrivacyLevel,
    pub project_id: Option<EntityId>,
    pub meeting_type: Option<String>,
    pub location: Option<String>,
    pub tags: Tags,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingAttendee {
    pub meeting_id: EntityId,
    pub person_id: EntityId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: EntityId,
    pub text: String,
    pub privacy_level: PrivacyLevel,
    pub entity_type: Option<EntityRefType>,
    pub entity_id: Option<EntityId>,
    pub tags: Tags,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// How to compute the next occurrence of a completed recurring
/// reminder (spec §4.8, GLOSSARY "Recurrence config").
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RecurrenceConfig {
    pub frequency: RecurrenceFrequency,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: EntityId,
    pub reminder_time: DateTime<Utc>,
    pub message: String,
    pub is_completed: bool,
    pub recurrence_config: Option<RecurrenceConfig>,
    pub related_entity_type: Option<EntityRefType>,
    pub related_entity_id: Option<EntityId>,
    pub snoozed_until: Option<DateTime<Utc>>,
    pub last_dispatched_at: Option<DateTime<Utc>>,
    pub dispatched_for_reminder_time: Option<DateTime<Utc>>,
    pub tags: Tags,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reminder {
    /// A reminder is due when it is not completed, its `reminder_time`
    /// has passed, and it is not currently snoozed (spec §4.7 step 1).
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        if self.is_completed || self.reminder_time > now {
            return false;
        }
        match self.snoozed_until {
            Some(until) => until <= now,
            None => true,
        }
    }

    /// A due reminder is not re-dispatched until the user advances its
    /// state, tracked by comparing the dispatch marker against the
    /// current `reminder_time` (spec §4.7, SPEC_FULL.md §C).
    pub fn already_dispatched_for_current_time(&self) -> bool {
        self.dispatched_for_reminder_time == Some(self.reminder_time)
    }

    pub fn start_time(&self) -> NaiveTime {
        self.reminder_time.time()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    pub name: String,
    pub email: Option<String>,
    pub timezone: String,
    pub default_week_boundary: crate::timezone::WeekBoundary,
    pub default_privacy_level: PrivacyLevel,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
