//! Full in-memory snapshots of the queryable entities. The executor
//! (spec §4.6) is a relational-plan interpreter over these snapshots
//! rather than a dynamic-SQL compiler (spec §5: "rounding and query
//! compilation are in-memory").

use crate::models::{Client, Employer, EntityId, Meeting, Note, Person, Project, Reminder, WorkSession};
use crate::repos::{Store, StoreError};

pub struct Snapshot {
    pub work_sessions: Vec<WorkSession>,
    pub meetings: Vec<Meeting>,
    pub meeting_attendees: Vec<(EntityId, EntityId)>,
    pub people: Vec<Person>,
    pub clients: Vec<Client>,
    pub projects: Vec<Project>,
    pub employers: Vec<Employer>,
    pub notes: Vec<Note>,
    pub reminders: Vec<Reminder>,
}

impl Snapshot {
    pub async fn load(store: &Store) -> Result<Self, StoreError> {
        Ok(Self {
            work_sessions: store.list_work_sessions().await?,
            meetings: store.list_meetings().await?,
            meeting_attendees: store.list_all_meeting_attendees().await?,
            people: store.list_people().await?,
            clients: store.list_clients().await?,
            projects: store.list_projects().await?,
            employers: store.list_employers().await?,
            notes: store.list_notes().await?,
            reminders: store.list_all_reminders().await?,
        })
    }
}
