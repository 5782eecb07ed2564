//! A precomputed relationship graph, keyed by entity (spec §4.5
//! "Implementations should precompute a relationship graph at
//! startup"). Plain const data, walked by [`super::validate`].

use crate::models::EntityType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Int,
    Bool,
    Decimal,
    Date,
    DateTime,
    Tags,
    Enum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    One,
    Many,
}

/// A node in the relationship graph. The `meeting_attendees` join
/// table is modeled explicitly so that `attendees.person.email`
/// traverses a real intermediate hop, matching spec §4.5's literal
/// example path, rather than collapsing the join transparently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaNode {
    Entity(EntityType),
    MeetingAttendee,
}

#[derive(Debug, Clone, Copy)]
pub struct Relationship {
    pub name: &'static str,
    pub target: SchemaNode,
    pub cardinality: Cardinality,
    /// The storage column on *this* entity that backs the edge, when
    /// the edge is a direct foreign key (spec §4.5 "field name
    /// normalization": `on_behalf_of` -> `on_behalf_of_id`). `None` for
    /// many-valued edges, which have no scalar FK on this side.
    pub id_field: Option<&'static str>,
}

#[derive(Debug, Clone, Copy)]
pub struct EntitySchema {
    pub fields: &'static [(&'static str, FieldType)],
    pub relationships: &'static [Relationship],
}

const WORK_SESSION_FIELDS: &[(&str, FieldType)] = &[
    ("id", FieldType::Int),
    ("project_id", FieldType::Int),
    ("date", FieldType::Date),
    ("start_time", FieldType::DateTime),
    ("end_time", FieldType::DateTime),
    ("duration_hours", FieldType::Decimal),
    ("summary", FieldType::String),
    ("privacy_level", FieldType::Enum),
    ("tags", FieldType::Tags),
    ("created_at", FieldType::DateTime),
    ("updated_at", FieldType::DateTime),
];
const WORK_SESSION_RELATIONSHIPS: &[Relationship] = &[Relationship {
    name: "project",
    target: SchemaNode::Entity(EntityType::Project),
    cardinality: Cardinality::One,
    id_field: Some("project_id"),
}];

const MEETING_FIELDS: &[(&str, FieldType)] = &[
    ("id", FieldType::Int),
    ("title", FieldType::String),
    ("start_time", FieldType::DateTime),
    ("duration_minutes", FieldType::Int),
    ("summary", FieldType::String),
    ("privacy_level", FieldType::Enum),
    ("project_id", FieldType::Int),
    ("meeting_type", FieldType::String),
    ("location", FieldType::String),
    ("tags", FieldType::Tags),
    ("created_at", FieldType::DateTime),
    ("updated_at", FieldType::DateTime),
];
const MEETING_RELATIONSHIPS: &[Relationship] = &[
    Relationship {
        name: "project",
        target: SchemaNode::Entity(EntityType::Project),
        cardinality: Cardinality::One,
        id_field: Some("project_id"),
    },
    Relationship {
        name: "attendees",
        target: SchemaNode::MeetingAttendee,
        cardinality: Cardinality::Many,
        id_field: None,
    },
];

const MEETING_ATTENDEE_FIELDS: &[(&str, FieldType)] =
    &[("meeting_id", FieldType::Int), ("person_id", FieldType::Int)];
const MEETING_ATTENDEE_RELATIONSHIPS: &[Relationship] = &[
    Relationship {
        name: "meeting",
        target: SchemaNode::Entity(EntityType::Meeting),
        cardinality: Cardinality::One,
        id_field: Some("meeting_id"),
    },
    Relationship {
        name: "person",
        target: SchemaNode::Entity(EntityType::Person),
        cardinality: Cardinality::One,
        id_field: Some("person_id"),
    },
];

const PERSON_FIELDS: &[(&str, FieldType)] = &[
    ("id", FieldType::Int),
    ("full_name", FieldType::String),
    ("email", FieldType::String),
    ("phone", FieldType::String),
    ("linkedin_url", FieldType::String),
    ("company", FieldType::String),
    ("title", FieldType::String),
    ("notes", FieldType::String),
    ("is_stakeholder", FieldType::Bool),
    ("tags", FieldType::Tags),
    ("created_at", FieldType::DateTime),
    ("updated_at", FieldType::DateTime),
];

const CLIENT_FIELDS: &[(&str, FieldType)] = &[
    ("id", FieldType::Int),
    ("name", FieldType::String),
    ("client_type", FieldType::Enum),
    ("status", FieldType::Enum),
    ("contact_person_id", FieldType::Int),
    ("notes", FieldType::String),
    ("tags", FieldType::Tags),
    ("created_at", FieldType::DateTime),
    ("updated_at", FieldType::DateTime),
];
const CLIENT_RELATIONSHIPS: &[Relationship] = &[Relationship {
    name: "contact_person",
    target: SchemaNode::Entity(EntityType::Person),
    cardinality: Cardinality::One,
    id_field: Some("contact_person_id"),
}];

const PROJECT_FIELDS: &[(&str, FieldType)] = &[
    ("id", FieldType::Int),
    ("name", FieldType::String),
    ("client_id", FieldType::Int),
    ("on_behalf_of_id", FieldType::Int),
    ("description", FieldType::String),
    ("status", FieldType::Enum),
    ("start_date", FieldType::Date),
    ("end_date", FieldType::Date),
    ("tags", FieldType::Tags),
    ("created_at", FieldType::DateTime),
    ("updated_at", FieldType::DateTime),
];
const PROJECT_RELATIONSHIPS: &[Relationship] = &[
    Relationship {
        name: "client",
        target: SchemaNode::Entity(EntityType::Client),
        cardinality: Cardinality::One,
        id_field: Some("client_id"),
    },
    Relationship {
        name: "on_behalf_of",
        target: SchemaNode::Entity(EntityType::Employer),
        cardinality: Cardinality::One,
        id_field: Some("on_behalf_of_id"),
    },
];

const EMPLOYER_FIELDS: &[(&str, FieldType)] = &[
    ("id", FieldType::Int),
    ("name", FieldType::String),
    ("notes", FieldType::String),
    ("tags", FieldType::Tags),
    ("created_at", FieldType::DateTime),
    ("updated_at", FieldType::DateTime),
];

const NOTE_FIELDS: &[(&str, FieldType)] = &[
    ("id", FieldType::Int),
    ("text", FieldType::String),
    ("privacy_level", FieldType::Enum),
    ("entity_type", FieldType::Enum),
    ("entity_id", FieldType::Int),
    ("tags", FieldType::Tags),
    ("created_at", FieldType::DateTime),
    ("updated_at", FieldType::DateTime),
];

const REMINDER_FIELDS: &[(&str, FieldType)] = &[
    ("id", FieldType::Int),
    ("reminder_time", FieldType::DateTime),
    ("message", FieldType::String),
    ("is_completed", FieldType::Bool),
    ("recurrence_frequency", FieldType::Enum),
    ("related_entity_type", FieldType::Enum),
    ("related_entity_id", FieldType::Int),
    ("snoozed_until", FieldType::DateTime),
    ("tags", FieldType::Tags),
    ("created_at", FieldType::DateTime),
    ("updated_at", FieldType::DateTime),
];

const EMPTY_RELATIONSHIPS: &[Relationship] = &[];

pub fn schema_for(node: SchemaNode) -> EntitySchema {
    match node {
        SchemaNode::Entity(EntityType::WorkSession) => EntitySchema {
            fields: WORK_SESSION_FIELDS,
            relationships: WORK_SESSION_RELATIONSHIPS,
        },
        SchemaNode::Entity(EntityType::Meeting) => EntitySchema {
            fields: MEETING_FIELDS,
            relationships: MEETING_RELATIONSHIPS,
        },
        SchemaNode::Entity(EntityType::Person) => EntitySchema {
            fields: PERSON_FIELDS,
            relationships: EMPTY_RELATIONSHIPS,
        },
        SchemaNode::Entity(EntityType::Client) => EntitySchema {
            fields: CLIENT_FIELDS,
            relationships: CLIENT_RELATIONSHIPS,
        },
        SchemaNode::Entity(EntityType::Project) => EntitySchema {
            fields: PROJECT_FIELDS,
            relationships: PROJECT_RELATIONSHIPS,
        },
        SchemaNode::Entity(EntityType::Employer) => EntitySchema {
            fields: EMPLOYER_FIELDS,
            relationships: EMPTY_RELATIONSHIPS,
        },
        SchemaNode::Entity(EntityType::Note) => EntitySchema {
            fields: NOTE_FIELDS,
            relationships: EMPTY_RELATIONSHIPS,
        },
        SchemaNode::Entity(EntityType::Reminder) => EntitySchema {
            fields: REMINDER_FIELDS,
            relationships: EMPTY_RELATIONSHIPS,
        },
        SchemaNode::MeetingAttendee => EntitySchema {
            fields: MEETING_ATTENDEE_FIELDS,
            relationships: MEETING_ATTENDEE_RELATIONSHIPS,
        },
    }
}

pub fn field_type(node: SchemaNode, field: &str) -> Option<FieldType> {
    schema_for(node)
        .fields
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, field_type)| *field_type)
}

pub fn relationship(node: SchemaNode, name: &str) -> Option<Relationship> {
    schema_for(node)
        .relationships
        .iter()
        .copied()
        .find(|relationship| relationship.name == name)
}
