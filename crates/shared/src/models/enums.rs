use serde::{Deserialize, Serialize};

/// Controls inclusion of a record in external/aggregated projections
/// (spec §3, §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivacyLevel {
    Public,
    Internal,
    Private,
}

impl PrivacyLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Internal => "internal",
            Self::Private => "private",
        }
    }

    /// Default privacy for creation is `private` (spec §4.4).
    pub fn default_for_creation() -> Self {
        Self::Private
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "public" => Some(Self::Public),
            "internal" => Some(Self::Internal),
            "private" => Some(Self::Private),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientType {
    Company,
    Individual,
}

impl ClientType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Company => "company",
            Self::Individual => "individual",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "company" => Some(Self::Company),
            "individual" => Some(Self::Individual),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    Active,
    Past,
}

impl ClientStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Past => "past",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "past" => Some(Self::Past),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Active,
    Paused,
    Completed,
}

impl ProjectStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "paused" => Some(Self::Paused),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// The closed set of entity kinds a `Note` or `Reminder` may attach
/// to (spec §9 "Polymorphic attachment").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityRefType {
    Person,
    Client,
    Project,
    Employer,
    WorkSession,
    Meeting,
    Reminder,
}

impl EntityRefType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Client => "client",
            Self::Project => "project",
            Self::Employer => "employer",
            Self::WorkSession => "work_session",
            Self::Meeting => "meeting",
            Self::Reminder => "reminder",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "person" => Some(Self::Person),
            "client" => Some(Self::Client),
            "project" => Some(Self::Project),
            "employer" => Some(Self::Employer),
            "work_session" => Some(Self::WorkSession),
            "meeting" => Some(Self::Meeting),
            "reminder" => Some(Self::Reminder),
            _ => None,
        }
    }
}

/// Frequency of a reminder's recurrence config (spec §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceFrequency {
    Daily,
    Weekly,
    Monthly,
}

impl RecurrenceFrequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            _ => None,
        }
    }
}

/// The base entity kinds the query DSL can target (spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    WorkSession,
    Meeting,
    Person,
    Client,
    Project,
    Employer,
    Note,
    Reminder,
}

impl EntityType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WorkSession => "work_session",
            Self::Meeting => "meeting",
            Self::Person => "person",
            Self::Client => "client",
            Self::Project => "project",
            Self::Employer => "employer",
            Self::Note => "note",
            Self::Reminder => "reminder",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "work_session" => Some(Self::WorkSession),
            "meeting" => Some(Self::Meeting),
            "person" => Some(Self::Person),
            "client" => Some(Self::Client),
            "project" => Some(Self::Project),
            "employer" => Some(Self::Employer),
            "note" => Some(Self::Note),
            "reminder" => Some(Self::Reminder),
            _ => None,
        }
    }
}
