//! The meeting→session linker (spec §4.3): pure computation of the
//! auto-generated `WorkSession` fields derived from a `Meeting`. The
//! atomic persistence of both rows lives in `repos::meetings`; this
//! module only knows how to derive one record from the other.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::error::CoreError;
use crate::models::PrivacyLevel;
use crate::rounding::{Decimal1dp, round_half_hour};
use crate::timezone::user_local_date;

pub struct DerivedWorkSession {
    pub date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_hours: Decimal1dp,
    pub summary: String,
}

/// Derives the auto-generated work session for a project-bound
/// meeting. `duration_minutes <= 0` is rejected here so the caller
/// never opens a transaction for an invalid meeting (spec §4.3
/// "Failure modes").
pub fn derive_work_session(
    meeting_title: &str,
    meeting_start_time: DateTime<Utc>,
    duration_minutes: i32,
    time_zone: &str,
) -> Result<DerivedWorkSession, CoreError> {
    if duration_minutes <= 0 {
        return Err(CoreError::InvalidArgument(
            "duration_minutes must be positive".to_string(),
        ));
    }

    let end_time = meeting_start_time + Duration::minutes(i64::from(duration_minutes));
    let duration_hours = round_half_hour(i64::from(duration_minutes));
    let date = user_local_date(meeting_start_time, time_zone);

    Ok(DerivedWorkSession {
        date,
        start_time: meeting_start_time,
        end_time,
        duration_hours,
        summary: meeting_title.to_string(),
    })
}

pub fn inherited_privacy_level(meeting_privacy_level: PrivacyLevel) -> PrivacyLevel {
    meeting_privacy_level
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn rejects_non_positive_duration() {
        let start = Utc.with_ymd_and_hms(2026, 4, 1, 10, 0, 0).unwrap();
        assert!(derive_work_session("Kickoff", start, 0, "UTC").is_err());
        assert!(derive_work_session("Kickoff", start, -5, "UTC").is_err());
    }

    #[test]
    fn derives_end_time_and_rounded_duration() {
        let start = Utc.with_ymd_and_hms(2026, 4, 1, 10, 0, 0).unwrap();
        let derived = derive_work_session("Kickoff", start, 45, "UTC").unwrap();
        assert_eq!(derived.end_time, start + Duration::minutes(45));
        assert_eq!(derived.duration_hours.to_string(), "1.0");
        assert_eq!(derived.summary, "Kickoff");
        assert_eq!(derived.date, start.date_naive());
    }
}
