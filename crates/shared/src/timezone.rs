use chrono::{
    DateTime, Datelike, Days, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

pub const DEFAULT_USER_TIME_ZONE: &str = "UTC";

/// Which weekday a user's week starts on, used to resolve the
/// `this_week` query DSL time shortcut (spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekBoundary {
    Monday,
    Sunday,
}

impl WeekBoundary {
    fn chrono_weekday(self) -> chrono::Weekday {
        match self {
            Self::Monday => chrono::Weekday::Mon,
            Self::Sunday => chrono::Weekday::Sun,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monday => "monday",
            Self::Sunday => "sunday",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "monday" => Some(Self::Monday),
            "sunday" => Some(Self::Sunday),
            _ => None,
        }
    }
}

pub fn normalize_time_zone(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    trimmed.parse::<Tz>().ok().map(|tz| tz.name().to_string())
}

pub fn parse_time_zone_or_default(value: &str) -> Tz {
    normalize_time_zone(value)
        .and_then(|normalized| normalized.parse::<Tz>().ok())
        .unwrap_or(chrono_tz::UTC)
}

pub fn user_local_date(now_utc: DateTime<Utc>, time_zone: &str) -> NaiveDate {
    let tz = parse_time_zone_or_default(time_zone);
    now_utc.with_timezone(&tz).date_naive()
}

pub fn user_local_time(now_utc: DateTime<Utc>, time_zone: &str) -> NaiveTime {
    let tz = parse_time_zone_or_default(time_zone);
    now_utc.with_timezone(&tz).time()
}

pub fn local_day_bounds_utc(
    local_date: NaiveDate,
    time_zone: &str,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start_of_day = local_date.and_hms_opt(0, 0, 0)?;
    let next_day = local_date.checked_add_days(Days::new(1))?;
    let start_of_next_day = next_day.and_hms_opt(0, 0, 0)?;

    let tz = parse_time_zone_or_default(time_zone);
    let local_start = resolve_local_datetime(&tz, start_of_day)?;
    let local_end = resolve_local_datetime(&tz, start_of_next_day)?;

    Some((
        local_start.with_timezone(&Utc),
        local_end.with_timezone(&Utc),
    ))
}

/// Resolves the `today`/`this_week`/`this_month`/`this_year`/`now`
/// time shortcuts (spec §4.5): "relative to the user's configured
/// timezone and week boundary at query time."
pub fn resolve_time_shortcut(
    token: &str,
    now_utc: DateTime<Utc>,
    time_zone: &str,
    week_boundary: WeekBoundary,
) -> Option<DateTime<Utc>> {
    match token {
        "now" => Some(now_utc),
        "today" => {
            let local_date = user_local_date(now_utc, time_zone);
            local_day_bounds_utc(local_date, time_zone).map(|(start, _)| start)
        }
        "this_week" => start_of_week_bounds_utc(now_utc, time_zone, week_boundary)
            .map(|(start, _)| start),
        "this_month" => start_of_month_bounds_utc(now_utc, time_zone).map(|(start, _)| start),
        "this_year" => start_of_year_bounds_utc(now_utc, time_zone).map(|(start, _)| start),
        _ => None,
    }
}

/// Start-of-week instant at 00:00 local, honoring the user's
/// configured week boundary (spec §4.5).
pub fn start_of_week_bounds_utc(
    now_utc: DateTime<Utc>,
    time_zone: &str,
    week_boundary: WeekBoundary,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let local_date = user_local_date(now_utc, time_zone);
    let week_start_date = local_date.week(week_boundary.chrono_weekday()).first_day();
    local_day_bounds_utc(week_start_date, time_zone)
}

/// Start-of-month instant at 00:00 local on the 1st (spec §4.5).
pub fn start_of_month_bounds_utc(
    now_utc: DateTime<Utc>,
    time_zone: &str,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let local_date = user_local_date(now_utc, time_zone);
    let first_of_month = NaiveDate::from_ymd_opt(local_date.year(), local_date.month(), 1)?;
    local_day_bounds_utc(first_of_month, time_zone)
}

/// Start-of-year instant at 00:00 local on Jan 1 (spec §4.5).
pub fn start_of_year_bounds_utc(
    now_utc: DateTime<Utc>,
    time_zone: &str,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let local_date = user_local_date(now_utc, time_zone);
    let first_of_year = NaiveDate::from_ymd_opt(local_date.year(), 1, 1)?;
    local_day_bounds_utc(first_of_year, time_zone)
}

fn resolve_local_datetime(tz: &Tz, local: NaiveDateTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(value) => Some(value),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => None,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Timelike, Utc};

    use super::{
        DEFAULT_USER_TIME_ZONE, WeekBoundary, local_day_bounds_utc, normalize_time_zone,
        resolve_time_shortcut, start_of_month_bounds_utc, start_of_week_bounds_utc,
        start_of_year_bounds_utc, user_local_date, user_local_time,
    };

    #[test]
    fn normalize_time_zone_accepts_valid_iana_name() {
        assert_eq!(
            normalize_time_zone("America/Los_Angeles"),
            Some("America/Los_Angeles".to_string())
        );
    }

    #[test]
    fn normalize_time_zone_rejects_invalid_values() {
        assert_eq!(normalize_time_zone(""), None);
        assert_eq!(normalize_time_zone("Mars/Olympus"), None);
    }

    #[test]
    fn user_local_date_uses_default_when_time_zone_is_invalid() {
        let now = Utc
            .with_ymd_and_hms(2026, 2, 17, 1, 15, 0)
            .single()
            .expect("valid utc datetime");
        let local_date = user_local_date(now, "not-a-time-zone");
        assert_eq!(local_date.to_string(), "2026-02-17");
        assert_eq!(DEFAULT_USER_TIME_ZONE, "UTC");
    }

    #[test]
    fn local_day_bounds_convert_local_midnight_to_utc() {
        let local_date = NaiveDate::from_ymd_opt(2026, 2, 17).expect("valid local date");
        let (start_utc, end_utc) =
            local_day_bounds_utc(local_date, "America/Los_Angeles").expect("time bounds");

        assert_eq!(start_utc.date_naive().to_string(), "2026-02-17");
        assert_eq!(start_utc.hour(), 8);
        assert_eq!(end_utc.hour(), 8);
    }

    #[test]
    fn user_local_time_converts_from_utc() {
        let now = Utc
            .with_ymd_and_hms(2026, 2, 17, 9, 30, 0)
            .single()
            .expect("valid utc datetime");
        let local_time = user_local_time(now, "America/New_York");
        assert_eq!(local_time.format("%H:%M").to_string(), "04:30");
    }

    #[test]
    fn this_week_resolves_to_monday_when_configured() {
        // 2026-02-17 is a Tuesday.
        let now = Utc.with_ymd_and_hms(2026, 2, 17, 12, 0, 0).single().unwrap();
        let (start, _) = start_of_week_bounds_utc(now, "UTC", WeekBoundary::Monday).unwrap();
        assert_eq!(start.date_naive().to_string(), "2026-02-16");
    }

    #[test]
    fn this_week_resolves_to_sunday_when_configured() {
        let now = Utc.with_ymd_and_hms(2026, 2, 17, 12, 0, 0).single().unwrap();
        let (start, _) = start_of_week_bounds_utc(now, "UTC", WeekBoundary::Sunday).unwrap();
        assert_eq!(start.date_naive().to_string(), "2026-02-15");
    }

    #[test]
    fn this_month_and_this_year_resolve_to_first_of_period() {
        let now = Utc.with_ymd_and_hms(2026, 2, 17, 12, 0, 0).single().unwrap();
        let (month_start, _) = start_of_month_bounds_utc(now, "UTC").unwrap();
        assert_eq!(month_start.date_naive().to_string(), "2026-02-01");
        let (year_start, _) = start_of_year_bounds_utc(now, "UTC").unwrap();
        assert_eq!(year_start.date_naive().to_string(), "2026-01-01");
    }

    #[test]
    fn resolve_time_shortcut_dispatches_by_token() {
        let now = Utc.with_ymd_and_hms(2026, 2, 17, 12, 0, 0).single().unwrap();
        assert_eq!(
            resolve_time_shortcut("now", now, "UTC", WeekBoundary::Monday),
            Some(now)
        );
        assert!(resolve_time_shortcut("bogus", now, "UTC", WeekBoundary::Monday).is_none());
    }
}
