//! The recurrence computer (spec §4.8): next-occurrence calculation
//! for a completed recurring reminder, grounded on the teacher's
//! `automation_schedule.rs` calendar arithmetic (`next_month`,
//! clamped day-of-month) adapted to the simpler daily/weekly/monthly
//! "same clock time" contract this spec calls for.

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use crate::models::RecurrenceFrequency;
use crate::timezone::parse_time_zone_or_default;

/// All computations happen in the user's configured timezone; results
/// are converted back to UTC (spec §4.8 "All computations are
/// performed in the user's configured timezone").
pub fn next_occurrence(
    reminder_time: DateTime<Utc>,
    frequency: RecurrenceFrequency,
    time_zone: &str,
) -> DateTime<Utc> {
    match frequency {
        RecurrenceFrequency::Daily => reminder_time + Duration::days(1),
        RecurrenceFrequency::Weekly => reminder_time + Duration::days(7),
        RecurrenceFrequency::Monthly => next_monthly_occurrence(reminder_time, time_zone),
    }
}

fn next_monthly_occurrence(reminder_time: DateTime<Utc>, time_zone: &str) -> DateTime<Utc> {
    let tz = parse_time_zone_or_default(time_zone);
    let local = reminder_time.with_timezone(&tz);
    let local_time = local.time();

    let (mut year, mut month) = (local.year(), local.month());
    (year, month) = next_month(year, month);
    let target_date = date_with_clamped_day(year, month, local.day());
    let target_local = target_date.and_time(local_time);

    resolve_local_datetime_to_utc(&tz, target_local)
}

fn resolve_local_datetime_to_utc(tz: &Tz, local: chrono::NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(value) => value.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => {
            for minute_offset in 1..=180 {
                let shifted = local + Duration::minutes(minute_offset);
                match tz.from_local_datetime(&shifted) {
                    LocalResult::Single(value) => return value.with_timezone(&Utc),
                    LocalResult::Ambiguous(earliest, _) => {
                        return earliest.with_timezone(&Utc);
                    }
                    LocalResult::None => continue,
                }
            }
            local.and_utc()
        }
    }
}

fn date_with_clamped_day(year: i32, month: u32, day: u32) -> NaiveDate {
    let days_in_month = days_in_month(year, month);
    let clamped_day = day.min(days_in_month);
    NaiveDate::from_ymd_opt(year, month, clamped_day).expect("clamped day is always valid")
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let first_of_month = NaiveDate::from_ymd_opt(year, month, 1).expect("valid first-of-month");
    let (next_year, next_month_num) = next_month(year, month);
    let first_of_next_month = NaiveDate::from_ymd_opt(next_year, next_month_num, 1)
        .expect("valid first-of-next-month");
    (first_of_next_month - first_of_month).num_days() as u32
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 { (year + 1, 1) } else { (year, month + 1) }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn daily_adds_twenty_four_hours() {
        let t = Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap();
        let next = next_occurrence(t, RecurrenceFrequency::Daily, "UTC");
        assert_eq!(next, t + Duration::days(1));
    }

    #[test]
    fn weekly_adds_seven_days_same_weekday_and_time() {
        let t = Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap();
        let next = next_occurrence(t, RecurrenceFrequency::Weekly, "UTC");
        assert_eq!(next.weekday(), t.weekday());
        assert_eq!(next.time(), t.time());
    }

    #[test]
    fn monthly_preserves_day_of_month() {
        let t = Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).unwrap();
        let next = next_occurrence(t, RecurrenceFrequency::Monthly, "UTC");
        assert_eq!(next.date_naive(), NaiveDate::from_ymd_opt(2026, 2, 15).unwrap());
    }

    #[test]
    fn monthly_clamps_to_last_day_of_shorter_month() {
        let t = Utc.with_ymd_and_hms(2026, 1, 31, 9, 0, 0).unwrap();
        let next = next_occurrence(t, RecurrenceFrequency::Monthly, "UTC");
        assert_eq!(next.date_naive(), NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());
    }

    #[test]
    fn monthly_from_end_of_december_rolls_into_next_year() {
        let t = Utc.with_ymd_and_hms(2026, 12, 31, 9, 0, 0).unwrap();
        let next = next_occurrence(t, RecurrenceFrequency::Monthly, "UTC");
        assert_eq!(next.date_naive(), NaiveDate::from_ymd_opt(2027, 1, 31).unwrap());
    }
}
