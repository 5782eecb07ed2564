//! The timecard aggregator (spec §4.2): privacy-filtered sum of
//! rounded hours by project/day.

use chrono::NaiveDate;

use crate::models::{PrivacyLevel, WorkSession};
use crate::rounding::Decimal1dp;

const GENERIC_SUMMARY_PLACEHOLDER: &str = "Project work";
const SUMMARY_SEPARATOR: &str = "; ";

#[derive(Debug, Clone, PartialEq)]
pub struct TimecardRow {
    pub date: NaiveDate,
    pub summed_hours: Decimal1dp,
    pub merged_summary: String,
}

/// `sessions` must already be scoped to the target `project_id` and
/// date range (spec §4.2 rule 1); this function applies the privacy
/// filter and grouping (rules 2-4). Sessions are expected ordered by
/// `start_time` ascending within each date so summary concatenation
/// preserves insertion order.
pub fn aggregate_timecard(sessions: &[WorkSession], include_private: bool) -> Vec<TimecardRow> {
    let mut rows: Vec<TimecardRow> = Vec::new();

    for session in sessions {
        if !is_visible(session.privacy_level, include_private) {
            continue;
        }

        let summary_piece = summary_piece_for(session, include_private);

        match rows.last_mut().filter(|row| row.date == session.date) {
            Some(row) => {
                row.summed_hours = row
                    .summed_hours
                    .checked_add(session.duration_hours)
                    .unwrap_or(row.summed_hours);
                append_summary(&mut row.merged_summary, summary_piece.as_deref());
            }
            None => {
                let mut merged_summary = String::new();
                append_summary(&mut merged_summary, summary_piece.as_deref());
                rows.push(TimecardRow {
                    date: session.date,
                    summed_hours: session.duration_hours,
                    merged_summary,
                });
            }
        }
    }

    rows.sort_by_key(|row| row.date);
    rows
}

fn is_visible(level: PrivacyLevel, include_private: bool) -> bool {
    match level {
        PrivacyLevel::Public => true,
        PrivacyLevel::Internal => true,
        PrivacyLevel::Private => include_private,
    }
}

fn summary_piece_for(session: &WorkSession, include_private: bool) -> Option<String> {
    match session.privacy_level {
        PrivacyLevel::Internal if !include_private => {
            Some(GENERIC_SUMMARY_PLACEHOLDER.to_string())
        }
        _ => session
            .summary
            .as_ref()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
    }
}

fn append_summary(merged: &mut String, piece: Option<&str>) {
    let Some(piece) = piece else { return };
    if merged.is_empty() {
        merged.push_str(piece);
    } else if !merged.split(SUMMARY_SEPARATOR).any(|existing| existing == piece) {
        merged.push_str(SUMMARY_SEPARATOR);
        merged.push_str(piece);
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::models::EntityId;
    use crate::rounding::round_half_hour;

    fn session(
        project_id: EntityId,
        date: &str,
        hour: u32,
        minutes: i64,
        summary: Option<&str>,
        privacy_level: PrivacyLevel,
    ) -> WorkSession {
        let naive_date = date.parse::<NaiveDate>().unwrap();
        let start_time = Utc.with_ymd_and_hms(
            naive_date.format("%Y").to_string().parse().unwrap(),
            naive_date.format("%m").to_string().parse().unwrap(),
            naive_date.format("%d").to_string().parse().unwrap(),
            hour,
            0,
            0,
        )
        .unwrap();
        let end_time = start_time + chrono::Duration::minutes(minutes);

        WorkSession {
            id: 1,
            project_id,
            date: naive_date,
            start_time,
            end_time,
            duration_hours: round_half_hour(minutes),
            summary: summary.map(str::to_string),
            privacy_level,
            linked_meeting_id: None,
            tags: Default::default(),
            created_at: start_time,
            updated_at: start_time,
        }
    }

    #[test]
    fn sums_without_re_rounding_and_merges_distinct_summaries() {
        let sessions = vec![
            session(1, "2026-02-10", 9, 90, Some("Standup"), PrivacyLevel::Public),
            session(1, "2026-02-10", 11, 90, Some("Review"), PrivacyLevel::Public),
        ];
        let rows = aggregate_timecard(&sessions, true);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].summed_hours.to_string(), "4.0");
        assert_eq!(rows[0].merged_summary, "Standup; Review");
    }

    #[test]
    fn excludes_private_sessions_unless_included() {
        let sessions = vec![session(
            1,
            "2026-02-10",
            9,
            60,
            Some("Confidential"),
            PrivacyLevel::Private,
        )];
        assert!(aggregate_timecard(&sessions, false).is_empty());
        assert_eq!(aggregate_timecard(&sessions, true).len(), 1);
    }

    #[test]
    fn generalizes_internal_summary_when_private_excluded() {
        let sessions = vec![session(
            1,
            "2026-02-10",
            9,
            60,
            Some("Sensitive detail"),
            PrivacyLevel::Internal,
        )];
        let rows = aggregate_timecard(&sessions, false);
        assert_eq!(rows[0].merged_summary, "Project work");

        let rows_included = aggregate_timecard(&sessions, true);
        assert_eq!(rows_included[0].merged_summary, "Sensitive detail");
    }

    #[test]
    fn groups_by_date_in_ascending_order() {
        let sessions = vec![
            session(1, "2026-02-11", 9, 60, None, PrivacyLevel::Public),
            session(1, "2026-02-10", 9, 60, None, PrivacyLevel::Public),
        ];
        let rows = aggregate_timecard(&sessions, true);
        assert_eq!(rows[0].date.to_string(), "2026-02-10");
        assert_eq!(rows[1].date.to_string(), "2026-02-11");
    }
}
