//! The rounding kernel (spec §4.1): half-hour duration rounding and
//! the fixed-precision decimal type that durations are stored as.
//!
//! Binary floating point is forbidden for stored durations (spec
//! §4.1), so `Decimal1dp` wraps `rust_decimal::Decimal` pinned to a
//! scale of exactly one digit after the point.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::Zero;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// A non-negative decimal quantity fixed at one decimal place.
///
/// Serializes as a string (e.g. `"2.0"`) per spec §6 "Decimals are
/// serialized as strings preserving 1dp."
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Decimal1dp(Decimal);

impl Decimal1dp {
    pub const ZERO: Decimal1dp = Decimal1dp(Decimal::ZERO);

    fn new(value: Decimal) -> Self {
        let mut rescaled = value;
        rescaled.rescale(1);
        Self(rescaled)
    }

    /// Rescales a decimal read back from storage onto the 1dp grid.
    /// Used by repos mapping `NUMERIC` columns.
    pub fn from_decimal(value: Decimal) -> Self {
        Self::new(value)
    }

    /// Build a value directly from a count of tenths, i.e. `tenths`
    /// counts units of 0.1. Used by [`round_half_hour`].
    fn from_tenths(tenths: i64) -> Self {
        Self::new(Decimal::new(tenths, 1))
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn inner(self) -> Decimal {
        self.0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Decimal1dp::new)
    }

    pub fn from_str_exact(value: &str) -> Result<Self, CoreError> {
        value
            .parse::<Decimal>()
            .map(Decimal1dp::new)
            .map_err(|_| CoreError::InvalidArgument(format!("not a decimal value: {value}")))
    }
}

impl fmt::Display for Decimal1dp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

impl Serialize for Decimal1dp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Decimal1dp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<Decimal>()
            .map(Decimal1dp::new)
            .map_err(serde::de::Error::custom)
    }
}

/// Contract (spec §4.1):
/// - `minutes <= 0` -> `0.0`
/// - `r = minutes mod 60 = 0` -> `h.0`
/// - `1 <= r <= 30` -> `h + 0.5`
/// - `31 <= r <= 59` -> `h + 1.0`
///
/// The 30-minute boundary rounds **down** to the half hour; this is
/// the authoritative rule per spec §9's Open Question resolution.
pub fn round_half_hour(minutes: i64) -> Decimal1dp {
    if minutes <= 0 {
        return Decimal1dp::ZERO;
    }

    let hours = minutes / 60;
    let remainder = minutes % 60;

    let tenths = match remainder {
        0 => hours * 10,
        1..=30 => hours * 10 + 5,
        _ => hours * 10 + 10,
    };

    Decimal1dp::from_tenths(tenths)
}

/// `durationRounded(start, end)` (spec §4.1): fails when `end < start`;
/// truncates seconds/sub-seconds before rounding, so 29m59s -> 29m ->
/// 0.5h and 30m00s -> 30m -> 0.5h.
pub fn duration_rounded(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Decimal1dp, CoreError> {
    if end < start {
        return Err(CoreError::InvalidArgument(
            "end_time must not be before start_time".to_string(),
        ));
    }

    let whole_minutes = (end - start).num_minutes();
    Ok(round_half_hour(whole_minutes))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn zero_and_negative_minutes_round_to_zero() {
        assert_eq!(round_half_hour(0).to_string(), "0.0");
        assert_eq!(round_half_hour(-5).to_string(), "0.0");
    }

    #[test]
    fn remainder_one_to_thirty_rounds_to_half_hour() {
        assert_eq!(round_half_hour(1).to_string(), "0.5");
        assert_eq!(round_half_hour(29).to_string(), "0.5");
        assert_eq!(round_half_hour(30).to_string(), "0.5");
    }

    #[test]
    fn remainder_thirty_one_to_fifty_nine_rounds_up_to_next_hour() {
        assert_eq!(round_half_hour(31).to_string(), "1.0");
        assert_eq!(round_half_hour(59).to_string(), "1.0");
        assert_eq!(round_half_hour(60).to_string(), "1.0");
    }

    #[test]
    fn exact_hours_have_no_remainder() {
        assert_eq!(round_half_hour(120).to_string(), "2.0");
    }

    #[test]
    fn monotonic_and_periodic() {
        for m in 0..400 {
            assert!(round_half_hour(m) <= round_half_hour(m + 1));
            let a = round_half_hour(m);
            let b = round_half_hour(m + 60);
            assert_eq!(
                b.inner(),
                a.inner() + Decimal::ONE,
                "period law failed at m={m}"
            );
        }
    }

    #[test]
    fn duration_rounded_rejects_inverted_interval() {
        let start = Utc.with_ymd_and_hms(2026, 1, 15, 15, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 1, 15, 14, 0, 0).unwrap();
        assert!(duration_rounded(start, end).is_err());
    }

    #[test]
    fn duration_rounded_truncates_seconds_before_rounding() {
        let start = Utc.with_ymd_and_hms(2026, 1, 15, 14, 0, 0).unwrap();
        let end_29_59 = start + chrono::Duration::seconds(29 * 60 + 59);
        let end_30_00 = start + chrono::Duration::seconds(30 * 60);
        assert_eq!(duration_rounded(start, end_29_59).unwrap().to_string(), "0.5");
        assert_eq!(duration_rounded(start, end_30_00).unwrap().to_string(), "0.5");
    }

    #[test]
    fn concrete_scenario_one_log_work_session() {
        let start = Utc.with_ymd_and_hms(2026, 1, 15, 14, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 1, 15, 15, 45, 0).unwrap();
        assert_eq!(duration_rounded(start, end).unwrap().to_string(), "2.0");
    }

    #[test]
    fn decimal_round_trips_through_string() {
        let value = round_half_hour(45);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, "\"1.0\"");
        let parsed: Decimal1dp = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, value);
    }
}
