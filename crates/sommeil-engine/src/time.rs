//! Time-of-day and calendar arithmetic shared by every engine.
//!
//! Times of day are minute-precision values on a 24-hour circular clock.
//! The integer helpers work on "minutes since midnight" so that wraparound
//! is plain modular arithmetic; the `chrono` adapters convert to and from
//! the typed [`NaiveTime`] values carried by the data model.
//!
//! # Functions
//!
//! - [`time_to_minutes`] / [`minutes_to_time`] — `"HH:MM"` ⇄ minutes since midnight
//! - [`circular_difference`] — shortest signed distance on the 24h clock
//! - [`calculate_sleep_duration`] — sleep span, crossing midnight if needed
//! - [`calculate_deficit`] — shortfall against a habitual duration
//! - [`difference_in_calendar_days`] — whole-day distance between two dates
//! - [`round_half_up`] — nearest integer, halves toward positive infinity

use chrono::{NaiveDate, NaiveTime, Timelike};

use crate::error::{EngineError, Result};

/// Length of the circular clock, in minutes.
pub const MINUTES_PER_DAY: i32 = 1440;

const HALF_DAY: i32 = MINUTES_PER_DAY / 2;

// ── Parsing and formatting ──────────────────────────────────────────────────

/// Parse a strict `"HH:MM"` string (two-digit hour 00-23, two-digit minute 00-59).
///
/// # Errors
///
/// Returns [`EngineError::InvalidTime`] for anything else, including
/// single-digit hours and trailing seconds.
pub fn parse_hhmm(s: &str) -> Result<NaiveTime> {
    let invalid = || EngineError::InvalidTime(format!("'{s}' (expected HH:MM)"));

    let (h, m) = s.split_once(':').ok_or_else(invalid)?;
    if h.len() != 2 || m.len() != 2 {
        return Err(invalid());
    }
    if !h.bytes().chain(m.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let hour: u32 = h.parse().map_err(|_| invalid())?;
    let minute: u32 = m.parse().map_err(|_| invalid())?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

/// Format a time of day as `"HH:MM"` (seconds are dropped).
pub fn format_hhmm(time: NaiveTime) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

/// Minutes since midnight of a time of day, in `0..=1439`.
pub fn minute_of_day(time: NaiveTime) -> i32 {
    (time.hour() * 60 + time.minute()) as i32
}

/// The time of day `minutes` after midnight, wrapping any integer onto the clock.
pub fn time_from_minutes(minutes: i32) -> NaiveTime {
    let wrapped = minutes.rem_euclid(MINUTES_PER_DAY);
    NaiveTime::default() + chrono::Duration::minutes(i64::from(wrapped))
}

/// Convert `"HH:MM"` to minutes since midnight (0-1439).
///
/// # Errors
///
/// Returns [`EngineError::InvalidTime`] if the string is not a valid `"HH:MM"`.
///
/// # Examples
///
/// ```
/// use sommeil_engine::time::time_to_minutes;
///
/// assert_eq!(time_to_minutes("07:00").unwrap(), 420);
/// assert_eq!(time_to_minutes("23:30").unwrap(), 1410);
/// ```
pub fn time_to_minutes(time: &str) -> Result<i32> {
    parse_hhmm(time).map(minute_of_day)
}

/// Convert minutes since midnight to `"HH:MM"`, wrapping negatives and
/// values past 24h back onto the clock.
///
/// # Examples
///
/// ```
/// use sommeil_engine::time::minutes_to_time;
///
/// assert_eq!(minutes_to_time(-60), "23:00");
/// assert_eq!(minutes_to_time(1500), "01:00");
/// ```
pub fn minutes_to_time(minutes: i32) -> String {
    let wrapped = minutes.rem_euclid(MINUTES_PER_DAY);
    format!("{:02}:{:02}", wrapped / 60, wrapped % 60)
}

/// Nearest integer, halves rounded toward positive infinity (`-7.5` → `-7`).
///
/// Unlike [`f64::round`], which sends halves away from zero.
pub fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

/// Minutes as hours rounded to one decimal, without a trailing `.0` ("8", "9.5").
pub fn format_hours(minutes: i32) -> String {
    let tenths = round_half_up(f64::from(minutes) / 6.0);
    format!("{}", tenths / 10.0)
}

// ── Clock arithmetic ────────────────────────────────────────────────────────

/// Shortest signed distance from `from` to `to` on the 24h clock.
///
/// Positive means moving later in the day. The result lies in `(-720, 720]`,
/// so a twelve-hour move is always expressed as forward.
pub fn circular_difference(from: i32, to: i32) -> i32 {
    let diff = (to - from).rem_euclid(MINUTES_PER_DAY);
    if diff > HALF_DAY {
        diff - MINUTES_PER_DAY
    } else {
        diff
    }
}

/// Minutes slept between `sleep` and `wake`. A non-positive span means the
/// night crosses midnight, so a full day is added.
pub fn calculate_sleep_duration(sleep: i32, wake: i32) -> i32 {
    let duration = wake - sleep;
    if duration <= 0 {
        duration + MINUTES_PER_DAY
    } else {
        duration
    }
}

/// Shortfall of the `sleep`→`wake` span against `habitual_duration`, never negative.
pub fn calculate_deficit(habitual_duration: i32, sleep: i32, wake: i32) -> i32 {
    (habitual_duration - calculate_sleep_duration(sleep, wake)).max(0)
}

/// Signed number of calendar days from `earlier` to `later`.
///
/// Dates carry no time of day, so the result is exact.
pub fn difference_in_calendar_days(later: NaiveDate, earlier: NaiveDate) -> i64 {
    (later - earlier).num_days()
}

// ── Serde adapters ──────────────────────────────────────────────────────────

/// `#[serde(with = "...")]` adapter storing a [`NaiveTime`] as `"HH:MM"`.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_hhmm(*time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_hhmm(&s).map_err(serde::de::Error::custom)
    }
}

/// Nullable counterpart of [`hhmm`]; `null` maps to `None`.
pub mod hhmm_option {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        time: &Option<NaiveTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match time {
            Some(t) => serializer.serialize_some(&super::format_hhmm(*t)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveTime>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|s| super::parse_hhmm(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
