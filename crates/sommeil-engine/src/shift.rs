//! Normalized shift records and the per-employee sleep profile.
//!
//! These are the shapes the engines consume. The storage layer maps its own
//! rows into them; nothing here knows about shift codes or CSV columns.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::time::{calculate_sleep_duration, minute_of_day, time_from_minutes};

/// Category of one scheduled day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftType {
    /// Day shift.
    Jour,
    /// Evening shift.
    Soir,
    /// Night shift.
    Nuit,
    /// Scheduled rest.
    Repos,
    /// Leave, sickness, training and other non-worked days.
    Absence,
}

impl ShiftType {
    /// Rest and absence days carry no work and allow recovery.
    pub fn is_rest(self) -> bool {
        matches!(self, ShiftType::Repos | ShiftType::Absence)
    }

    pub fn is_work(self) -> bool {
        !self.is_rest()
    }

    /// Display label used by the planning grid.
    pub fn label(self) -> &'static str {
        match self {
            ShiftType::Jour => "Jour",
            ShiftType::Soir => "Soir",
            ShiftType::Nuit => "Nuit",
            ShiftType::Repos => "Repos",
            ShiftType::Absence => "Absence",
        }
    }
}

/// One scheduled day for one employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftInput {
    pub date: NaiveDate,
    pub shift_type: ShiftType,
    #[serde(default, with = "crate::time::hhmm_option")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, with = "crate::time::hhmm_option")]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub break_minutes: u32,
}

impl ShiftInput {
    /// A rest or absence day without times.
    pub fn off(date: NaiveDate, shift_type: ShiftType) -> Self {
        Self {
            date,
            shift_type,
            start_time: None,
            end_time: None,
            break_minutes: 0,
        }
    }

    /// A worked day with both times set.
    pub fn worked(
        date: NaiveDate,
        shift_type: ShiftType,
        start_time: NaiveTime,
        end_time: NaiveTime,
        break_minutes: u32,
    ) -> Self {
        Self {
            date,
            shift_type,
            start_time: Some(start_time),
            end_time: Some(end_time),
            break_minutes,
        }
    }

    /// Both times, when this is a work shift that has them.
    pub(crate) fn work_times(&self) -> Option<(NaiveTime, NaiveTime)> {
        if self.shift_type.is_rest() {
            return None;
        }
        Some((self.start_time?, self.end_time?))
    }

    /// Net worked minutes: end − start (overnight adds a day) minus the break.
    /// `None` for rest days and shifts missing a time.
    pub fn worked_minutes(&self) -> Option<i32> {
        let (start, end) = self.work_times()?;
        let span = calculate_sleep_duration(minute_of_day(start), minute_of_day(end));
        let break_minutes = i32::try_from(self.break_minutes).unwrap_or(i32::MAX);
        Some(span.saturating_sub(break_minutes))
    }
}

/// Habitual sleep rhythm of one employee. Missing fields take the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmployeeSleepProfile {
    #[serde(with = "crate::time::hhmm")]
    pub habitual_sleep_time: NaiveTime,
    #[serde(with = "crate::time::hhmm")]
    pub habitual_wake_time: NaiveTime,
    /// Informational; the risk math does not read it.
    pub contract_hours_per_week: f64,
}

impl EmployeeSleepProfile {
    /// Minutes between habitual sleep and wake, crossing midnight if needed.
    pub fn habitual_duration(&self) -> i32 {
        calculate_sleep_duration(
            minute_of_day(self.habitual_sleep_time),
            minute_of_day(self.habitual_wake_time),
        )
    }
}

impl Default for EmployeeSleepProfile {
    /// 23:00 → 07:00, 35 contractual hours.
    fn default() -> Self {
        Self {
            habitual_sleep_time: time_from_minutes(23 * 60),
            habitual_wake_time: time_from_minutes(7 * 60),
            contract_hours_per_week: 35.0,
        }
    }
}
