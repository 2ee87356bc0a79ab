//! Violation records and regulatory thresholds.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which rule a violation comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationType {
    /// Less than the minimum rest between two shifts.
    QuickReturn,
    /// One shift longer than the daily maximum.
    DailyHours,
    /// One ISO week longer than the weekly maximum.
    WeeklyHours,
    /// Too many adjacent night shifts.
    ConsecutiveNights,
    /// No long enough rest inside one ISO week.
    WeeklyRest,
    /// Too many adjacent worked days.
    ConsecutiveDays,
}

/// How serious a violation is, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Violation,
    Critical,
}

/// One detected breach, anchored to a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceViolation {
    #[serde(rename = "type")]
    pub kind: ViolationType,
    pub severity: Severity,
    pub date: NaiveDate,
    /// Ready-to-display French text.
    pub message: String,
    /// Numeric inputs that triggered the rule, keyed by name.
    pub details: BTreeMap<String, i64>,
}

/// All violations of one employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceResult {
    pub employee_id: String,
    /// Sorted by date, rules in check order within a date.
    pub violations: Vec<ComplianceViolation>,
    pub is_compliant: bool,
}

impl ComplianceResult {
    pub(crate) fn new(employee_id: &str, violations: Vec<ComplianceViolation>) -> Self {
        Self {
            employee_id: employee_id.to_string(),
            is_compliant: violations.is_empty(),
            violations,
        }
    }

    /// Keep only the violations dated inside `start..=end`.
    pub fn within(&self, start: NaiveDate, end: NaiveDate) -> ComplianceResult {
        let violations = self
            .violations
            .iter()
            .filter(|v| v.date >= start && v.date <= end)
            .cloned()
            .collect();
        ComplianceResult::new(&self.employee_id, violations)
    }

    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.violations
            .iter()
            .filter(|v| v.severity == severity)
            .count()
    }

    pub fn worst_severity(&self) -> Option<Severity> {
        self.violations.iter().map(|v| v.severity).max()
    }
}

/// Legal limits, in minutes or counts. French labor-code values by default,
/// with the 12h hospital derogation for the daily maximum. Partial JSON
/// overrides only the named fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComplianceThresholds {
    /// Art. L3131-1: 11h.
    pub min_rest_between_shifts: i32,
    /// 10h standard, 12h derogation.
    pub max_daily_minutes: i32,
    /// Art. L3121-20: 48h.
    pub max_weekly_minutes: i32,
    pub max_consecutive_nights: u32,
    /// 35 consecutive hours.
    pub min_weekly_rest_minutes: i32,
    /// Art. L3132-1: 6.
    pub max_consecutive_days: u32,
}

impl Default for ComplianceThresholds {
    fn default() -> Self {
        Self {
            min_rest_between_shifts: 660,
            max_daily_minutes: 720,
            max_weekly_minutes: 2880,
            max_consecutive_nights: 3,
            min_weekly_rest_minutes: 2100,
            max_consecutive_days: 6,
        }
    }
}
