//! Labor-code compliance checks over one employee's shift history.
//!
//! Six independent rules (see [`rules`]) each scan the history and emit
//! zero or more [`ComplianceViolation`]s. The aggregate is their union,
//! sorted by date; violations from different rules are never merged.
//!
//! Rules that look across shift boundaries (rest gaps, weekly totals) need
//! context outside the requested range. Callers fetch shifts over
//! [`context_range`] and then narrow the result with
//! [`ComplianceResult::within`], or use
//! [`check_employee_compliance_in_range`] for both steps.

pub mod rules;
pub mod types;

use chrono::{Days, NaiveDate};
use tracing::{debug, trace};

use crate::shift::ShiftInput;

pub use rules::{
    check_consecutive_days, check_consecutive_nights, check_daily_hours, check_quick_return,
    check_weekly_hours, check_weekly_rest,
};
pub use types::{
    ComplianceResult, ComplianceThresholds, ComplianceViolation, Severity, ViolationType,
};

/// Days of extra history fetched on each side of a requested range.
pub const CONTEXT_DAYS: u64 = 7;

/// Check one employee against the default French thresholds.
pub fn check_employee_compliance(employee_id: &str, shifts: &[ShiftInput]) -> ComplianceResult {
    check_employee_compliance_with(employee_id, shifts, &ComplianceThresholds::default())
}

/// Check one employee against explicit thresholds.
pub fn check_employee_compliance_with(
    employee_id: &str,
    shifts: &[ShiftInput],
    thresholds: &ComplianceThresholds,
) -> ComplianceResult {
    debug!(employee_id, shifts = shifts.len(), "checking compliance");

    let checks = [
        check_quick_return(shifts, thresholds.min_rest_between_shifts),
        check_daily_hours(shifts, thresholds.max_daily_minutes),
        check_weekly_hours(shifts, thresholds.max_weekly_minutes),
        check_consecutive_nights(shifts, thresholds.max_consecutive_nights),
        check_weekly_rest(shifts, thresholds.min_weekly_rest_minutes),
        check_consecutive_days(shifts, thresholds.max_consecutive_days),
    ];

    let mut violations = Vec::new();
    for found in checks {
        if let Some(first) = found.first() {
            trace!(rule = ?first.kind, count = found.len(), "rule triggered");
        }
        violations.extend(found);
    }
    violations.sort_by_key(|v| v.date);

    debug!(employee_id, violations = violations.len(), "compliance checked");
    ComplianceResult::new(employee_id, violations)
}

/// The fetch range for checking `start..=end`: [`CONTEXT_DAYS`] wider on each side.
pub fn context_range(start: NaiveDate, end: NaiveDate) -> (NaiveDate, NaiveDate) {
    let days = Days::new(CONTEXT_DAYS);
    (
        start.checked_sub_days(days).unwrap_or(NaiveDate::MIN),
        end.checked_add_days(days).unwrap_or(NaiveDate::MAX),
    )
}

/// Check `shifts` (fetched over [`context_range`]) and keep only the
/// violations dated inside `start..=end`.
pub fn check_employee_compliance_in_range(
    employee_id: &str,
    shifts: &[ShiftInput],
    start: NaiveDate,
    end: NaiveDate,
    thresholds: &ComplianceThresholds,
) -> ComplianceResult {
    check_employee_compliance_with(employee_id, shifts, thresholds).within(start, end)
}
