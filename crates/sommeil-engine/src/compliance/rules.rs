//! The six labor-code rules. Each one scans a shift list on its own and
//! returns zero or more violations; none of them depends on another.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, IsoWeek, NaiveDate, NaiveTime};

use super::types::{ComplianceViolation, Severity, ViolationType};
use crate::shift::{ShiftInput, ShiftType};
use crate::time::{
    difference_in_calendar_days, format_hours, minute_of_day, round_half_up, MINUTES_PER_DAY,
};

/// Under 9h of rest a quick return is critical.
const QUICK_RETURN_CRITICAL_MINUTES: i32 = 540;
/// Over 54h a week is critical.
const WEEKLY_HOURS_CRITICAL_MINUTES: i32 = 3240;

// ── Rule 1: rest between shifts ─────────────────────────────────────────────

/// Art. L3131-1: minimum rest between two consecutive work shifts.
///
/// Violation dated on the later shift; critical under 9h.
pub fn check_quick_return(shifts: &[ShiftInput], min_rest_minutes: i32) -> Vec<ComplianceViolation> {
    let work = timed_work_shifts(shifts);

    work.windows(2)
        .filter_map(|pair| {
            let gap = rest_gap(&pair[0], &pair[1]);
            if gap >= min_rest_minutes {
                return None;
            }
            let severity = if gap < QUICK_RETURN_CRITICAL_MINUTES {
                Severity::Critical
            } else {
                Severity::Violation
            };
            Some(violation(
                ViolationType::QuickReturn,
                severity,
                pair[1].date,
                format!(
                    "Repos de {}h entre 2 shifts (minimum {}h requis - Art. L3131-1)",
                    format_hours(gap),
                    whole_hours(min_rest_minutes)
                ),
                &[
                    ("gapMinutes", i64::from(gap)),
                    ("requiredMinutes", i64::from(min_rest_minutes)),
                ],
            ))
        })
        .collect()
}

// ── Rule 2: daily hours ─────────────────────────────────────────────────────

/// Maximum net duration of a single shift.
pub fn check_daily_hours(shifts: &[ShiftInput], max_minutes: i32) -> Vec<ComplianceViolation> {
    shifts
        .iter()
        .filter_map(|shift| {
            let duration = shift.worked_minutes()?;
            (duration > max_minutes).then(|| {
                violation(
                    ViolationType::DailyHours,
                    Severity::Violation,
                    shift.date,
                    format!(
                        "Duree journaliere de {}h (maximum {}h autorisees)",
                        format_hours(duration),
                        whole_hours(max_minutes)
                    ),
                    &[
                        ("durationMinutes", i64::from(duration)),
                        ("maxMinutes", i64::from(max_minutes)),
                    ],
                )
            })
        })
        .collect()
}

// ── Rule 3: weekly hours ────────────────────────────────────────────────────

/// Art. L3121-20: maximum worked minutes per ISO week (Monday to Sunday).
///
/// Violation dated on the earliest shift of the week; critical over 54h.
pub fn check_weekly_hours(shifts: &[ShiftInput], max_minutes: i32) -> Vec<ComplianceViolation> {
    let mut weeks: BTreeMap<IsoWeek, (i32, NaiveDate)> = BTreeMap::new();
    for shift in shifts {
        let Some(duration) = shift.worked_minutes() else {
            continue;
        };
        let entry = weeks
            .entry(shift.date.iso_week())
            .or_insert((0, shift.date));
        entry.0 += duration;
        entry.1 = entry.1.min(shift.date);
    }

    weeks
        .into_values()
        .filter(|&(total, _)| total > max_minutes)
        .map(|(total, first_date)| {
            let severity = if total > WEEKLY_HOURS_CRITICAL_MINUTES {
                Severity::Critical
            } else {
                Severity::Violation
            };
            violation(
                ViolationType::WeeklyHours,
                severity,
                first_date,
                format!(
                    "Semaine de {}h (maximum {}h - Art. L3121-20)",
                    format_hours(total),
                    whole_hours(max_minutes)
                ),
                &[
                    ("weeklyMinutes", i64::from(total)),
                    ("maxMinutes", i64::from(max_minutes)),
                ],
            )
        })
        .collect()
}

// ── Rule 4: consecutive nights ──────────────────────────────────────────────

/// Maximum run of date-adjacent night shifts. One violation per run, dated
/// on its first night; critical from `max_nights + 2`.
pub fn check_consecutive_nights(shifts: &[ShiftInput], max_nights: u32) -> Vec<ComplianceViolation> {
    let mut sorted: Vec<&ShiftInput> = shifts.iter().collect();
    sorted.sort_by_key(|s| s.date);

    let mut violations = Vec::new();
    let mut run = 0;
    let mut run_start: Option<NaiveDate> = None;

    for (i, shift) in sorted.iter().enumerate() {
        let is_night = shift.shift_type == ShiftType::Nuit;
        let follows_previous = i > 0 && difference_in_calendar_days(shift.date, sorted[i - 1].date) == 1;

        if is_night && (run == 0 || follows_previous) {
            if run == 0 {
                run_start = Some(shift.date);
            }
            run += 1;
        } else {
            if let Some(start) = run_start.filter(|_| run > max_nights) {
                violations.push(night_run_violation(run, max_nights, start));
            }
            run = u32::from(is_night);
            run_start = Some(shift.date);
        }
    }

    if let Some(start) = run_start.filter(|_| run > max_nights) {
        violations.push(night_run_violation(run, max_nights, start));
    }

    violations
}

fn night_run_violation(count: u32, max_nights: u32, start: NaiveDate) -> ComplianceViolation {
    let severity = if count >= max_nights + 2 {
        Severity::Critical
    } else {
        Severity::Violation
    };
    violation(
        ViolationType::ConsecutiveNights,
        severity,
        start,
        format!("{count} nuits consecutives (maximum {max_nights} recommandees)"),
        &[
            ("consecutiveNights", i64::from(count)),
            ("maxNights", i64::from(max_nights)),
        ],
    )
}

// ── Rule 5: weekly rest ─────────────────────────────────────────────────────

/// Each ISO week with at least two work shifts must contain one rest gap of
/// at least `min_rest_minutes` between consecutive work shifts.
pub fn check_weekly_rest(shifts: &[ShiftInput], min_rest_minutes: i32) -> Vec<ComplianceViolation> {
    let mut timed: Vec<&ShiftInput> = shifts
        .iter()
        .filter(|s| s.start_time.is_some() && s.end_time.is_some())
        .collect();
    if timed.len() < 2 {
        return Vec::new();
    }
    timed.sort_by_key(|s| s.date);

    let mut weeks: BTreeMap<IsoWeek, Vec<&ShiftInput>> = BTreeMap::new();
    for shift in timed {
        weeks.entry(shift.date.iso_week()).or_default().push(shift);
    }

    weeks
        .into_values()
        .filter_map(|week| {
            let work = timed_work_shifts(week);
            if work.len() < 2 {
                return None;
            }
            let longest_rest = work
                .windows(2)
                .map(|pair| rest_gap(&pair[0], &pair[1]))
                .fold(0, i32::max);
            if longest_rest <= 0 || longest_rest >= min_rest_minutes {
                return None;
            }
            Some(violation(
                ViolationType::WeeklyRest,
                Severity::Violation,
                work[0].date,
                format!(
                    "Repos hebdomadaire de {}h (minimum {}h consecutives requises)",
                    format_hours(longest_rest),
                    whole_hours(min_rest_minutes)
                ),
                &[
                    ("maxRestMinutes", i64::from(longest_rest)),
                    ("requiredMinutes", i64::from(min_rest_minutes)),
                ],
            ))
        })
        .collect()
}

// ── Rule 6: consecutive worked days ─────────────────────────────────────────

/// Art. L3132-1: maximum run of calendar-adjacent days with any work shift.
/// One violation per run, dated on its first day.
pub fn check_consecutive_days(shifts: &[ShiftInput], max_days: u32) -> Vec<ComplianceViolation> {
    let work_dates: BTreeSet<NaiveDate> = shifts
        .iter()
        .filter(|s| s.shift_type.is_work())
        .map(|s| s.date)
        .collect();

    let mut violations = Vec::new();
    let mut dates = work_dates.into_iter();
    let Some(first) = dates.next() else {
        return violations;
    };

    let mut run_start = first;
    let mut previous = first;
    let mut run: u32 = 1;

    for date in dates {
        if difference_in_calendar_days(date, previous) == 1 {
            run += 1;
        } else {
            if run > max_days {
                violations.push(day_run_violation(run, max_days, run_start));
            }
            run = 1;
            run_start = date;
        }
        previous = date;
    }

    if run > max_days {
        violations.push(day_run_violation(run, max_days, run_start));
    }

    violations
}

fn day_run_violation(count: u32, max_days: u32, start: NaiveDate) -> ComplianceViolation {
    violation(
        ViolationType::ConsecutiveDays,
        Severity::Violation,
        start,
        format!("{count} jours travailles consecutifs (maximum {max_days} - Art. L3132-1)"),
        &[
            ("consecutiveDays", i64::from(count)),
            ("maxDays", i64::from(max_days)),
        ],
    )
}

// ── Helpers ─────────────────────────────────────────────────────────────────

/// A work shift with both times, as used by the gap-based rules.
#[derive(Debug, Clone, Copy)]
struct TimedShift {
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
}

/// Work shifts that have both times, sorted by date (stable).
fn timed_work_shifts<'a>(shifts: impl IntoIterator<Item = &'a ShiftInput>) -> Vec<TimedShift> {
    let mut work: Vec<TimedShift> = shifts
        .into_iter()
        .filter_map(|s| {
            let (start, end) = s.work_times()?;
            Some(TimedShift {
                date: s.date,
                start,
                end,
            })
        })
        .collect();
    work.sort_by_key(|s| s.date);
    work
}

/// Minutes from the end of `earlier` to the start of `later`, counting
/// whole calendar days between their dates.
fn rest_gap(earlier: &TimedShift, later: &TimedShift) -> i32 {
    let days = difference_in_calendar_days(later.date, earlier.date) as i32;
    days * MINUTES_PER_DAY + minute_of_day(later.start) - minute_of_day(earlier.end)
}

fn violation(
    kind: ViolationType,
    severity: Severity,
    date: NaiveDate,
    message: String,
    details: &[(&str, i64)],
) -> ComplianceViolation {
    ComplianceViolation {
        kind,
        severity,
        date,
        message,
        details: details
            .iter()
            .map(|&(key, value)| (key.to_string(), value))
            .collect(),
    }
}

fn whole_hours(minutes: i32) -> i64 {
    round_half_up(f64::from(minutes) / 60.0) as i64
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::parse_hhmm;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn work(date: &str, kind: ShiftType, start: &str, end: &str, break_minutes: u32) -> ShiftInput {
        ShiftInput::worked(
            d(date),
            kind,
            parse_hhmm(start).unwrap(),
            parse_hhmm(end).unwrap(),
            break_minutes,
        )
    }

    fn jour(date: &str) -> ShiftInput {
        work(date, ShiftType::Jour, "07:00", "15:00", 0)
    }

    fn nuit(date: &str) -> ShiftInput {
        work(date, ShiftType::Nuit, "21:00", "07:00", 0)
    }

    fn repos(date: &str) -> ShiftInput {
        ShiftInput::off(d(date), ShiftType::Repos)
    }

    // ── formatting ──────────────────────────────────────────────────────

    #[test]
    fn test_format_hours() {
        assert_eq!(format_hours(480), "8");
        assert_eq!(format_hours(570), "9.5");
        assert_eq!(format_hours(750), "12.5");
        assert_eq!(format_hours(3620), "60.3");
        assert_eq!(whole_hours(2100), 35);
        assert_eq!(whole_hours(-90), -1);
    }

    // ── quick return ────────────────────────────────────────────────────

    #[test]
    fn test_quick_return_under_nine_hours_is_critical() {
        let shifts = vec![
            work("2026-03-09", ShiftType::Soir, "14:00", "22:00", 0),
            work("2026-03-10", ShiftType::Jour, "06:00", "14:00", 0),
        ];
        let v = check_quick_return(&shifts, 660);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].kind, ViolationType::QuickReturn);
        assert_eq!(v[0].severity, Severity::Critical);
        assert_eq!(v[0].date, d("2026-03-10"));
        assert_eq!(v[0].details["gapMinutes"], 480);
        assert_eq!(
            v[0].message,
            "Repos de 8h entre 2 shifts (minimum 11h requis - Art. L3131-1)"
        );
    }

    #[test]
    fn test_quick_return_between_nine_and_eleven_hours() {
        let shifts = vec![
            work("2026-03-09", ShiftType::Soir, "13:00", "21:00", 0),
            work("2026-03-10", ShiftType::Jour, "06:30", "14:30", 0),
        ];
        let v = check_quick_return(&shifts, 660);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].severity, Severity::Violation);
        assert!(v[0].message.starts_with("Repos de 9.5h"));
    }

    #[test]
    fn test_quick_return_skips_rest_days_and_counts_calendar_gap() {
        let shifts = vec![
            work("2026-03-09", ShiftType::Soir, "14:00", "22:00", 0),
            repos("2026-03-10"),
            work("2026-03-11", ShiftType::Jour, "06:00", "14:00", 0),
        ];
        // the pair is soir → jour two days later: 1920 minutes
        assert!(check_quick_return(&shifts, 660).is_empty());
    }

    #[test]
    fn test_quick_return_ignores_untimed_shifts() {
        let mut untimed = jour("2026-03-10");
        untimed.start_time = None;
        let shifts = vec![work("2026-03-09", ShiftType::Soir, "14:00", "23:00", 0), untimed];
        assert!(check_quick_return(&shifts, 660).is_empty());
    }

    // ── daily hours ─────────────────────────────────────────────────────

    #[test]
    fn test_daily_hours_net_of_break() {
        let shifts = vec![
            work("2026-03-09", ShiftType::Jour, "07:00", "20:00", 30),
            work("2026-03-10", ShiftType::Jour, "07:00", "19:00", 60),
        ];
        let v = check_daily_hours(&shifts, 720);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].date, d("2026-03-09"));
        assert_eq!(v[0].severity, Severity::Violation);
        assert_eq!(v[0].details["durationMinutes"], 750);
        assert_eq!(v[0].message, "Duree journaliere de 12.5h (maximum 12h autorisees)");
    }

    #[test]
    fn test_daily_hours_overnight() {
        let shifts = vec![work("2026-03-09", ShiftType::Nuit, "19:00", "08:00", 0)];
        let v = check_daily_hours(&shifts, 720);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].details["durationMinutes"], 780);
    }

    // ── weekly hours ────────────────────────────────────────────────────

    #[test]
    fn test_weekly_hours_violation_dated_on_first_shift() {
        // 2026-03-09 is a Monday
        let mut shifts: Vec<_> = ["2026-03-12", "2026-03-10", "2026-03-11", "2026-03-13"]
            .iter()
            .map(|day| work(day, ShiftType::Jour, "07:00", "19:00", 0))
            .collect();
        assert!(check_weekly_hours(&shifts, 2880).is_empty());

        shifts.push(work("2026-03-15", ShiftType::Jour, "07:00", "11:00", 0));
        let v = check_weekly_hours(&shifts, 2880);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].severity, Severity::Violation);
        assert_eq!(v[0].date, d("2026-03-10"));
        assert_eq!(v[0].details["weeklyMinutes"], 3120);
        assert_eq!(v[0].message, "Semaine de 52h (maximum 48h - Art. L3121-20)");
    }

    #[test]
    fn test_weekly_hours_critical_over_54h() {
        let shifts: Vec<_> = (9..=13)
            .map(|day| work(&format!("2026-03-{day:02}"), ShiftType::Nuit, "19:00", "07:00", 0))
            .collect();
        let v = check_weekly_hours(&shifts, 2880);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].severity, Severity::Critical);
    }

    #[test]
    fn test_weekly_hours_iso_week_spans_new_year() {
        // 2025-12-29 .. 2026-01-02 all belong to 2026-W01
        let shifts: Vec<_> = ["2025-12-29", "2025-12-30", "2025-12-31", "2026-01-01", "2026-01-02"]
            .iter()
            .map(|day| work(day, ShiftType::Jour, "07:00", "18:00", 0))
            .collect();
        let v = check_weekly_hours(&shifts, 2880);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].date, d("2025-12-29"));
        assert_eq!(v[0].details["weeklyMinutes"], 3300);
    }

    #[test]
    fn test_weekly_hours_split_across_weeks() {
        // Sunday and the following Monday fall in different weeks
        let shifts = vec![
            work("2026-03-15", ShiftType::Jour, "07:00", "19:00", 0),
            work("2026-03-16", ShiftType::Jour, "07:00", "19:00", 0),
        ];
        assert!(check_weekly_hours(&shifts, 1000).is_empty());
    }

    // ── consecutive nights ──────────────────────────────────────────────

    #[test]
    fn test_four_nights_one_violation() {
        let shifts: Vec<_> = (9..=12).map(|day| nuit(&format!("2026-03-{day:02}"))).collect();
        let v = check_consecutive_nights(&shifts, 3);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].severity, Severity::Violation);
        assert_eq!(v[0].date, d("2026-03-09"));
        assert_eq!(v[0].details["consecutiveNights"], 4);
        assert_eq!(v[0].message, "4 nuits consecutives (maximum 3 recommandees)");
    }

    #[test]
    fn test_five_nights_critical() {
        let shifts: Vec<_> = (9..=13).map(|day| nuit(&format!("2026-03-{day:02}"))).collect();
        let v = check_consecutive_nights(&shifts, 3);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].severity, Severity::Critical);
    }

    #[test]
    fn test_night_run_broken_by_calendar_gap() {
        let shifts: Vec<_> = ["2026-03-09", "2026-03-10", "2026-03-12", "2026-03-13"]
            .iter()
            .map(|day| nuit(day))
            .collect();
        assert!(check_consecutive_nights(&shifts, 3).is_empty());
    }

    #[test]
    fn test_two_night_runs_two_violations() {
        let mut shifts: Vec<_> = (2..=5).map(|day| nuit(&format!("2026-03-{day:02}"))).collect();
        shifts.push(jour("2026-03-06"));
        shifts.extend((7..=10).map(|day| nuit(&format!("2026-03-{day:02}"))));
        let v = check_consecutive_nights(&shifts, 3);
        assert_eq!(v.len(), 2);
        assert_eq!(v[0].date, d("2026-03-02"));
        assert_eq!(v[1].date, d("2026-03-07"));
    }

    #[test]
    fn test_night_run_restarts_after_gap() {
        let mut shifts = vec![nuit("2026-03-01")];
        shifts.extend((3..=6).map(|day| nuit(&format!("2026-03-{day:02}"))));
        let v = check_consecutive_nights(&shifts, 3);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].date, d("2026-03-03"));
        assert_eq!(v[0].details["consecutiveNights"], 4);
    }

    // ── weekly rest ─────────────────────────────────────────────────────

    #[test]
    fn test_weekly_rest_full_week_of_work() {
        let shifts: Vec<_> = (9..=15).map(|day| jour(&format!("2026-03-{day:02}"))).collect();
        let v = check_weekly_rest(&shifts, 2100);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].date, d("2026-03-09"));
        // 07:00 next day after 15:00 end: 16h
        assert_eq!(v[0].details["maxRestMinutes"], 960);
        assert_eq!(
            v[0].message,
            "Repos hebdomadaire de 16h (minimum 35h consecutives requises)"
        );
    }

    #[test]
    fn test_weekly_rest_satisfied_by_day_off() {
        let shifts: Vec<_> = [9, 10, 11, 13, 14, 15]
            .iter()
            .map(|day| jour(&format!("2026-03-{day:02}")))
            .collect();
        // Wed 15:00 → Fri 07:00 = 40h
        assert!(check_weekly_rest(&shifts, 2100).is_empty());
    }

    #[test]
    fn test_weekly_rest_needs_two_work_shifts() {
        let shifts = vec![jour("2026-03-09"), repos("2026-03-10")];
        assert!(check_weekly_rest(&shifts, 2100).is_empty());
    }

    // ── consecutive days ────────────────────────────────────────────────

    #[test]
    fn test_seven_days_one_violation_at_start() {
        let shifts: Vec<_> = (9..=15).map(|day| jour(&format!("2026-03-{day:02}"))).collect();
        let v = check_consecutive_days(&shifts, 6);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].date, d("2026-03-09"));
        assert_eq!(v[0].details["consecutiveDays"], 7);
        assert_eq!(
            v[0].message,
            "7 jours travailles consecutifs (maximum 6 - Art. L3132-1)"
        );
    }

    #[test]
    fn test_six_days_allowed_and_duplicates_counted_once() {
        let mut shifts: Vec<_> = (9..=14).map(|day| jour(&format!("2026-03-{day:02}"))).collect();
        shifts.push(nuit("2026-03-14"));
        shifts.push(repos("2026-03-15"));
        assert!(check_consecutive_days(&shifts, 6).is_empty());
    }

    #[test]
    fn test_untimed_work_days_still_count() {
        let shifts: Vec<_> = (9..=15)
            .map(|day| ShiftInput::off(d(&format!("2026-03-{day:02}")), ShiftType::Nuit))
            .collect();
        assert_eq!(check_consecutive_days(&shifts, 6).len(), 1);
    }
}
