//! Sleep-fatigue estimation from a shift history.
//!
//! The engine walks a date-sorted shift series once, estimates the sleep
//! opportunity each day leaves, accumulates the resulting deficit (halving
//! it on rest days), applies aggravating factors to the final total, and
//! classifies the result into a [`RiskLevel`].
//!
//! # Functions
//!
//! - [`calculate_employee_fatigue`] — full result with default constants
//! - [`calculate_employee_fatigue_with`] — same, with an explicit [`FatigueConfig`]
//! - [`estimate_sleep_opportunity`] — per-shift sleep estimate and quick-return flag
//! - [`count_consecutive_nights`] — longest run of adjacent night records
//! - [`classify_risk`] — deficit + night run → [`RiskLevel`]
//!
//! The "next shift" used for quick-return detection is the next record in
//! sorted order, not the next calendar day: a gap in the calendar is not
//! inspected here.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::shift::{EmployeeSleepProfile, ShiftInput, ShiftType};
use crate::time::{calculate_sleep_duration, minute_of_day};

/// Typical diurnal sleep after a night shift (5.5h).
const NIGHT_SLEEP_MINUTES: i32 = 330;
/// Extra sleep credited to a night shift with a real break.
const NIGHT_BREAK_BONUS_MINUTES: i32 = 15;
const NIGHT_BREAK_MIN_MINUTES: u32 = 30;
/// Cap for sleep after an evening shift (7h).
const EVENING_SLEEP_CAP_MINUTES: i32 = 420;
/// Commute and wind-down taken out of a short gap before sleeping.
const WIND_DOWN_MINUTES: i32 = 90;
const EVENING_QUICK_RETURN_FLOOR: i32 = 240;
const DAY_QUICK_RETURN_FLOOR: i32 = 300;

// ── Risk classification ─────────────────────────────────────────────────────

/// Fatigue risk, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Badge label shown next to an employee.
    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "Normal",
            RiskLevel::Medium => "Vigilance",
            RiskLevel::High => "Alerte",
            RiskLevel::Critical => "Critique",
        }
    }

    /// High and critical levels raise a dashboard alert.
    pub fn is_alert(self) -> bool {
        self >= RiskLevel::High
    }
}

/// Upper bounds (inclusive, in minutes of cumulative deficit) of each level
/// below critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RiskThresholds {
    pub low: i32,
    pub medium: i32,
    pub high: i32,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            low: 120,
            medium: 240,
            high: 480,
        }
    }
}

/// Constants of the fatigue model. Partial JSON overrides only the named fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FatigueConfig {
    pub risk_thresholds: RiskThresholds,
    /// A gap shorter than this between two shifts is a quick return (11h).
    pub quick_return_minutes: i32,
    /// Night run length from which the final deficit is multiplied.
    pub night_multiplier_run: u32,
    pub night_multiplier: f64,
    /// Night run length that forces [`RiskLevel::Critical`].
    pub critical_night_run: u32,
    /// Flat deficit added per quick return.
    pub quick_return_penalty_minutes: i32,
}

impl Default for FatigueConfig {
    fn default() -> Self {
        Self {
            risk_thresholds: RiskThresholds::default(),
            quick_return_minutes: 660,
            night_multiplier_run: 3,
            night_multiplier: 1.5,
            critical_night_run: 5,
            quick_return_penalty_minutes: 30,
        }
    }
}

/// Classify a final cumulative deficit. A long enough night run is critical
/// whatever the deficit.
pub fn classify_risk(
    cumulative_deficit_minutes: i32,
    consecutive_nights: u32,
    config: &FatigueConfig,
) -> RiskLevel {
    let t = &config.risk_thresholds;
    if cumulative_deficit_minutes > t.high || consecutive_nights >= config.critical_night_run {
        RiskLevel::Critical
    } else if cumulative_deficit_minutes > t.medium {
        RiskLevel::High
    } else if cumulative_deficit_minutes > t.low {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

// ── Per-shift estimation ────────────────────────────────────────────────────

/// Sleep left by one shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SleepEstimate {
    pub sleep_minutes: i32,
    pub has_quick_return: bool,
}

/// Estimate the sleep opportunity of `shift`, looking at `next` (the
/// following record, if any) for a quick return under 11h.
///
/// Uses the default quick-return threshold; the engine passes its
/// configured one.
pub fn estimate_sleep_opportunity(
    shift: &ShiftInput,
    next: Option<&ShiftInput>,
    habitual_duration: i32,
) -> SleepEstimate {
    estimate(
        shift,
        next,
        habitual_duration,
        FatigueConfig::default().quick_return_minutes,
    )
}

fn estimate(
    shift: &ShiftInput,
    next: Option<&ShiftInput>,
    habitual_duration: i32,
    quick_return_minutes: i32,
) -> SleepEstimate {
    if shift.shift_type.is_rest() {
        return SleepEstimate {
            sleep_minutes: habitual_duration,
            has_quick_return: false,
        };
    }

    let Some(end) = shift.end_time else {
        let sleep_minutes = match shift.shift_type {
            ShiftType::Nuit => NIGHT_SLEEP_MINUTES,
            ShiftType::Soir => habitual_duration.min(EVENING_SLEEP_CAP_MINUTES),
            _ => habitual_duration,
        };
        return SleepEstimate {
            sleep_minutes,
            has_quick_return: false,
        };
    };

    // Clock gap from this end to the next start; wraps past midnight.
    let gap = next
        .filter(|n| n.shift_type.is_work())
        .and_then(|n| n.start_time)
        .map(|start| calculate_sleep_duration(minute_of_day(end), minute_of_day(start)));
    let quick_gap = gap.filter(|&g| g < quick_return_minutes);

    let sleep_minutes = match shift.shift_type {
        ShiftType::Nuit => {
            if shift.break_minutes >= NIGHT_BREAK_MIN_MINUTES {
                NIGHT_SLEEP_MINUTES + NIGHT_BREAK_BONUS_MINUTES
            } else {
                NIGHT_SLEEP_MINUTES
            }
        }
        ShiftType::Soir => match quick_gap {
            Some(g) => EVENING_QUICK_RETURN_FLOOR.max(g - WIND_DOWN_MINUTES),
            None => habitual_duration.min(EVENING_SLEEP_CAP_MINUTES),
        },
        _ => match quick_gap {
            Some(g) => DAY_QUICK_RETURN_FLOOR.max(g - WIND_DOWN_MINUTES),
            None => habitual_duration,
        },
    };

    SleepEstimate {
        sleep_minutes: sleep_minutes.min(habitual_duration),
        has_quick_return: quick_gap.is_some(),
    }
}

/// Longest run of adjacent `nuit` records, in list order.
pub fn count_consecutive_nights(shifts: &[ShiftInput]) -> u32 {
    let mut longest: u32 = 0;
    let mut current: u32 = 0;
    for shift in shifts {
        if shift.shift_type == ShiftType::Nuit {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

// ── Engine ──────────────────────────────────────────────────────────────────

/// Sleep estimate for one day of the series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyEstimate {
    pub date: NaiveDate,
    pub shift_type: ShiftType,
    pub estimated_sleep_minutes: i32,
    pub deficit_minutes: i32,
    pub is_rest_day: bool,
    pub is_night_shift: bool,
    pub has_quick_return: bool,
}

/// Fatigue of one employee over one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FatigueResult {
    /// First date of the series; `None` when there were no shifts.
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub window_days: u32,
    pub daily_estimates: Vec<DailyEstimate>,
    pub cumulative_deficit_minutes: i32,
    /// 100 = no deficit, 0 = half of all possible sleep lost.
    pub recovery_score: u8,
    pub risk_level: RiskLevel,
    pub shift_count: u32,
    pub night_shift_count: u32,
    pub consecutive_nights: u32,
    pub quick_return_count: u32,
}

/// Compute the fatigue of one employee with the default [`FatigueConfig`].
///
/// `shifts` need not be sorted. An empty series yields a zero deficit and
/// [`RiskLevel::Low`].
///
/// # Examples
///
/// ```
/// use sommeil_engine::fatigue::{calculate_employee_fatigue, RiskLevel};
/// use sommeil_engine::shift::EmployeeSleepProfile;
///
/// let result = calculate_employee_fatigue(&[], &EmployeeSleepProfile::default(), 7);
/// assert_eq!(result.cumulative_deficit_minutes, 0);
/// assert_eq!(result.risk_level, RiskLevel::Low);
/// ```
pub fn calculate_employee_fatigue(
    shifts: &[ShiftInput],
    profile: &EmployeeSleepProfile,
    window_days: u32,
) -> FatigueResult {
    calculate_employee_fatigue_with(shifts, profile, window_days, &FatigueConfig::default())
}

/// Compute the fatigue of one employee with explicit model constants.
pub fn calculate_employee_fatigue_with(
    shifts: &[ShiftInput],
    profile: &EmployeeSleepProfile,
    window_days: u32,
    config: &FatigueConfig,
) -> FatigueResult {
    debug!(shifts = shifts.len(), window_days, "estimating fatigue");

    let habitual = profile.habitual_duration();

    let mut sorted = shifts.to_vec();
    sorted.sort_by_key(|s| s.date);

    let mut daily_estimates = Vec::with_capacity(sorted.len());
    let mut cumulative = 0.0_f64;
    let mut shift_count = 0;
    let mut night_shift_count = 0;
    let mut quick_return_count = 0;

    for (i, shift) in sorted.iter().enumerate() {
        let is_rest_day = shift.shift_type.is_rest();
        let is_night_shift = shift.shift_type == ShiftType::Nuit;
        if !is_rest_day {
            shift_count += 1;
        }
        if is_night_shift {
            night_shift_count += 1;
        }

        let est = estimate(shift, sorted.get(i + 1), habitual, config.quick_return_minutes);
        if est.has_quick_return {
            quick_return_count += 1;
        }

        let deficit = (habitual - est.sleep_minutes).max(0);
        if is_rest_day {
            cumulative *= 0.5;
        } else {
            cumulative += f64::from(deficit);
        }

        daily_estimates.push(DailyEstimate {
            date: shift.date,
            shift_type: shift.shift_type,
            estimated_sleep_minutes: est.sleep_minutes,
            deficit_minutes: deficit,
            is_rest_day,
            is_night_shift,
            has_quick_return: est.has_quick_return,
        });
    }

    let consecutive_nights = count_consecutive_nights(&sorted);
    if consecutive_nights >= config.night_multiplier_run {
        cumulative = (cumulative * config.night_multiplier).round();
    }
    cumulative += f64::from(quick_return_count) * f64::from(config.quick_return_penalty_minutes);
    let cumulative_deficit_minutes = cumulative.round().max(0.0) as i32;

    let recovery_score = recovery_score(cumulative_deficit_minutes, habitual, window_days);
    let risk_level = classify_risk(cumulative_deficit_minutes, consecutive_nights, config);

    debug!(
        cumulative_deficit_minutes,
        recovery_score,
        ?risk_level,
        consecutive_nights,
        quick_return_count,
        "fatigue estimated"
    );

    FatigueResult {
        period_start: sorted.first().map(|s| s.date),
        period_end: sorted.last().map(|s| s.date),
        window_days,
        daily_estimates,
        cumulative_deficit_minutes,
        recovery_score,
        risk_level,
        shift_count,
        night_shift_count,
        consecutive_nights,
        quick_return_count,
    }
}

/// Losing half of all possible sleep over the window scores 0.
fn recovery_score(deficit: i32, habitual: i32, window_days: u32) -> u8 {
    let reference = f64::from(habitual) * f64::from(window_days) * 0.5;
    if reference <= 0.0 {
        return if deficit == 0 { 100 } else { 0 };
    }
    (100.0 * (1.0 - f64::from(deficit) / reference))
        .round()
        .clamp(0.0, 100.0) as u8
}

// ── Tests ───────────────────────────────────────────────────────────────────
