//! Sleep-transition planning between two shift rhythms.
//!
//! Given a habitual rhythm, the block of shifts being left and the block
//! being joined, [`generate_transition_plan`] spreads the bedtime move over
//! the calendar gap between the two blocks (2 to 6 days). Every planned
//! night keeps the habitual duration. Each day carries caffeine and light
//! guidance that depends on the real shift falling on that date.
//!
//! This engine is independent of the fatigue engine: it shares the clock
//! helpers in [`crate::time`] but none of the fatigue heuristics.
//!
//! # Functions
//!
//! - [`generate_transition_plan`] — the day-by-day plan
//! - [`calculate_caffeine_cutoff`] — last caffeine intake before a bedtime
//! - [`calculate_light_window`] — dimmed-light window before a bedtime

use chrono::{Days, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::shift::ShiftType;
use crate::time::{
    calculate_deficit, calculate_sleep_duration, circular_difference,
    difference_in_calendar_days, format_hours, minute_of_day, round_half_up, time_from_minutes,
    MINUTES_PER_DAY,
};

/// Shortest transition, in days.
pub const MIN_TRANSITION_DAYS: i64 = 2;
/// Longest transition, in days.
pub const MAX_TRANSITION_DAYS: i64 = 6;

const DAY_SHIFT_CAFFEINE_MINUTES: i32 = 480;
const LATE_SHIFT_CAFFEINE_MINUTES: i32 = 360;
const LIGHT_WINDOW_MINUTES: i32 = 120;
const NAP_THRESHOLD_MINUTES: i32 = 60;

const INTRO_NOTE: &str = "Debut de la transition. Decalez progressivement votre heure de coucher. \
                          Evitez les ecrans 1h avant le coucher.";
const LAST_DAY_NOTE: &str = "Dernier jour de transition. Vous devriez etre adapte au nouveau rythme. \
                             Maintenez ces horaires pour consolider l'adaptation.";

// ── Types ───────────────────────────────────────────────────────────────────

/// A block of identical work shifts over an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftWindow {
    #[serde(rename = "type")]
    pub shift_type: ShiftType,
    #[serde(with = "crate::time::hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "crate::time::hhmm")]
    pub end_time: NaiveTime,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl ShiftWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    fn validate(&self, side: &str) -> Result<()> {
        if self.shift_type.is_rest() {
            return Err(EngineError::InvalidShiftWindow(format!(
                "{side} shift must be jour, soir or nuit, got {}",
                self.shift_type.label()
            )));
        }
        if self.end_date < self.start_date {
            return Err(EngineError::InvalidShiftWindow(format!(
                "{side} shift ends {} before it starts {}",
                self.end_date, self.start_date
            )));
        }
        Ok(())
    }
}

/// A transition request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningInput {
    #[serde(with = "crate::time::hhmm")]
    pub habitual_sleep_time: NaiveTime,
    #[serde(with = "crate::time::hhmm")]
    pub habitual_wake_time: NaiveTime,
    pub from_shift: ShiftWindow,
    pub to_shift: ShiftWindow,
}

/// One day of a transition plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPlanDay {
    /// 1-based.
    pub day_number: u32,
    pub date: NaiveDate,
    #[serde(with = "crate::time::hhmm")]
    pub target_sleep_time: NaiveTime,
    #[serde(with = "crate::time::hhmm")]
    pub target_wake_time: NaiveTime,
    #[serde(with = "crate::time::hhmm")]
    pub caffeine_cutoff: NaiveTime,
    /// `None` on night-shift days.
    #[serde(with = "crate::time::hhmm_option")]
    pub light_start: Option<NaiveTime>,
    #[serde(with = "crate::time::hhmm_option")]
    pub light_end: Option<NaiveTime>,
    pub deficit_minutes: i32,
    pub notes: String,
    /// Shift worked on this date; `None` for a rest day.
    pub shift_type: Option<ShiftType>,
    #[serde(with = "crate::time::hhmm_option")]
    pub work_start_time: Option<NaiveTime>,
    #[serde(with = "crate::time::hhmm_option")]
    pub work_end_time: Option<NaiveTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResult {
    pub days: Vec<GeneratedPlanDay>,
    pub total_deficit_minutes: i32,
    pub actual_days_count: u32,
}

// ── Guidance ────────────────────────────────────────────────────────────────

/// Last caffeine intake for a bedtime at `target_sleep_minutes`: 8h before
/// on day shifts and rest days, 6h before on evening and night shifts.
///
/// # Examples
///
/// ```
/// use sommeil_engine::planning::calculate_caffeine_cutoff;
/// use sommeil_engine::shift::ShiftType;
/// use sommeil_engine::time::format_hhmm;
///
/// assert_eq!(format_hhmm(calculate_caffeine_cutoff(23 * 60, None)), "15:00");
/// assert_eq!(format_hhmm(calculate_caffeine_cutoff(13 * 60, Some(ShiftType::Nuit))), "07:00");
/// ```
pub fn calculate_caffeine_cutoff(target_sleep_minutes: i32, shift_type: Option<ShiftType>) -> NaiveTime {
    let before = match shift_type {
        None | Some(ShiftType::Jour) => DAY_SHIFT_CAFFEINE_MINUTES,
        Some(_) => LATE_SHIFT_CAFFEINE_MINUTES,
    };
    time_from_minutes(target_sleep_minutes - before)
}

/// Dimmed-light window: the two hours ending at bedtime, or `None` on a
/// night-shift day where bedtime falls in daylight.
pub fn calculate_light_window(
    shift_type: Option<ShiftType>,
    target_sleep_minutes: i32,
) -> Option<(NaiveTime, NaiveTime)> {
    if shift_type == Some(ShiftType::Nuit) {
        return None;
    }
    Some((
        time_from_minutes(target_sleep_minutes - LIGHT_WINDOW_MINUTES),
        time_from_minutes(target_sleep_minutes),
    ))
}

// ── Plan generation ─────────────────────────────────────────────────────────

/// Build the day-by-day transition from `input.from_shift` to `input.to_shift`.
///
/// Day `i` falls on `from_shift.end_date + i`. The plan length is the
/// calendar gap to `to_shift.start_date`, clamped to
/// [`MIN_TRANSITION_DAYS`]..=[`MAX_TRANSITION_DAYS`]. Bedtime moves from
/// the habitual bedtime along the shortest way around the clock and lands
/// exactly on `to_shift.start_time` minus the habitual duration on the last
/// day.
///
/// # Errors
///
/// Returns [`EngineError::InvalidShiftWindow`] when either endpoint is a
/// rest category or ends before it starts.
pub fn generate_transition_plan(input: &PlanningInput) -> Result<PlanResult> {
    let from = &input.from_shift;
    let to = &input.to_shift;
    from.validate("from")?;
    to.validate("to")?;

    let habitual_sleep = minute_of_day(input.habitual_sleep_time);
    let habitual_duration =
        calculate_sleep_duration(habitual_sleep, minute_of_day(input.habitual_wake_time));

    let gap = difference_in_calendar_days(to.start_date, from.end_date);
    let day_count = gap.clamp(MIN_TRANSITION_DAYS, MAX_TRANSITION_DAYS) as u32;

    let target_sleep = (minute_of_day(to.start_time) - habitual_duration).rem_euclid(MINUTES_PER_DAY);
    let total_shift = circular_difference(habitual_sleep, target_sleep);
    let increment = f64::from(total_shift) / f64::from(day_count);

    debug!(
        from = from.shift_type.label(),
        to = to.shift_type.label(),
        gap,
        day_count,
        total_shift,
        "generating transition plan"
    );

    let mut days = Vec::with_capacity(day_count as usize);
    for day_number in 1..=day_count {
        let date = from
            .end_date
            .checked_add_days(Days::new(u64::from(day_number)))
            .ok_or_else(|| {
                EngineError::InvalidShiftWindow(format!(
                    "plan starting after {} runs past the calendar",
                    from.end_date
                ))
            })?;

        let sleep = if day_number == day_count {
            target_sleep
        } else {
            let step = round_half_up(increment * f64::from(day_number)) as i32;
            (habitual_sleep + step).rem_euclid(MINUTES_PER_DAY)
        };
        let wake = (sleep + habitual_duration).rem_euclid(MINUTES_PER_DAY);

        let worked = [from, to].into_iter().find(|w| w.contains(date));
        let shift_type = worked.map(|w| w.shift_type);
        let deficit = night_deficit(habitual_duration, sleep, wake, worked);
        let light = calculate_light_window(shift_type, sleep);

        let notes = day_notes(input, day_number, day_count, deficit);

        days.push(GeneratedPlanDay {
            day_number,
            date,
            target_sleep_time: time_from_minutes(sleep),
            target_wake_time: time_from_minutes(wake),
            caffeine_cutoff: calculate_caffeine_cutoff(sleep, shift_type),
            light_start: light.map(|(start, _)| start),
            light_end: light.map(|(_, end)| end),
            deficit_minutes: deficit,
            notes,
            shift_type,
            work_start_time: worked.map(|w| w.start_time),
            work_end_time: worked.map(|w| w.end_time),
        });
    }

    let total_deficit_minutes = days.iter().map(|d| d.deficit_minutes).sum();
    debug!(day_count, total_deficit_minutes, "transition plan generated");

    Ok(PlanResult {
        days,
        total_deficit_minutes,
        actual_days_count: day_count,
    })
}

/// A work start falling strictly inside the planned night cuts it short.
fn night_deficit(habitual: i32, sleep: i32, wake: i32, worked: Option<&ShiftWindow>) -> i32 {
    let Some(shift) = worked else {
        return calculate_deficit(habitual, sleep, wake);
    };
    let work_start = minute_of_day(shift.start_time);
    let offset = (work_start - sleep).rem_euclid(MINUTES_PER_DAY);
    if offset > 0 && offset < habitual {
        calculate_deficit(habitual, sleep, work_start)
    } else {
        calculate_deficit(habitual, sleep, wake)
    }
}

fn day_notes(input: &PlanningInput, day_number: u32, day_count: u32, deficit: i32) -> String {
    let mut parts = Vec::new();

    let leaving_nights = input.from_shift.shift_type == ShiftType::Nuit;
    let joining_days = matches!(input.to_shift.shift_type, ShiftType::Jour | ShiftType::Soir);
    if day_number == 1 && leaving_nights && joining_days && deficit > 0 {
        parts.push(INTRO_NOTE.to_string());
    }
    if day_number == day_count {
        parts.push(LAST_DAY_NOTE.to_string());
    }
    if deficit > NAP_THRESHOLD_MINUTES {
        parts.push(format!(
            "Deficit de sommeil prevu ({}h). Si possible, faites une sieste courte de 20 min en debut d'apres-midi.",
            format_hours(deficit)
        ));
    }

    parts.join(" ")
}

// ── Tests ───────────────────────────────────────────────────────────────────
