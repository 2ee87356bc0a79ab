//! # sommeil-engine
//!
//! Deterministic shift-work analytics for hospital-style rosters.
//!
//! The engine turns a normalized list of shifts and a habitual sleep
//! rhythm into sleep-deficit and fatigue-risk estimates, French labor-code
//! compliance violations, and day-by-day circadian transition plans. Every
//! operation is a pure function over in-memory data: no I/O, no shared
//! state, safe to call from many threads at once.
//!
//! ## Modules
//!
//! - [`time`] — `"HH:MM"` parsing, 24h clock arithmetic, calendar-day distance
//! - [`shift`] — shift records, categories, and the employee sleep profile
//! - [`fatigue`] — cumulative deficit, recovery score, and risk level
//! - [`compliance`] — the six labor-code rules and their aggregate
//! - [`planning`] — sleep-transition plans between two shift rhythms
//! - [`overview`] — team roll-up of fatigue results
//! - [`error`] — Error types

pub mod compliance;
pub mod error;
pub mod fatigue;
pub mod overview;
pub mod planning;
pub mod shift;
pub mod time;

pub use compliance::{
    check_employee_compliance, check_employee_compliance_in_range,
    check_employee_compliance_with, context_range, ComplianceResult, ComplianceThresholds,
    ComplianceViolation, Severity, ViolationType,
};
pub use error::EngineError;
pub use fatigue::{
    calculate_employee_fatigue, calculate_employee_fatigue_with, classify_risk,
    count_consecutive_nights, estimate_sleep_opportunity, DailyEstimate, FatigueConfig,
    FatigueResult, RiskLevel, RiskThresholds, SleepEstimate,
};
pub use overview::{TeamMember, TeamOverview};
pub use planning::{
    calculate_caffeine_cutoff, calculate_light_window, generate_transition_plan,
    GeneratedPlanDay, PlanResult, PlanningInput, ShiftWindow,
};
pub use shift::{EmployeeSleepProfile, ShiftInput, ShiftType};
