//! Team-level roll-up of per-employee fatigue results for the dashboard.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::fatigue::{FatigueResult, RiskLevel};

/// One employee's row in the overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub employee_id: String,
    pub fatigue: FatigueResult,
}

/// Headline figures and ranked rows for a team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamOverview {
    /// Most severe risk first; equal risks keep input order.
    pub members: Vec<TeamMember>,
    pub low_count: u32,
    pub medium_count: u32,
    pub high_count: u32,
    pub critical_count: u32,
    /// High plus critical.
    pub alert_count: u32,
    /// Rounded mean recovery score, 100 for an empty team.
    pub average_recovery_score: u8,
    pub night_shift_total: u32,
}

impl TeamOverview {
    pub fn build<I, S>(results: I) -> Self
    where
        I: IntoIterator<Item = (S, FatigueResult)>,
        S: Into<String>,
    {
        let mut members: Vec<TeamMember> = results
            .into_iter()
            .map(|(id, fatigue)| TeamMember {
                employee_id: id.into(),
                fatigue,
            })
            .collect();
        members.sort_by(|a, b| b.fatigue.risk_level.cmp(&a.fatigue.risk_level));

        let count = |level: RiskLevel| {
            members
                .iter()
                .filter(|m| m.fatigue.risk_level == level)
                .count() as u32
        };
        let low_count = count(RiskLevel::Low);
        let medium_count = count(RiskLevel::Medium);
        let high_count = count(RiskLevel::High);
        let critical_count = count(RiskLevel::Critical);

        let average_recovery_score = if members.is_empty() {
            100
        } else {
            let sum: f64 = members
                .iter()
                .map(|m| f64::from(m.fatigue.recovery_score))
                .sum();
            (sum / members.len() as f64).round() as u8
        };
        let night_shift_total = members.iter().map(|m| m.fatigue.night_shift_count).sum();

        debug!(
            members = members.len(),
            critical_count,
            high_count,
            average_recovery_score,
            "team overview built"
        );

        Self {
            members,
            low_count,
            medium_count,
            high_count,
            critical_count,
            alert_count: high_count + critical_count,
            average_recovery_score,
            night_shift_total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fatigue::calculate_employee_fatigue;
    use crate::shift::EmployeeSleepProfile;

    fn result(risk: RiskLevel, recovery: u8, nights: u32) -> FatigueResult {
        let mut r = calculate_employee_fatigue(&[], &EmployeeSleepProfile::default(), 7);
        r.risk_level = risk;
        r.recovery_score = recovery;
        r.night_shift_count = nights;
        r
    }

    #[test]
    fn test_empty_team() {
        let overview = TeamOverview::build(Vec::<(String, FatigueResult)>::new());
        assert!(overview.members.is_empty());
        assert_eq!(overview.alert_count, 0);
        assert_eq!(overview.average_recovery_score, 100);
        assert_eq!(overview.night_shift_total, 0);
    }

    #[test]
    fn test_ranked_critical_first_stable() {
        let overview = TeamOverview::build(vec![
            ("a", result(RiskLevel::Low, 100, 0)),
            ("b", result(RiskLevel::High, 60, 2)),
            ("c", result(RiskLevel::Critical, 10, 5)),
            ("d", result(RiskLevel::High, 55, 1)),
        ]);
        let order: Vec<_> = overview.members.iter().map(|m| m.employee_id.as_str()).collect();
        assert_eq!(order, ["c", "b", "d", "a"]);
        assert_eq!(overview.critical_count, 1);
        assert_eq!(overview.high_count, 2);
        assert_eq!(overview.medium_count, 0);
        assert_eq!(overview.low_count, 1);
        assert_eq!(overview.alert_count, 3);
        // (100 + 60 + 10 + 55) / 4 = 56.25
        assert_eq!(overview.average_recovery_score, 56);
        assert_eq!(overview.night_shift_total, 8);
    }

    #[test]
    fn test_serializes_camel_case() {
        let overview = TeamOverview::build(vec![("emp-1".to_string(), result(RiskLevel::Medium, 80, 0))]);
        let json = serde_json::to_value(&overview).unwrap();
        assert_eq!(json["alertCount"], 0);
        assert_eq!(json["averageRecoveryScore"], 80);
        assert_eq!(json["members"][0]["employeeId"], "emp-1");
        assert_eq!(json["members"][0]["fatigue"]["riskLevel"], "medium");
    }
}
