use serde::Serialize;

use super::GroupMetrics;

/// Traffic-light classification of an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Health {
    Healthy,
    Watch,
    Critical,
}

impl Health {
    /// Higher values are worse.
    fn rising(value: f64, watch_above: f64, critical_above: f64) -> Self {
        if value > critical_above {
            Health::Critical
        } else if value > watch_above {
            Health::Watch
        } else {
            Health::Healthy
        }
    }

    pub fn of_wip(wip: u64) -> Self {
        Self::rising(wip as f64, 7.0, 12.0)
    }

    pub fn of_aging(aging_count: u64) -> Self {
        Self::rising(aging_count as f64, 3.0, 6.0)
    }

    /// Applies to both group and per-task risk scores.
    pub fn of_risk(risk_score: f64) -> Self {
        Self::rising(risk_score, 40.0, 70.0)
    }

    pub fn of_overdue_severity(days: f64) -> Self {
        Self::rising(days, 1.0, 3.0)
    }

    /// Higher values are better.
    pub fn of_efficiency(score: f64) -> Self {
        if score > 75.0 {
            Health::Healthy
        } else if score > 55.0 {
            Health::Watch
        } else {
            Health::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Health::Healthy => "healthy",
            Health::Watch => "watch",
            Health::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Health {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health of the indicators that carry thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GroupHealth {
    pub wip: Health,
    pub aging: Health,
    pub risk: Health,
    pub overdue_severity: Health,
    pub efficiency: Health,
}

impl GroupHealth {
    pub fn from_metrics(m: &GroupMetrics) -> Self {
        Self {
            wip: Health::of_wip(m.wip),
            aging: Health::of_aging(m.aging_count),
            risk: Health::of_risk(m.risk_score),
            overdue_severity: Health::of_overdue_severity(m.overdue_severity_days),
            efficiency: Health::of_efficiency(m.efficiency_score),
        }
    }

    /// The most severe classification across all indicators.
    pub fn worst(&self) -> Health {
        [self.wip, self.aging, self.risk, self.overdue_severity, self.efficiency]
            .into_iter()
            .max_by_key(|h| *h as u8)
            .unwrap_or(Health::Healthy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_are_exclusive() {
        assert_eq!(Health::of_wip(7), Health::Healthy);
        assert_eq!(Health::of_wip(8), Health::Watch);
        assert_eq!(Health::of_wip(12), Health::Watch);
        assert_eq!(Health::of_wip(13), Health::Critical);

        assert_eq!(Health::of_aging(3), Health::Healthy);
        assert_eq!(Health::of_aging(4), Health::Watch);
        assert_eq!(Health::of_aging(7), Health::Critical);

        assert_eq!(Health::of_risk(40.0), Health::Healthy);
        assert_eq!(Health::of_risk(40.1), Health::Watch);
        assert_eq!(Health::of_risk(70.1), Health::Critical);

        assert_eq!(Health::of_overdue_severity(1.0), Health::Healthy);
        assert_eq!(Health::of_overdue_severity(1.5), Health::Watch);
        assert_eq!(Health::of_overdue_severity(3.5), Health::Critical);
    }

    #[test]
    fn test_efficiency_is_inverted() {
        assert_eq!(Health::of_efficiency(90.0), Health::Healthy);
        assert_eq!(Health::of_efficiency(75.0), Health::Watch);
        assert_eq!(Health::of_efficiency(55.0), Health::Critical);
    }

    #[test]
    fn test_group_health() {
        let m = GroupMetrics {
            wip: 9,
            aging_count: 1,
            risk_score: 20.0,
            overdue_severity_days: 0.5,
            efficiency_score: 80.0,
            ..Default::default()
        };
        let h = GroupHealth::from_metrics(&m);
        assert_eq!(h.wip, Health::Watch);
        assert_eq!(h.efficiency, Health::Healthy);
        assert_eq!(h.worst(), Health::Watch);

        let empty = GroupHealth::from_metrics(&GroupMetrics::default());
        assert_eq!(empty.efficiency, Health::Critical);
        assert_eq!(empty.worst(), Health::Critical);
    }
}
