use serde::Deserialize;

use crate::error::EngineError;
use crate::filter::{aggregate, AggregateOp, Metric};
use crate::models::{ProjectRecord, ScoredProject};

pub const NO_DATA_MESSAGE: &str = "No projects match the current filters.";
pub const ALL_ON_TARGET_MESSAGE: &str = "All key indicators meet target.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ScoreBand {
    BelowTarget,
    Warning,
    OnTarget,
    Unscored,
}

impl ScoreBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreBand::BelowTarget => "below-target",
            ScoreBand::Warning => "warning",
            ScoreBand::OnTarget => "on-target",
            ScoreBand::Unscored => "unscored",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Maximize,
    Minimize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetSet {
    pub roi_target: f64,
    pub automation_target: f64,
    pub defect_target: f64,
}

impl Default for TargetSet {
    fn default() -> Self {
        TargetSet {
            roi_target: 0.15,
            automation_target: 5.0,
            defect_target: 2.0,
        }
    }
}

pub fn classify(value: f64, target: f64, direction: Direction) -> ScoreBand {
    if !value.is_finite() {
        return ScoreBand::Unscored;
    }

    match direction {
        Direction::Maximize => {
            if value >= target {
                ScoreBand::OnTarget
            } else if value >= target * 0.7 {
                ScoreBand::Warning
            } else {
                ScoreBand::BelowTarget
            }
        }
        Direction::Minimize => {
            if value <= target {
                ScoreBand::OnTarget
            } else if value <= target * 1.5 {
                ScoreBand::Warning
            } else {
                ScoreBand::BelowTarget
            }
        }
    }
}

// Each metric is classified on its own; bands are never folded into a
// composite score.
pub fn score_projects(rows: &[ProjectRecord], targets: &TargetSet) -> Vec<ScoredProject> {
    rows.iter()
        .map(|row| ScoredProject {
            record: row.clone(),
            roi_band: classify(row.roi, targets.roi_target, Direction::Maximize),
            automation_band: classify(
                row.automation as f64,
                targets.automation_target,
                Direction::Maximize,
            ),
            defect_band: classify(row.defects as f64, targets.defect_target, Direction::Minimize),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyFilterPolicy {
    #[default]
    Placeholder,
    Fail,
}

pub fn build_recommendations(
    rows: &[ProjectRecord],
    targets: &TargetSet,
    policy: EmptyFilterPolicy,
) -> Result<Vec<String>, EngineError> {
    if rows.is_empty() {
        return match policy {
            EmptyFilterPolicy::Placeholder => Ok(vec![NO_DATA_MESSAGE.to_string()]),
            EmptyFilterPolicy::Fail => Err(EngineError::EmptyDataset),
        };
    }

    let roi_mean = aggregate(rows, Metric::Roi, AggregateOp::Mean)?;
    let defect_mean = aggregate(rows, Metric::Defects, AggregateOp::Mean)?;
    let automation_mean = aggregate(rows, Metric::Automation, AggregateOp::Mean)?;

    let mut recommendations = Vec::new();
    if roi_mean < targets.roi_target {
        recommendations.push("ROI below target.".to_string());
    }
    if defect_mean > targets.defect_target {
        recommendations.push("Too many average defects.".to_string());
    }
    if automation_mean < targets.automation_target {
        recommendations.push("Average automation is low.".to_string());
    }

    if recommendations.is_empty() {
        recommendations.push(ALL_ON_TARGET_MESSAGE.to_string());
    }

    Ok(recommendations)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_portfolio() -> Vec<ProjectRecord> {
        let base = ProjectRecord {
            project: String::new(),
            client: "Acme Retail".to_string(),
            industry: "Retail".to_string(),
            budget: 50_000.0,
            actual_cost: 48_000.0,
            deviation: 2_000.0,
            roi: 0.0,
            completed_on: None,
            status: "Closed".to_string(),
            tasks_total: 10,
            automation: 0,
            defects: 0,
            security: 1,
            growth: 1,
            okr: "OKR demo".to_string(),
        };

        let mut rows = Vec::new();
        for (name, roi, defects, automation) in [
            ("CRM Rollout", 0.10, 1, 6),
            ("Billing Revamp", 0.20, 3, 4),
            ("Data Lake", 0.05, 2, 5),
        ] {
            let mut row = base.clone();
            row.project = name.to_string();
            row.roi = roi;
            row.defects = defects;
            row.automation = automation;
            rows.push(row);
        }
        rows
    }

    #[test]
    fn maximize_boundaries() {
        let target = 0.15;
        assert_eq!(classify(target, target, Direction::Maximize), ScoreBand::OnTarget);
        assert_eq!(classify(0.7 * target, target, Direction::Maximize), ScoreBand::Warning);
        assert_eq!(classify(0.104, target, Direction::Maximize), ScoreBand::BelowTarget);
        assert_eq!(classify(0.30, target, Direction::Maximize), ScoreBand::OnTarget);
    }

    #[test]
    fn minimize_boundaries() {
        let target = 2.0;
        assert_eq!(classify(2.0, target, Direction::Minimize), ScoreBand::OnTarget);
        assert_eq!(classify(3.0, target, Direction::Minimize), ScoreBand::Warning);
        assert_eq!(classify(3.5, target, Direction::Minimize), ScoreBand::BelowTarget);
        assert_eq!(classify(0.0, target, Direction::Minimize), ScoreBand::OnTarget);
    }

    #[test]
    fn bands_are_ordered_for_monotonicity_checks() {
        assert!(ScoreBand::BelowTarget < ScoreBand::Warning);
        assert!(ScoreBand::Warning < ScoreBand::OnTarget);
    }

    #[test]
    fn classify_is_deterministic() {
        for _ in 0..3 {
            assert_eq!(classify(0.12, 0.15, Direction::Maximize), ScoreBand::Warning);
        }
    }

    #[test]
    fn non_finite_values_are_unscored() {
        assert_eq!(classify(f64::NAN, 0.15, Direction::Maximize), ScoreBand::Unscored);
        assert_eq!(classify(f64::INFINITY, 2.0, Direction::Minimize), ScoreBand::Unscored);
    }

    #[test]
    fn roi_bands_for_sample_portfolio() {
        let rows = sample_portfolio();
        let scored = score_projects(&rows, &TargetSet::default());
        // 0.10 < 0.7 * 0.15, 0.20 >= 0.15, 0.05 < 0.7 * 0.15
        assert_eq!(scored[0].roi_band, ScoreBand::BelowTarget);
        assert_eq!(scored[1].roi_band, ScoreBand::OnTarget);
        assert_eq!(scored[2].roi_band, ScoreBand::BelowTarget);
    }

    #[test]
    fn recommendations_fire_only_on_missed_aggregates() {
        let rows = sample_portfolio();
        // mean roi 0.1167 < 0.15; mean defects 2.0 not > 2; mean automation 5.0 not < 5
        let recs =
            build_recommendations(&rows, &TargetSet::default(), EmptyFilterPolicy::default())
                .unwrap();
        assert_eq!(recs, vec!["ROI below target.".to_string()]);
    }

    #[test]
    fn all_rules_fire_when_every_aggregate_misses() {
        let mut rows = sample_portfolio();
        for row in rows.iter_mut() {
            row.roi = 0.01;
            row.defects = 9;
            row.automation = 1;
        }
        let recs =
            build_recommendations(&rows, &TargetSet::default(), EmptyFilterPolicy::default())
                .unwrap();
        assert_eq!(
            recs,
            vec![
                "ROI below target.".to_string(),
                "Too many average defects.".to_string(),
                "Average automation is low.".to_string(),
            ]
        );
    }

    #[test]
    fn healthy_portfolio_reports_all_on_target() {
        let mut rows = sample_portfolio();
        for row in rows.iter_mut() {
            row.roi = 0.25;
            row.defects = 1;
            row.automation = 8;
        }
        let recs =
            build_recommendations(&rows, &TargetSet::default(), EmptyFilterPolicy::default())
                .unwrap();
        assert_eq!(recs, vec![ALL_ON_TARGET_MESSAGE.to_string()]);
    }

    #[test]
    fn empty_rows_default_to_placeholder_message() {
        let recs = build_recommendations(&[], &TargetSet::default(), EmptyFilterPolicy::default())
            .unwrap();
        assert_eq!(recs, vec![NO_DATA_MESSAGE.to_string()]);
    }

    #[test]
    fn empty_rows_fail_when_configured() {
        let err = build_recommendations(&[], &TargetSet::default(), EmptyFilterPolicy::Fail)
            .unwrap_err();
        assert!(matches!(err, EngineError::EmptyDataset));
    }
}
