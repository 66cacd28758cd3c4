use std::collections::HashSet;
use std::str::FromStr;

use crate::error::EngineError;
use crate::models::{KpiSummary, ProjectRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Project,
    Client,
    Industry,
}

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Project => "project",
            Dimension::Client => "client",
            Dimension::Industry => "industry",
        }
    }

    fn value_of<'a>(&self, record: &'a ProjectRecord) -> &'a str {
        match self {
            Dimension::Project => &record.project,
            Dimension::Client => &record.client,
            Dimension::Industry => &record.industry,
        }
    }
}

impl FromStr for Dimension {
    type Err = EngineError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "project" => Ok(Dimension::Project),
            "client" => Ok(Dimension::Client),
            "industry" => Ok(Dimension::Industry),
            other => Err(EngineError::InvalidDimension(other.to_string())),
        }
    }
}

pub fn distinct_values(rows: &[ProjectRecord], dimension: Dimension) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut values = Vec::new();

    for row in rows {
        let value = dimension.value_of(row);
        if seen.insert(value) {
            values.push(value.to_string());
        }
    }

    values
}

#[derive(Debug, Clone)]
pub struct FilterSpec {
    pub projects: HashSet<String>,
    pub clients: HashSet<String>,
    pub industries: HashSet<String>,
}

impl FilterSpec {
    pub fn select_all(rows: &[ProjectRecord]) -> Self {
        FilterSpec {
            projects: rows.iter().map(|r| r.project.clone()).collect(),
            clients: rows.iter().map(|r| r.client.clone()).collect(),
            industries: rows.iter().map(|r| r.industry.clone()).collect(),
        }
    }

    fn matches(&self, record: &ProjectRecord) -> bool {
        self.projects.contains(&record.project)
            && self.clients.contains(&record.client)
            && self.industries.contains(&record.industry)
    }
}

// An empty selection for a dimension admits no rows, matching the source
// dashboard's multiselect contract.
pub fn apply_filter(rows: &[ProjectRecord], spec: &FilterSpec) -> Vec<ProjectRecord> {
    rows.iter().filter(|row| spec.matches(row)).cloned().collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Budget,
    ActualCost,
    Deviation,
    Roi,
    TasksTotal,
    Automation,
    Defects,
    Security,
    Growth,
}

impl Metric {
    fn value_of(&self, record: &ProjectRecord) -> f64 {
        match self {
            Metric::Budget => record.budget,
            Metric::ActualCost => record.actual_cost,
            Metric::Deviation => record.deviation,
            Metric::Roi => record.roi,
            Metric::TasksTotal => record.tasks_total as f64,
            Metric::Automation => record.automation as f64,
            Metric::Defects => record.defects as f64,
            Metric::Security => record.security as f64,
            Metric::Growth => record.growth as f64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOp {
    Sum,
    Mean,
    CountDistinct,
}

pub fn aggregate(
    rows: &[ProjectRecord],
    metric: Metric,
    op: AggregateOp,
) -> Result<f64, EngineError> {
    match op {
        AggregateOp::Sum => Ok(rows.iter().map(|row| metric.value_of(row)).sum()),
        AggregateOp::Mean => {
            if rows.is_empty() {
                return Err(EngineError::EmptyAggregation);
            }
            let total: f64 = rows.iter().map(|row| metric.value_of(row)).sum();
            Ok(total / rows.len() as f64)
        }
        AggregateOp::CountDistinct => {
            let distinct: HashSet<u64> = rows
                .iter()
                .map(|row| metric.value_of(row).to_bits())
                .collect();
            Ok(distinct.len() as f64)
        }
    }
}

pub fn kpi_summary(rows: &[ProjectRecord]) -> Result<KpiSummary, EngineError> {
    Ok(KpiSummary {
        budget_total: aggregate(rows, Metric::Budget, AggregateOp::Sum)?,
        deviation_mean: aggregate(rows, Metric::Deviation, AggregateOp::Mean)?,
        roi_mean: aggregate(rows, Metric::Roi, AggregateOp::Mean)?,
        tasks_total: aggregate(rows, Metric::TasksTotal, AggregateOp::Sum)?,
        automation_total: aggregate(rows, Metric::Automation, AggregateOp::Sum)?,
        defect_total: aggregate(rows, Metric::Defects, AggregateOp::Sum)?,
        security_total: aggregate(rows, Metric::Security, AggregateOp::Sum)?,
        clients_active: distinct_values(rows, Dimension::Client).len(),
        industries_active: distinct_values(rows, Dimension::Industry).len(),
    })
}
