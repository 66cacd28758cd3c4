use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::score::ScoreBand;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub project: String,
    pub client: String,
    pub industry: String,
    pub budget: f64,
    pub actual_cost: f64,
    // budget - actual_cost, computed by the extract query, never re-derived here
    pub deviation: f64,
    pub roi: f64,
    pub completed_on: Option<NaiveDate>,
    pub status: String,
    pub tasks_total: i64,
    pub automation: i64,
    pub defects: i64,
    pub security: i64,
    pub growth: i64,
    pub okr: String,
}

#[derive(Debug, Clone)]
pub struct KpiSummary {
    pub budget_total: f64,
    pub deviation_mean: f64,
    pub roi_mean: f64,
    pub tasks_total: f64,
    pub automation_total: f64,
    pub defect_total: f64,
    pub security_total: f64,
    pub clients_active: usize,
    pub industries_active: usize,
}

#[derive(Debug, Clone)]
pub struct ScoredProject {
    pub record: ProjectRecord,
    pub roi_band: ScoreBand,
    pub automation_band: ScoreBand,
    pub defect_band: ScoreBand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Analyst,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Analyst => "analyst",
            Role::Viewer => "viewer",
        }
    }
}

pub trait UserStore {
    fn role_of(&self, user_id: &str) -> Option<Role>;
}
