use std::fmt::Write;

use chrono::Utc;

use crate::filter::kpi_summary;
use crate::models::{ProjectRecord, Role};
use crate::score::{
    build_recommendations, score_projects, EmptyFilterPolicy, TargetSet, NO_DATA_MESSAGE,
};

pub fn build_report(
    role: Role,
    all_rows: &[ProjectRecord],
    filtered: &[ProjectRecord],
    targets: &TargetSet,
    drill: Option<&str>,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Project Portfolio Scorecard");
    let _ = writeln!(
        output,
        "Generated for {} on {} ({} of {} projects selected)",
        role.as_str(),
        Utc::now().date_naive(),
        filtered.len(),
        all_rows.len()
    );

    if matches!(role, Role::Admin | Role::Analyst) {
        write_kpi_sections(&mut output, filtered);
    }

    write_scorecard(&mut output, filtered, targets);
    write_recommendations(&mut output, filtered, targets);

    if role == Role::Admin {
        write_drilldown(&mut output, all_rows, drill);
    }

    output
}

fn write_kpi_sections(output: &mut String, filtered: &[ProjectRecord]) {
    let _ = writeln!(output);
    let _ = writeln!(output, "## KPI Panels");

    let summary = match kpi_summary(filtered) {
        Ok(summary) => summary,
        Err(_) => {
            let _ = writeln!(output, "{NO_DATA_MESSAGE}");
            return;
        }
    };

    let _ = writeln!(output, "### Financial");
    let _ = writeln!(output, "- Total budget: ${:.2}", summary.budget_total);
    let _ = writeln!(output, "- Average deviation: ${:.2}", summary.deviation_mean);
    let _ = writeln!(output, "- Average ROI: {:.2}%", summary.roi_mean * 100.0);

    let _ = writeln!(output, "### Delivery");
    let _ = writeln!(output, "- Total tasks: {}", summary.tasks_total as i64);
    let _ = writeln!(output, "- Automated tasks: {}", summary.automation_total as i64);
    let _ = writeln!(output, "- Defects: {}", summary.defect_total as i64);

    let _ = writeln!(output, "### Quality");
    let _ = writeln!(output, "- Total defects: {}", summary.defect_total as i64);
    let _ = writeln!(output, "- Secure projects: {}", summary.security_total as i64);

    let _ = writeln!(output, "### Growth");
    let _ = writeln!(output, "- Active clients: {}", summary.clients_active);
    let _ = writeln!(output, "- Industries served: {}", summary.industries_active);
}

fn write_scorecard(output: &mut String, filtered: &[ProjectRecord], targets: &TargetSet) {
    let _ = writeln!(output);
    let _ = writeln!(output, "## Balanced Scorecard");

    if filtered.is_empty() {
        let _ = writeln!(output, "{NO_DATA_MESSAGE}");
        return;
    }

    let _ = writeln!(
        output,
        "| Project | Client | ROI | Tasks | Automation | Defects | Growth | OKR |"
    );
    let _ = writeln!(output, "|---|---|---|---|---|---|---|---|");
    for scored in score_projects(filtered, targets) {
        let row = &scored.record;
        let _ = writeln!(
            output,
            "| {} | {} | {:.2} ({}) | {} | {} ({}) | {} ({}) | {} | {} |",
            row.project,
            row.client,
            row.roi,
            scored.roi_band.as_str(),
            row.tasks_total,
            row.automation,
            scored.automation_band.as_str(),
            row.defects,
            scored.defect_band.as_str(),
            row.growth,
            row.okr
        );
    }
}

fn write_recommendations(output: &mut String, filtered: &[ProjectRecord], targets: &TargetSet) {
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recommendations");

    let recommendations = build_recommendations(filtered, targets, EmptyFilterPolicy::Placeholder)
        .unwrap_or_else(|_| vec![NO_DATA_MESSAGE.to_string()]);
    for recommendation in recommendations {
        let _ = writeln!(output, "- {recommendation}");
    }
}

// Drill-down reads the unfiltered dataset so a project stays reachable even
// when the current filters exclude it.
fn write_drilldown(output: &mut String, all_rows: &[ProjectRecord], drill: Option<&str>) {
    let Some(project) = drill else {
        return;
    };

    let _ = writeln!(output);
    let _ = writeln!(output, "## Project Detail: {project}");

    let matches: Vec<&ProjectRecord> = all_rows
        .iter()
        .filter(|row| row.project == project)
        .collect();

    if matches.is_empty() {
        let _ = writeln!(output, "No project named {project}.");
        return;
    }

    for row in matches {
        let completed = row
            .completed_on
            .map(|date| date.to_string())
            .unwrap_or_else(|| "open".to_string());
        let _ = writeln!(
            output,
            "- {} ({}, {}) status {} | budget ${:.2} actual ${:.2} deviation ${:.2} | \
             ROI {:.2} | tasks {} automation {} defects {} | completed {}",
            row.project,
            row.client,
            row.industry,
            row.status,
            row.budget,
            row.actual_cost,
            row.deviation,
            row.roi,
            row.tasks_total,
            row.automation,
            row.defects,
            completed
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_rows() -> Vec<ProjectRecord> {
        let base = ProjectRecord {
            project: String::new(),
            client: "Acme Retail".to_string(),
            industry: "Retail".to_string(),
            budget: 120_000.0,
            actual_cost: 110_000.0,
            deviation: 10_000.0,
            roi: 0.2,
            completed_on: None,
            status: "Closed".to_string(),
            tasks_total: 12,
            automation: 6,
            defects: 1,
            security: 1,
            growth: 1,
            okr: "OKR demo".to_string(),
        };

        let mut first = base.clone();
        first.project = "CRM Rollout".to_string();
        let mut second = base;
        second.project = "Data Lake".to_string();
        second.roi = 0.05;
        vec![first, second]
    }

    #[test]
    fn viewer_report_is_scorecard_only() {
        let rows = sample_rows();
        let report = build_report(
            Role::Viewer,
            &rows,
            &rows,
            &TargetSet::default(),
            Some("CRM Rollout"),
        );
        assert!(report.contains("## Balanced Scorecard"));
        assert!(report.contains("## Recommendations"));
        assert!(!report.contains("## KPI Panels"));
        assert!(!report.contains("## Project Detail"));
    }

    #[test]
    fn analyst_report_adds_kpi_panels_but_not_drilldown() {
        let rows = sample_rows();
        let report = build_report(
            Role::Analyst,
            &rows,
            &rows,
            &TargetSet::default(),
            Some("CRM Rollout"),
        );
        assert!(report.contains("## KPI Panels"));
        assert!(!report.contains("## Project Detail"));
    }

    #[test]
    fn admin_drilldown_uses_the_unfiltered_rows() {
        let rows = sample_rows();
        let filtered: Vec<ProjectRecord> = rows
            .iter()
            .filter(|r| r.project == "Data Lake")
            .cloned()
            .collect();
        let report = build_report(
            Role::Admin,
            &rows,
            &filtered,
            &TargetSet::default(),
            Some("CRM Rollout"),
        );
        assert!(report.contains("## Project Detail: CRM Rollout"));
        assert!(report.contains("status Closed"));
    }

    #[test]
    fn empty_filtered_set_renders_placeholders() {
        let rows = sample_rows();
        let report = build_report(Role::Admin, &rows, &[], &TargetSet::default(), None);
        assert!(report.contains(NO_DATA_MESSAGE));
        assert!(!report.contains("NaN"));
    }

    #[test]
    fn unknown_drill_project_is_reported() {
        let rows = sample_rows();
        let report = build_report(
            Role::Admin,
            &rows,
            &rows,
            &TargetSet::default(),
            Some("Ghost Project"),
        );
        assert!(report.contains("No project named Ghost Project."));
    }
}
