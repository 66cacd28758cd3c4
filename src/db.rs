use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::EngineError;
use crate::models::ProjectRecord;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let clients = vec![
        (
            Uuid::parse_str("7b1e2f60-4c5a-4b8e-9f0d-2a6c1e3b5d70")?,
            "Acme Retail",
            "Retail",
        ),
        (
            Uuid::parse_str("1f9c8d2a-63b4-4a1e-bb7f-8e5a0c4d2f91")?,
            "Borealis Bank",
            "Finance",
        ),
        (
            Uuid::parse_str("c4a7e1b8-0d2f-4c6a-8e3b-5f9d7a1c2e40")?,
            "Helios Health",
            "Healthcare",
        ),
    ];

    for (id, name, industry) in clients {
        sqlx::query(
            r#"
            INSERT INTO portfolio.clients (id, name, industry)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO UPDATE
            SET industry = EXCLUDED.industry
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(industry)
        .execute(pool)
        .await?;
    }

    let projects = vec![
        (
            "CRM Rollout",
            "Acme Retail",
            3,
            120_000.0,
            131_000.0,
            Some(0.08),
            NaiveDate::from_ymd_opt(2026, 3, 20),
        ),
        (
            "Billing Revamp",
            "Borealis Bank",
            3,
            250_000.0,
            238_000.0,
            Some(0.21),
            NaiveDate::from_ymd_opt(2026, 5, 11),
        ),
        ("Data Lake", "Acme Retail", 2, 180_000.0, 92_000.0, None, None),
        (
            "Patient Portal",
            "Helios Health",
            2,
            95_000.0,
            61_000.0,
            Some(0.17),
            None,
        ),
    ];

    for (name, client, status_id, budget, actual_cost, roi, completed_on) in projects {
        let client_id: Uuid = sqlx::query("SELECT id FROM portfolio.clients WHERE name = $1")
            .bind(client)
            .fetch_one(pool)
            .await?
            .get("id");

        sqlx::query(
            r#"
            INSERT INTO portfolio.projects
            (id, name, client_id, status_id, budget, actual_cost, final_roi, completed_on)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (name) DO UPDATE
            SET status_id = EXCLUDED.status_id,
                budget = EXCLUDED.budget,
                actual_cost = EXCLUDED.actual_cost,
                final_roi = EXCLUDED.final_roi,
                completed_on = EXCLUDED.completed_on
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(client_id)
        .bind(status_id)
        .bind(budget)
        .bind(actual_cost)
        .bind(roi)
        .bind(completed_on)
        .execute(pool)
        .await?;
    }

    let tasks = vec![
        ("seed-task-001", "CRM Rollout", "Migrate contact data", true),
        ("seed-task-002", "CRM Rollout", "Train sales team", false),
        ("seed-task-003", "Billing Revamp", "Rebuild invoice engine", true),
        ("seed-task-004", "Billing Revamp", "Nightly reconciliation job", true),
        ("seed-task-005", "Data Lake", "Ingest ERP snapshots", true),
        ("seed-task-006", "Data Lake", "Define retention policy", false),
        ("seed-task-007", "Patient Portal", "Appointment scheduling flow", false),
    ];

    for (source_key, project, title, is_automation) in tasks {
        let project_id: Uuid = sqlx::query("SELECT id FROM portfolio.projects WHERE name = $1")
            .bind(project)
            .fetch_one(pool)
            .await?
            .get("id");

        sqlx::query(
            r#"
            INSERT INTO portfolio.tasks (id, project_id, title, is_automation, source_key)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(project_id)
        .bind(title)
        .bind(is_automation)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    let incidents = vec![
        (
            "seed-inc-001",
            "CRM Rollout",
            "Duplicate contacts after migration",
            NaiveDate::from_ymd_opt(2026, 3, 2).context("invalid date")?,
        ),
        (
            "seed-inc-002",
            "CRM Rollout",
            "Pipeline report totals off by one day",
            NaiveDate::from_ymd_opt(2026, 3, 9).context("invalid date")?,
        ),
        (
            "seed-inc-003",
            "Billing Revamp",
            "Rounding error on credit notes",
            NaiveDate::from_ymd_opt(2026, 4, 27).context("invalid date")?,
        ),
    ];

    for (source_key, project, summary, opened_on) in incidents {
        let project_id: Uuid = sqlx::query("SELECT id FROM portfolio.projects WHERE name = $1")
            .bind(project)
            .fetch_one(pool)
            .await?
            .get("id");

        sqlx::query(
            r#"
            INSERT INTO portfolio.incidents (id, project_id, summary, opened_on, source_key)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(project_id)
        .bind(summary)
        .bind(opened_on)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn fetch_portfolio(pool: &PgPool) -> anyhow::Result<Vec<ProjectRecord>> {
    let records = sqlx::query(
        r#"
        SELECT
            pr.name AS project,
            cl.name AS client,
            cl.industry AS industry,
            pr.budget AS budget,
            pr.actual_cost AS actual_cost,
            (pr.budget - pr.actual_cost) AS deviation,
            COALESCE(pr.final_roi, 0) AS roi,
            pr.completed_on AS completed_on,
            st.label AS status,
            COUNT(DISTINCT t.id) AS tasks_total,
            COUNT(DISTINCT t.id) FILTER (WHERE t.is_automation) AS automation,
            COUNT(DISTINCT i.id) AS defects,
            1::BIGINT AS security,
            1::BIGINT AS growth,
            pr.okr AS okr
        FROM portfolio.projects pr
        LEFT JOIN portfolio.clients cl ON cl.id = pr.client_id
        LEFT JOIN portfolio.project_status st ON st.id = pr.status_id
        LEFT JOIN portfolio.tasks t ON t.project_id = pr.id
        LEFT JOIN portfolio.incidents i ON i.project_id = pr.id
        GROUP BY pr.id, pr.name, cl.name, cl.industry, pr.budget, pr.actual_cost,
                 pr.final_roi, pr.completed_on, st.label, pr.okr
        ORDER BY pr.name
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut rows = Vec::new();
    for record in records {
        rows.push(ProjectRecord {
            project: record.get("project"),
            client: record.get("client"),
            industry: record.get("industry"),
            budget: record.get("budget"),
            actual_cost: record.get("actual_cost"),
            deviation: record.get("deviation"),
            roi: record.get("roi"),
            completed_on: record.get("completed_on"),
            status: record.get("status"),
            tasks_total: record.get("tasks_total"),
            automation: record.get("automation"),
            defects: record.get("defects"),
            security: record.get("security"),
            growth: record.get("growth"),
            okr: record.get("okr"),
        });
    }

    Ok(rows)
}

pub fn write_extract(path: &Path, rows: &[ProjectRecord]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("cannot write extract to {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_extract(path: &Path) -> Result<Vec<ProjectRecord>, EngineError> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|err| EngineError::DataUnavailable(format!("{}: {err}", path.display())))?;

    let mut rows = Vec::new();
    for result in reader.deserialize::<ProjectRecord>() {
        let row = result
            .map_err(|err| EngineError::DataUnavailable(format!("{}: {err}", path.display())))?;
        rows.push(row);
    }

    Ok(rows)
}
