use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgGroup, Args, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

mod db;
mod error;
mod filter;
mod models;
mod report;
mod score;

use filter::{apply_filter, distinct_values, kpi_summary, Dimension, FilterSpec};
use models::{ProjectRecord, Role, UserStore};
use score::{build_recommendations, score_projects, EmptyFilterPolicy, TargetSet};

#[derive(Parser)]
#[command(name = "portfolio-scorecard")]
#[command(about = "Project portfolio KPI and balanced scorecard reporting", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FilterArgs {
    /// Selected projects; repeat the flag, omit for all
    #[arg(long = "project")]
    projects: Vec<String>,
    /// Selected clients; repeat the flag, omit for all
    #[arg(long = "client")]
    clients: Vec<String>,
    /// Selected industries; repeat the flag, omit for all
    #[arg(long = "industry")]
    industries: Vec<String>,
}

impl FilterArgs {
    fn to_spec(&self, rows: &[ProjectRecord]) -> FilterSpec {
        let mut spec = FilterSpec::select_all(rows);
        if !self.projects.is_empty() {
            spec.projects = self.projects.iter().cloned().collect();
        }
        if !self.clients.is_empty() {
            spec.clients = self.clients.iter().cloned().collect();
        }
        if !self.industries.is_empty() {
            spec.industries = self.industries.iter().cloned().collect();
        }
        spec
    }
}

#[derive(Args)]
struct TargetArgs {
    /// JSON file with roi_target, automation_target and defect_target
    #[arg(long)]
    targets: Option<PathBuf>,
    #[arg(long)]
    roi_target: Option<f64>,
    #[arg(long)]
    automation_target: Option<f64>,
    #[arg(long)]
    defect_target: Option<f64>,
}

impl TargetArgs {
    fn resolve(&self) -> anyhow::Result<TargetSet> {
        let mut targets = match &self.targets {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("cannot read targets from {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("malformed targets in {}", path.display()))?
            }
            None => TargetSet::default(),
        };

        if let Some(value) = self.roi_target {
            targets.roi_target = value;
        }
        if let Some(value) = self.automation_target {
            targets.automation_target = value;
        }
        if let Some(value) = self.defect_target {
            targets.defect_target = value;
        }
        Ok(targets)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the warehouse schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Run the denormalized portfolio query and write the CSV extract
    Extract {
        #[arg(long, default_value = "data_dashboard.csv")]
        out: PathBuf,
    },
    /// List the distinct values of a filter dimension
    Options {
        #[arg(long, default_value = "data_dashboard.csv")]
        data: PathBuf,
        #[arg(long)]
        dimension: String,
    },
    /// Print the KPI panels for the filtered portfolio
    Kpi {
        #[arg(long, default_value = "data_dashboard.csv")]
        data: PathBuf,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Print the scored balanced-scorecard table
    Scorecard {
        #[arg(long, default_value = "data_dashboard.csv")]
        data: PathBuf,
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        targets: TargetArgs,
    },
    /// Print improvement recommendations for the filtered portfolio
    Recommend {
        #[arg(long, default_value = "data_dashboard.csv")]
        data: PathBuf,
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        targets: TargetArgs,
        /// Fail instead of printing a placeholder when no rows match
        #[arg(long, default_value_t = false)]
        fail_on_empty: bool,
    },
    /// Show full detail for one project
    Drill {
        #[arg(long, default_value = "data_dashboard.csv")]
        data: PathBuf,
        #[arg(long)]
        project: String,
    },
    /// Generate a role-gated markdown report
    #[command(group(
        ArgGroup::new("identity")
            .args(["user", "role"])
            .multiple(false)
    ))]
    Report {
        #[arg(long, default_value = "data_dashboard.csv")]
        data: PathBuf,
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        targets: TargetArgs,
        /// User id, resolved to a role via --users
        #[arg(long, requires = "users")]
        user: Option<String>,
        /// JSON file mapping user ids to roles
        #[arg(long)]
        users: Option<PathBuf>,
        #[arg(long, value_enum)]
        role: Option<Role>,
        /// Project name for the drill-down section (admin only)
        #[arg(long)]
        drill: Option<String>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

struct FileUserStore {
    roles: HashMap<String, Role>,
}

impl FileUserStore {
    fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read users from {}", path.display()))?;
        let roles = serde_json::from_str(&raw)
            .with_context(|| format!("malformed user store in {}", path.display()))?;
        Ok(FileUserStore { roles })
    }
}

impl UserStore for FileUserStore {
    fn role_of(&self, user_id: &str) -> Option<Role> {
        self.roles.get(user_id).copied()
    }
}

async fn connect() -> anyhow::Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to the warehouse Postgres instance")?;

    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::InitDb => {
            let pool = connect().await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect().await?;
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Extract { out } => {
            let pool = connect().await?;
            let rows = db::fetch_portfolio(&pool).await?;
            db::write_extract(&out, &rows)?;
            println!("Wrote {} projects to {}.", rows.len(), out.display());
        }
        Commands::Options { data, dimension } => {
            let rows = db::load_extract(&data)?;
            let dimension: Dimension = dimension.parse()?;
            for value in distinct_values(&rows, dimension) {
                println!("{value}");
            }
        }
        Commands::Kpi { data, filters } => {
            let rows = db::load_extract(&data)?;
            let filtered = apply_filter(&rows, &filters.to_spec(&rows));
            match kpi_summary(&filtered) {
                Ok(summary) => {
                    println!("Total budget: ${:.2}", summary.budget_total);
                    println!("Average deviation: ${:.2}", summary.deviation_mean);
                    println!("Average ROI: {:.2}%", summary.roi_mean * 100.0);
                    println!("Total tasks: {}", summary.tasks_total as i64);
                    println!("Automated tasks: {}", summary.automation_total as i64);
                    println!("Defects: {}", summary.defect_total as i64);
                    println!("Secure projects: {}", summary.security_total as i64);
                    println!("Active clients: {}", summary.clients_active);
                    println!("Industries served: {}", summary.industries_active);
                }
                Err(_) => println!("{}", score::NO_DATA_MESSAGE),
            }
        }
        Commands::Scorecard {
            data,
            filters,
            targets,
        } => {
            let rows = db::load_extract(&data)?;
            let targets = targets.resolve()?;
            let filtered = apply_filter(&rows, &filters.to_spec(&rows));

            if filtered.is_empty() {
                println!("{}", score::NO_DATA_MESSAGE);
                return Ok(());
            }

            for scored in score_projects(&filtered, &targets) {
                let row = &scored.record;
                println!(
                    "- {} ({}) ROI {:.2} [{}] | automation {} [{}] | defects {} [{}]",
                    row.project,
                    row.client,
                    row.roi,
                    scored.roi_band.as_str(),
                    row.automation,
                    scored.automation_band.as_str(),
                    row.defects,
                    scored.defect_band.as_str()
                );
            }
        }
        Commands::Recommend {
            data,
            filters,
            targets,
            fail_on_empty,
        } => {
            let rows = db::load_extract(&data)?;
            let targets = targets.resolve()?;
            let filtered = apply_filter(&rows, &filters.to_spec(&rows));
            let policy = if fail_on_empty {
                EmptyFilterPolicy::Fail
            } else {
                EmptyFilterPolicy::Placeholder
            };

            for recommendation in build_recommendations(&filtered, &targets, policy)? {
                println!("- {recommendation}");
            }
        }
        Commands::Drill { data, project } => {
            let rows = db::load_extract(&data)?;
            let matches: Vec<&ProjectRecord> =
                rows.iter().filter(|row| row.project == project).collect();

            if matches.is_empty() {
                println!("No project named {project}.");
                return Ok(());
            }

            for row in matches {
                println!(
                    "- {} ({}, {}) status {} | budget ${:.2} actual ${:.2} | ROI {:.2} | \
                     tasks {} automation {} defects {}",
                    row.project,
                    row.client,
                    row.industry,
                    row.status,
                    row.budget,
                    row.actual_cost,
                    row.roi,
                    row.tasks_total,
                    row.automation,
                    row.defects
                );
            }
        }
        Commands::Report {
            data,
            filters,
            targets,
            user,
            users,
            role,
            drill,
            out,
        } => {
            let rows = db::load_extract(&data)?;
            let targets = targets.resolve()?;
            let filtered = apply_filter(&rows, &filters.to_spec(&rows));

            let role = match (user, users) {
                (Some(user_id), Some(users_path)) => {
                    let store = FileUserStore::load(&users_path)?;
                    store
                        .role_of(&user_id)
                        .with_context(|| format!("unknown user {user_id}"))?
                }
                _ => role.unwrap_or(Role::Viewer),
            };

            let report = report::build_report(role, &rows, &filtered, &targets, drill.as_deref());
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
