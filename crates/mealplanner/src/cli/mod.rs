//! Command-line interface over the meal planner database.

mod categories;
mod meals;
mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use tabled::Tabled;
use tracing::info;

use mealplanner::config::DatabaseConfig;
use mealplanner::database::SqliteDatabase;
use mealplanner::seed::{seed, SeedReport};
use mealplanner_core::storage::Database;

pub use output::OutputFormat;

/// Meal planner database tool
#[derive(Debug, clap::Parser)]
#[command(name = "mealplanner")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: Global,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Database file, `:memory:` for a throwaway database.
    /// Overrides MEALPLANNER_DB_PATH.
    #[arg(long, global = true, value_name = "PATH", env = "MEALPLANNER_DB_PATH")]
    pub db: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    pub format: OutputFormat,
}

impl Global {
    /// Environment configuration with the `--db` override applied.
    pub fn database_config(&self) -> Result<DatabaseConfig> {
        let mut config = DatabaseConfig::from_env()?;
        if let Some(path) = &self.db {
            config.path = path.clone();
        }
        Ok(config)
    }
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Create the database or upgrade its schema
    Init,

    /// Count records per store
    Stats,

    /// Insert demo categories, units, items, recipes and a week of meals
    Seed(SeedCommand),

    /// Manage shopping categories
    Categories(categories::CategoriesCommand),

    /// Browse planned meals
    Meals(meals::MealsCommand),
}

#[derive(Debug, clap::Parser)]
#[command(long_about = "Insert the demo data set.

Records whose name already exists are skipped, so the command can be run
repeatedly. Meals are planned for the Monday-to-Sunday week containing
--week-of, leaving days that already have a meal untouched.")]
pub struct SeedCommand {
    /// Any day of the week to plan (defaults to today). Format: YYYY-MM-DD
    #[arg(long, value_name = "DATE")]
    pub week_of: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
struct InitReport {
    path: String,
    schema_version: i64,
}

/// Number of records in each store.
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub categories: u64,
    pub units: u64,
    pub items: u64,
    pub recipes: u64,
    pub meals: u64,
}

pub async fn stats(db: &dyn Database) -> Result<Stats> {
    Ok(Stats {
        categories: db.categories()?.count().await?,
        units: db.units()?.count().await?,
        items: db.items()?.count().await?,
        recipes: db.recipes()?.count().await?,
        meals: db.meals()?.count().await?,
    })
}

#[derive(Tabled)]
struct StatRow {
    #[tabled(rename = "Store")]
    store: &'static str,
    #[tabled(rename = "Records")]
    records: u64,
}

fn render_stats(stats: &Stats) -> String {
    output::table([
        StatRow {
            store: "categories",
            records: stats.categories,
        },
        StatRow {
            store: "units",
            records: stats.units,
        },
        StatRow {
            store: "items",
            records: stats.items,
        },
        StatRow {
            store: "recipes",
            records: stats.recipes,
        },
        StatRow {
            store: "meals",
            records: stats.meals,
        },
    ])
}

fn render_seed(report: &SeedReport) -> String {
    let mut lines: Vec<String> = report
        .created
        .iter()
        .map(|(store, count)| format!("Created {count} {store}"))
        .collect();
    if lines.is_empty() {
        lines.push("Nothing created".to_string());
    }
    if !report.skipped.is_empty() {
        lines.push(format!("Skipped {} existing records", report.skipped.len()));
    }
    lines.join("\n")
}

/// Opens the database, runs `cli.command` and closes it again.
pub async fn run(cli: Cli) -> Result<()> {
    let config = cli.global.database_config()?;
    let path = config.path.display().to_string();
    let db = SqliteDatabase::sqlite(config);

    db.initialize()
        .await
        .with_context(|| format!("Failed to open database at {path}"))?;
    info!(path = %path, "Database opened");

    let outcome = dispatch(cli.command, &db, &cli.global, &path).await;
    db.close().await?;
    outcome
}

async fn dispatch(
    command: Commands,
    db: &SqliteDatabase,
    global: &Global,
    path: &str,
) -> Result<()> {
    match command {
        Commands::Init => {
            let report = InitReport {
                path: path.to_string(),
                schema_version: db.handle()?.schema_version().await?,
            };
            global.format.print(&report, |r| {
                format!("Database {} at schema version {}", r.path, r.schema_version)
            })
        }
        Commands::Stats => {
            let stats = stats(db).await?;
            global.format.print(&stats, render_stats)
        }
        Commands::Seed(cmd) => {
            let week_of = cmd.week_of.unwrap_or_else(|| Local::now().date_naive());
            let report = seed(db, week_of).await?;
            info!(created = report.total_created(), "Seeding finished");
            global.format.print(&report, render_seed)
        }
        Commands::Categories(cmd) => categories::run(cmd, db, global).await,
        Commands::Meals(cmd) => meals::run(cmd, db, global).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, Parser};

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "mealplanner",
            "meals",
            "list",
            "--from",
            "2024-06-10",
            "--to",
            "2024-06-16",
            "--format",
            "json",
            "--db",
            ":memory:",
        ])
        .unwrap();

        assert_eq!(cli.global.format, OutputFormat::Json);
        assert_eq!(cli.global.db, Some(PathBuf::from(":memory:")));
        assert!(matches!(
            cli.command,
            Commands::Meals(meals::MealsCommand {
                action: meals::MealsAction::List { .. }
            })
        ));
    }

    #[test]
    fn test_invalid_date_is_rejected() {
        let result = Cli::try_parse_from(["mealplanner", "seed", "--week-of", "next week"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_render_seed_summarizes_report() {
        let mut report = SeedReport::default();
        assert_eq!(render_seed(&report), "Nothing created");

        report.created.insert("categories", 5);
        report.skipped.push("recipe lentil soup".to_string());
        assert_eq!(
            render_seed(&report),
            "Created 5 categories\nSkipped 1 existing records"
        );
    }

    #[test]
    fn test_render_stats_lists_every_store() {
        let rendered = render_stats(&Stats {
            categories: 5,
            units: 4,
            items: 11,
            recipes: 3,
            meals: 7,
        });

        for (store, count) in [
            ("categories", "5"),
            ("units", "4"),
            ("items", "11"),
            ("recipes", "3"),
            ("meals", "7"),
        ] {
            let row = rendered.lines().find(|l| l.contains(store)).unwrap();
            assert!(row.contains(count), "{store} row: {row}");
        }
    }

    #[tokio::test]
    async fn test_run_against_in_memory_sqlite() {
        let cli = Cli::try_parse_from(["mealplanner", "--db", ":memory:", "stats"]).unwrap();
        assert_eq!(
            cli.global.database_config().unwrap().path,
            PathBuf::from(":memory:")
        );

        run(cli).await.unwrap();
    }

    #[tokio::test]
    async fn test_stats_after_seed() {
        let db = SqliteDatabase::sqlite(DatabaseConfig::in_memory());
        db.initialize().await.unwrap();
        let week_of = NaiveDate::from_ymd_opt(2024, 6, 12).unwrap();

        seed(&db, week_of).await.unwrap();

        assert_eq!(
            stats(&db).await.unwrap(),
            Stats {
                categories: 5,
                units: 5,
                items: 11,
                recipes: 3,
                meals: 7,
            }
        );
        db.close().await.unwrap();
    }
}
