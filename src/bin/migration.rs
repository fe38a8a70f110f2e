use clap::{Parser, Subcommand};
use migrations::Migrator;
use sea_orm::{ConnectOptions, Database, DbErr};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;
use tracing::info;

/// Applies or rolls back the database schema
#[derive(Debug, Parser)]
#[command(name = "migration", version, about)]
struct Cli {
    /// Database to migrate; falls back to DATABASE_URL, then APP__DATABASE_URL
    #[arg(long)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Option<MigrationCommand>,
}

#[derive(Debug, Subcommand)]
enum MigrationCommand {
    /// Apply pending migrations (default)
    Up {
        /// Apply at most this many migrations
        #[arg(short, long)]
        steps: Option<u32>,
    },
    /// Roll back applied migrations
    Down {
        #[arg(short, long, default_value_t = 1)]
        steps: u32,
    },
    /// Drop every table and reapply all migrations
    Fresh,
    /// Show which migrations have been applied
    Status,
}

fn resolve_database_url(cli: &Cli) -> String {
    cli.database_url
        .clone()
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .or_else(|| std::env::var("APP__DATABASE_URL").ok())
        .unwrap_or_else(|| "sqlite://smallbiz.db?mode=rwc".to_string())
}

#[tokio::main]
async fn main() -> Result<(), DbErr> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();
    let database_url = resolve_database_url(&cli);

    let mut options = ConnectOptions::new(database_url);
    options
        .max_connections(2)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    let db = Database::connect(options).await?;

    match cli.command.unwrap_or(MigrationCommand::Up { steps: None }) {
        MigrationCommand::Up { steps } => {
            info!("Applying migrations");
            Migrator::up(&db, steps).await?;
        }
        MigrationCommand::Down { steps } => {
            info!(steps, "Rolling back migrations");
            Migrator::down(&db, Some(steps)).await?;
        }
        MigrationCommand::Fresh => {
            info!("Dropping all tables and reapplying migrations");
            Migrator::fresh(&db).await?;
        }
        MigrationCommand::Status => {
            Migrator::status(&db).await?;
            return Ok(());
        }
    }

    info!("Migration completed successfully");
    Ok(())
}
