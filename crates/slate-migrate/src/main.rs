//! slate-migrate CLI
//!
//! Inspects a database and runs raw statements against it.

use clap::{Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use slate_migrate::Migrator;
use slate_orm::{Engine, EngineOptions};

/// Inspect slate databases.
#[derive(Parser)]
#[command(name = "slate-migrate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL.
    #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite:slate.db")]
    database: String,

    /// Maximum number of pooled connections.
    #[arg(long, env = "SLATE_MAX_CONNECTIONS", default_value_t = 5)]
    max_connections: u32,

    /// Enable verbose output, including every executed statement.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the tables of the database.
    Tables,

    /// Show the columns of a table without reading any row.
    Columns {
        /// Table name.
        table: String,
    },

    /// Execute one SQL statement and print the affected row count.
    Exec {
        /// Statement to execute.
        sql: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let options = EngineOptions::new(cli.database)
        .max_connections(cli.max_connections)
        .debug(cli.verbose);
    let engine = Engine::connect(&options).await?;
    let migrator = Migrator::new(&engine);

    match cli.command {
        Commands::Tables => {
            let tables = migrator.tables().await?;
            if tables.is_empty() {
                info!("No tables.");
            }
            for table in tables {
                println!("{table}");
            }
        }

        Commands::Columns { table } => {
            for column in migrator.columns(&table).await? {
                println!("{column}");
            }
        }

        Commands::Exec { sql } => {
            let affected = migrator.execute(&sql).await?;
            println!("{affected} row(s) affected");
        }
    }

    engine.close().await;
    Ok(())
}
