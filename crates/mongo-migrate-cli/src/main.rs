//! mongo-migrate CLI - versioned, reversible MongoDB collection migrations.

mod migrations;

use clap::{Parser, Subcommand};
use dialoguer::{Confirm, Select};
use mongo_migrate::{
    BatchReport, BatchStatus, CollectionRegistry, Config, MigrateError, MigrationRequest,
    Orchestrator, Result, RunOptions, StorageConfig,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;

#[derive(Parser)]
#[command(name = "mongo-migrate")]
#[command(about = "Versioned, reversible MongoDB collection migrations")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run migrations on multiple collections and references
    Migrate {
        /// Collection name with optional reference, e.g. users or users:REF
        #[arg(required = true, value_name = "COLLECTION[:REFERENCE]")]
        collections: Vec<String>,

        /// Force run migration
        #[arg(short, long)]
        force: bool,

        /// Run migration on all documents
        #[arg(short, long)]
        all: bool,
    },

    /// Roll back migrations on multiple collections and references
    Rollback {
        /// Collection name with optional reference, e.g. users or users:REF
        #[arg(required = true, value_name = "COLLECTION[:REFERENCE]")]
        collections: Vec<String>,

        /// Force rollback
        #[arg(short, long)]
        force: bool,

        /// Roll back all migrations
        #[arg(short, long)]
        all: bool,
    },

    /// Browse migration units interactively and run one
    ListMigrations {
        /// Force run migration
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format)
        .map_err(MigrateError::Config)?;

    let config = Config::load(&cli.config)?;
    let storage = config.storage.clone();

    let orchestrator = Orchestrator::new(
        config,
        CollectionRegistry::with_builtins(),
        migrations::catalog(),
    );

    match cli.command {
        Commands::Migrate {
            collections,
            force,
            all,
        } => {
            let requests = parse_requests(&collections);
            let report = orchestrator
                .migrate(requests, RunOptions { force, all })
                .await?;
            print_report(&report);
            Ok(report_exit_code(&report))
        }

        Commands::Rollback {
            collections,
            force,
            all,
        } => {
            let requests = parse_requests(&collections);
            let report = orchestrator
                .rollback(requests, RunOptions { force, all }, || {
                    Confirm::new()
                        .with_prompt(
                            "Are you sure you want to rollback? The previous data will be lost",
                        )
                        .default(false)
                        .interact()
                        .map_err(prompt_error)
                })
                .await?;
            print_report(&report);
            Ok(report_exit_code(&report))
        }

        Commands::ListMigrations { force } => {
            list_migrations(&orchestrator, &storage, force).await
        }
    }
}

fn parse_requests(collections: &[String]) -> Vec<MigrationRequest> {
    collections
        .iter()
        .map(|arg| MigrationRequest::parse(arg))
        .collect()
}

fn print_report(report: &BatchReport) {
    match report.status {
        BatchStatus::NothingToDo => {
            println!("No migrations found for the requested collections");
        }
        BatchStatus::Aborted => {
            println!("Rollback aborted by the user");
        }
        status => {
            println!("\n{} batch {}", report.operation, status);
            for outcome in &report.outcomes {
                match &outcome.error {
                    None => println!("  ok      {}:{}", outcome.collection, outcome.reference),
                    Some(e) => println!(
                        "  failed  {}:{} ({})",
                        outcome.collection, outcome.reference, e
                    ),
                }
            }
        }
    }
}

fn report_exit_code(report: &BatchReport) -> ExitCode {
    if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Interactive browser: collection, then unit, then run its migrate.
async fn list_migrations(
    orchestrator: &Orchestrator,
    storage: &StorageConfig,
    force: bool,
) -> Result<ExitCode> {
    let root = &storage.migrations_root;
    if !root.is_dir() {
        println!("No migration scripts found");
        return Ok(ExitCode::SUCCESS);
    }

    let mut collections = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            collections.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    collections.sort();

    if collections.is_empty() {
        println!("No migration scripts found");
        return Ok(ExitCode::SUCCESS);
    }

    let selected = Select::new()
        .with_prompt("Select a collection to list migration scripts")
        .items(&collections)
        .default(0)
        .interact()
        .map_err(prompt_error)?;
    let collection = &collections[selected];

    let mut units = Vec::new();
    for entry in std::fs::read_dir(root.join(collection))? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            units.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    units.sort();

    if units.is_empty() {
        println!("No migration scripts found for {collection}");
        return Ok(ExitCode::SUCCESS);
    }

    let chosen = Select::new()
        .with_prompt("Select a migration script to run")
        .items(&units)
        .default(0)
        .interact()
        .map_err(prompt_error)?;

    orchestrator
        .run_single(collection, &units[chosen], RunOptions { force, all: false })
        .await?;
    println!("Migration completed");
    Ok(ExitCode::SUCCESS)
}

fn prompt_error(e: dialoguer::Error) -> MigrateError {
    MigrateError::Io(std::io::Error::other(e.to_string()))
}

fn setup_logging(verbosity: &str, format: &str) -> std::result::Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    Ok(())
}
