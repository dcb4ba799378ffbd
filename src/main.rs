//! Command-line interface for mongo2crate
//!
//! # Usage Examples
//!
//! ## Table creation
//! ```bash
//! mongo2crate create-table \
//!   --source-uri mongodb://localhost:27017 --source-database app \
//!   --collection Organizations --config organizations.yaml --print-only
//!
//! # From a schema file instead of the collection validator
//! mongo2crate create-table --collection Organizations --schema-file organizations.json
//! ```
//!
//! ## Initial scan
//! ```bash
//! mongo2crate full \
//!   --source-uri mongodb://localhost:27017 --source-database app \
//!   --collection Organizations \
//!   --crate-sql-endpoint http://localhost:4200/_sql --crate-auth crate:secret
//! ```
//!
//! ## Change stream
//! ```bash
//! mongo2crate incremental \
//!   --source-uri mongodb://localhost:27017 --source-database app \
//!   --collection Organizations --resume-after gmWhN4...== --idle-timeout 10m
//! ```
//!
//! The resume token to pass to `--resume-after` is logged after every batch.

use anyhow::Context;
use clap::{Parser, Subcommand};
use crate_schema::SchemaConverter;
use crate_sink::{CrateResponse, Statement};
use mongo2crate::{parse_duration, CrateOpts, SourceOpts, TableConfig};
use mongo2crate_mongodb_changestream_source::{
    connect, get_collection_schema, run_incremental_sync, run_initial_scan, ChangeApplier,
    ChangeStreamOpts,
};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use sync_core::TracingObserver;

#[derive(Parser)]
#[command(name = "mongo2crate")]
#[command(about = "Replicate MongoDB collections into CrateDB tables")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the CrateDB table from the collection's $jsonSchema validator
    CreateTable {
        /// Source database connection options
        #[command(flatten)]
        from_opts: SourceOpts,

        /// Target CrateDB options
        #[command(flatten)]
        to_opts: CrateOpts,

        /// Table config (omit, rename, overrides, strict mode)
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Read the $jsonSchema from this JSON file instead of the collection
        #[arg(long, value_name = "PATH")]
        schema_file: Option<PathBuf>,

        /// Print the table definition without executing it
        #[arg(long)]
        print_only: bool,
    },

    /// Copy every document of the collection into CrateDB
    Full {
        /// Source database connection options
        #[command(flatten)]
        from_opts: SourceOpts,

        /// Target CrateDB options
        #[command(flatten)]
        to_opts: CrateOpts,

        /// Table config (rename rules must match the ones the table was created with)
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Apply the collection's change stream to CrateDB
    Incremental {
        /// Source database connection options
        #[command(flatten)]
        from_opts: SourceOpts,

        /// Target CrateDB options
        #[command(flatten)]
        to_opts: CrateOpts,

        /// Table config (rename rules must match the ones the table was created with)
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Resume after this token, as logged by an earlier run
        #[arg(long)]
        resume_after: Option<String>,

        /// Watch inserts only and write every batch as one bulk insert
        #[arg(long)]
        immutable: bool,

        /// Stop after this long without changes (e.g. "300", "30m", "2h")
        #[arg(long, value_parser = parse_duration)]
        idle_timeout: Option<Duration>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::CreateTable {
            from_opts,
            to_opts,
            config,
            schema_file,
            print_only,
        } => {
            let table = TableConfig::load(config.as_deref())?;
            run_create_table(from_opts, to_opts, table, schema_file, print_only).await?;
        }
        Commands::Full {
            from_opts,
            to_opts,
            config,
        } => {
            let table = TableConfig::load(config.as_deref())?;
            run_full_sync(from_opts, to_opts, table).await?;
        }
        Commands::Incremental {
            from_opts,
            to_opts,
            config,
            resume_after,
            immutable,
            idle_timeout,
        } => {
            let table = TableConfig::load(config.as_deref())?;
            let stream_opts = ChangeStreamOpts {
                batch_size: to_opts.batch_size,
                resume_after,
                immutable,
                idle_timeout,
            };
            run_incremental(from_opts, to_opts, table, stream_opts).await?;
        }
    }

    Ok(())
}

async fn load_schema(
    from_opts: &SourceOpts,
    schema_file: Option<PathBuf>,
) -> anyhow::Result<Value> {
    if let Some(path) = schema_file {
        tracing::info!("Reading schema from {}", path.display());
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read schema file {}", path.display()))?;
        return serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse schema file {}", path.display()));
    }
    let db = connect(&from_opts.into()).await?;
    let collection = &from_opts.collection;
    get_collection_schema(&db, collection)
        .await?
        .with_context(|| format!("Collection '{collection}' has no $jsonSchema validator"))
}

async fn run_create_table(
    from_opts: SourceOpts,
    to_opts: CrateOpts,
    table: TableConfig,
    schema_file: Option<PathBuf>,
    print_only: bool,
) -> anyhow::Result<()> {
    let schema = load_schema(&from_opts, schema_file).await?;
    let qualified_name = table.qualified_name(&to_opts.crate_schema, &from_opts.collection);
    let ddl = SchemaConverter::new(table.convert)
        .with_observer(Arc::new(TracingObserver))
        .convert(&schema, &qualified_name)?;

    if print_only {
        println!("{ddl}");
        return Ok(());
    }

    let client = to_opts.client()?;
    match client.execute(&Statement::sql(ddl)).await? {
        CrateResponse::Error(error) => {
            anyhow::bail!("Failed to create {qualified_name}: {}", error.error.message)
        }
        _ => tracing::info!("Created table {}", qualified_name),
    }
    Ok(())
}

async fn run_full_sync(
    from_opts: SourceOpts,
    to_opts: CrateOpts,
    table: TableConfig,
) -> anyhow::Result<()> {
    let qualified_name = table.qualified_name(&to_opts.crate_schema, &from_opts.collection);
    tracing::info!("Starting full sync of '{}' to {}", from_opts.collection, qualified_name);

    let db = connect(&(&from_opts).into()).await?;
    let collection = db.collection::<bson::Document>(&from_opts.collection);
    let applier = ChangeApplier::new(to_opts.client()?, qualified_name, table.document_mapper()?);

    let outcome = run_initial_scan(&applier, &collection, to_opts.batch_size).await?;
    tracing::info!("Full sync completed: {}", outcome);
    Ok(())
}

async fn run_incremental(
    from_opts: SourceOpts,
    to_opts: CrateOpts,
    table: TableConfig,
    stream_opts: ChangeStreamOpts,
) -> anyhow::Result<()> {
    let qualified_name = table.qualified_name(&to_opts.crate_schema, &from_opts.collection);
    tracing::info!(
        "Starting incremental sync of '{}' to {}",
        from_opts.collection,
        qualified_name
    );

    let db = connect(&(&from_opts).into()).await?;
    let collection = db.collection::<bson::Document>(&from_opts.collection);
    let applier = ChangeApplier::new(to_opts.client()?, qualified_name, table.document_mapper()?)
        .with_batch_inserts(table.batch_inserts);

    let outcome = run_incremental_sync(&applier, &collection, &stream_opts).await?;
    tracing::info!("Incremental sync stopped: {}", outcome);
    Ok(())
}
