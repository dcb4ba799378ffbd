//! mongo2crate library
//!
//! Replicates a MongoDB collection into a CrateDB table: the table is
//! created from the collection's `$jsonSchema` validator, existing documents
//! are copied by an initial scan, and the change stream keeps the table up
//! to date afterwards.
//!
//! # Crates
//!
//! - `crate_schema` - `$jsonSchema` to `CREATE TABLE` conversion
//! - `crate_sink` - statements and the CrateDB HTTP client
//! - `mongo2crate_mongodb_changestream_source` - change application, initial
//!   scan and change stream runners
//!
//! # CLI Usage
//!
//! ```bash
//! # Create the table, printing the DDL only
//! mongo2crate create-table --source-uri mongodb://... --source-database app \
//!   --collection Organizations --config organizations.yaml --print-only
//!
//! # Copy existing documents
//! mongo2crate full --source-uri mongodb://... --source-database app --collection Organizations
//!
//! # Follow the change stream from a logged resume token
//! mongo2crate incremental --source-uri mongodb://... --source-database app \
//!   --collection Organizations --resume-after <token>
//! ```

use clap::Parser;
use crate_sink::{CrateClient, CrateConnectionConfig, DryRunClient, HttpCrateClient};
use std::sync::Arc;
use std::time::Duration;

pub mod config;

pub use config::{parse_duration, TableConfig, DEFAULT_CRATE_SCHEMA};

#[derive(Parser, Clone, Debug)]
pub struct CrateOpts {
    /// CrateDB `_sql` endpoint URL
    #[arg(
        long,
        default_value = crate_sink::DEFAULT_SQL_ENDPOINT,
        env = "CRATE_SQL_ENDPOINT"
    )]
    pub crate_sql_endpoint: String,

    /// CrateDB credentials as "user:password"
    #[arg(long, env = "CRATE_AUTH", hide_env_values = true)]
    pub crate_auth: Option<String>,

    /// CrateDB schema the table lives in
    #[arg(long, default_value = DEFAULT_CRATE_SCHEMA)]
    pub crate_schema: String,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    pub crate_timeout_secs: u64,

    /// Documents per batch
    #[arg(long, default_value = "500")]
    pub batch_size: usize,

    /// Dry run mode - log statements instead of executing them
    #[arg(long)]
    pub dry_run: bool,
}

impl CrateOpts {
    pub fn connection_config(&self) -> CrateConnectionConfig {
        CrateConnectionConfig {
            sql_endpoint: self.crate_sql_endpoint.clone(),
            auth: self.crate_auth.clone(),
            timeout: Duration::from_secs(self.crate_timeout_secs),
        }
    }

    /// The client statements go through: HTTP, or a logger in dry-run mode.
    pub fn client(&self) -> anyhow::Result<Arc<dyn CrateClient>> {
        if self.dry_run {
            tracing::info!("Running in dry-run mode - no data will be written");
            return Ok(Arc::new(DryRunClient));
        }
        let client = HttpCrateClient::new(&self.connection_config())?;
        tracing::debug!("Using CrateDB endpoint {}", client.endpoint());
        Ok(Arc::new(client))
    }
}

#[derive(Parser, Clone, Debug)]
pub struct SourceOpts {
    /// MongoDB connection string
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub source_uri: String,

    /// MongoDB database. Defaults to the one in the connection string.
    #[arg(long, env = "MONGODB_DATABASE")]
    pub source_database: Option<String>,

    /// Collection to replicate
    #[arg(long)]
    pub collection: String,
}

// CLI type → MongoDB source library type conversion
impl From<&SourceOpts> for mongo2crate_mongodb_changestream_source::SourceOpts {
    fn from(opts: &SourceOpts) -> Self {
        Self {
            source_uri: opts.source_uri.clone(),
            source_database: opts.source_database.clone(),
            collection: opts.collection.clone(),
        }
    }
}
