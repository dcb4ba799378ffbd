//! Initial scan of a MongoDB collection into CrateDB.

use crate::applier::ChangeApplier;
use crate::outcome::SyncOutcome;
use anyhow::{Context, Result};
use bson::doc;
use crate_sink::CrateClient;
use futures::TryStreamExt;
use mongodb::{options::ClientOptions, Client as MongoClient, Collection, Database};
use mongodb_types::document_to_json;
use std::time::Duration;

/// Source database connection options (library type without clap).
#[derive(Clone, Debug)]
pub struct SourceOpts {
    pub source_uri: String,
    pub source_database: Option<String>,
    pub collection: String,
}

/// Connect to the source database named in `opts`.
pub async fn connect(opts: &SourceOpts) -> Result<Database> {
    tracing::debug!("Parsing MongoDB connection options from URI");
    let mut mongo_options = ClientOptions::parse(&opts.source_uri)
        .await
        .context("Failed to parse MongoDB connection options")?;
    // Fail fast instead of hanging on an unreachable server
    mongo_options.connect_timeout = Some(Duration::from_secs(10));
    mongo_options.server_selection_timeout = Some(Duration::from_secs(10));

    let mongo_client = MongoClient::with_options(mongo_options)?;
    let database = opts
        .source_database
        .clone()
        .or_else(|| mongo_client.default_database().map(|db| db.name().to_string()))
        .ok_or_else(|| anyhow::anyhow!("MongoDB source database name is required"))?;
    tracing::debug!("Using MongoDB database: {}", database);
    Ok(mongo_client.database(&database))
}

/// Copy every document of `collection` through the applier's backfill path.
///
/// Documents are read in `_id` order and written `batch_size` at a time.
pub async fn run_initial_scan<C: CrateClient>(
    applier: &ChangeApplier<C>,
    collection: &Collection<bson::Document>,
    batch_size: usize,
) -> Result<SyncOutcome> {
    let batch_size = batch_size.max(1);
    let collection_name = collection.name();
    let total_docs = collection.estimated_document_count().await?;
    tracing::info!(
        "Starting initial scan of '{}' (about {} documents) into {}",
        collection_name,
        total_docs,
        applier.qualified_name()
    );

    let mut cursor = collection
        .find(doc! {})
        .sort(doc! { "_id": 1 })
        .batch_size(u32::try_from(batch_size).unwrap_or(u32::MAX))
        .await
        .with_context(|| format!("Failed to open cursor on '{collection_name}'"))?;

    let mut outcome = SyncOutcome::default();
    let mut batch = Vec::with_capacity(batch_size);
    while let Some(document) = cursor.try_next().await? {
        tracing::trace!("Converting document {}", outcome.processed() + batch.len() as u64);
        batch.push(document_to_json(document)?);
        if batch.len() >= batch_size {
            let written = applier
                .apply_backfill_batch(std::mem::take(&mut batch))
                .await?;
            outcome.absorb(written);
            tracing::info!(
                "Processed {}/{} documents from '{}'",
                outcome.processed(),
                total_docs,
                collection_name
            );
        }
    }

    if !batch.is_empty() {
        tracing::debug!("Writing final batch of {} documents", batch.len());
        outcome.absorb(applier.apply_backfill_batch(batch).await?);
    }

    if outcome.failed > 0 {
        tracing::warn!(
            "{} documents of '{}' were rejected: {:?}",
            outcome.failed,
            collection_name,
            outcome.failed_ids
        );
    }
    tracing::info!("Initial scan of '{}' completed: {}", collection_name, outcome);
    Ok(outcome)
}
