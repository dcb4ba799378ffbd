//! Change stream runner.
//!
//! Watches one collection with update lookup and applies what arrives in
//! batches of at most `batch_size` ready events. The resume token is logged
//! after every batch so a restart can pass it back with `--resume-after`.

use crate::applier::ChangeApplier;
use crate::checkpoint::{decode_resume_token, encode_resume_token};
use crate::driver::convert_change_event;
use crate::outcome::SyncOutcome;
use anyhow::{Context, Result};
use bson::doc;
use crate_sink::CrateClient;
use mongodb::options::{ChangeStreamOptions, FullDocumentType};
use mongodb::Collection;
use std::time::{Duration, Instant};
use sync_core::{BatchSource, ChangeEvent};

#[derive(Clone, Debug)]
pub struct ChangeStreamOpts {
    pub batch_size: usize,
    /// Base64 resume token printed by an earlier run.
    pub resume_after: Option<String>,
    /// Only inserts are watched, and every batch is one bulk insert.
    pub immutable: bool,
    /// Stop after this long without events. `None` runs until the stream dies.
    pub idle_timeout: Option<Duration>,
}

impl Default for ChangeStreamOpts {
    fn default() -> Self {
        Self {
            batch_size: 500,
            resume_after: None,
            immutable: false,
            idle_timeout: None,
        }
    }
}

/// Pipeline restricting the stream to what the run applies.
pub fn change_stream_pipeline(immutable: bool) -> Vec<bson::Document> {
    if immutable {
        vec![doc! { "$match": { "operationType": "insert" } }]
    } else {
        Vec::new()
    }
}

pub async fn run_incremental_sync<C: CrateClient>(
    applier: &ChangeApplier<C>,
    collection: &Collection<bson::Document>,
    opts: &ChangeStreamOpts,
) -> Result<SyncOutcome> {
    let batch_size = opts.batch_size.max(1);
    let mut options = ChangeStreamOptions::builder()
        .full_document(Some(FullDocumentType::UpdateLookup))
        .build();
    if let Some(token) = &opts.resume_after {
        options.resume_after = Some(decode_resume_token(token)?);
        tracing::info!("Resuming change stream of '{}'", collection.name());
    }

    let mut stream = collection
        .watch()
        .pipeline(change_stream_pipeline(opts.immutable))
        .with_options(options)
        .await
        .with_context(|| format!("Failed to watch '{}'", collection.name()))?;
    tracing::info!(
        "Watching '{}' into {} (immutable: {})",
        collection.name(),
        applier.qualified_name(),
        opts.immutable
    );

    let mut total = SyncOutcome::default();
    let mut last_activity = Instant::now();
    loop {
        let mut raw = Vec::new();
        while raw.len() < batch_size {
            match stream.next_if_any().await? {
                Some(event) => raw.push(event),
                None => break,
            }
        }

        if raw.is_empty() {
            if !stream.is_alive() {
                tracing::info!("Change stream of '{}' closed", collection.name());
                break;
            }
            if let Some(timeout) = opts.idle_timeout {
                if last_activity.elapsed() >= timeout {
                    tracing::info!("No changes for {:?}, stopping", timeout);
                    break;
                }
            }
            continue;
        }
        last_activity = Instant::now();

        let received = raw.len();
        let mut events = Vec::with_capacity(received);
        for event in raw {
            if let Some(change) = convert_change_event(event)? {
                events.push(change);
            }
        }
        tracing::debug!("Received {} events, {} applicable", received, events.len());

        let outcome = if opts.immutable {
            let documents = events
                .into_iter()
                .filter_map(|event| match event {
                    ChangeEvent::Insert { document, .. } => Some(document),
                    _ => None,
                })
                .collect();
            applier
                .apply_bulk(documents, BatchSource::ChangeStream)
                .await?
        } else {
            applier.apply_events(&events).await?
        };
        tracing::info!("Applied change stream batch: {}", outcome);
        if outcome.failed > 0 {
            tracing::warn!("Rejected documents: {:?}", outcome.failed_ids);
        }
        total.absorb(outcome);

        if let Some(token) = stream.resume_token() {
            tracing::info!("Resume token: {}", encode_resume_token(&token)?);
        }
    }

    tracing::info!("Change stream sync of '{}' finished: {}", collection.name(), total);
    Ok(total)
}
