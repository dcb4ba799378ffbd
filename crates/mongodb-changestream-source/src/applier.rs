//! Change-application engine.
//!
//! [`ChangeApplier`] turns change events and initial-scan batches into
//! CrateDB statements, executes them one at a time through a
//! [`CrateClient`], and classifies each response:
//!
//! - a row count is counted as success;
//! - a bulk member with row count `-2` is a failed row, reported by identity;
//! - an error payload is either an expected race (swallowed and counted as a
//!   conflict) or fatal ([`SyncError::Write`]), as the [`ConflictPolicy`] says;
//! - a transport failure is returned as [`SyncError::Transport`].

use crate::conflict::{ConflictPolicy, DuplicateKeyPolicy};
use crate::error::SyncError;
use crate::mapper::DocumentMapper;
use crate::outcome::SyncOutcome;
use crate::partition::partition_events;
use crate_sink::{CrateClient, CrateResponse, Statement, StatementBuilder};
use serde_json::Value;
use std::sync::Arc;
use sync_core::{
    BatchSource, ChangeEvent, Document, OperationType, SyncEvent, SyncObserver, TracingObserver,
};

pub struct ChangeApplier<C: CrateClient> {
    client: C,
    statements: StatementBuilder,
    mapper: DocumentMapper,
    conflict_policy: Arc<dyn ConflictPolicy>,
    observer: Arc<dyn SyncObserver>,
    batch_inserts: bool,
}

impl<C: CrateClient> ChangeApplier<C> {
    /// Applier writing to `qualified_name`, keyed on the mapper's id column.
    pub fn new(client: C, qualified_name: impl Into<String>, mapper: DocumentMapper) -> Self {
        let statements = StatementBuilder::new(qualified_name).with_id_column(mapper.id_column());
        Self {
            client,
            statements,
            mapper,
            conflict_policy: Arc::new(DuplicateKeyPolicy),
            observer: Arc::new(TracingObserver),
            batch_inserts: false,
        }
    }

    pub fn with_conflict_policy(mut self, policy: Arc<dyn ConflictPolicy>) -> Self {
        self.conflict_policy = policy;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn SyncObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Merge runs of adjacent inserts into one bulk insert.
    pub fn with_batch_inserts(mut self, batch_inserts: bool) -> Self {
        self.batch_inserts = batch_inserts;
        self
    }

    pub fn qualified_name(&self) -> &str {
        self.statements.qualified_name()
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Execute a statement that is not tied to a document, e.g. DDL.
    pub async fn execute_raw(&self, statement: &Statement) -> anyhow::Result<CrateResponse> {
        self.client.execute(statement).await
    }

    /// Apply change-stream events in order.
    pub async fn apply_events(&self, events: &[ChangeEvent]) -> Result<SyncOutcome, SyncError> {
        let mut outcome = SyncOutcome::default();
        if self.batch_inserts {
            for group in partition_events(events) {
                match group {
                    [event] => outcome.absorb(self.apply_event(event).await?),
                    inserts => {
                        let documents = inserts.iter().filter_map(insert_document).collect();
                        let bulk = self.apply_bulk(documents, BatchSource::ChangeStream).await?;
                        outcome.absorb(bulk);
                    }
                }
            }
        } else {
            for event in events {
                outcome.absorb(self.apply_event(event).await?);
            }
        }
        Ok(outcome)
    }

    /// Apply an initial-scan batch with a single bulk insert.
    pub async fn apply_backfill_batch(
        &self,
        documents: Vec<Document>,
    ) -> Result<SyncOutcome, SyncError> {
        self.apply_bulk(documents, BatchSource::InitialScan).await
    }

    /// Bulk insert `documents`, reporting rejected rows by identity.
    pub async fn apply_bulk(
        &self,
        documents: Vec<Document>,
        source: BatchSource,
    ) -> Result<SyncOutcome, SyncError> {
        let mut outcome = SyncOutcome::default();
        if documents.is_empty() {
            return Ok(outcome);
        }
        let documents: Vec<Document> = documents
            .into_iter()
            .map(|document| self.mapper.map(document))
            .collect();
        outcome.count_operation(OperationType::Insert, documents.len() as u64);

        let statement = self.statements.bulk_insert(&documents);
        match self.execute(&statement).await? {
            CrateResponse::Bulk(result) => {
                let failed_ids: Vec<Value> = result
                    .failed_positions()
                    .into_iter()
                    .map(|i| {
                        documents
                            .get(i)
                            .and_then(|d| d.get(self.mapper.id_column()))
                            .cloned()
                            .unwrap_or(Value::Null)
                    })
                    .collect();
                outcome.success = result.inserted();
                outcome.failed = failed_ids.len() as u64;
                self.observer.observe(&SyncEvent::BulkApplied {
                    source,
                    inserted: outcome.success,
                    failed_ids: failed_ids.clone(),
                });
                outcome.failed_ids = failed_ids;
            }
            CrateResponse::Error(error) => {
                self.classify_error(OperationType::Insert, None, &error.error, &mut outcome)?;
            }
            CrateResponse::Query(_) => {
                return Err(SyncError::UnexpectedResponse {
                    operation: OperationType::Insert,
                    received: "single-row",
                })
            }
        }
        Ok(outcome)
    }

    /// Apply one event with one statement (two for a replace).
    pub async fn apply_event(&self, event: &ChangeEvent) -> Result<SyncOutcome, SyncError> {
        let operation = event.operation_type();
        let mut outcome = SyncOutcome::default();
        outcome.count_operation(operation, 1);
        let id = self.mapper.map_id(event.id());

        match event {
            ChangeEvent::Insert { document, .. } => {
                let document = self.mapper.map(document.clone());
                let statement = self.statements.insert(&document);
                self.apply_single(operation, &id, &statement, &mut outcome).await?;
            }
            ChangeEvent::Update {
                update,
                full_document,
                ..
            } => {
                let assignments = self.mapper.map(update.to_assignments());
                if assignments.is_empty() {
                    outcome.skipped += 1;
                    self.observer.observe(&SyncEvent::EventSkipped {
                        operation,
                        id,
                        reason: "empty update description",
                    });
                    return Ok(outcome);
                }
                let record = match full_document {
                    Some(document) => self.mapper.map(document.clone()),
                    None => {
                        tracing::warn!(
                            "Update of {} arrived without a full document; upserting id only",
                            id
                        );
                        self.mapper.id_document(event.id())
                    }
                };
                let statement = self.statements.upsert(&record, &assignments);
                self.apply_single(operation, &id, &statement, &mut outcome).await?;
            }
            ChangeEvent::Replace { document, .. } => {
                // Not atomic: a failure after the delete leaves the row missing.
                let delete = self.statements.delete_by_id(&id);
                let mut deleted = SyncOutcome::default();
                self.apply_single(operation, &id, &delete, &mut deleted).await?;
                outcome.conflicts += deleted.conflicts;

                let document = self.mapper.map(document.clone());
                let statement = self.statements.insert(&document);
                self.apply_single(operation, &id, &statement, &mut outcome).await?;
            }
            ChangeEvent::Delete { .. } => {
                let statement = self.statements.delete_by_id(&id);
                self.apply_single(operation, &id, &statement, &mut outcome).await?;
            }
        }
        Ok(outcome)
    }

    async fn execute(&self, statement: &Statement) -> Result<CrateResponse, SyncError> {
        self.client
            .execute(statement)
            .await
            .map_err(SyncError::Transport)
    }

    async fn apply_single(
        &self,
        operation: OperationType,
        id: &Value,
        statement: &Statement,
        outcome: &mut SyncOutcome,
    ) -> Result<(), SyncError> {
        match self.execute(statement).await? {
            CrateResponse::Query(result) => {
                outcome.success += u64::try_from(result.rowcount).unwrap_or(0);
                self.observer.observe(&SyncEvent::WriteApplied {
                    operation,
                    id: id.clone(),
                    rowcount: result.rowcount,
                });
                Ok(())
            }
            CrateResponse::Error(error) => {
                self.classify_error(operation, Some(id.clone()), &error.error, outcome)
            }
            CrateResponse::Bulk(_) => Err(SyncError::UnexpectedResponse {
                operation,
                received: "bulk",
            }),
        }
    }

    fn classify_error(
        &self,
        operation: OperationType,
        id: Option<Value>,
        error: &crate_sink::ErrorPayload,
        outcome: &mut SyncOutcome,
    ) -> Result<(), SyncError> {
        if self.conflict_policy.is_expected(error) {
            outcome.conflicts += 1;
            self.observer.observe(&SyncEvent::ConflictSwallowed {
                operation,
                id,
                message: error.message.clone(),
            });
            Ok(())
        } else {
            self.observer.observe(&SyncEvent::WriteFailed {
                operation,
                id: id.clone(),
                message: error.message.clone(),
            });
            Err(SyncError::Write {
                operation,
                id,
                message: error.message.clone(),
                code: error.code,
            })
        }
    }
}

fn insert_document(event: &ChangeEvent) -> Option<Document> {
    match event {
        ChangeEvent::Insert { document, .. } => Some(document.clone()),
        _ => None,
    }
}
