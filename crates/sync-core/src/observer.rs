//! Observer hook for conversion and write-outcome notifications.
//!
//! The schema converter and the change applier report what they did through
//! a [`SyncObserver`] passed in by the caller. [`TracingObserver`] is the
//! default and forwards everything to `tracing`.

use crate::event::OperationType;
use serde_json::Value;
use std::fmt;

/// Where a bulk write originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchSource {
    InitialScan,
    ChangeStream,
}

impl fmt::Display for BatchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitialScan => write!(f, "initial_scan"),
            Self::ChangeStream => write!(f, "change_stream"),
        }
    }
}

/// Something the sync engine wants the outside world to know about.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// A table definition was rendered from a collection schema.
    TableDefinitionRendered { table: String, node_count: usize },
    /// A single-row statement completed.
    WriteApplied {
        operation: OperationType,
        id: Value,
        rowcount: i64,
    },
    /// A bulk insert completed, possibly with some rows rejected.
    BulkApplied {
        source: BatchSource,
        inserted: u64,
        failed_ids: Vec<Value>,
    },
    /// A duplicate-identity error was recognised as a scan/stream race and ignored.
    ConflictSwallowed {
        operation: OperationType,
        id: Option<Value>,
        message: String,
    },
    /// A write failed in a way that will be propagated to the caller.
    WriteFailed {
        operation: OperationType,
        id: Option<Value>,
        message: String,
    },
    /// An event produced no statement.
    EventSkipped {
        operation: OperationType,
        id: Value,
        reason: &'static str,
    },
}

pub trait SyncObserver: Send + Sync {
    fn observe(&self, event: &SyncEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SyncObserver for NoopObserver {
    fn observe(&self, _event: &SyncEvent) {}
}

/// Logs every event through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SyncObserver for TracingObserver {
    fn observe(&self, event: &SyncEvent) {
        match event {
            SyncEvent::TableDefinitionRendered { table, node_count } => {
                tracing::info!(table = %table, node_count, "Rendered table definition");
            }
            SyncEvent::WriteApplied {
                operation,
                id,
                rowcount,
            } => {
                tracing::debug!(%operation, %id, rowcount, "Applied change");
            }
            SyncEvent::BulkApplied {
                source,
                inserted,
                failed_ids,
            } => {
                if failed_ids.is_empty() {
                    tracing::debug!(%source, inserted, "Applied bulk insert");
                } else {
                    tracing::warn!(
                        %source,
                        inserted,
                        failed = failed_ids.len(),
                        "Bulk insert rejected some rows: {failed_ids:?}"
                    );
                }
            }
            SyncEvent::ConflictSwallowed {
                operation,
                id,
                message,
            } => {
                tracing::debug!(%operation, ?id, "Ignoring duplicate key conflict: {message}");
            }
            SyncEvent::WriteFailed {
                operation,
                id,
                message,
            } => {
                tracing::error!(%operation, ?id, "Write failed: {message}");
            }
            SyncEvent::EventSkipped {
                operation,
                id,
                reason,
            } => {
                tracing::trace!(%operation, %id, "Skipped event: {reason}");
            }
        }
    }
}
