use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use sync_core::OperationType;

/// What applying a batch did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncOutcome {
    /// Rows reported written.
    pub success: u64,
    /// Bulk members the server rejected.
    pub failed: u64,
    /// Identities of the rejected bulk members.
    pub failed_ids: Vec<Value>,
    /// Duplicate-key races that were ignored.
    pub conflicts: u64,
    /// Events that produced no statement.
    pub skipped: u64,
    /// Events (or bulk members) handled per operation type.
    pub operation_counts: BTreeMap<OperationType, u64>,
}

impl SyncOutcome {
    pub fn count_operation(&mut self, operation: OperationType, n: u64) {
        *self.operation_counts.entry(operation).or_default() += n;
    }

    pub fn absorb(&mut self, other: SyncOutcome) {
        self.success += other.success;
        self.failed += other.failed;
        self.failed_ids.extend(other.failed_ids);
        self.conflicts += other.conflicts;
        self.skipped += other.skipped;
        for (operation, n) in other.operation_counts {
            self.count_operation(operation, n);
        }
    }

    pub fn processed(&self) -> u64 {
        self.operation_counts.values().sum()
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "success={} failed={} conflicts={} skipped={}",
            self.success, self.failed, self.conflicts, self.skipped
        )?;
        for (operation, n) in &self.operation_counts {
            write!(f, " {operation}={n}")?;
        }
        Ok(())
    }
}
