//! Deciding which write errors are expected races.

use crate_sink::ErrorPayload;

/// Decides whether a CrateDB error is an expected race between the initial
/// scan and the change stream (swallowed) or a real failure (propagated).
pub trait ConflictPolicy: Send + Sync {
    fn is_expected(&self, error: &ErrorPayload) -> bool;
}

/// Duplicate primary keys are expected; everything else is fatal.
#[derive(Debug, Clone, Copy, Default)]
pub struct DuplicateKeyPolicy;

impl ConflictPolicy for DuplicateKeyPolicy {
    fn is_expected(&self, error: &ErrorPayload) -> bool {
        error.is_duplicate_key()
    }
}

/// Nothing is expected.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictPolicy;

impl ConflictPolicy for StrictPolicy {
    fn is_expected(&self, _error: &ErrorPayload) -> bool {
        false
    }
}

impl<F> ConflictPolicy for F
where
    F: Fn(&ErrorPayload) -> bool + Send + Sync,
{
    fn is_expected(&self, error: &ErrorPayload) -> bool {
        self(error)
    }
}
