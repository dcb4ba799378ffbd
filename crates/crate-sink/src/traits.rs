//! CrateClient trait definition.

use crate::response::CrateResponse;
use crate::statement::Statement;
use anyhow::Result;
use std::sync::Arc;

/// Executes statements against CrateDB.
///
/// A server-side failure (constraint violation, parse error) is returned as
/// `Ok(CrateResponse::Error(..))` so the caller can classify it. `Err` is
/// reserved for failures to reach the server or read its answer.
///
/// The sync engine is generic over this trait:
///
/// ```ignore
/// pub async fn run_initial_scan<C: CrateClient>(applier: &ChangeApplier<C>, ..) -> Result<()>
/// ```
#[async_trait::async_trait]
pub trait CrateClient: Send + Sync {
    async fn execute(&self, statement: &Statement) -> Result<CrateResponse>;
}

#[async_trait::async_trait]
impl<T: CrateClient + ?Sized> CrateClient for Arc<T> {
    async fn execute(&self, statement: &Statement) -> Result<CrateResponse> {
        (**self).execute(statement).await
    }
}
