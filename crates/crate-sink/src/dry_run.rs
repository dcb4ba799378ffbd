//! A client that logs statements instead of executing them.

use crate::response::{BulkQueryResult, BulkRowResult, CrateResponse, QueryResult};
use crate::statement::{Statement, StatementArgs};
use crate::traits::CrateClient;
use anyhow::Result;

/// Logs statements instead of sending them and reports every row as written.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunClient;

#[async_trait::async_trait]
impl CrateClient for DryRunClient {
    async fn execute(&self, statement: &Statement) -> Result<CrateResponse> {
        tracing::info!("Dry-run: {}", statement.sql);
        Ok(match &statement.args {
            StatementArgs::Single(_) => CrateResponse::Query(QueryResult {
                cols: Vec::new(),
                rows: Vec::new(),
                rowcount: 1,
                duration: 0.0,
            }),
            StatementArgs::Bulk(rows) => CrateResponse::Bulk(BulkQueryResult {
                cols: Vec::new(),
                results: rows
                    .iter()
                    .map(|_| BulkRowResult {
                        rowcount: 1,
                        error_message: None,
                    })
                    .collect(),
                duration: 0.0,
            }),
        })
    }
}
