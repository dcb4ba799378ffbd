//! Responses of the CrateDB `_sql` endpoint.

use serde::Deserialize;
use serde_json::Value;

/// Error code CrateDB uses for a duplicate primary key.
pub const DUPLICATE_KEY_CODE: i64 = 4091;

/// Row count of a bulk member that could not be written.
pub const BULK_ROW_FAILED: i64 = -2;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueryResult {
    #[serde(default)]
    pub cols: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
    pub rowcount: i64,
    #[serde(default)]
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BulkRowResult {
    pub rowcount: i64,
    /// Present on newer servers when the row failed.
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BulkQueryResult {
    #[serde(default)]
    pub cols: Vec<String>,
    pub results: Vec<BulkRowResult>,
    #[serde(default)]
    pub duration: f64,
}

impl BulkQueryResult {
    /// Members written with a row count of exactly one.
    pub fn inserted(&self) -> u64 {
        self.results.iter().filter(|r| r.rowcount == 1).count() as u64
    }

    /// Positions of members the server rejected.
    pub fn failed_positions(&self) -> Vec<usize> {
        self.results
            .iter()
            .enumerate()
            .filter(|(_, r)| r.rowcount == BULK_ROW_FAILED)
            .map(|(i, _)| i)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
    #[serde(default)]
    pub code: Option<i64>,
}

impl ErrorPayload {
    pub fn is_duplicate_key(&self) -> bool {
        self.code == Some(DUPLICATE_KEY_CODE) || self.message.contains("DuplicateKeyException")
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErrorResult {
    pub error: ErrorPayload,
    #[serde(default)]
    pub error_trace: Option<String>,
}

/// Any body the endpoint may answer with.
///
/// Variant order matters: an error body is recognised first, then a bulk
/// body by its `results` array.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CrateResponse {
    Error(ErrorResult),
    Bulk(BulkQueryResult),
    Query(QueryResult),
}

impl CrateResponse {
    pub fn error(&self) -> Option<&ErrorPayload> {
        match self {
            Self::Error(result) => Some(&result.error),
            _ => None,
        }
    }
}
