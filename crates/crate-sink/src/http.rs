//! HTTP client for the CrateDB `_sql` endpoint.

use crate::response::CrateResponse;
use crate::statement::{Statement, StatementArgs};
use crate::traits::CrateClient;
use anyhow::{Context, Result};
use base64::{engine::general_purpose, Engine as _};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_SQL_ENDPOINT: &str = "http://localhost:4200/_sql";

/// Connection settings for [`HttpCrateClient`].
#[derive(Debug, Clone)]
pub struct CrateConnectionConfig {
    pub sql_endpoint: String,
    /// `user:password` for HTTP basic auth.
    pub auth: Option<String>,
    pub timeout: Duration,
}

impl Default for CrateConnectionConfig {
    fn default() -> Self {
        Self {
            sql_endpoint: DEFAULT_SQL_ENDPOINT.to_string(),
            auth: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// `Basic <base64(user:password)>`
pub fn basic_auth_header(auth: &str) -> String {
    format!("Basic {}", general_purpose::STANDARD.encode(auth))
}

/// JSON body for `statement`: `{stmt, args}` or `{stmt, bulk_args}`.
pub fn request_body(statement: &Statement) -> Value {
    match &statement.args {
        StatementArgs::Single(args) if args.is_empty() => json!({ "stmt": statement.sql }),
        StatementArgs::Single(args) => json!({ "stmt": statement.sql, "args": args }),
        StatementArgs::Bulk(rows) => json!({ "stmt": statement.sql, "bulk_args": rows }),
    }
}

#[derive(Debug, Clone)]
pub struct HttpCrateClient {
    client: Client,
    endpoint: String,
}

impl HttpCrateClient {
    pub fn new(config: &CrateConnectionConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(auth) = &config.auth {
            let mut value = HeaderValue::from_str(&basic_auth_header(auth))
                .context("CrateDB credentials contain characters not allowed in a header")?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;
        tracing::debug!("Created CrateDB client for {}", config.sql_endpoint);
        Ok(Self {
            client,
            endpoint: config.sql_endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl CrateClient for HttpCrateClient {
    async fn execute(&self, statement: &Statement) -> Result<CrateResponse> {
        tracing::trace!("Executing {} ({} rows)", statement.sql, statement.row_count());
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request_body(statement))
            .send()
            .await
            .with_context(|| format!("Failed to reach CrateDB at '{}'", self.endpoint))?;

        // Error bodies come with a non-2xx status; they are parsed like any other.
        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read CrateDB response (status {status})"))?;
        serde_json::from_str(&body)
            .with_context(|| format!("Unexpected CrateDB response (status {status}): {body}"))
    }
}
