//! CrateDB write side for mongo2crate.
//!
//! - [`StatementBuilder`] turns documents and update descriptions into
//!   parameterized `INSERT`/`DELETE` statements for one table.
//! - [`CrateClient`] is the seam between the sync engine and the database;
//!   [`HttpCrateClient`] talks to the `_sql` HTTP endpoint and
//!   [`DryRunClient`] only logs.
//! - [`CrateResponse`] models the three response shapes the endpoint returns.

mod dry_run;
mod http;
mod response;
pub mod statement;
mod traits;

pub use dry_run::DryRunClient;
pub use http::{
    basic_auth_header, request_body, CrateConnectionConfig, HttpCrateClient, DEFAULT_SQL_ENDPOINT,
};
pub use response::{
    BulkQueryResult, BulkRowResult, CrateResponse, ErrorPayload, ErrorResult, QueryResult,
    BULK_ROW_FAILED, DUPLICATE_KEY_CODE,
};
pub use statement::{quote_column, unique_keys, Statement, StatementArgs, StatementBuilder};
pub use traits::CrateClient;
