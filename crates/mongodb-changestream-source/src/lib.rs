//! Replicating a MongoDB collection into a CrateDB table.
//!
//! [`ChangeApplier`] is the engine: it maps documents, builds statements,
//! executes them through a [`crate_sink::CrateClient`] and classifies the
//! responses. The rest is driver glue: [`run_initial_scan`] copies what is
//! already in the collection and [`run_incremental_sync`] follows its change
//! stream.

mod applier;
pub mod checkpoint;
mod conflict;
mod driver;
mod error;
mod full_sync;
mod incremental_sync;
mod mapper;
mod outcome;
mod partition;
mod schema;

pub use applier::ChangeApplier;
pub use checkpoint::{decode_resume_token, encode_resume_token};
pub use conflict::{ConflictPolicy, DuplicateKeyPolicy, StrictPolicy};
pub use driver::convert_change_event;
pub use error::SyncError;
pub use full_sync::{connect, run_initial_scan, SourceOpts};
pub use incremental_sync::{change_stream_pipeline, run_incremental_sync, ChangeStreamOpts};
pub use mapper::{DocumentMapper, LeafMapper};
pub use outcome::SyncOutcome;
pub use partition::partition_events;
pub use schema::{get_collection_schema, json_schema_from_validator};
