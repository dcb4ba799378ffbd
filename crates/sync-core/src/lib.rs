//! Core types for the mongo2crate framework.
//!
//! This crate provides the foundational pieces shared by every other crate
//! in the workspace:
//!
//! - [`path`] - Dotted-path parsing, prefix checks and duplicate detection
//! - [`ident`] - Identifier quoting and the `_id` → `id` identity convention
//! - [`ChangeEvent`] - Insert/update/replace/delete events keyed by identity
//! - [`SyncObserver`] - Hook for conversion and write-outcome notifications
//!
//! # Architecture
//!
//! ```text
//! sync-core (this crate)
//!    │
//!    ├─── crate-schema                  (schema conversion, uses path)
//!    ├─── crate-sink                    (statement builder, uses path + Document)
//!    └─── mongodb-changestream-source   (change application, uses everything)
//! ```

pub mod event;
pub mod ident;
pub mod observer;
pub mod path;

// Re-exports for convenience
pub use event::{ChangeEvent, Document, OperationType, UpdateDescription};
pub use ident::{ID_COLUMN, SOURCE_ID_FIELD};
pub use observer::{BatchSource, NoopObserver, SyncEvent, SyncObserver, TracingObserver};
