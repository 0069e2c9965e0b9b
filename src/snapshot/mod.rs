//! Schema Snapshot Module
//!
//! Detecting what changed in a dataset between runs:
//! - Snapshot cache (last observed schema per dataset)
//! - Schema diff engine (added / removed / changed-type fields)

pub mod diff;
pub mod store;

pub use diff::{DiffEngine, DriftStatus, SchemaDiff};
pub use store::SchemaCache;
