//! Catalog Module
//!
//! Everything on the far side of the pipeline: turning an observed schema
//! into a DataHub metadata change event and delivering it.

pub mod emitter;
pub mod event;
#[cfg(test)]
pub mod mock;

pub use emitter::{DryRunEmitter, Emitter, MetadataEmitter, RestEmitter};
pub use event::{DatasetDescriptor, EventBuilder};
