//! Ingestion Pipeline Module
//!
//! read → infer schema → normalize → diff against cache → persist cache →
//! build metadata event → emit, once per configured dataset.

pub mod orchestrator;
pub mod types;

pub use orchestrator::Orchestrator;
