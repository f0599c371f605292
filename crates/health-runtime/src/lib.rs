//! Runtime layer for the health pipeline.
//!
//! Sequences the ingestion and normalization stages over one store session
//! and collects the run report.

pub mod orchestrator;
pub mod report;

pub use health_core as core;
pub use health_data as data;
