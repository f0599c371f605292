//! Data layer for the health pipeline.
//!
//! Reads the export drop, owns the SQLite store, and implements the
//! normalization core: calendar alignment, the six domain transforms, the
//! date filter and missing-value imputation.

pub mod calendar;
pub mod filter;
pub mod impute;
pub mod reader;
pub mod store;
pub mod transform;

pub use health_core as core;
