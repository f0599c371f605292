//! Shared types for the health pipeline.
//!
//! Error type, the store-facing [`table::Table`] dataset, typed raw and
//! canonical records, timestamp parsing and run settings.

pub mod error;
pub mod models;
pub mod records;
pub mod settings;
pub mod stats;
pub mod table;
pub mod time_utils;

pub use error::{HealthError, Result};
