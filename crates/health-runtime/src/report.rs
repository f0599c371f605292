//! Run report produced by the pipeline stages.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use health_core::error::Result;
use health_data::impute::NutritionImputation;
use serde::Serialize;
use tracing::info;

// ── Stage 1 ───────────────────────────────────────────────────────────────────

/// One raw table written by the ingestion stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadedTable {
    pub table: String,
    pub source: PathBuf,
    pub rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    pub data_dir: PathBuf,
    pub tables: Vec<LoadedTable>,
    /// Wall-clock seconds spent reading and loading the exports.
    pub load_time_seconds: f64,
}

// ── Stage 2 ───────────────────────────────────────────────────────────────────

/// Row counts of one cleaned table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableCounts {
    pub table: String,
    /// Rows produced by the transform, before the date filter.
    pub transformed: usize,
    /// Rows written to the store.
    pub stored: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanReport {
    /// ISO-8601 timestamp when this report was generated.
    pub generated_at: String,
    /// Local instant the calendar grids run up to.
    pub evaluated_at: NaiveDateTime,
    pub epoch: NaiveDate,
    pub cutoff: NaiveDate,
    pub tables: Vec<TableCounts>,
    pub nutrition: NutritionImputation,
    pub read_time_seconds: f64,
    pub transform_time_seconds: f64,
    pub write_time_seconds: f64,
}

// ── RunReport ─────────────────────────────────────────────────────────────────

/// Everything a run did; stages that were not run are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub ingest: Option<IngestReport>,
    pub clean: Option<CleanReport>,
}

impl RunReport {
    /// Emit a summary through `tracing`.
    pub fn log(&self) {
        if let Some(ingest) = &self.ingest {
            let rows: usize = ingest.tables.iter().map(|t| t.rows).sum();
            info!(
                tables = ingest.tables.len(),
                rows,
                seconds = ingest.load_time_seconds,
                "ingestion finished"
            );
        }
        if let Some(clean) = &self.clean {
            for t in &clean.tables {
                info!(
                    table = %t.table,
                    transformed = t.transformed,
                    stored = t.stored,
                    "table stored"
                );
            }
            info!(
                substituted_days = clean.nutrition.substituted_days.len(),
                read = clean.read_time_seconds,
                transform = clean.transform_time_seconds,
                write = clean.write_time_seconds,
                "normalization finished"
            );
        }
    }

    /// Write the report as pretty-printed JSON.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
