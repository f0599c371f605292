//! Pipeline orchestrator.
//!
//! Runs the ingestion stage, the normalization stage, or both against an
//! explicitly passed [`HealthStore`]. The store handle is owned by the caller
//! and released when it goes out of scope, on success and error alike.

use std::time::Instant;

use chrono::{NaiveDateTime, Utc};
use health_core::error::{HealthError, Result};
use health_core::models::{
    ACTIVITY_TABLE, BODYWEIGHT_TABLE, ENERGY_TABLE, HEART_RATE_TABLE, NUTRITION_TABLE,
    WORKOUT_TABLE,
};
use health_core::settings::{PipelineConfig, Stage};
use health_core::table::Table;
use health_data::calendar::CalendarGrid;
use health_data::filter::date_filter;
use health_data::impute::{
    impute_activity, impute_bodyweight, impute_nutrition, impute_workout, NutritionImputation,
};
use health_data::reader::{load_export, locate_exports};
use health_data::store::HealthStore;
use health_data::transform::{CleanTables, RawTables};
use tracing::{debug, error, info};

use crate::report::{CleanReport, IngestReport, LoadedTable, RunReport, TableCounts};

// ── PipelineRunner ────────────────────────────────────────────────────────────

pub struct PipelineRunner {
    config: PipelineConfig,
}

impl PipelineRunner {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run `stage`, evaluating calendar grids up to `now`.
    pub fn run(&self, store: &mut HealthStore, stage: Stage, now: NaiveDateTime) -> Result<RunReport> {
        let mut report = RunReport::default();
        if matches!(stage, Stage::Ingest | Stage::All) {
            report.ingest = Some(self.ingest(store)?);
        }
        if matches!(stage, Stage::Clean | Stage::All) {
            report.clean = Some(self.clean(store, now)?);
        }
        Ok(report)
    }

    /// Stage 1: load every export file into its raw table.
    ///
    /// All files are located before the first one is loaded, so a missing
    /// file leaves the store untouched.
    pub fn ingest(&self, store: &mut HealthStore) -> Result<IngestReport> {
        let start = Instant::now();
        let files = locate_exports(&self.config.data_dir)?;
        info!(
            "Ingesting {} export files from {}",
            files.len(),
            self.config.data_dir.display()
        );

        let mut tables = Vec::with_capacity(files.len());
        for file in &files {
            let table = load_export(file)?;
            store.load_table(file.table, &table)?;
            info!("Loaded {} rows into {}", table.len(), file.table);
            tables.push(LoadedTable {
                table: file.table.to_string(),
                source: file.path.clone(),
                rows: table.len(),
            });
        }

        Ok(IngestReport {
            data_dir: self.config.data_dir.clone(),
            tables,
            load_time_seconds: start.elapsed().as_secs_f64(),
        })
    }

    /// Stage 2: transform, filter and impute the raw tables, then replace the
    /// whole store with the six cleaned tables.
    ///
    /// Everything up to the final write works on in-memory copies, so errors
    /// there leave the store as it was. Once the store has been dropped, any
    /// failure is reported as [`HealthError::StoreCorrupted`].
    pub fn clean(&self, store: &mut HealthStore, now: NaiveDateTime) -> Result<CleanReport> {
        info!("Normalizing raw tables up to {}", now);

        let read_start = Instant::now();
        let raw = RawTables::read(store)?;
        let read_time = read_start.elapsed().as_secs_f64();

        let transform_start = Instant::now();
        let grid = CalendarGrid::new(self.config.epoch, now);
        let aligned = CleanTables::build(raw, &self.config, &grid);
        let transformed = aligned.row_counts();
        let (cleaned, nutrition) = self.filter_and_impute(aligned)?;
        let transform_time = transform_start.elapsed().as_secs_f64();

        let write_start = Instant::now();
        write_tables(store, &cleaned.to_tables())?;
        let write_time = write_start.elapsed().as_secs_f64();

        let tables = transformed
            .into_iter()
            .zip(cleaned.row_counts())
            .map(|((table, transformed), (_, stored))| TableCounts {
                table: table.to_string(),
                transformed,
                stored,
            })
            .collect();

        Ok(CleanReport {
            generated_at: Utc::now().to_rfc3339(),
            evaluated_at: now,
            epoch: self.config.epoch,
            cutoff: self.config.cutoff,
            tables,
            nutrition,
            read_time_seconds: read_time,
            transform_time_seconds: transform_time,
            write_time_seconds: write_time,
        })
    }

    fn filter_and_impute(&self, aligned: CleanTables) -> Result<(CleanTables, NutritionImputation)> {
        let cutoff = self.config.cutoff;
        let mut cleaned = CleanTables {
            energy: date_filter(ENERGY_TABLE, aligned.energy, cutoff)?,
            workout: date_filter(WORKOUT_TABLE, aligned.workout, cutoff)?,
            bodyweight: date_filter(BODYWEIGHT_TABLE, aligned.bodyweight, cutoff)?,
            activity: date_filter(ACTIVITY_TABLE, aligned.activity, cutoff)?,
            heart_rate: date_filter(HEART_RATE_TABLE, aligned.heart_rate, cutoff)?,
            nutrition: date_filter(NUTRITION_TABLE, aligned.nutrition, cutoff)?,
            step_fields: aligned.step_fields,
        };

        impute_bodyweight(&mut cleaned.bodyweight, &self.config.weight_source)?;
        impute_workout(&mut cleaned.workout, &self.config.workout_source);
        impute_activity(&mut cleaned.activity);
        let nutrition = impute_nutrition(&mut cleaned.nutrition);

        Ok((cleaned, nutrition))
    }
}

/// Replace the whole store with `tables`.
///
/// A failed drop is rolled back and leaves the store as it was. Once the drop
/// has committed, any load failure is [`HealthError::StoreCorrupted`].
fn write_tables(store: &mut HealthStore, tables: &[Table]) -> Result<()> {
    store.drop_all_tables()?;
    for table in tables {
        store
            .load_table(table.name(), table)
            .map_err(|e| corrupted(table.name(), e))?;
        debug!("Stored {} rows in {}", table.len(), table.name());
    }
    Ok(())
}

fn corrupted(table: &str, e: HealthError) -> HealthError {
    error!("Store write failed after drop at {}: {}", table, e);
    HealthError::StoreCorrupted {
        table: table.to_string(),
        message: e.to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
