//! Domain transforms from raw export records to canonical tables.
//!
//! [`RawTables`] decodes the nine raw store tables into typed records;
//! [`CleanTables::build`] runs the six transforms over them.

pub mod activity;
pub mod bodyweight;
pub mod energy;
pub mod heart_rate;
pub mod nutrition;
pub mod workout;

pub use activity::transform_activity;
pub use bodyweight::transform_bodyweight;
pub use energy::transform_energy;
pub use heart_rate::transform_heart_rate;
pub use nutrition::transform_nutrition;
pub use workout::transform_workout;

use health_core::error::Result;
use health_core::models::{
    ActivityHour, BodyweightDay, EnergyRecord, HeartRateSample, NutritionSlot, WorkoutDay,
    ACTIVITY_TABLE, BODYWEIGHT_TABLE, ENERGY_TABLE, HEART_RATE_TABLE, NUTRITION_TABLE,
    WORKOUT_TABLE,
};
use health_core::records::{
    step_field_columns, HealthSample, NutritionRecord, StepRecord, WorkoutRecord,
    RAW_ACTIVE_ENERGY, RAW_BODYWEIGHT, RAW_HEART_RATE, RAW_NUTRITION, RAW_RESTING_HEART_RATE,
    RAW_REST_ENERGY, RAW_STANDING, RAW_STEPS, RAW_WORKOUT,
};
use health_core::settings::PipelineConfig;
use health_core::table::{FromRow, Table};
use tracing::debug;

use crate::calendar::CalendarGrid;
use crate::store::HealthStore;

// ── RawTables ─────────────────────────────────────────────────────────────────

/// Decoded contents of the raw tables loaded by the ingestion stage.
#[derive(Debug, Clone, Default)]
pub struct RawTables {
    pub workout: Vec<WorkoutRecord>,
    pub active_energy: Vec<HealthSample>,
    pub rest_energy: Vec<HealthSample>,
    pub bodyweight: Vec<HealthSample>,
    pub steps: Vec<StepRecord>,
    /// Extra step-export columns carried into Activity.
    pub step_fields: Vec<String>,
    pub standing: Vec<HealthSample>,
    pub heart_rate: Vec<HealthSample>,
    pub resting_heart_rate: Vec<HealthSample>,
    pub nutrition: Vec<NutritionRecord>,
}

impl RawTables {
    /// Query and decode every raw table. A missing table or malformed cell
    /// aborts the read.
    pub fn read(store: &HealthStore) -> Result<Self> {
        let steps = store.query_table(RAW_STEPS)?;
        Ok(Self {
            workout: read_table(store, RAW_WORKOUT)?,
            active_energy: read_table(store, RAW_ACTIVE_ENERGY)?,
            rest_energy: read_table(store, RAW_REST_ENERGY)?,
            bodyweight: read_table(store, RAW_BODYWEIGHT)?,
            step_fields: step_field_columns(steps.columns()),
            steps: decode_table(&steps)?,
            standing: read_table(store, RAW_STANDING)?,
            heart_rate: read_table(store, RAW_HEART_RATE)?,
            resting_heart_rate: read_table(store, RAW_RESTING_HEART_RATE)?,
            nutrition: read_table(store, RAW_NUTRITION)?,
        })
    }
}

fn read_table<T: FromRow>(store: &HealthStore, name: &str) -> Result<Vec<T>> {
    decode_table(&store.query_table(name)?)
}

fn decode_table<T: FromRow>(table: &Table) -> Result<Vec<T>> {
    let records = table.decode::<T>()?;
    debug!("Decoded {} rows from {}", records.len(), table.name());
    Ok(records)
}

// ── CleanTables ───────────────────────────────────────────────────────────────

/// The six canonical tables of one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanTables {
    pub energy: Vec<EnergyRecord>,
    pub workout: Vec<WorkoutDay>,
    pub bodyweight: Vec<BodyweightDay>,
    pub activity: Vec<ActivityHour>,
    /// Names of the extra Activity columns, in [`ActivityHour::step_fields`] order.
    pub step_fields: Vec<String>,
    pub heart_rate: Vec<HeartRateSample>,
    pub nutrition: Vec<NutritionSlot>,
}

impl CleanTables {
    /// Run every domain transform, aligning onto `grid` where applicable.
    pub fn build(raw: RawTables, config: &PipelineConfig, grid: &CalendarGrid) -> Self {
        Self {
            energy: transform_energy(
                raw.rest_energy,
                raw.active_energy,
                &config.active_energy_source,
            ),
            workout: transform_workout(raw.workout, grid),
            bodyweight: transform_bodyweight(raw.bodyweight, &config.weight_source, grid),
            activity: transform_activity(raw.standing, raw.steps, &raw.step_fields, grid),
            heart_rate: transform_heart_rate(raw.heart_rate, raw.resting_heart_rate),
            nutrition: transform_nutrition(raw.nutrition, grid),
            step_fields: raw.step_fields,
        }
    }

    /// `(table name, row count)` in store order.
    pub fn row_counts(&self) -> Vec<(&'static str, usize)> {
        vec![
            (ENERGY_TABLE, self.energy.len()),
            (WORKOUT_TABLE, self.workout.len()),
            (BODYWEIGHT_TABLE, self.bodyweight.len()),
            (ACTIVITY_TABLE, self.activity.len()),
            (HEART_RATE_TABLE, self.heart_rate.len()),
            (NUTRITION_TABLE, self.nutrition.len()),
        ]
    }

    /// Encode into store tables, in store order.
    pub fn to_tables(&self) -> Vec<Table> {
        vec![
            Table::from_records(ENERGY_TABLE, &self.energy),
            Table::from_records(WORKOUT_TABLE, &self.workout),
            Table::from_records(BODYWEIGHT_TABLE, &self.bodyweight),
            Table::from_records_with(ACTIVITY_TABLE, &self.step_fields, &self.activity),
            Table::from_records(HEART_RATE_TABLE, &self.heart_rate),
            Table::from_records(NUTRITION_TABLE, &self.nutrition),
        ]
    }
}
