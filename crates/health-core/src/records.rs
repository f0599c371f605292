//! Typed views of the raw export tables.
//!
//! Each record reads only the columns the transforms use; bookkeeping
//! columns (device, source version, creation date) are never decoded.
//! Timestamps are parsed here, so a malformed value fails the decode.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::Result;
use crate::table::{FromRow, Row};
use crate::time_utils::{parse_date, parse_time, parse_timestamp};

/// Raw table names as loaded by the ingestion stage.
pub const RAW_WORKOUT: &str = "Workout";
pub const RAW_ACTIVE_ENERGY: &str = "ActiveEnergy";
pub const RAW_REST_ENERGY: &str = "RestEnergy";
pub const RAW_BODYWEIGHT: &str = "Bodyweight";
pub const RAW_STEPS: &str = "Steps";
pub const RAW_STANDING: &str = "Standing";
pub const RAW_HEART_RATE: &str = "HeartRate";
pub const RAW_RESTING_HEART_RATE: &str = "RestingHeartRate";
pub const RAW_NUTRITION: &str = "Nutrition";

fn timestamp(row: &Row<'_>, column: &str) -> Result<NaiveDateTime> {
    parse_timestamp(&row.required_text(column)?)
}

// ── HealthSample ──────────────────────────────────────────────────────────────

/// A quantity sample from the health-device export (energy, body mass,
/// stand time, heart rate, resting heart rate).
#[derive(Debug, Clone, PartialEq)]
pub struct HealthSample {
    pub source_name: String,
    pub unit: Option<String>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub value: f64,
}

impl FromRow for HealthSample {
    const REQUIRED_COLUMNS: &'static [&'static str] =
        &["sourceName", "startDate", "endDate", "value"];

    fn from_row(row: &Row<'_>) -> Result<Self> {
        Ok(Self {
            source_name: row.required_text("sourceName")?,
            unit: row.get("unit").and_then(|c| c.as_text()),
            start: timestamp(row, "startDate")?,
            end: timestamp(row, "endDate")?,
            value: row.required_number("value")?,
        })
    }
}

// ── WorkoutRecord ─────────────────────────────────────────────────────────────

/// A recorded workout from the health-device export.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutRecord {
    pub source_name: String,
    pub activity_type: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub duration: Option<f64>,
    pub duration_unit: Option<String>,
    pub total_distance: Option<f64>,
    pub total_distance_unit: Option<String>,
    pub total_energy_burned: Option<f64>,
    pub total_energy_burned_unit: Option<String>,
}

impl FromRow for WorkoutRecord {
    const REQUIRED_COLUMNS: &'static [&'static str] = &[
        "sourceName",
        "workoutActivityType",
        "startDate",
        "endDate",
        "duration",
        "durationUnit",
        "totalDistance",
        "totalDistanceUnit",
        "totalEnergyBurned",
        "totalEnergyBurnedUnit",
    ];

    fn from_row(row: &Row<'_>) -> Result<Self> {
        Ok(Self {
            source_name: row.required_text("sourceName")?,
            activity_type: row.required_text("workoutActivityType")?,
            start: timestamp(row, "startDate")?,
            end: timestamp(row, "endDate")?,
            duration: row.number("duration")?,
            duration_unit: row.text("durationUnit")?,
            total_distance: row.number("totalDistance")?,
            total_distance_unit: row.text("totalDistanceUnit")?,
            total_energy_burned: row.number("totalEnergyBurned")?,
            total_energy_burned_unit: row.text("totalEnergyBurnedUnit")?,
        })
    }
}

// ── StepRecord ────────────────────────────────────────────────────────────────

/// Step-export columns that never reach the Activity table.
pub const STEP_DROPPED_COLUMNS: &[&str] = &["duration", "distance", "calories"];

fn is_step_field(column: &str) -> bool {
    column != "date" && column != "steps" && !STEP_DROPPED_COLUMNS.contains(&column)
}

/// The per-hour step columns carried into Activity besides `steps`, in
/// header order.
pub fn step_field_columns(columns: &[String]) -> Vec<String> {
    columns.iter().filter(|c| is_step_field(c)).cloned().collect()
}

/// One row of the step-counter export, after header normalisation.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord {
    pub timestamp: NaiveDateTime,
    pub steps: Option<f64>,
    /// Values of [`step_field_columns`], in the same order.
    pub fields: Vec<Option<f64>>,
}

impl FromRow for StepRecord {
    const REQUIRED_COLUMNS: &'static [&'static str] = &["date", "steps"];

    fn from_row(row: &Row<'_>) -> Result<Self> {
        let fields = row
            .columns()
            .iter()
            .filter(|c| is_step_field(c))
            .map(|c| row.number(c))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            timestamp: timestamp(row, "date")?,
            steps: row.number("steps")?,
            fields,
        })
    }
}

// ── NutritionRecord ───────────────────────────────────────────────────────────

/// One meal line of the diet-diary export.
#[derive(Debug, Clone, PartialEq)]
pub struct NutritionRecord {
    pub date: NaiveDate,
    pub meal: String,
    pub time: Option<NaiveTime>,
    pub calories: Option<f64>,
    pub carbs: Option<f64>,
    pub fats: Option<f64>,
    pub proteins: Option<f64>,
}

impl FromRow for NutritionRecord {
    const REQUIRED_COLUMNS: &'static [&'static str] = &["Date", "Meal", "Time", "Calories"];

    fn from_row(row: &Row<'_>) -> Result<Self> {
        let time = match row.text("Time")? {
            Some(t) => Some(parse_time(&t)?),
            None => None,
        };
        Ok(Self {
            date: parse_date(&row.required_text("Date")?)?,
            meal: row.required_text("Meal")?,
            time,
            calories: row.number("Calories")?,
            carbs: row.optional_number("Carbohydrates (g)")?,
            fats: row.optional_number("Fat (g)")?,
            proteins: row.optional_number("Protein (g)")?,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
