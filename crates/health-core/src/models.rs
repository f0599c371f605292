//! Canonical cleaned tables written back to the store.
//!
//! Optional fields are the cells a calendar join can leave empty; imputation
//! fills them according to each table's policy before the rows are stored.

use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::table::{Cell, TableRecord};

/// Output table names.
pub const ENERGY_TABLE: &str = "EnergyConsumption";
pub const WORKOUT_TABLE: &str = "Workout";
pub const BODYWEIGHT_TABLE: &str = "Bodyweight";
pub const ACTIVITY_TABLE: &str = "Activity";
pub const HEART_RATE_TABLE: &str = "HeartRate";
pub const NUTRITION_TABLE: &str = "Nutrition";

/// Rows that belong to a calendar date.
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

// ── EnergyConsumption ─────────────────────────────────────────────────────────

/// Whether a burned-energy interval is basal or activity energy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnergyCategory {
    Resting,
    Active,
}

impl EnergyCategory {
    pub fn label(self) -> &'static str {
        match self {
            EnergyCategory::Resting => "Resting",
            EnergyCategory::Active => "active",
        }
    }
}

impl fmt::Display for EnergyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One energy-burn interval.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyRecord {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub value: f64,
    pub unit: Option<String>,
    pub source_name: String,
    pub category: EnergyCategory,
}

impl TableRecord for EnergyRecord {
    const COLUMNS: &'static [&'static str] = &[
        "date",
        "startTime",
        "endTime",
        "value",
        "unit",
        "sourceName",
        "type",
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            self.date.into(),
            self.start_time.into(),
            self.end_time.into(),
            self.value.into(),
            self.unit.clone().into(),
            self.source_name.clone().into(),
            self.category.label().into(),
        ]
    }
}

impl Dated for EnergyRecord {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

// ── Workout ───────────────────────────────────────────────────────────────────

/// One calendar day, carrying the workout recorded on it if any.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkoutDay {
    pub date: NaiveDate,
    pub source_name: Option<String>,
    pub activity_type: Option<String>,
    pub duration: Option<f64>,
    pub duration_unit: Option<String>,
    pub total_distance: Option<f64>,
    pub total_distance_unit: Option<String>,
    pub total_energy_burned: Option<f64>,
    pub total_energy_burned_unit: Option<String>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

impl WorkoutDay {
    /// A grid day with no recorded workout.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            ..Default::default()
        }
    }
}

impl TableRecord for WorkoutDay {
    const COLUMNS: &'static [&'static str] = &[
        "date",
        "sourceName",
        "workoutActivityType",
        "duration",
        "durationUnit",
        "totalDistance",
        "totalDistanceUnit",
        "totalEnergyBurned",
        "totalEnergyBurnedUnit",
        "startTime",
        "endTime",
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            self.date.into(),
            self.source_name.clone().into(),
            self.activity_type.clone().into(),
            self.duration.into(),
            self.duration_unit.clone().into(),
            self.total_distance.into(),
            self.total_distance_unit.clone().into(),
            self.total_energy_burned.into(),
            self.total_energy_burned_unit.clone().into(),
            self.start_time.into(),
            self.end_time.into(),
        ]
    }
}

impl Dated for WorkoutDay {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

// ── Bodyweight ────────────────────────────────────────────────────────────────

/// One calendar day's bodyweight measurement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BodyweightDay {
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub bodyweight: Option<f64>,
    pub source_name: Option<String>,
    pub unit: Option<String>,
}

impl BodyweightDay {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            ..Default::default()
        }
    }
}

impl TableRecord for BodyweightDay {
    const COLUMNS: &'static [&'static str] = &["date", "time", "bodyweight", "sourceName", "unit"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            self.date.into(),
            self.time.into(),
            self.bodyweight.into(),
            self.source_name.clone().into(),
            self.unit.clone().into(),
        ]
    }
}

impl Dated for BodyweightDay {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

// ── Activity ──────────────────────────────────────────────────────────────────

/// Standing minutes and steps within one clock hour.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityHour {
    pub date: NaiveDate,
    pub hour: u32,
    pub standing: Option<f64>,
    pub steps: Option<f64>,
    /// Hourly sums of the other step-export columns, appended after the
    /// fixed columns when encoded.
    pub step_fields: Vec<Option<f64>>,
}

impl ActivityHour {
    /// An hour with nothing recorded and `fields` extra step columns.
    pub fn empty(date: NaiveDate, hour: u32, fields: usize) -> Self {
        Self {
            date,
            hour,
            standing: None,
            steps: None,
            step_fields: vec![None; fields],
        }
    }
}

impl TableRecord for ActivityHour {
    const COLUMNS: &'static [&'static str] = &["date", "hour", "standing", "steps"];

    fn cells(&self) -> Vec<Cell> {
        let mut cells = vec![
            self.date.into(),
            self.hour.into(),
            self.standing.into(),
            self.steps.into(),
        ];
        cells.extend(self.step_fields.iter().map(|v| Cell::from(*v)));
        cells
    }
}

impl Dated for ActivityHour {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

// ── HeartRate ─────────────────────────────────────────────────────────────────

/// A heart-rate sample joined with the resting heart rate of its day.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HeartRateSample {
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub heart_rate: Option<f64>,
    pub resting_heart_rate: Option<f64>,
    pub source_name: Option<String>,
    pub unit: Option<String>,
}

impl TableRecord for HeartRateSample {
    const COLUMNS: &'static [&'static str] = &[
        "date",
        "time",
        "heartRate",
        "restingHeartRate",
        "sourceName",
        "unit",
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            self.date.into(),
            self.time.into(),
            self.heart_rate.into(),
            self.resting_heart_rate.into(),
            self.source_name.clone().into(),
            self.unit.clone().into(),
        ]
    }
}

impl Dated for HeartRateSample {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

// ── Nutrition ─────────────────────────────────────────────────────────────────

/// One of the six fixed meal positions of a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MealSlot {
    Meal1,
    Meal2,
    Meal3,
    Meal4,
    Meal5,
    Meal6,
}

impl MealSlot {
    pub const ALL: [MealSlot; 6] = [
        MealSlot::Meal1,
        MealSlot::Meal2,
        MealSlot::Meal3,
        MealSlot::Meal4,
        MealSlot::Meal5,
        MealSlot::Meal6,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MealSlot::Meal1 => "Meal 1",
            MealSlot::Meal2 => "Meal 2",
            MealSlot::Meal3 => "Meal 3",
            MealSlot::Meal4 => "Meal 4",
            MealSlot::Meal5 => "Meal 5",
            MealSlot::Meal6 => "Meal 6",
        }
    }

    /// Exact match on the diary label, e.g. `"Meal 3"`.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.label() == label.trim())
    }

    /// Clock time assumed for the slot when the diary has none.
    pub fn default_time(self) -> NaiveTime {
        let hour = match self {
            MealSlot::Meal1 => 7,
            MealSlot::Meal2 => 10,
            MealSlot::Meal3 => 13,
            MealSlot::Meal4 => 16,
            MealSlot::Meal5 => 19,
            MealSlot::Meal6 => 21,
        };
        NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl fmt::Display for MealSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One meal slot of one calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct NutritionSlot {
    pub date: NaiveDate,
    pub meal: MealSlot,
    pub time: Option<NaiveTime>,
    pub calories: Option<f64>,
    pub carbs: Option<f64>,
    pub fats: Option<f64>,
    pub proteins: Option<f64>,
}

impl NutritionSlot {
    pub fn empty(date: NaiveDate, meal: MealSlot) -> Self {
        Self {
            date,
            meal,
            time: None,
            calories: None,
            carbs: None,
            fats: None,
            proteins: None,
        }
    }
}

impl TableRecord for NutritionSlot {
    const COLUMNS: &'static [&'static str] = &[
        "date", "meal", "time", "calories", "carbs", "fats", "proteins",
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            self.date.into(),
            self.meal.label().into(),
            self.time.into(),
            self.calories.into(),
            self.carbs.into(),
            self.fats.into(),
            self.proteins.into(),
        ]
    }
}

impl Dated for NutritionSlot {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
