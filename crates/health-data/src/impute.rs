//! Missing-value imputation for the cleaned tables.
//!
//! Runs after calendar alignment and date filtering. Each function applies one
//! table's policy in place.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, NaiveTime};
use health_core::error::{HealthError, Result};
use health_core::models::{ActivityHour, BodyweightDay, NutritionSlot, WorkoutDay};
use health_core::stats::{median, round_to};
use serde::Serialize;
use tracing::debug;

/// Sentinel activity type for days without a workout.
pub const NO_WORKOUT: &str = "NoWorkout";

pub const DEFAULT_WEIGHT_UNIT: &str = "kg";

/// Units assumed when no earlier workout carries one.
pub const DEFAULT_DURATION_UNIT: &str = "min";
pub const DEFAULT_DISTANCE_UNIT: &str = "km";
pub const DEFAULT_ENERGY_UNIT: &str = "kcal";

/// kcal per gram.
const FAT_KCAL_PER_GRAM: f64 = 9.3;
const PROTEIN_KCAL_PER_GRAM: f64 = 4.1;
const CARBS_KCAL_PER_GRAM: f64 = 4.1;

/// Share of substituted energy per macro.
const FAT_SHARE: f64 = 0.2;
const PROTEIN_SHARE: f64 = 0.4;
const CARBS_SHARE: f64 = 0.4;

// ── Bodyweight ────────────────────────────────────────────────────────────────

/// Interpolate bodyweight linearly between measured days and round to one
/// decimal.
///
/// Days before the first measurement take the first value, days after the
/// last take the last. Fails when no day carries a measurement.
pub fn impute_bodyweight(rows: &mut [BodyweightDay], weight_source: &str) -> Result<()> {
    let values: Vec<Option<f64>> = rows.iter().map(|r| r.bodyweight).collect();
    let filled = interpolate_linear(&values).ok_or_else(|| {
        HealthError::InsufficientData("no bodyweight measurement to interpolate from".to_string())
    })?;

    for (row, value) in rows.iter_mut().zip(filled) {
        row.bodyweight = Some(round_to(value, 1));
        row.time.get_or_insert(NaiveTime::MIN);
        row.source_name
            .get_or_insert_with(|| weight_source.to_string());
        row.unit.get_or_insert_with(|| DEFAULT_WEIGHT_UNIT.to_string());
    }
    Ok(())
}

/// Fill gaps by linear interpolation over row position.
///
/// Returns `None` when every value is missing.
fn interpolate_linear(values: &[Option<f64>]) -> Option<Vec<f64>> {
    let known: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i, v)))
        .collect();
    let (&(first_idx, first), &(last_idx, last)) = (known.first()?, known.last()?);

    let mut out = Vec::with_capacity(values.len());
    let mut next = 0;
    for (i, v) in values.iter().enumerate() {
        if let Some(v) = v {
            out.push(*v);
            next += 1;
            continue;
        }
        if i < first_idx {
            out.push(first);
        } else if i > last_idx {
            out.push(last);
        } else {
            let (lo_idx, lo) = known[next - 1];
            let (hi_idx, hi) = known[next];
            let frac = (i - lo_idx) as f64 / (hi_idx - lo_idx) as f64;
            out.push(lo + frac * (hi - lo));
        }
    }
    Some(out)
}

// ── Workout ───────────────────────────────────────────────────────────────────

/// Fill days without a workout with sentinel values.
///
/// Unit columns inherit the previous row's unit; measurements become zero.
pub fn impute_workout(rows: &mut [WorkoutDay], workout_source: &str) {
    let mut duration_unit = DEFAULT_DURATION_UNIT.to_string();
    let mut distance_unit = DEFAULT_DISTANCE_UNIT.to_string();
    let mut energy_unit = DEFAULT_ENERGY_UNIT.to_string();

    for row in rows.iter_mut() {
        row.activity_type
            .get_or_insert_with(|| NO_WORKOUT.to_string());
        row.source_name
            .get_or_insert_with(|| workout_source.to_string());
        row.start_time.get_or_insert(NaiveTime::MIN);
        row.end_time.get_or_insert(NaiveTime::MIN);

        forward_fill(&mut row.duration_unit, &mut duration_unit);
        forward_fill(&mut row.total_distance_unit, &mut distance_unit);
        forward_fill(&mut row.total_energy_burned_unit, &mut energy_unit);

        row.duration.get_or_insert(0.0);
        row.total_distance.get_or_insert(0.0);
        row.total_energy_burned.get_or_insert(0.0);
    }
}

fn forward_fill(cell: &mut Option<String>, last: &mut String) {
    match cell {
        Some(value) => last.clone_from(value),
        None => *cell = Some(last.clone()),
    }
}

// ── Activity ──────────────────────────────────────────────────────────────────

/// An hour with nothing recorded is zero standing minutes, zero steps and
/// zero in every extra step column.
pub fn impute_activity(rows: &mut [ActivityHour]) {
    for row in rows.iter_mut() {
        row.standing.get_or_insert(0.0);
        row.steps.get_or_insert(0.0);
        for field in row.step_fields.iter_mut() {
            field.get_or_insert(0.0);
        }
    }
}

// ── Nutrition ─────────────────────────────────────────────────────────────────

/// What the nutrition substitution did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NutritionImputation {
    /// Days whose recorded calories summed to zero.
    pub substituted_days: Vec<NaiveDate>,
    /// Median daily calorie total over all days, if any.
    pub median_daily_calories: Option<f64>,
    /// Calories assigned to each slot of a substituted day.
    pub slot_calories: Option<f64>,
}

/// Substitute unrecorded days, then zero-fill and default meal times.
///
/// Days whose calorie total is zero are determined before anything is
/// filled. Each of their slots receives `median / 6` calories split across
/// macros by fixed energy shares.
pub fn impute_nutrition(rows: &mut [NutritionSlot]) -> NutritionImputation {
    let mut daily: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for row in rows.iter() {
        *daily.entry(row.date).or_insert(0.0) += row.calories.unwrap_or(0.0);
    }
    let empty_days: BTreeSet<NaiveDate> = daily
        .iter()
        .filter(|(_, total)| **total == 0.0)
        .map(|(date, _)| *date)
        .collect();

    let totals: Vec<f64> = daily.values().copied().collect();
    let median_daily = median(&totals);
    let slot_calories = median_daily.map(|m| m / 6.0);

    if let Some(m) = slot_calories {
        let calories = round_to(m, 1);
        let fats = round_to(m * FAT_SHARE / FAT_KCAL_PER_GRAM, 1);
        let proteins = round_to(m * PROTEIN_SHARE / PROTEIN_KCAL_PER_GRAM, 1);
        let carbs = round_to(m * CARBS_SHARE / CARBS_KCAL_PER_GRAM, 1);

        for row in rows.iter_mut().filter(|r| empty_days.contains(&r.date)) {
            row.calories = Some(calories);
            row.fats = Some(fats);
            row.proteins = Some(proteins);
            row.carbs = Some(carbs);
        }
    }

    for row in rows.iter_mut() {
        row.calories.get_or_insert(0.0);
        row.fats.get_or_insert(0.0);
        row.carbs.get_or_insert(0.0);
        row.proteins.get_or_insert(0.0);
        row.time.get_or_insert(row.meal.default_time());
    }

    debug!(
        "Nutrition: {} of {} days substituted, median daily total {:?}",
        empty_days.len(),
        daily.len(),
        median_daily
    );

    NutritionImputation {
        substituted_days: empty_days.into_iter().collect(),
        median_daily_calories: median_daily,
        slot_calories,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use health_core::models::MealSlot;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2019, 8, d).unwrap()
    }

    // ── bodyweight ────────────────────────────────────────────────────────────

    fn weights(values: &[Option<f64>]) -> Vec<BodyweightDay> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| BodyweightDay {
                bodyweight: *v,
                ..BodyweightDay::empty(date(i as u32 + 1))
            })
            .collect()
    }

    #[test]
    fn test_bodyweight_linear_between_measurements() {
        let mut rows = weights(&[Some(70.0), None, None, None, Some(74.0)]);
        impute_bodyweight(&mut rows, "Health").unwrap();
        let values: Vec<f64> = rows.iter().map(|r| r.bodyweight.unwrap()).collect();
        assert_eq!(values, vec![70.0, 71.0, 72.0, 73.0, 74.0]);
    }

    #[test]
    fn test_bodyweight_rounds_and_fills_edges() {
        let mut rows = weights(&[None, Some(70.0), None, None, Some(71.0), None]);
        impute_bodyweight(&mut rows, "Health").unwrap();
        let values: Vec<f64> = rows.iter().map(|r| r.bodyweight.unwrap()).collect();
        assert_eq!(values, vec![70.0, 70.0, 70.3, 70.7, 71.0, 71.0]);
    }

    #[test]
    fn test_bodyweight_defaults() {
        let mut rows = weights(&[Some(70.0), None]);
        rows[0].unit = Some("lb".to_string());
        impute_bodyweight(&mut rows, "Health").unwrap();
        assert_eq!(rows[0].unit.as_deref(), Some("lb"));
        assert_eq!(rows[1].unit.as_deref(), Some(DEFAULT_WEIGHT_UNIT));
        assert_eq!(rows[1].source_name.as_deref(), Some("Health"));
        assert_eq!(rows[1].time, Some(NaiveTime::MIN));
    }

    #[test]
    fn test_bodyweight_without_measurements_fails() {
        let mut rows = weights(&[None, None]);
        let err = impute_bodyweight(&mut rows, "Health").unwrap_err();
        assert!(matches!(err, HealthError::InsufficientData(_)));
    }

    // ── workout ───────────────────────────────────────────────────────────────

    #[test]
    fn test_workout_sentinels_and_forward_fill() {
        let mut rows = vec![
            WorkoutDay::empty(date(1)),
            WorkoutDay {
                activity_type: Some("Running".to_string()),
                duration: Some(30.0),
                duration_unit: Some("h".to_string()),
                total_distance_unit: Some("mi".to_string()),
                ..WorkoutDay::empty(date(2))
            },
            WorkoutDay::empty(date(3)),
        ];
        impute_workout(&mut rows, "GymGoal Pro");

        assert_eq!(rows[0].activity_type.as_deref(), Some(NO_WORKOUT));
        assert_eq!(rows[0].source_name.as_deref(), Some("GymGoal Pro"));
        assert_eq!(rows[0].duration_unit.as_deref(), Some(DEFAULT_DURATION_UNIT));
        assert_eq!(rows[0].start_time, Some(NaiveTime::MIN));
        assert_eq!(rows[0].duration, Some(0.0));

        assert_eq!(rows[1].activity_type.as_deref(), Some("Running"));
        assert_eq!(rows[1].duration, Some(30.0));

        assert_eq!(rows[2].duration_unit.as_deref(), Some("h"));
        assert_eq!(rows[2].total_distance_unit.as_deref(), Some("mi"));
        assert_eq!(
            rows[2].total_energy_burned_unit.as_deref(),
            Some(DEFAULT_ENERGY_UNIT)
        );
        assert_eq!(rows[2].total_energy_burned, Some(0.0));
    }

    // ── activity ──────────────────────────────────────────────────────────────

    #[test]
    fn test_activity_gaps_become_zero() {
        let mut rows = vec![
            ActivityHour::empty(date(1), 0, 1),
            ActivityHour {
                standing: Some(4.0),
                step_fields: vec![Some(2.0)],
                ..ActivityHour::empty(date(1), 1, 1)
            },
        ];
        impute_activity(&mut rows);
        assert_eq!(rows[0].standing, Some(0.0));
        assert_eq!(rows[0].steps, Some(0.0));
        assert_eq!(rows[0].step_fields, vec![Some(0.0)]);
        assert_eq!(rows[1].standing, Some(4.0));
        assert_eq!(rows[1].step_fields, vec![Some(2.0)]);
    }

    // ── nutrition ─────────────────────────────────────────────────────────────

    fn day_slots(d: u32, calories: [Option<f64>; 6]) -> Vec<NutritionSlot> {
        MealSlot::ALL
            .iter()
            .zip(calories)
            .map(|(meal, c)| NutritionSlot {
                calories: c,
                carbs: c.map(|_| 50.0),
                ..NutritionSlot::empty(date(d), *meal)
            })
            .collect()
    }

    #[test]
    fn test_nutrition_zero_day_substituted_on_every_slot() {
        let mut rows = day_slots(1, [Some(600.0), Some(600.0), Some(600.0), None, None, None]);
        rows.extend(day_slots(2, [Some(0.0), Some(0.0), Some(0.0), Some(0.0), Some(0.0), Some(0.0)]));
        rows.extend(day_slots(3, [Some(2400.0), None, None, None, None, None]));

        let outcome = impute_nutrition(&mut rows);

        // Totals 1800, 0, 2400 → median 1800 → 300 per slot.
        assert_eq!(outcome.substituted_days, vec![date(2)]);
        assert_eq!(outcome.median_daily_calories, Some(1800.0));
        for slot in rows.iter().filter(|r| r.date == date(2)) {
            assert_eq!(slot.calories, Some(300.0));
            assert_eq!(slot.fats, Some(6.5));
            assert_eq!(slot.proteins, Some(29.3));
            assert_eq!(slot.carbs, Some(29.3));
        }
    }

    #[test]
    fn test_nutrition_nonzero_day_untouched() {
        let mut rows = day_slots(1, [Some(500.0), None, None, None, None, None]);
        rows.extend(day_slots(2, [None; 6]));
        impute_nutrition(&mut rows);

        assert_eq!(rows[0].calories, Some(500.0));
        assert_eq!(rows[0].carbs, Some(50.0));
        assert_eq!(rows[0].fats, Some(0.0));
        assert_eq!(rows[1].calories, Some(0.0));
        assert_eq!(rows[1].carbs, Some(0.0));
    }

    #[test]
    fn test_nutrition_meal_times_default_per_slot() {
        let mut rows = day_slots(1, [Some(500.0); 6]);
        rows[2].time = NaiveTime::from_hms_opt(12, 30, 0);
        impute_nutrition(&mut rows);

        assert_eq!(rows[0].time, NaiveTime::from_hms_opt(7, 0, 0));
        assert_eq!(rows[2].time, NaiveTime::from_hms_opt(12, 30, 0));
        assert_eq!(rows[5].time, NaiveTime::from_hms_opt(21, 0, 0));
    }

    #[test]
    fn test_nutrition_empty_input() {
        let mut rows: Vec<NutritionSlot> = vec![];
        let outcome = impute_nutrition(&mut rows);
        assert_eq!(outcome, NutritionImputation::default());
    }
}
