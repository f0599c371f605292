use chrono::NaiveDate;
use health_core::models::{MealSlot, NutritionSlot};
use health_core::records::NutritionRecord;
use tracing::warn;

use crate::calendar::{left_join, CalendarGrid};

/// Align diary lines onto the (day, meal slot) grid.
///
/// Lines whose meal label is not one of the six slots are dropped with a
/// warning. Several lines for the same slot each produce a row.
pub fn transform_nutrition(records: Vec<NutritionRecord>, grid: &CalendarGrid) -> Vec<NutritionSlot> {
    let mut slots = Vec::with_capacity(records.len());
    for r in records {
        let Some(meal) = MealSlot::from_label(&r.meal) else {
            warn!("Dropping nutrition entry on {} with unknown meal {:?}", r.date, r.meal);
            continue;
        };
        slots.push(NutritionSlot {
            date: r.date,
            meal,
            time: r.time,
            calories: r.calories,
            carbs: r.carbs,
            fats: r.fats,
            proteins: r.proteins,
        });
    }

    left_join(
        &grid.meal_slots(),
        slots,
        |s| (s.date, s.meal),
        |(date, meal): (NaiveDate, MealSlot), matched| {
            if matched.is_empty() {
                vec![NutritionSlot::empty(date, meal)]
            } else {
                matched
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2019, 8, d).unwrap()
    }

    fn line(d: u32, meal: &str, calories: f64) -> NutritionRecord {
        NutritionRecord {
            date: date(d),
            meal: meal.to_string(),
            time: NaiveTime::from_hms_opt(8, 0, 0),
            calories: Some(calories),
            carbs: Some(10.0),
            fats: Some(5.0),
            proteins: Some(7.0),
        }
    }

    #[test]
    fn test_six_slots_per_day() {
        let grid = CalendarGrid::new(date(1), date(2).and_hms_opt(10, 0, 0).unwrap());
        let out = transform_nutrition(
            vec![line(1, "Meal 3", 650.0), line(2, "Meal 1", 400.0)],
            &grid,
        );

        assert_eq!(out.len(), 12);
        assert_eq!(out[2].meal, MealSlot::Meal3);
        assert_eq!(out[2].calories, Some(650.0));
        assert_eq!(out[6].calories, Some(400.0));
        assert_eq!(out[0], NutritionSlot::empty(date(1), MealSlot::Meal1));
    }

    #[test]
    fn test_unknown_meal_label_dropped() {
        let grid = CalendarGrid::new(date(1), date(1).and_hms_opt(10, 0, 0).unwrap());
        let out = transform_nutrition(vec![line(1, "Snacks", 200.0)], &grid);
        assert_eq!(out.len(), 6);
        assert!(out.iter().all(|s| s.calories.is_none()));
    }
}
