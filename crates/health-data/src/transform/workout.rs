use health_core::models::WorkoutDay;
use health_core::records::WorkoutRecord;
use regex::Regex;

use crate::calendar::{left_join, CalendarGrid};

/// Align recorded workouts onto the daily grid.
///
/// Days without a workout get one empty row; days with several keep one row
/// per workout in input order.
pub fn transform_workout(records: Vec<WorkoutRecord>, grid: &CalendarGrid) -> Vec<WorkoutDay> {
    let re = Regex::new(r"^HKWorkoutActivityType(.+)$").expect("regex is valid");

    let days: Vec<WorkoutDay> = records
        .into_iter()
        .map(|r| WorkoutDay {
            date: r.start.date(),
            source_name: Some(r.source_name),
            activity_type: Some(activity_type(&re, &r.activity_type)),
            duration: r.duration,
            duration_unit: r.duration_unit,
            total_distance: r.total_distance,
            total_distance_unit: r.total_distance_unit,
            total_energy_burned: r.total_energy_burned,
            total_energy_burned_unit: r.total_energy_burned_unit,
            start_time: Some(r.start.time()),
            end_time: Some(r.end.time()),
        })
        .collect();

    left_join(&grid.days(), days, |w| w.date, |date, matched| {
        if matched.is_empty() {
            vec![WorkoutDay::empty(date)]
        } else {
            matched
        }
    })
}

/// `HKWorkoutActivityTypeRunning` → `Running`; other values pass through.
fn activity_type(re: &Regex, raw: &str) -> String {
    re.captures(raw)
        .map(|cap| cap[1].to_string())
        .unwrap_or_else(|| raw.to_string())
}
