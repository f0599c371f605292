use std::collections::BTreeMap;

use chrono::{NaiveDate, Timelike};
use health_core::models::ActivityHour;
use health_core::records::{HealthSample, StepRecord};

use crate::calendar::{left_join, CalendarGrid};

type HourKey = (NaiveDate, u32);

/// Per-hour standing minutes and steps on the hourly grid.
///
/// Sub-hour stand records are summed within their clock hour, as are step
/// records and each of the `step_fields` columns they carry. A sum over
/// records that are all null stays null.
pub fn transform_activity(
    standing: Vec<HealthSample>,
    steps: Vec<StepRecord>,
    step_fields: &[String],
    grid: &CalendarGrid,
) -> Vec<ActivityHour> {
    let width = step_fields.len();
    let empty = |(date, hour): HourKey| ActivityHour::empty(date, hour, width);
    let mut hours: BTreeMap<HourKey, ActivityHour> = BTreeMap::new();

    for s in standing {
        let key = (s.start.date(), s.start.hour());
        let hour = hours.entry(key).or_insert_with(|| empty(key));
        hour.standing = Some(hour.standing.unwrap_or(0.0) + s.value);
    }

    for r in steps {
        let key = (r.timestamp.date(), r.timestamp.hour());
        let hour = hours.entry(key).or_insert_with(|| empty(key));
        add(&mut hour.steps, r.steps);
        for (sum, value) in hour.step_fields.iter_mut().zip(r.fields) {
            add(sum, value);
        }
    }

    left_join(
        &grid.hours(),
        hours.into_values().collect(),
        |h| (h.date, h.hour),
        |key, matched| {
            if matched.is_empty() {
                vec![empty(key)]
            } else {
                matched
            }
        },
    )
}

fn add(sum: &mut Option<f64>, value: Option<f64>) {
    if let Some(n) = value {
        *sum = Some(sum.unwrap_or(0.0) + n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2019, 8, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn stand(d: u32, h: u32, m: u32, minutes: f64) -> HealthSample {
        HealthSample {
            source_name: "Watch".to_string(),
            unit: Some("min".to_string()),
            start: at(d, h, m),
            end: at(d, h, m),
            value: minutes,
        }
    }

    fn steps(d: u32, h: u32, m: u32, n: Option<f64>) -> StepRecord {
        StepRecord {
            timestamp: at(d, h, m),
            steps: n,
            fields: vec![],
        }
    }

    #[test]
    fn test_one_row_per_grid_hour() {
        let grid = CalendarGrid::new(
            NaiveDate::from_ymd_opt(2019, 8, 1).unwrap(),
            at(1, 5, 59),
        );
        let out = transform_activity(
            vec![stand(1, 2, 0, 1.0), stand(1, 2, 15, 2.0), stand(1, 2, 40, 3.0)],
            vec![
                steps(1, 2, 0, Some(100.0)),
                steps(1, 2, 30, Some(50.0)),
                steps(1, 4, 0, Some(7.0)),
                steps(1, 4, 10, None),
            ],
            &[],
            &grid,
        );

        assert_eq!(out.len(), 6);
        assert_eq!(out.iter().map(|h| h.hour).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(out[2].standing, Some(6.0));
        assert_eq!(out[2].steps, Some(150.0));
        assert_eq!(out[4].standing, None);
        assert_eq!(out[4].steps, Some(7.0));
        assert_eq!(out[3].standing, None);
        assert_eq!(out[3].steps, None);
    }

    #[test]
    fn test_hours_outside_grid_dropped() {
        let grid = CalendarGrid::new(
            NaiveDate::from_ymd_opt(2019, 8, 1).unwrap(),
            at(1, 1, 0),
        );
        let out = transform_activity(vec![stand(1, 3, 0, 1.0)], vec![], &[], &grid);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|h| h.standing.is_none()));
    }

    #[test]
    fn test_step_fields_summed_per_hour() {
        let grid = CalendarGrid::new(
            NaiveDate::from_ymd_opt(2019, 8, 1).unwrap(),
            at(1, 2, 0),
        );
        let fields = vec!["floors".to_string()];
        let record = |m, floors| StepRecord {
            fields: vec![floors],
            ..steps(1, 1, m, Some(10.0))
        };
        let out = transform_activity(
            vec![],
            vec![record(0, Some(2.0)), record(20, None), record(40, Some(1.0))],
            &fields,
            &grid,
        );

        assert_eq!(out.len(), 3);
        assert_eq!(out[0].step_fields, vec![None]);
        assert_eq!(out[1].steps, Some(30.0));
        assert_eq!(out[1].step_fields, vec![Some(3.0)]);
        assert_eq!(out[2].step_fields, vec![None]);
    }
}
