use std::collections::BTreeMap;

use chrono::NaiveDate;
use health_core::models::HeartRateSample;
use health_core::records::HealthSample;

/// Outer-join heart-rate samples with the resting heart rate of their day.
///
/// Every sample is paired with each resting record of the same date; samples
/// on days without a resting record keep a null resting rate, and resting
/// records on days without samples produce a row of their own. No calendar
/// completion is applied. Rows are ordered by date, samples in input order.
pub fn transform_heart_rate(
    samples: Vec<HealthSample>,
    resting: Vec<HealthSample>,
) -> Vec<HeartRateSample> {
    let mut resting_by_day: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for r in resting {
        resting_by_day.entry(r.start.date()).or_default().push(r.value);
    }

    let mut samples_by_day: BTreeMap<NaiveDate, Vec<HealthSample>> = BTreeMap::new();
    for s in samples {
        samples_by_day.entry(s.start.date()).or_default().push(s);
    }

    let mut dates: Vec<NaiveDate> = samples_by_day
        .keys()
        .chain(resting_by_day.keys())
        .copied()
        .collect();
    dates.sort();
    dates.dedup();

    let mut out = Vec::new();
    for date in dates {
        let day_samples = samples_by_day.remove(&date).unwrap_or_default();
        let day_resting = resting_by_day.remove(&date).unwrap_or_default();

        match (day_samples.is_empty(), day_resting.is_empty()) {
            (true, _) => out.extend(day_resting.into_iter().map(|rest| HeartRateSample {
                date,
                resting_heart_rate: Some(rest),
                ..Default::default()
            })),
            (false, true) => out.extend(
                day_samples
                    .into_iter()
                    .map(|s| sample_row(date, s, None)),
            ),
            (false, false) => {
                for s in day_samples {
                    for rest in &day_resting {
                        out.push(sample_row(date, s.clone(), Some(*rest)));
                    }
                }
            }
        }
    }
    out
}

fn sample_row(date: NaiveDate, s: HealthSample, resting: Option<f64>) -> HeartRateSample {
    HeartRateSample {
        date,
        time: Some(s.start.time()),
        heart_rate: Some(s.value),
        resting_heart_rate: resting,
        source_name: Some(s.source_name),
        unit: s.unit,
    }
}
