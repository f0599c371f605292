use health_core::models::BodyweightDay;
use health_core::records::HealthSample;
use tracing::debug;

use crate::calendar::{left_join, CalendarGrid};

/// Align manually entered bodyweight measurements onto the daily grid.
///
/// Samples from any source other than `weight_source` are discarded.
pub fn transform_bodyweight(
    samples: Vec<HealthSample>,
    weight_source: &str,
    grid: &CalendarGrid,
) -> Vec<BodyweightDay> {
    let total = samples.len();
    let kept: Vec<BodyweightDay> = samples
        .into_iter()
        .filter(|s| s.source_name == weight_source)
        .map(|s| BodyweightDay {
            date: s.start.date(),
            time: Some(s.start.time()),
            bodyweight: Some(s.value),
            source_name: Some(s.source_name),
            unit: s.unit,
        })
        .collect();
    debug!(
        "Bodyweight: kept {} of {} samples from {:?}",
        kept.len(),
        total,
        weight_source
    );

    left_join(&grid.days(), kept, |b| b.date, |date, matched| {
        if matched.is_empty() {
            vec![BodyweightDay::empty(date)]
        } else {
            matched
        }
    })
}
