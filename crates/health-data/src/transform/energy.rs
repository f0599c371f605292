use health_core::models::{EnergyCategory, EnergyRecord};
use health_core::records::HealthSample;
use tracing::debug;

/// Combine basal and active energy samples into one interval table.
///
/// Every basal sample is kept. Active samples are kept only when their source
/// matches `active_source` exactly. The result is ordered by date; rows on the
/// same date keep their input order, basal before active.
pub fn transform_energy(
    rest: Vec<HealthSample>,
    active: Vec<HealthSample>,
    active_source: &str,
) -> Vec<EnergyRecord> {
    let active_total = active.len();
    let active: Vec<HealthSample> = active
        .into_iter()
        .filter(|s| s.source_name == active_source)
        .collect();
    debug!(
        "Energy: kept {} of {} active samples from {:?}",
        active.len(),
        active_total,
        active_source
    );

    let mut records: Vec<EnergyRecord> = rest
        .into_iter()
        .map(|s| to_record(s, EnergyCategory::Resting))
        .chain(active.into_iter().map(|s| to_record(s, EnergyCategory::Active)))
        .collect();

    records.sort_by_key(|r| r.date);
    records
}

fn to_record(sample: HealthSample, category: EnergyCategory) -> EnergyRecord {
    EnergyRecord {
        date: sample.start.date(),
        start_time: sample.start.time(),
        end_time: sample.end.time(),
        value: sample.value,
        unit: sample.unit,
        source_name: sample.source_name,
        category,
    }
}
