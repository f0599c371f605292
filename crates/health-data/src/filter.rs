use chrono::NaiveDate;
use health_core::error::{HealthError, Result};
use health_core::models::Dated;
use tracing::debug;

/// Keep rows dated strictly after `cutoff` and strictly before the latest
/// date in `rows`, which is always an incomplete day at run time.
///
/// The latest date is computed from the rows themselves, so physical order
/// does not matter. An empty input is an [`HealthError::InsufficientData`].
pub fn date_filter<T: Dated>(table: &str, rows: Vec<T>, cutoff: NaiveDate) -> Result<Vec<T>> {
    let last_day = rows.iter().map(Dated::date).max().ok_or_else(|| {
        HealthError::InsufficientData(format!("{} has no rows to date-filter", table))
    })?;

    let before = rows.len();
    let kept: Vec<T> = rows
        .into_iter()
        .filter(|r| r.date() > cutoff && r.date() < last_day)
        .collect();
    debug!(
        "{}: kept {} of {} rows between {} and {}",
        table,
        kept.len(),
        before,
        cutoff,
        last_day
    );
    Ok(kept)
}
