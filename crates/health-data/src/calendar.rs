//! Calendar grids and left joins onto them.
//!
//! A grid enumerates every key from the epoch up to "now": days, clock hours
//! or (day, meal) slots. Joining observations onto a grid yields exactly one
//! output per grid key, or one per matching observation when several share a
//! key, and observations whose key is not on the grid are dropped.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use health_core::models::MealSlot;

/// The span of calendar keys covered by a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarGrid {
    epoch: NaiveDate,
    now: NaiveDateTime,
}

impl CalendarGrid {
    pub fn new(epoch: NaiveDate, now: NaiveDateTime) -> Self {
        Self { epoch, now }
    }

    /// Every date from the epoch through today, inclusive.
    pub fn days(&self) -> Vec<NaiveDate> {
        self.epoch
            .iter_days()
            .take_while(|d| *d <= self.now.date())
            .collect()
    }

    /// Every whole hour from the epoch's midnight through the hour of "now".
    pub fn hours(&self) -> Vec<(NaiveDate, u32)> {
        let last = self
            .now
            .with_minute(0)
            .and_then(|t| t.with_second(0))
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(self.now);

        let mut hours = Vec::new();
        let mut current = self.epoch.and_time(chrono::NaiveTime::MIN);
        while current <= last {
            hours.push((current.date(), current.hour()));
            current += Duration::hours(1);
        }
        hours
    }

    /// Six meal slots for each grid day.
    pub fn meal_slots(&self) -> Vec<(NaiveDate, MealSlot)> {
        self.days()
            .into_iter()
            .flat_map(|d| MealSlot::ALL.into_iter().map(move |m| (d, m)))
            .collect()
    }
}

/// Left-join `rows` onto `grid`.
///
/// `emit` receives each grid key together with the rows sharing it, in their
/// original order, and returns the output rows for that key. Rows whose key
/// is not on the grid never reach `emit`.
pub fn left_join<K, R, O>(
    grid: &[K],
    rows: Vec<R>,
    key: impl Fn(&R) -> K,
    mut emit: impl FnMut(K, Vec<R>) -> Vec<O>,
) -> Vec<O>
where
    K: Ord + Copy,
{
    let mut by_key: BTreeMap<K, Vec<R>> = BTreeMap::new();
    for row in rows {
        by_key.entry(key(&row)).or_default().push(row);
    }

    let mut out = Vec::with_capacity(grid.len());
    for k in grid {
        let matched = by_key.remove(k).unwrap_or_default();
        out.extend(emit(*k, matched));
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
