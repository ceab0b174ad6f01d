use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::types::{RawObservation, SeriesKey};

/// Raw upstream observations keyed by series, each list in any date order.
pub type SeriesObservations = BTreeMap<SeriesKey, Vec<RawObservation>>;

/// Last known value of a series carried in from a previously persisted record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeedValue {
    pub value: f64,
    /// Date of the genuine observation the value came from.
    pub observed: NaiveDate,
}

pub type Seed = BTreeMap<SeriesKey, SeedValue>;

/// One dense calendar day after forward-filling.
#[derive(Debug, Clone, PartialEq)]
pub struct FilledRow {
    pub date: NaiveDate,
    pub values: BTreeMap<SeriesKey, f64>,
    pub last_observed: BTreeMap<SeriesKey, NaiveDate>,
}

impl FilledRow {
    pub fn value(&self, key: SeriesKey) -> Option<f64> {
        self.values.get(&key).copied()
    }
}

/// Align sparse observations onto every calendar day in `[start, end]`.
///
/// A day with a finite observation adopts it; otherwise the previous value is carried
/// forward (no interpolation). Observations before `start` and the `seed` prime the
/// carry so a leading gap is bridged. A series with nothing to carry stays absent.
pub fn forward_fill(
    observations: &SeriesObservations,
    seed: &Seed,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<FilledRow> {
    if start > end {
        return Vec::new();
    }

    let parsed = parse_observations(observations, end);

    let mut carry: BTreeMap<SeriesKey, SeedValue> = seed.clone();
    for (key, by_date) in &parsed {
        // Latest observation before the window, if newer than the seed
        if let Some((date, value)) = by_date.range(..start).next_back() {
            let newer = carry.get(key).map(|s| *date >= s.observed).unwrap_or(true);
            if newer {
                carry.insert(*key, SeedValue { value: *value, observed: *date });
            }
        }
    }

    let mut rows = Vec::new();
    for date in start.iter_days().take_while(|d| *d <= end) {
        for (key, by_date) in &parsed {
            if let Some(value) = by_date.get(&date) {
                carry.insert(*key, SeedValue { value: *value, observed: date });
            }
        }

        rows.push(FilledRow {
            date,
            values: carry.iter().map(|(k, s)| (*k, s.value)).collect(),
            last_observed: carry.iter().map(|(k, s)| (*k, s.observed)).collect(),
        });
    }

    debug!(
        "Forward-filled {} days from {} to {} across {} series",
        rows.len(),
        start,
        end,
        parsed.len()
    );
    rows
}

/// Parse raw strings, dropping non-numeric values and anything after `end`.
/// When a date repeats, the last listed value wins.
fn parse_observations(
    observations: &SeriesObservations,
    end: NaiveDate,
) -> BTreeMap<SeriesKey, BTreeMap<NaiveDate, f64>> {
    let mut parsed = BTreeMap::new();

    for (key, list) in observations {
        let mut by_date = BTreeMap::new();
        let mut rejected = 0usize;

        for obs in list.iter().filter(|o| o.date <= end) {
            match obs.value() {
                Some(value) => {
                    by_date.insert(obs.date, value);
                }
                None => rejected += 1,
            }
        }

        if rejected > 0 {
            warn!("{}: ignored {} non-numeric observations", key, rejected);
        }
        parsed.insert(*key, by_date);
    }

    parsed
}
