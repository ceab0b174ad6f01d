use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use uuid::Uuid;

use crate::config::PatternSettings;
use crate::indicators::{pct_change, stddev};
use crate::types::DailyRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CycleType {
    Qe,
    Qt,
    /// Valid for externally labelled cycles; segmentation never opens one.
    Neutral,
    Transition,
}

impl CycleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleType::Qe => "QE",
            CycleType::Qt => "QT",
            CycleType::Neutral => "NEUTRAL",
            CycleType::Transition => "TRANSITION",
        }
    }
}

impl fmt::Display for CycleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CycleCharacteristics {
    pub balance_sheet_change_pct: f64,
    pub reserves_change_pct: f64,
    /// Policy rate change, percentage points
    pub rate_change: f64,
    /// Liquidity score at close minus score at open
    pub impact_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyCycle {
    pub id: Uuid,
    pub cycle_type: CycleType,
    pub start_date: NaiveDate,
    /// `None` while the cycle is still open at the end of the series.
    pub end_date: Option<NaiveDate>,
    pub duration_days: i64,
    pub peak_score: Option<f64>,
    pub trough_score: Option<f64>,
    pub volatility: f64,
    pub characteristics: CycleCharacteristics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloseReason {
    Reversal,
    Stagnation,
}

struct OpenCycle {
    cycle_type: CycleType,
    start: usize,
}

/// Walk the series once with at most one open cycle.
///
/// Opens on a large day-over-day balance-sheet move (QE/QT) or a reserves surge on a
/// quiet balance sheet (TRANSITION). Closes on a reversal past the opening threshold,
/// or on stagnation once the cycle has lasted the minimum duration. Closed cycles
/// shorter than the minimum are dropped; a cycle still open at the end is kept.
pub fn segment_cycles(records: &[DailyRecord], settings: &PatternSettings) -> Vec<PolicyCycle> {
    let mut cycles = Vec::new();
    let mut open: Option<OpenCycle> = None;

    let bs_moves: Vec<f64> = (0..records.len())
        .map(|i| if i == 0 { 0.0 } else { pct_change(records[i - 1].walcl, records[i].walcl) })
        .collect();

    for i in 1..records.len() {
        let bs_pct = bs_moves[i];
        let res_pct = pct_change(records[i - 1].wresbal, records[i].wresbal);

        if let Some(current) = &open {
            let reversed = match current.cycle_type {
                CycleType::Qe => bs_pct < -settings.cycle_start_pct,
                CycleType::Qt => bs_pct > settings.cycle_start_pct,
                CycleType::Transition | CycleType::Neutral => false,
            };

            let elapsed = (records[i].date - records[current.start].date).num_days();
            let stagnant = elapsed >= settings.min_cycle_days && {
                let from = (i + 1).saturating_sub(settings.stagnation_window);
                let window = &bs_moves[from..=i];
                let avg = window.iter().map(|m| m.abs()).sum::<f64>() / window.len() as f64;
                avg < settings.stagnation_pct
            };

            let reason = if reversed {
                Some(CloseReason::Reversal)
            } else if stagnant {
                Some(CloseReason::Stagnation)
            } else {
                None
            };

            if let Some(reason) = reason {
                let cycle = finalize(records, current.cycle_type, current.start, i, true);
                debug!(
                    "{} cycle {} -> {} closed on {:?} ({} days)",
                    cycle.cycle_type, cycle.start_date, records[i].date, reason, cycle.duration_days
                );
                if cycle.duration_days >= settings.min_cycle_days {
                    cycles.push(cycle);
                }
                open = None;
            }
        }

        if open.is_none() {
            let start_type = if bs_pct > settings.cycle_start_pct {
                Some(CycleType::Qe)
            } else if bs_pct < -settings.cycle_start_pct {
                Some(CycleType::Qt)
            } else if res_pct > settings.transition_reserves_pct && bs_pct < settings.transition_balance_sheet_pct {
                Some(CycleType::Transition)
            } else {
                None
            };

            if let Some(cycle_type) = start_type {
                open = Some(OpenCycle { cycle_type, start: i });
            }
        }
    }

    if let Some(current) = open {
        cycles.push(finalize(records, current.cycle_type, current.start, records.len() - 1, false));
    }

    cycles
}

fn finalize(records: &[DailyRecord], cycle_type: CycleType, start: usize, end: usize, closed: bool) -> PolicyCycle {
    let span = &records[start..=end];
    let first = &records[start];
    let last = &records[end];

    let scores: Vec<f64> = span.iter().filter_map(|r| r.sufficient_score_total()).collect();
    let peak_score = scores.iter().copied().reduce(f64::max);
    let trough_score = scores.iter().copied().reduce(f64::min);

    let rate_change = match (first.effr, last.effr) {
        (Some(a), Some(b)) => b - a,
        _ => 0.0,
    };
    let impact_score = match (first.sufficient_score_total(), last.sufficient_score_total()) {
        (Some(a), Some(b)) => b - a,
        _ => 0.0,
    };

    let name = format!("{}:{}", cycle_type, first.date);

    PolicyCycle {
        id: Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()),
        cycle_type,
        start_date: first.date,
        end_date: if closed { Some(last.date) } else { None },
        duration_days: (last.date - first.date).num_days(),
        peak_score,
        trough_score,
        volatility: stddev(&scores),
        characteristics: CycleCharacteristics {
            balance_sheet_change_pct: pct_change(first.walcl, last.walcl),
            reserves_change_pct: pct_change(first.wresbal, last.wresbal),
            rate_change,
            impact_score,
        },
    }
}
