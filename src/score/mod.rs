pub mod components;

pub use components::*;

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::config::ScoreSettings;
use crate::indicators::mean;
use crate::types::{DailyRecord, SeriesKey};

pub const COMPONENT_MAX: f64 = 25.0;
pub const COMPONENT_NEUTRAL: f64 = 12.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub balance_sheet: f64,
    pub reserves: f64,
    pub market_stress: f64,
    pub momentum: f64,
}

impl ScoreComponents {
    pub fn neutral() -> Self {
        Self {
            balance_sheet: COMPONENT_NEUTRAL,
            reserves: COMPONENT_NEUTRAL,
            market_stress: COMPONENT_NEUTRAL,
            momentum: COMPONENT_NEUTRAL,
        }
    }

    pub fn total(&self) -> f64 {
        self.balance_sheet + self.reserves + self.market_stress + self.momentum
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTrend {
    Improving,
    Stable,
    Deteriorating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    #[serde(rename = "B+")]
    BPlus,
    B,
    C,
    D,
}

impl Grade {
    pub fn from_total(total: f64) -> Self {
        match total {
            t if t >= 90.0 => Grade::APlus,
            t if t >= 80.0 => Grade::A,
            t if t >= 70.0 => Grade::BPlus,
            t if t >= 60.0 => Grade::B,
            t if t >= 40.0 => Grade::C,
            _ => Grade::D,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityScore {
    pub total: f64,
    pub components: ScoreComponents,
    pub trend: ScoreTrend,
    pub confidence: f64,
    pub grade: Grade,
    /// `false` marks the fixed neutral default returned for thin history.
    pub sufficient_history: bool,
}

impl LiquidityScore {
    /// Returned when history is too short. Callers must read it as "insufficient data".
    pub fn insufficient_history() -> Self {
        Self {
            total: 50.0,
            components: ScoreComponents::neutral(),
            trend: ScoreTrend::Stable,
            confidence: 50.0,
            grade: Grade::C,
            sufficient_history: false,
        }
    }
}

/// Score `current` against `history`, the records strictly before it in date order.
pub fn compute_liquidity_score(
    current: &DailyRecord,
    history: &[DailyRecord],
    settings: &ScoreSettings,
) -> LiquidityScore {
    if history.len() < settings.min_history {
        debug!(
            "{}: {} prior records, need {} for a liquidity score",
            current.date,
            history.len(),
            settings.min_history
        );
        return LiquidityScore::insufficient_history();
    }

    let window = tail(history, settings.window);
    let components = ScoreComponents {
        balance_sheet: round2(balance_sheet_score(current, window, settings)),
        reserves: round2(reserves_score(current, window)),
        market_stress: round2(market_stress_score(current)),
        momentum: round2(momentum_score(current, history, settings)),
    };
    let total = round2(components.total().clamp(0.0, 100.0));

    LiquidityScore {
        total,
        components,
        trend: score_trend(total, history, settings),
        confidence: round2(score_confidence(current, settings)),
        grade: Grade::from_total(total),
        sufficient_history: true,
    }
}

/// Compare the mean of the latest `trend_window` totals with the window before it.
fn score_trend(current_total: f64, history: &[DailyRecord], settings: &ScoreSettings) -> ScoreTrend {
    let needed = settings.trend_window * 2;
    let mut totals: Vec<f64> = history
        .iter()
        .rev()
        .filter_map(|r| r.score.as_ref())
        .filter(|s| s.sufficient_history)
        .map(|s| s.total)
        .take(needed - 1)
        .collect();
    totals.reverse();
    totals.push(current_total);

    if totals.len() < needed {
        return ScoreTrend::Stable;
    }

    let split = totals.len() - settings.trend_window;
    let (recent, prior) = match (mean(&totals[split..]), mean(&totals[..split])) {
        (Some(recent), Some(prior)) => (recent, prior),
        _ => return ScoreTrend::Stable,
    };

    let diff = recent - prior;
    if diff > settings.trend_threshold {
        ScoreTrend::Improving
    } else if diff < -settings.trend_threshold {
        ScoreTrend::Deteriorating
    } else {
        ScoreTrend::Stable
    }
}

fn score_confidence(current: &DailyRecord, settings: &ScoreSettings) -> f64 {
    let mut confidence = 100.0;
    confidence -= current.missing_critical_fields() as f64 * settings.missing_field_penalty;

    if let Some(observed) = current.last_observed.get(&SeriesKey::BalanceSheet) {
        let stale_days = (current.date - *observed).num_days() - settings.staleness_grace_days;
        if stale_days > 0 {
            let penalty = stale_days as f64 * settings.staleness_penalty_per_day;
            confidence -= penalty.min(settings.staleness_penalty_cap);
        }
    }

    confidence.clamp(0.0, 100.0)
}

pub(crate) fn tail<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn build_history(n: usize) -> Vec<DailyRecord> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n)
            .map(|i| {
                let date = start + Duration::days(i as i64);
                let mut r = DailyRecord::empty(date);
                r.walcl = Some(7_500_000.0 + i as f64 * 1_000.0);
                r.wresbal = Some(3_300_000.0 + i as f64 * 500.0);
                r.rrp = Some(500.0 - i as f64);
                r.vix = Some(15.0);
                r.hy_spread = Some(3.8);
                r.sofr = Some(5.31);
                r.iorb = Some(5.40);
                r.refresh_spreads();
                r.deltas.walcl = Some(if i % 2 == 0 { 5_000.0 } else { -5_000.0 });
                r.deltas.wresbal = Some(2_000.0);
                r.deltas.rrp = Some(-10.0);
                for key in SeriesKey::ALL {
                    r.last_observed.insert(key, date);
                }
                r
            })
            .collect()
    }

    #[test]
    fn test_insufficient_history_default() {
        let history = build_history(29);
        let current = build_history(30).pop().unwrap();
        let score = compute_liquidity_score(&current, &history, &ScoreSettings::default());

        assert_eq!(score.total, 50.0);
        assert_eq!(score.grade, Grade::C);
        assert_eq!(score.trend, ScoreTrend::Stable);
        assert_eq!(score.confidence, 50.0);
        assert!(!score.sufficient_history);
    }

    #[test]
    fn test_score_bounds_under_extreme_deltas() {
        let mut all = build_history(61);
        let mut current = all.pop().unwrap();

        for extreme in [1e9, -1e9] {
            current.deltas.walcl = Some(extreme);
            current.deltas.wresbal = Some(extreme);
            current.deltas.rrp = Some(-extreme);
            current.wresbal = Some(extreme.abs());
            current.vix = Some(if extreme > 0.0 { 1e9 } else { 0.0 });

            let score = compute_liquidity_score(&current, &all, &ScoreSettings::default());
            assert!(score.sufficient_history);
            assert!((0.0..=100.0).contains(&score.total), "total {}", score.total);
            for c in [
                score.components.balance_sheet,
                score.components.reserves,
                score.components.market_stress,
                score.components.momentum,
            ] {
                assert!((0.0..=COMPONENT_MAX).contains(&c), "component {c}");
            }
        }
    }

    #[test]
    fn test_later_records_do_not_change_score() {
        let all = build_history(60);
        let settings = ScoreSettings::default();
        let before = compute_liquidity_score(&all[40], &all[..40], &settings);

        let mut altered = all.clone();
        for r in altered.iter_mut().skip(41) {
            r.deltas.walcl = Some(-900_000.0);
            r.vix = Some(80.0);
        }
        let after = compute_liquidity_score(&altered[40], &altered[..40], &settings);
        assert_eq!(before, after);
    }

    #[test]
    fn test_confidence_penalties() {
        let all = build_history(40);
        let mut current = all[39].clone();
        current.vix = None;
        current.last_observed.insert(SeriesKey::BalanceSheet, current.date - Duration::days(12));

        let score = compute_liquidity_score(&current, &all[..39], &ScoreSettings::default());
        // one missing field (-10) and 5 days beyond grace (-15)
        assert_eq!(score.confidence, 75.0);

        current.last_observed.insert(SeriesKey::BalanceSheet, current.date - Duration::days(60));
        let score = compute_liquidity_score(&current, &all[..39], &ScoreSettings::default());
        assert_eq!(score.confidence, 60.0);
    }

    #[test]
    fn test_trend_uses_stored_totals() {
        let mut all = build_history(45);
        for (i, r) in all.iter_mut().enumerate() {
            let mut score = LiquidityScore::insufficient_history();
            score.sufficient_history = true;
            score.total = if i < 38 { 40.0 } else { 60.0 };
            r.score = Some(score);
        }
        let settings = ScoreSettings::default();
        assert_eq!(score_trend(60.0, &all[..44], &settings), ScoreTrend::Improving);
        assert_eq!(score_trend(40.0, &all[..38], &settings), ScoreTrend::Stable);

        for r in all.iter_mut() {
            r.score.as_mut().unwrap().total = 70.0;
        }
        assert_eq!(score_trend(50.0, &all[..44], &settings), ScoreTrend::Stable);
    }

    #[test]
    fn test_grade_table() {
        assert_eq!(Grade::from_total(95.0), Grade::APlus);
        assert_eq!(Grade::from_total(80.0), Grade::A);
        assert_eq!(Grade::from_total(72.0), Grade::BPlus);
        assert_eq!(Grade::from_total(60.0), Grade::B);
        assert_eq!(Grade::from_total(50.0), Grade::C);
        assert_eq!(Grade::from_total(39.9), Grade::D);
        assert_eq!(serde_json::to_string(&Grade::APlus).unwrap(), "\"A+\"");
    }
}
