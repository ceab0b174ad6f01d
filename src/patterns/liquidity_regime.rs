use serde::{Deserialize, Serialize};

use crate::config::PatternSettings;
use crate::indicators::{daily_changes, mean, ols_slope, stddev};
use crate::score::{round2, tail, ScoreTrend};
use crate::types::DailyRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LiquidityRegime {
    Abundant,
    Adequate,
    Scarce,
    Crisis,
}

impl LiquidityRegime {
    pub const ALL: [LiquidityRegime; 4] = [
        LiquidityRegime::Abundant,
        LiquidityRegime::Adequate,
        LiquidityRegime::Scarce,
        LiquidityRegime::Crisis,
    ];

    fn index(&self) -> usize {
        match self {
            LiquidityRegime::Abundant => 0,
            LiquidityRegime::Adequate => 1,
            LiquidityRegime::Scarce => 2,
            LiquidityRegime::Crisis => 3,
        }
    }

    /// Band for a mean liquidity score, with its fixed confidence.
    pub fn from_mean_score(score: f64) -> (Self, f64) {
        if score >= 70.0 {
            (LiquidityRegime::Abundant, 0.85)
        } else if score >= 50.0 {
            (LiquidityRegime::Adequate, 0.75)
        } else if score >= 30.0 {
            (LiquidityRegime::Scarce, 0.70)
        } else {
            (LiquidityRegime::Crisis, 0.80)
        }
    }

    /// Hand-authored next-period probabilities, in `ALL` order. Not estimated from data.
    pub fn transition_probabilities(&self) -> [f64; 4] {
        TRANSITIONS[self.index()]
    }
}

const TRANSITIONS: [[f64; 4]; 4] = [
    [0.70, 0.25, 0.04, 0.01],
    [0.15, 0.65, 0.17, 0.03],
    [0.05, 0.25, 0.60, 0.10],
    [0.02, 0.10, 0.38, 0.50],
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeTransition {
    pub to: LiquidityRegime,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityRegimeAssessment {
    pub regime: LiquidityRegime,
    pub confidence: f64,
    pub mean_score: f64,
    pub trend: ScoreTrend,
    pub slope: f64,
    /// 0-100, from the volatility of daily 10y yield changes
    pub stress: f64,
    pub transitions: Vec<RegimeTransition>,
    pub sufficient_history: bool,
}

impl LiquidityRegimeAssessment {
    fn from_regime(regime: LiquidityRegime, confidence: f64) -> Self {
        Self {
            regime,
            confidence,
            mean_score: 50.0,
            trend: ScoreTrend::Stable,
            slope: 0.0,
            stress: 0.0,
            transitions: transitions_from(regime),
            sufficient_history: false,
        }
    }
}

fn transitions_from(regime: LiquidityRegime) -> Vec<RegimeTransition> {
    LiquidityRegime::ALL
        .iter()
        .zip(regime.transition_probabilities())
        .map(|(to, probability)| RegimeTransition { to: *to, probability })
        .collect()
}

/// Classify the trailing window of scored records.
pub fn classify_liquidity_regime(records: &[DailyRecord], settings: &PatternSettings) -> LiquidityRegimeAssessment {
    let window = tail(records, settings.regime_window);
    let scores: Vec<f64> = window.iter().filter_map(|r| r.sufficient_score_total()).collect();

    if window.len() < settings.regime_window || scores.is_empty() {
        return LiquidityRegimeAssessment::from_regime(LiquidityRegime::Adequate, 0.0);
    }

    let mean_score = mean(&scores).unwrap_or(50.0);
    let (regime, confidence) = LiquidityRegime::from_mean_score(mean_score);

    let slope = ols_slope(&scores);
    let trend = if slope > 0.2 {
        ScoreTrend::Improving
    } else if slope < -0.2 {
        ScoreTrend::Deteriorating
    } else {
        ScoreTrend::Stable
    };

    let yields: Vec<Option<f64>> = window.iter().map(|r| r.dgs10).collect();
    let yield_moves_bps: Vec<f64> = daily_changes(&yields).iter().map(|c| c * 100.0).collect();
    let stress = (stddev(&yield_moves_bps) * 10.0).min(100.0);

    LiquidityRegimeAssessment {
        regime,
        confidence,
        mean_score: round2(mean_score),
        trend,
        slope,
        stress: round2(stress),
        transitions: transitions_from(regime),
        sufficient_history: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::LiquidityScore;
    use chrono::{Duration, NaiveDate};

    fn scored(n: usize, score: impl Fn(usize) -> f64) -> Vec<DailyRecord> {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        (0..n)
            .map(|i| {
                let mut r = DailyRecord::empty(start + Duration::days(i as i64));
                let mut s = LiquidityScore::insufficient_history();
                s.total = score(i);
                s.sufficient_history = true;
                r.score = Some(s);
                r.dgs10 = Some(4.0 + if i % 2 == 0 { 0.05 } else { 0.0 });
                r
            })
            .collect()
    }

    #[test]
    fn test_transition_rows_sum_to_one() {
        for regime in LiquidityRegime::ALL {
            let total: f64 = regime.transition_probabilities().iter().sum();
            assert!((total - 1.0).abs() < 1e-9, "{regime:?}");
        }
    }

    #[test]
    fn test_bands() {
        assert_eq!(LiquidityRegime::from_mean_score(75.0), (LiquidityRegime::Abundant, 0.85));
        assert_eq!(LiquidityRegime::from_mean_score(50.0), (LiquidityRegime::Adequate, 0.75));
        assert_eq!(LiquidityRegime::from_mean_score(31.0), (LiquidityRegime::Scarce, 0.70));
        assert_eq!(LiquidityRegime::from_mean_score(10.0), (LiquidityRegime::Crisis, 0.80));
    }

    #[test]
    fn test_deteriorating_scarce_window() {
        let records = scored(40, |i| 60.0 - i as f64);
        let out = classify_liquidity_regime(&records, &PatternSettings::default());
        // trailing 30: 50 down to 21, mean 35.5
        assert_eq!(out.regime, LiquidityRegime::Scarce);
        assert_eq!(out.mean_score, 35.5);
        assert_eq!(out.trend, ScoreTrend::Deteriorating);
        // ±5 bps daily moves
        assert!(out.stress > 45.0 && out.stress < 50.0, "stress {}", out.stress);
        assert_eq!(out.transitions.len(), 4);
        assert_eq!(out.transitions[2].probability, 0.60);
    }

    #[test]
    fn test_short_window_defaults() {
        let out = classify_liquidity_regime(&scored(10, |_| 90.0), &PatternSettings::default());
        assert!(!out.sufficient_history);
        assert_eq!(out.regime, LiquidityRegime::Adequate);
        assert_eq!(out.confidence, 0.0);
    }

    #[test]
    fn test_thin_history_defaults_are_skipped() {
        let mut records = scored(40, |_| 80.0);
        for r in records.iter_mut().take(20) {
            r.score = Some(LiquidityScore::insufficient_history());
        }
        let out = classify_liquidity_regime(&records, &PatternSettings::default());
        assert!(out.sufficient_history);
        assert_eq!(out.regime, LiquidityRegime::Abundant);
        assert_eq!(out.mean_score, 80.0);

        for r in records.iter_mut() {
            r.score = Some(LiquidityScore::insufficient_history());
        }
        let out = classify_liquidity_regime(&records, &PatternSettings::default());
        assert!(!out.sufficient_history);
        assert_eq!(out.confidence, 0.0);
    }
}
