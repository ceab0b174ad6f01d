pub mod signals;

pub use signals::*;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::LeadingSettings;
use crate::types::DailyRecord;

/// How a signal was obtained. Every signal without its own series is inferred from
/// other series' joint behaviour, and is tagged so in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalBasis {
    Proxy,
}

/// A derived signal with no underlying series. Consumers should discount `confidence`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProxySignal<T> {
    pub value: T,
    pub basis: SignalBasis,
    pub confidence: f64,
}

impl<T> ProxySignal<T> {
    pub fn proxy(value: T, confidence: f64) -> Self {
        Self {
            value,
            basis: SignalBasis::Proxy,
            confidence,
        }
    }
}

/// Treasury General Account direction, inferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TgaTrend {
    Building,
    Drawing,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiquidityImpact {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RrpAcceleration {
    Accelerating,
    Decelerating,
    Steady,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditTrend {
    Improving,
    Stable,
    Worsening,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallSignal {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadingIndicators {
    pub tga_trend: ProxySignal<TgaTrend>,
    pub tga_impact: LiquidityImpact,
    /// Billions per day
    pub rrp_velocity: f64,
    pub rrp_acceleration: RrpAcceleration,
    pub credit_stress_index: f64,
    /// Inputs present in the index; the weights are renormalised over these
    pub credit_components_used: usize,
    pub credit_trend: CreditTrend,
    pub repo_spike_risk: f64,
    pub qt_pivot_probability: f64,
    pub overall_signal: OverallSignal,
    pub bullish_votes: u8,
    pub bearish_votes: u8,
    pub confidence: f64,
    pub sufficient_history: bool,
}

impl LeadingIndicators {
    pub fn insufficient_history() -> Self {
        Self {
            tga_trend: ProxySignal::proxy(TgaTrend::Stable, 0.0),
            tga_impact: LiquidityImpact::Neutral,
            rrp_velocity: 0.0,
            rrp_acceleration: RrpAcceleration::Steady,
            credit_stress_index: 0.0,
            credit_components_used: 0,
            credit_trend: CreditTrend::Stable,
            repo_spike_risk: 0.0,
            qt_pivot_probability: 0.0,
            overall_signal: OverallSignal::Neutral,
            bullish_votes: 0,
            bearish_votes: 0,
            confidence: 0.0,
            sufficient_history: false,
        }
    }
}

/// Compute the five leading signals for `current` from `history` (records strictly before it).
/// `delta_horizon` is the span the stored deltas were taken over.
pub fn compute_leading_indicators(
    current: &DailyRecord,
    history: &[DailyRecord],
    settings: &LeadingSettings,
    delta_horizon: usize,
) -> LeadingIndicators {
    if history.len() < settings.min_history {
        debug!(
            "{}: {} prior records, need {} for leading indicators",
            current.date,
            history.len(),
            settings.min_history
        );
        return LeadingIndicators::insufficient_history();
    }

    // Two trailing weeks; the recent one ends at `current`
    let mut fortnight: Vec<&DailyRecord> = history[history.len() - (WEEK * 2 - 1)..].iter().collect();
    fortnight.push(current);
    let (prior_week, recent_week) = fortnight.split_at(WEEK);

    let (tga_trend, tga_impact) = infer_tga(prior_week, recent_week);

    let velocity = rrp_velocity(recent_week, delta_horizon);
    let prior_velocity = rrp_velocity(prior_week, delta_horizon);
    let rrp_acceleration = match (velocity, prior_velocity) {
        (Some(now), Some(before)) if now - before > settings.acceleration_threshold => {
            RrpAcceleration::Accelerating
        }
        (Some(now), Some(before)) if now - before < -settings.acceleration_threshold => {
            RrpAcceleration::Decelerating
        }
        _ => RrpAcceleration::Steady,
    };

    let credit = credit_stress_index(current);
    let week_ago = credit_stress_index(fortnight[WEEK - 1]);
    let credit_trend = if credit.components_used == 0 || week_ago.components_used == 0 {
        CreditTrend::Stable
    } else {
        match credit.index - week_ago.index {
            d if d > 5.0 => CreditTrend::Worsening,
            d if d < -5.0 => CreditTrend::Improving,
            _ => CreditTrend::Stable,
        }
    };

    let repo_spike_risk = repo_spike_risk(current, &fortnight, velocity.unwrap_or(0.0));
    let qt_pivot_probability = qt_pivot_probability(current);

    let mut bullish = 0u8;
    let mut bearish = 0u8;
    let mut vote = |bull: bool, bear: bool| {
        if bull {
            bullish += 1;
        } else if bear {
            bearish += 1;
        }
    };
    vote(tga_impact == LiquidityImpact::Positive, tga_impact == LiquidityImpact::Negative);
    if let Some(v) = velocity {
        vote(v < -1.0, v > 1.0);
    }
    if credit.components_used > 0 {
        vote(credit.index < 30.0, credit.index > 60.0);
    }
    vote(repo_spike_risk < 30.0, repo_spike_risk > 60.0);
    vote(qt_pivot_probability > 60.0, qt_pivot_probability < 20.0);

    let overall_signal = if bullish as i16 - bearish as i16 > 1 {
        OverallSignal::Bullish
    } else if bearish as i16 - bullish as i16 > 1 {
        OverallSignal::Bearish
    } else {
        OverallSignal::Neutral
    };

    let missing = [
        current.vix,
        current.hy_spread,
        current.sofr_iorb_spread,
        current.wresbal,
        current.deltas.rrp,
    ]
    .iter()
    .filter(|v| v.is_none())
    .count();
    let margin = (bullish as f64 - bearish as f64).abs();
    let confidence = ((40.0 + 12.0 * margin).min(100.0) - 10.0 * missing as f64).max(0.0);

    LeadingIndicators {
        tga_trend,
        tga_impact,
        rrp_velocity: velocity.unwrap_or(0.0),
        rrp_acceleration,
        credit_stress_index: credit.index,
        credit_components_used: credit.components_used,
        credit_trend,
        repo_spike_risk,
        qt_pivot_probability,
        overall_signal,
        bullish_votes: bullish,
        bearish_votes: bearish,
        confidence,
        sufficient_history: true,
    }
}
