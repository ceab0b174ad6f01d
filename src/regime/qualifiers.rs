use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::QualifierThresholds;

/// Market micro-indicators the qualifiers vote on. Any field may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QualifierInputs {
    pub vix: Option<f64>,
    /// High-yield credit spread, percent
    pub credit_spread: Option<f64>,
    /// 4-week change of the dollar index
    pub dollar_delta: Option<f64>,
    /// 10y-2y, percent
    pub yield_curve: Option<f64>,
    pub yield_curve_delta: Option<f64>,
    /// SOFR-IORB, basis points
    pub funding_spread_bps: Option<f64>,
    pub balance_sheet_delta: Option<f64>,
    pub reserves_delta: Option<f64>,
    pub rrp_delta: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Context {
    StressDriven,
    GrowthDriven,
    Ambiguous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sustainability {
    High,
    Medium,
    Low,
}

/// `Elevated` is the fallback: the reading is neither confirmed normal nor confirmed high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Normal,
    Elevated,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Qualifiers {
    pub context: Context,
    pub sustainability: Sustainability,
    pub risk_level: RiskLevel,
    pub confidence: Confidence,
    pub stress_votes: u8,
    pub growth_votes: u8,
    /// One entry per triggered micro-indicator, in evaluation order.
    pub drivers: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Vote {
    Stress,
    Growth,
}

#[derive(Default)]
struct Tally {
    stress: u8,
    growth: u8,
    drivers: Vec<String>,
}

impl Tally {
    fn cast(&mut self, vote: Vote, driver: String) {
        match vote {
            Vote::Stress => self.stress += 1,
            Vote::Growth => self.growth += 1,
        }
        self.drivers.push(driver);
    }
}

/// One voting market indicator. Stress is checked before growth; a missing reading casts no vote.
struct MicroIndicator {
    name: &'static str,
    read: fn(&QualifierInputs) -> Option<f64>,
    stress: fn(f64, &QualifierInputs, &QualifierThresholds) -> bool,
    growth: fn(f64, &QualifierInputs, &QualifierThresholds) -> bool,
    driver: fn(Vote, f64) -> String,
}

/// Evaluated in order, which is also the order of `Qualifiers::drivers`.
const MICRO_INDICATORS: [MicroIndicator; 5] = [
    MicroIndicator {
        name: "vix",
        read: |i| i.vix,
        stress: |v, _, t| v > t.vix_stress,
        growth: |v, _, t| v < t.vix_calm,
        driver: |vote, v| match vote {
            Vote::Stress => format!("VIX elevated at {:.1}", v),
            Vote::Growth => format!("VIX subdued at {:.1}", v),
        },
    },
    MicroIndicator {
        name: "credit",
        read: |i| i.credit_spread,
        stress: |v, _, t| v > t.credit_stress,
        growth: |v, _, t| v < t.credit_calm,
        driver: |vote, v| match vote {
            Vote::Stress => format!("credit spreads wide at {:.2}%", v),
            Vote::Growth => format!("credit spreads tight at {:.2}%", v),
        },
    },
    MicroIndicator {
        name: "dollar",
        read: |i| i.dollar_delta,
        stress: |v, _, t| v > t.dollar_move,
        growth: |v, _, t| v < -t.dollar_move,
        driver: |vote, v| match vote {
            Vote::Stress => format!("dollar strengthening (+{:.2} over 4w)", v),
            Vote::Growth => format!("dollar weakening ({:.2} over 4w)", v),
        },
    },
    MicroIndicator {
        name: "curve",
        read: |i| i.yield_curve,
        stress: |v, _, t| v < t.curve_inversion,
        growth: |v, i, t| v > t.curve_inversion && i.yield_curve_delta.map_or(false, |d| d > 0.0),
        driver: |vote, v| match vote {
            Vote::Stress => format!("yield curve inverted at {:.2}%", v),
            Vote::Growth => format!("yield curve steepening at {:.2}%", v),
        },
    },
    MicroIndicator {
        name: "funding",
        read: |i| i.funding_spread_bps,
        stress: |v, _, t| v > t.funding_pressure_bps,
        growth: |v, _, t| v < t.funding_pressure_bps,
        driver: |vote, v| match vote {
            Vote::Stress => format!("SOFR above IORB by {:.1} bps", v),
            Vote::Growth => format!("SOFR below IORB by {:.1} bps", v.abs()),
        },
    },
];

pub fn derive_qualifiers(inputs: &QualifierInputs, t: &QualifierThresholds) -> Qualifiers {
    let mut tally = Tally::default();

    for indicator in &MICRO_INDICATORS {
        let value = match (indicator.read)(inputs) {
            Some(v) => v,
            None => continue,
        };
        let vote = if (indicator.stress)(value, inputs, t) {
            Vote::Stress
        } else if (indicator.growth)(value, inputs, t) {
            Vote::Growth
        } else {
            continue;
        };
        trace!("{} votes {:?} at {:.2}", indicator.name, vote, value);
        tally.cast(vote, (indicator.driver)(vote, value));
    }

    let context = if tally.stress >= 2 && tally.stress > tally.growth {
        Context::StressDriven
    } else if tally.growth >= 2 && tally.growth > tally.stress {
        Context::GrowthDriven
    } else {
        Context::Ambiguous
    };

    let rotation = matches!(
        (inputs.reserves_delta, inputs.rrp_delta),
        (Some(res), Some(rrp)) if res > 0.0 && rrp < 0.0
    );
    let balance_sheet_expanding = inputs.balance_sheet_delta.map_or(false, |d| d > 0.0);

    let sustainability = if rotation && tally.growth >= 2 {
        Sustainability::High
    } else if context == Context::StressDriven || (!rotation && balance_sheet_expanding) {
        Sustainability::Low
    } else {
        Sustainability::Medium
    };

    let severe = inputs.vix.map_or(false, |v| v > t.vix_high_risk)
        || inputs.credit_spread.map_or(false, |s| s > t.credit_high_risk);

    let risk_level = if context == Context::GrowthDriven && sustainability != Sustainability::Low {
        RiskLevel::Normal
    } else if context == Context::StressDriven && severe {
        RiskLevel::High
    } else {
        RiskLevel::Elevated
    };

    let confidence = match tally.stress.max(tally.growth) {
        n if n >= 3 => Confidence::High,
        2 => Confidence::Medium,
        _ => Confidence::Low,
    };

    Qualifiers {
        context,
        sustainability,
        risk_level,
        confidence,
        stress_votes: tally.stress,
        growth_votes: tally.growth,
        drivers: tally.drivers,
    }
}
