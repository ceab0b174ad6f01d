use super::{LiquidityImpact, ProxySignal, TgaTrend};
use crate::indicators::{daily_changes, mean, stddev};
use crate::types::DailyRecord;

pub const WEEK: usize = 7;

/// Reserves below these levels (millions USD) are scarce / critically low.
const RESERVES_TIGHT: f64 = 3_200_000.0;
const RESERVES_LOW: f64 = 3_000_000.0;
const RESERVES_CRITICAL: f64 = 2_800_000.0;

/// Balance sheet moving less than this fraction over a week counts as stable.
const BALANCE_SHEET_STABLE_FRACTION: f64 = 0.005;
const RESERVE_VOLATILITY_JUMP: f64 = 1.5;

fn balance_sheet_stable(week: &[&DailyRecord]) -> bool {
    let first = week.first().and_then(|r| r.walcl);
    let last = week.last().and_then(|r| r.walcl);
    match (first, last) {
        (Some(first), Some(last)) if first != 0.0 => {
            (last - first).abs() < first.abs() * BALANCE_SHEET_STABLE_FRACTION
        }
        _ => false,
    }
}

fn reserve_changes(week: &[&DailyRecord]) -> Vec<f64> {
    let levels: Vec<Option<f64>> = week.iter().map(|r| r.wresbal).collect();
    daily_changes(&levels)
}

/// The TGA has no direct series here. With the balance sheet stable in both weeks, a jump
/// in reserve volatility is read as Treasury cash moving: falling reserves mean the TGA is
/// building (draining liquidity), rising reserves mean it is drawing down.
pub fn infer_tga(prior_week: &[&DailyRecord], recent_week: &[&DailyRecord]) -> (ProxySignal<TgaTrend>, LiquidityImpact) {
    let stable = balance_sheet_stable(prior_week) && balance_sheet_stable(recent_week);
    let recent = reserve_changes(recent_week);
    let prior = reserve_changes(prior_week);

    if stable && !recent.is_empty() {
        let recent_vol = stddev(&recent);
        let prior_vol = stddev(&prior);
        let jumped = if prior_vol > 0.0 {
            recent_vol > prior_vol * RESERVE_VOLATILITY_JUMP
        } else {
            recent_vol > 0.0
        };

        if jumped {
            let net: f64 = recent.iter().sum();
            if net < 0.0 {
                return (ProxySignal::proxy(TgaTrend::Building, 40.0), LiquidityImpact::Negative);
            }
            if net > 0.0 {
                return (ProxySignal::proxy(TgaTrend::Drawing, 40.0), LiquidityImpact::Positive);
            }
        }
    }

    (ProxySignal::proxy(TgaTrend::Stable, 20.0), LiquidityImpact::Neutral)
}

/// Mean RRP delta over the week, spread over the `horizon` it spans (billions/day).
pub fn rrp_velocity(week: &[&DailyRecord], horizon: usize) -> Option<f64> {
    if horizon == 0 {
        return None;
    }
    let deltas: Vec<f64> = week.iter().filter_map(|r| r.deltas.rrp).collect();
    mean(&deltas).map(|m| m / horizon as f64)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreditStress {
    pub index: f64,
    pub components_used: usize,
}

/// Weighted credit stress on 0-100. Missing inputs drop out and the remaining
/// weights are renormalised, so the effective scale shifts with coverage.
pub fn credit_stress_index(record: &DailyRecord) -> CreditStress {
    let components = [
        (0.4, record.hy_spread.map(|s| bucket(s, &[(7.0, 100.0), (5.0, 75.0), (4.0, 50.0), (3.0, 25.0)], 0.0))),
        (0.3, record.vix.map(|v| bucket(v, &[(40.0, 100.0), (30.0, 75.0), (20.0, 50.0), (15.0, 25.0)], 0.0))),
        (0.2, record.sofr_iorb_spread.map(|b| bucket(b, &[(10.0, 100.0), (5.0, 75.0), (0.0, 50.0), (-5.0, 25.0)], 0.0))),
        (0.1, record.yield_curve.map(curve_inversion_score)),
    ];

    let mut weighted = 0.0;
    let mut active_weight = 0.0;
    let mut used = 0;
    for (weight, score) in components {
        if let Some(score) = score {
            weighted += weight * score;
            active_weight += weight;
            used += 1;
        }
    }

    CreditStress {
        index: if active_weight > 0.0 { weighted / active_weight } else { 0.0 },
        components_used: used,
    }
}

fn curve_inversion_score(curve: f64) -> f64 {
    if curve < -0.5 {
        100.0
    } else if curve < 0.0 {
        75.0
    } else if curve < 0.5 {
        25.0
    } else {
        0.0
    }
}

/// First `(threshold, score)` with `value > threshold`, else `floor`.
fn bucket(value: f64, bands: &[(f64, f64)], floor: f64) -> f64 {
    bands
        .iter()
        .find(|(threshold, _)| value > *threshold)
        .map(|(_, score)| *score)
        .unwrap_or(floor)
}

fn funding_spread_score(bps: Option<f64>) -> f64 {
    bps.map(|b| bucket(b, &[(10.0, 100.0), (5.0, 70.0), (0.0, 40.0)], 10.0))
        .unwrap_or(0.0)
}

/// Spread level 40%, spread volatility 30%, reserves level 20%, RRP drain rate 10%.
pub fn repo_spike_risk(current: &DailyRecord, fortnight: &[&DailyRecord], rrp_velocity: f64) -> f64 {
    let level = funding_spread_score(current.sofr_iorb_spread);

    let spreads: Vec<f64> = fortnight.iter().filter_map(|r| r.sofr_iorb_spread).collect();
    let volatility = bucket(stddev(&spreads), &[(5.0, 100.0), (2.0, 60.0), (1.0, 30.0)], 0.0);

    let reserves = match current.wresbal {
        Some(r) if r < RESERVES_CRITICAL => 100.0,
        Some(r) if r < RESERVES_LOW => 60.0,
        Some(r) if r < RESERVES_TIGHT => 30.0,
        _ => 0.0,
    };

    let drain = if rrp_velocity < -5.0 {
        100.0
    } else if rrp_velocity < -2.0 {
        50.0
    } else {
        0.0
    };

    (level * 0.4 + volatility * 0.3 + reserves * 0.2 + drain * 0.1).min(100.0)
}

/// Systemic stress 40%, spread level 30%, low reserves 20%, pre-pivot pattern 10%.
pub fn qt_pivot_probability(current: &DailyRecord) -> f64 {
    let flags = [
        current.vix.map_or(false, |v| v > 30.0),
        current.hy_spread.map_or(false, |s| s > 6.0),
        current.sofr_iorb_spread.map_or(false, |b| b > 10.0),
        current.yield_curve.map_or(false, |c| c < -0.5),
    ];
    let systemic = flags.iter().filter(|f| **f).count() as f64 / flags.len() as f64 * 100.0;

    let spread = funding_spread_score(current.sofr_iorb_spread);

    let reserves = match current.wresbal {
        Some(r) if r < RESERVES_LOW => 100.0,
        Some(r) if r < RESERVES_TIGHT => 50.0,
        _ => 0.0,
    };

    // Reserves falling, RRP buffer nearly exhausted, funding trading above IORB
    let pattern_hits = [
        current.deltas.wresbal.map_or(false, |d| d < 0.0),
        current.rrp.map_or(false, |r| r < 100.0),
        current.sofr_iorb_spread.map_or(false, |b| b > 0.0),
    ]
    .iter()
    .filter(|hit| **hit)
    .count();
    let pattern = match pattern_hits {
        3 => 100.0,
        2 => 50.0,
        _ => 0.0,
    };

    (systemic * 0.4 + spread * 0.3 + reserves * 0.2 + pattern * 0.1).min(100.0)
}
