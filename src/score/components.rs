use super::{tail, COMPONENT_MAX, COMPONENT_NEUTRAL};
use crate::config::ScoreSettings;
use crate::indicators::{mean, ols_slope, percentile_rank, stddev, z_score};
use crate::types::DailyRecord;

fn clamp_component(value: f64) -> f64 {
    if value.is_nan() {
        return COMPONENT_NEUTRAL;
    }
    value.clamp(0.0, COMPONENT_MAX)
}

/// Z-score of today's balance-sheet delta against the window, ±2σ mapped to ±10 points.
pub fn balance_sheet_score(current: &DailyRecord, window: &[DailyRecord], settings: &ScoreSettings) -> f64 {
    let delta = match current.deltas.walcl {
        Some(delta) => delta,
        None => return COMPONENT_NEUTRAL,
    };

    let history: Vec<f64> = window.iter().filter_map(|r| r.deltas.walcl).collect();
    let z = match mean(&history) {
        Some(avg) => z_score(delta, avg, stddev(&history)),
        None => 0.0,
    };

    let mut score = COMPONENT_NEUTRAL + z.clamp(-2.0, 2.0) * 5.0;
    if delta > settings.large_delta {
        score += 2.5;
    } else if delta < -settings.large_delta {
        score -= 2.5;
    }
    clamp_component(score)
}

/// Rotation bonus, growth/drain bands and the level's percentile within the window.
pub fn reserves_score(current: &DailyRecord, window: &[DailyRecord]) -> f64 {
    let mut score = COMPONENT_NEUTRAL;

    if let (Some(reserves), Some(rrp)) = (current.deltas.wresbal, current.deltas.rrp) {
        if rrp < 0.0 && reserves > 0.0 {
            score += (rrp.abs() / 10.0).min(5.0);
        }
    }

    if let Some(reserves) = current.deltas.wresbal {
        score += match reserves {
            d if d > 100_000.0 => 4.0,
            d if d > 25_000.0 => 2.0,
            d if d < -100_000.0 => -4.0,
            d if d < -25_000.0 => -2.0,
            _ => 0.0,
        };
    }

    if let Some(level) = current.wresbal {
        let levels: Vec<f64> = window.iter().filter_map(|r| r.wresbal).collect();
        if !levels.is_empty() {
            score += (percentile_rank(level, &levels) - 0.5) * 6.0;
        }
    }

    clamp_component(score)
}

/// Starts at full marks and loses points as volatility, credit and funding stress rise.
pub fn market_stress_score(current: &DailyRecord) -> f64 {
    let mut score = COMPONENT_MAX;

    if let Some(vix) = current.vix {
        score += match vix {
            v if v > 40.0 => -10.0,
            v if v > 30.0 => -7.0,
            v if v > 20.0 => -4.0,
            v if v < 13.0 => 1.0,
            _ => 0.0,
        };
    }

    if let Some(spread) = current.hy_spread {
        score += match spread {
            s if s > 7.0 => -8.0,
            s if s > 5.0 => -5.0,
            s if s > 4.0 => -2.0,
            s if s < 3.0 => 1.0,
            _ => 0.0,
        };
    }

    if let Some(bps) = current.sofr_iorb_spread {
        score += match bps {
            b if b > 10.0 => -7.0,
            b if b > 5.0 => -4.0,
            b if b > 0.0 => -2.0,
            b if b < -5.0 => 1.0,
            _ => 0.0,
        };
    }

    clamp_component(score)
}

/// Balance sheet + reserves + market stress for one record against its own prior window.
pub fn core_score(record: &DailyRecord, prior: &[DailyRecord], settings: &ScoreSettings) -> f64 {
    let window = tail(prior, settings.window);
    balance_sheet_score(record, window, settings) + reserves_score(record, window) + market_stress_score(record)
}

/// Slope of the core score over the trailing records ending at `current`,
/// plus up to 3 points when day-over-day moves agree with the slope.
pub fn momentum_score(current: &DailyRecord, history: &[DailyRecord], settings: &ScoreSettings) -> f64 {
    let lookback = settings.momentum_window.saturating_sub(1).min(history.len());
    let first = history.len() - lookback;

    let mut series: Vec<f64> = (first..history.len())
        .map(|j| core_score(&history[j], &history[..j], settings))
        .collect();
    series.push(core_score(current, history, settings));

    if series.len() < 2 {
        return COMPONENT_NEUTRAL;
    }

    let slope = ols_slope(&series);
    let mut score = COMPONENT_NEUTRAL + (slope * 10.0).clamp(-9.5, 9.5);

    if slope != 0.0 {
        let moves: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();
        let agreeing = moves.iter().filter(|m| m.signum() == slope.signum() && **m != 0.0).count();
        let ratio = agreeing as f64 / moves.len() as f64;
        score += match ratio {
            r if r >= 0.7 => 3.0,
            r if r >= 0.6 => 2.0,
            r if r >= 0.5 => 1.0,
            _ => 0.0,
        };
    }

    clamp_component(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn record(day: i64) -> DailyRecord {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(day);
        DailyRecord::empty(date)
    }

    #[test]
    fn test_balance_sheet_z_mapping() {
        let settings = ScoreSettings::default();
        let window: Vec<DailyRecord> = (0..40)
            .map(|i| {
                let mut r = record(i);
                r.deltas.walcl = Some(if i % 2 == 0 { 10_000.0 } else { -10_000.0 });
                r
            })
            .collect();

        let mut current = record(40);
        current.deltas.walcl = Some(0.0);
        assert_eq!(balance_sheet_score(&current, &window, &settings), 12.5);

        current.deltas.walcl = Some(20_000.0); // z = 2
        assert_eq!(balance_sheet_score(&current, &window, &settings), 22.5);

        current.deltas.walcl = Some(-500_000.0); // z clamped, plus penalty
        assert_eq!(balance_sheet_score(&current, &window, &settings), 0.0);

        current.deltas.walcl = None;
        assert_eq!(balance_sheet_score(&current, &window, &settings), COMPONENT_NEUTRAL);
    }

    #[test]
    fn test_constant_history_gives_neutral_z() {
        let settings = ScoreSettings::default();
        let window: Vec<DailyRecord> = (0..40)
            .map(|i| {
                let mut r = record(i);
                r.deltas.walcl = Some(1_000.0);
                r
            })
            .collect();
        let mut current = record(40);
        current.deltas.walcl = Some(90_000.0);
        assert_eq!(balance_sheet_score(&current, &window, &settings), 12.5);
    }

    #[test]
    fn test_reserves_rotation_and_bands() {
        let mut current = record(0);
        current.deltas.wresbal = Some(30_000.0);
        current.deltas.rrp = Some(-80.0);
        // 12.5 + min(8, 5) + 2
        assert_eq!(reserves_score(&current, &[]), 19.5);

        current.deltas.rrp = Some(20.0);
        current.deltas.wresbal = Some(-150_000.0);
        assert_eq!(reserves_score(&current, &[]), 8.5);
    }

    #[test]
    fn test_reserves_percentile_term() {
        let window: Vec<DailyRecord> = (0..10)
            .map(|i| {
                let mut r = record(i);
                r.wresbal = Some(3_000_000.0 + i as f64 * 10_000.0);
                r
            })
            .collect();
        let mut current = record(10);
        current.wresbal = Some(4_000_000.0);
        assert_eq!(reserves_score(&current, &window), 15.5);
        current.wresbal = Some(1_000_000.0);
        assert_eq!(reserves_score(&current, &window), 9.5);
    }

    #[test]
    fn test_market_stress_bands() {
        let mut calm = record(0);
        calm.vix = Some(11.0);
        calm.hy_spread = Some(2.8);
        calm.sofr_iorb_spread = Some(-8.0);
        assert_eq!(market_stress_score(&calm), 25.0);

        let mut crisis = record(0);
        crisis.vix = Some(45.0);
        crisis.hy_spread = Some(8.0);
        crisis.sofr_iorb_spread = Some(15.0);
        assert_eq!(market_stress_score(&crisis), 0.0);

        let mut mild = record(0);
        mild.vix = Some(22.0);
        mild.hy_spread = Some(4.2);
        mild.sofr_iorb_spread = Some(2.0);
        assert_eq!(market_stress_score(&mild), 17.0);

        assert_eq!(market_stress_score(&record(0)), 25.0);
    }

    #[test]
    fn test_momentum_rises_with_improving_stress() {
        let settings = ScoreSettings::default();
        let history: Vec<DailyRecord> = (0..40)
            .map(|i| {
                let mut r = record(i);
                r.vix = Some(45.0 - i as f64);
                r
            })
            .collect();
        let mut current = record(40);
        current.vix = Some(5.0);

        let score = momentum_score(&current, &history, &settings);
        assert!(score > COMPONENT_NEUTRAL, "momentum {score}");
        assert!(score <= COMPONENT_MAX);

        let flat: Vec<DailyRecord> = (0..40).map(record).collect();
        assert_eq!(momentum_score(&record(40), &flat, &settings), COMPONENT_NEUTRAL);
    }
}
