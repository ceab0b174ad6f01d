use chrono::NaiveDate;
use tracing::{debug, info};

use crate::config::MonitorConfig;
use crate::indicators::deltas;
use crate::leading::compute_leading_indicators;
use crate::normalize::{forward_fill, Seed, SeriesObservations};
use crate::regime::{classify_regime, derive_qualifiers};
use crate::score::compute_liquidity_score;
use crate::types::DailyRecord;

/// Turns raw observations for a date range into fully derived daily records.
///
/// Every record is computed from `prior_records` plus the records produced earlier in the
/// same run, never from anything dated after it. Running twice over the same inputs gives
/// identical output.
pub struct LiquidityPipeline {
    config: MonitorConfig,
}

impl LiquidityPipeline {
    pub fn new(config: MonitorConfig) -> Self {
        Self { config }
    }

    /// `prior_records` must be in date order; any dated on or after `start` are ignored.
    pub fn run(
        &self,
        observations: &SeriesObservations,
        prior_records: &[DailyRecord],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<DailyRecord> {
        let mut timeline: Vec<DailyRecord> = prior_records.iter().filter(|r| r.date < start).cloned().collect();
        let offset = timeline.len();

        let seed: Seed = timeline.last().map(DailyRecord::seed).unwrap_or_default();
        let rows = forward_fill(observations, &seed, start, end);
        if rows.is_empty() {
            return Vec::new();
        }
        timeline.extend(rows.iter().map(DailyRecord::from_filled));

        self.apply_deltas(&mut timeline, offset);

        for i in offset..timeline.len() {
            let (history, rest) = timeline.split_at_mut(i);
            let history: &[DailyRecord] = history;
            let current = &mut rest[0];

            let regime = classify_regime(&current.regime_inputs(), &self.config.regime);
            let qualifiers = derive_qualifiers(&current.qualifier_inputs(), &self.config.qualifiers);
            let score = compute_liquidity_score(current, history, &self.config.score);
            let leading = compute_leading_indicators(
                current,
                history,
                &self.config.leading,
                self.config.general.delta_horizon,
            );

            debug!(
                "{}: regime={} score={:.2} ({}) leading={:?}",
                current.date, regime.regime, score.total, score.grade, leading.overall_signal
            );

            current.regime = Some(regime);
            current.qualifiers = Some(qualifiers);
            current.score = Some(score);
            current.leading = Some(leading);
        }

        let records = timeline.split_off(offset);
        info!(
            "Pipeline produced {} records from {} to {} ({} prior)",
            records.len(),
            start,
            end,
            offset
        );
        records
    }

    /// Fill the 4-week deltas of records from `offset` on, by position over the whole timeline.
    fn apply_deltas(&self, timeline: &mut [DailyRecord], offset: usize) {
        let horizon = self.config.general.delta_horizon;
        let column = |read: fn(&DailyRecord) -> Option<f64>| -> Vec<Option<f64>> {
            deltas(&timeline.iter().map(read).collect::<Vec<_>>(), horizon)
        };

        let walcl = column(|r| r.walcl);
        let wresbal = column(|r| r.wresbal);
        let rrp = column(|r| r.rrp);
        let dxy = column(|r| r.dxy);
        let yield_curve = column(|r| r.yield_curve);

        for i in offset..timeline.len() {
            let d = &mut timeline[i].deltas;
            d.walcl = walcl[i];
            d.wresbal = wresbal[i];
            d.rrp = rrp[i];
            d.dxy = dxy[i];
            d.yield_curve = yield_curve[i];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regime::Regime;
    use crate::score::{Grade, ScoreTrend};
    use crate::types::{RawObservation, SeriesKey};
    use chrono::Duration;

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(n)
    }

    /// Weekly balance sheet and reserves growing fast enough to read as QE,
    /// daily market series with a little movement.
    fn observations(days: i64) -> SeriesObservations {
        let mut obs = SeriesObservations::new();
        let weekly = |base: f64, step: f64| -> Vec<RawObservation> {
            (0..days)
                .step_by(7)
                .map(|d| RawObservation::new(day(d), format!("{}", base + step * d as f64)))
                .collect()
        };
        let daily = |f: &dyn Fn(i64) -> f64| -> Vec<RawObservation> {
            (0..days).map(|d| RawObservation::new(day(d), format!("{:.4}", f(d)))).collect()
        };

        obs.insert(SeriesKey::BalanceSheet, weekly(7_000_000.0, 3_000.0));
        obs.insert(SeriesKey::Reserves, weekly(3_300_000.0, 3_000.0));
        obs.insert(SeriesKey::ReverseRepo, daily(&|d| 500.0 - d as f64));
        obs.insert(SeriesKey::Vix, daily(&|d| 14.0 + (d % 5) as f64 * 0.3));
        obs.insert(SeriesKey::HighYieldSpread, daily(&|d| 3.2 + (d % 3) as f64 * 0.05));
        obs.insert(SeriesKey::Treasury10y, daily(&|d| 4.2 + (d % 4) as f64 * 0.02));
        obs.insert(SeriesKey::Treasury2y, daily(&|_| 4.0));
        obs.insert(SeriesKey::Sofr, daily(&|_| 5.31));
        obs.insert(SeriesKey::Iorb, daily(&|_| 5.40));
        obs.insert(SeriesKey::FedFunds, daily(&|_| 5.33));
        obs.insert(SeriesKey::Dollar, daily(&|d| 120.0 - d as f64 * 0.01));
        obs
    }

    fn pipeline() -> LiquidityPipeline {
        LiquidityPipeline::new(MonitorConfig::default())
    }

    #[test]
    fn test_thin_history_gives_neutral_score() {
        let records = pipeline().run(&observations(20), &[], day(0), day(19));

        assert_eq!(records.len(), 20);
        for record in &records {
            let score = record.score.as_ref().unwrap();
            assert_eq!(score.total, 50.0);
            assert_eq!(score.grade, Grade::C);
            assert_eq!(score.trend, ScoreTrend::Stable);
            assert_eq!(score.confidence, 50.0);
            assert!(!score.sufficient_history);
            // No 4-week delta yet, so the regime cannot be established
            assert_eq!(record.regime.as_ref().unwrap().regime, Regime::Neutral);
            assert_eq!(record.deltas.walcl, None);
        }
    }

    #[test]
    fn test_deltas_and_regime_after_four_weeks() {
        let records = pipeline().run(&observations(60), &[], day(0), day(59));
        let last = &records[59];

        // Weekly prints on day 56 and day 28 carried to day 59
        assert_eq!(last.deltas.walcl, Some(84_000.0));
        assert_eq!(last.deltas.wresbal, Some(84_000.0));
        assert_eq!(last.deltas.rrp, Some(-28.0));
        assert_eq!(last.regime.as_ref().unwrap().regime, Regime::Qe);
        assert!(last.score.as_ref().unwrap().sufficient_history);
        assert!(last.leading.as_ref().unwrap().sufficient_history);
    }

    #[test]
    fn test_rerun_is_identical() {
        let obs = observations(60);
        let a = pipeline().run(&obs, &[], day(0), day(59));
        let b = pipeline().run(&obs, &[], day(0), day(59));
        assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
    }

    #[test]
    fn test_later_data_does_not_change_earlier_records() {
        let short = pipeline().run(&observations(45), &[], day(0), day(44));
        let long = pipeline().run(&observations(60), &[], day(0), day(59));
        assert_eq!(short[..], long[..45]);
    }

    #[test]
    fn test_incremental_run_matches_full_run() {
        let obs = observations(60);
        let full = pipeline().run(&obs, &[], day(0), day(59));

        let first = pipeline().run(&obs, &[], day(0), day(39));
        let second = pipeline().run(&obs, &first, day(40), day(59));

        assert_eq!(second.len(), 20);
        assert_eq!(second[..], full[40..]);
    }

    #[test]
    fn test_empty_range() {
        assert!(pipeline().run(&observations(10), &[], day(5), day(4)).is_empty());
    }
}
