use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::config::PatternSettings;
use crate::indicators::{mean, stddev, z_score};
use crate::score::round2;
use crate::types::DailyRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricType {
    LiquidityScore,
    BalanceSheet,
    Reserves,
    ReverseRepo,
}

impl MetricType {
    pub const ALL: [MetricType; 4] = [
        MetricType::LiquidityScore,
        MetricType::BalanceSheet,
        MetricType::Reserves,
        MetricType::ReverseRepo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::LiquidityScore => "liquidity score",
            MetricType::BalanceSheet => "balance sheet",
            MetricType::Reserves => "reserves",
            MetricType::ReverseRepo => "reverse repo",
        }
    }

    fn read(&self, record: &DailyRecord) -> Option<f64> {
        match self {
            MetricType::LiquidityScore => record.sufficient_score_total(),
            MetricType::BalanceSheet => record.walcl,
            MetricType::Reserves => record.wresbal,
            MetricType::ReverseRepo => record.rrp,
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn from_z(z: f64) -> Self {
        let z = z.abs();
        if z >= 4.0 {
            Severity::Critical
        } else if z >= 3.5 {
            Severity::High
        } else if z >= 3.0 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub date: NaiveDate,
    pub metric: MetricType,
    pub severity: Severity,
    pub z_score: f64,
    pub description: String,
}

/// Flag values more than `anomaly_z` population deviations from their metric's mean over `records`.
pub fn detect_anomalies(records: &[DailyRecord], settings: &PatternSettings) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();

    for metric in MetricType::ALL {
        let values: Vec<f64> = records.iter().filter_map(|r| metric.read(r)).collect();
        let avg = match mean(&values) {
            Some(avg) => avg,
            None => continue,
        };
        let std = stddev(&values);

        for record in records {
            let value = match metric.read(record) {
                Some(v) => v,
                None => continue,
            };
            let z = z_score(value, avg, std);
            if z.abs() > settings.anomaly_z {
                let direction = if z > 0.0 { "above" } else { "below" };
                anomalies.push(Anomaly {
                    date: record.date,
                    metric,
                    severity: Severity::from_z(z),
                    z_score: round2(z),
                    description: format!(
                        "{} at {:.2} is {:.1}σ {} its window mean of {:.2}",
                        metric,
                        value,
                        z.abs(),
                        direction,
                        avg
                    ),
                });
            }
        }
    }

    anomalies.sort_by(|a, b| {
        b.z_score
            .abs()
            .partial_cmp(&a.z_score.abs())
            .unwrap_or(Ordering::Equal)
            .then(a.date.cmp(&b.date))
            .then(a.metric.cmp(&b.metric))
    });
    anomalies
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::LiquidityScore;
    use chrono::Duration;

    fn records(n: usize, build: impl Fn(usize, &mut DailyRecord)) -> Vec<DailyRecord> {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        (0..n)
            .map(|i| {
                let mut r = DailyRecord::empty(start + Duration::days(i as i64));
                build(i, &mut r);
                r
            })
            .collect()
    }

    #[test]
    fn test_constant_metric_is_never_flagged() {
        let records = records(30, |_, r| {
            r.walcl = Some(7_000_000.0);
            r.wresbal = Some(3_200_000.0);
            r.rrp = Some(400.0);
        });
        let out = detect_anomalies(&records, &PatternSettings::default());
        assert!(out.is_empty());
    }

    #[test]
    fn test_single_spike_is_flagged() {
        let records = records(30, |i, r| {
            r.walcl = Some(7_000_000.0);
            r.rrp = Some(if i == 20 { 1_500.0 } else { 400.0 });
        });
        let out = detect_anomalies(&records, &PatternSettings::default());

        assert_eq!(out.len(), 1);
        let hit = &out[0];
        assert_eq!(hit.metric, MetricType::ReverseRepo);
        assert_eq!(hit.date, records[20].date);
        // one outlier in 30: z = sqrt(29)
        assert!((hit.z_score - 5.39).abs() < 0.01);
        assert_eq!(hit.severity, Severity::Critical);
        assert!(hit.description.contains("above"));
        assert!(hit.z_score.is_finite());
    }

    #[test]
    fn test_ordering_by_magnitude_then_date_then_metric() {
        let records = records(30, |i, r| {
            let spike = i == 10 || i == 25;
            r.walcl = Some(if spike { 8_000_000.0 } else { 7_000_000.0 });
            r.wresbal = Some(if spike { 2_000_000.0 } else { 3_000_000.0 });
        });
        let out = detect_anomalies(&records, &PatternSettings::default());

        assert_eq!(out.len(), 4);
        assert_eq!(out[0].date, records[10].date);
        assert_eq!(out[0].metric, MetricType::BalanceSheet);
        assert_eq!(out[1].date, records[10].date);
        assert_eq!(out[1].metric, MetricType::Reserves);
        assert_eq!(out[2].date, records[25].date);
        assert!(out[1].z_score < 0.0);
    }

    #[test]
    fn test_severity_bands() {
        assert_eq!(Severity::from_z(2.6), Severity::Low);
        assert_eq!(Severity::from_z(-3.0), Severity::Medium);
        assert_eq!(Severity::from_z(3.7), Severity::High);
        assert_eq!(Severity::from_z(-4.0), Severity::Critical);
    }

    #[test]
    fn test_score_metric_uses_totals() {
        let records = records(40, |i, r| {
            let mut score = LiquidityScore::insufficient_history();
            score.total = if i == 39 { 95.0 } else { 50.0 + (i % 3) as f64 };
            score.sufficient_history = true;
            r.score = Some(score);
        });
        let out = detect_anomalies(&records, &PatternSettings::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].metric, MetricType::LiquidityScore);
        assert_eq!(serde_json::to_value(out[0].metric).unwrap(), "LIQUIDITY_SCORE");
    }

    #[test]
    fn test_thin_history_defaults_are_not_scored() {
        // A fresh store: the first month carries the fixed neutral default
        let records = records(365, |i, r| {
            let mut score = LiquidityScore::insufficient_history();
            if i >= 30 {
                score.total = 80.0 + (i % 3) as f64;
                score.sufficient_history = true;
            }
            r.score = Some(score);
        });
        let out = detect_anomalies(&records, &PatternSettings::default());
        assert!(out.is_empty(), "{:?}", out.first().map(|a| &a.description));
    }
}
