pub mod anomalies;
pub mod cycles;
pub mod liquidity_regime;

pub use anomalies::*;
pub use cycles::*;
pub use liquidity_regime::*;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::PatternSettings;
use crate::types::DailyRecord;

/// Everything the pattern pass derives from one window of scored records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternReport {
    pub cycles: Vec<PolicyCycle>,
    pub liquidity_regime: LiquidityRegimeAssessment,
    pub anomalies: Vec<Anomaly>,
}

pub fn analyze_patterns(records: &[DailyRecord], settings: &PatternSettings) -> PatternReport {
    let cycles = segment_cycles(records, settings);
    let liquidity_regime = classify_liquidity_regime(records, settings);
    let anomalies = detect_anomalies(records, settings);

    info!(
        "Pattern pass over {} records: {} cycles, {:?} liquidity, {} anomalies",
        records.len(),
        cycles.len(),
        liquidity_regime.regime,
        anomalies.len()
    );

    PatternReport {
        cycles,
        liquidity_regime,
        anomalies,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_yields_empty_report() {
        let report = analyze_patterns(&[], &PatternSettings::default());
        assert!(report.cycles.is_empty());
        assert!(report.anomalies.is_empty());
        assert!(!report.liquidity_regime.sufficient_history);
        assert!(serde_json::to_string(&report).is_ok());
    }
}
