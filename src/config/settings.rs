use serde::{Deserialize, Serialize};

use crate::indicators::DELTA_HORIZON;

/// Effective configuration. Every section falls back to its defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub general: GeneralSettings,
    pub regime: RegimeThresholds,
    pub qualifiers: QualifierThresholds,
    pub score: ScoreSettings,
    pub leading: LeadingSettings,
    pub patterns: PatternSettings,
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        // General
        if self.general.delta_horizon == 0 {
            errors.push("delta_horizon must be > 0".to_string());
        }

        // Regime thresholds are magnitudes; signs are applied by the classifier
        let regime = &self.regime;
        for (name, value) in [
            ("qe_balance_sheet", regime.qe_balance_sheet),
            ("qe_reserves", regime.qe_reserves),
            ("qt_balance_sheet", regime.qt_balance_sheet),
            ("qt_reserves", regime.qt_reserves),
            ("rrp_drain", regime.rrp_drain),
            ("rrp_drain_mild", regime.rrp_drain_mild),
            ("flat_band", regime.flat_band),
            ("stealth_reserves_growth", regime.stealth_reserves_growth),
            ("stealth_balance_sheet_growth", regime.stealth_balance_sheet_growth),
        ] {
            if value < 0.0 || !value.is_finite() {
                errors.push(format!("regime: {} must be a non-negative number", name));
            }
        }

        // Qualifiers
        let q = &self.qualifiers;
        if q.vix_calm >= q.vix_stress {
            errors.push("qualifiers: vix_calm must be < vix_stress".to_string());
        }
        if q.vix_high_risk < q.vix_stress {
            errors.push("qualifiers: vix_high_risk must be >= vix_stress".to_string());
        }
        if q.credit_calm >= q.credit_stress {
            errors.push("qualifiers: credit_calm must be < credit_stress".to_string());
        }
        if q.credit_high_risk < q.credit_stress {
            errors.push("qualifiers: credit_high_risk must be >= credit_stress".to_string());
        }
        if q.dollar_move <= 0.0 {
            errors.push("qualifiers: dollar_move must be > 0".to_string());
        }

        // Score
        let s = &self.score;
        if s.min_history == 0 || s.window < s.min_history {
            errors.push("score: window must be >= min_history > 0".to_string());
        }
        if s.momentum_window < 2 {
            errors.push("score: momentum_window must be >= 2".to_string());
        }
        if s.trend_window == 0 {
            errors.push("score: trend_window must be > 0".to_string());
        }

        // Leading
        if self.leading.min_history < 14 {
            errors.push("leading: min_history must be >= 14 (two weekly windows)".to_string());
        }

        // Patterns
        let p = &self.patterns;
        if p.stagnation_window == 0 || p.regime_window == 0 {
            errors.push("patterns: windows must be > 0".to_string());
        }
        if p.anomaly_z <= 0.0 {
            errors.push("patterns: anomaly_z must be > 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    pub database_url: String,
    pub delta_horizon: usize,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            database_url: "sqlite:./liquidity.db".to_string(),
            delta_horizon: DELTA_HORIZON,
        }
    }
}

/// Regime classifier thresholds. Balance sheet and reserves in millions USD, RRP in billions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeThresholds {
    pub qe_balance_sheet: f64,
    pub qe_reserves: f64,
    pub qt_balance_sheet: f64,
    pub qt_reserves: f64,
    pub rrp_drain: f64,
    pub rrp_drain_mild: f64,
    pub flat_band: f64,
    pub stealth_reserves_growth: f64,
    pub stealth_balance_sheet_growth: f64,
}

impl Default for RegimeThresholds {
    fn default() -> Self {
        Self {
            qe_balance_sheet: 50_000.0,
            qe_reserves: 50_000.0,
            qt_balance_sheet: 25_000.0,
            qt_reserves: 50_000.0,
            rrp_drain: 30.0,
            rrp_drain_mild: 10.0,
            flat_band: 10_000.0,
            stealth_reserves_growth: 25_000.0,
            stealth_balance_sheet_growth: 25_000.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QualifierThresholds {
    pub vix_stress: f64,
    pub vix_calm: f64,
    pub vix_high_risk: f64,
    pub credit_stress: f64,
    pub credit_calm: f64,
    pub credit_high_risk: f64,
    /// Absolute 4-week move in the dollar index that counts as strengthening/weakening
    pub dollar_move: f64,
    /// Curve below this level (percent) is inverted
    pub curve_inversion: f64,
    /// SOFR-IORB spread (bps) above which money markets are under pressure
    pub funding_pressure_bps: f64,
}

impl Default for QualifierThresholds {
    fn default() -> Self {
        Self {
            vix_stress: 20.0,
            vix_calm: 15.0,
            vix_high_risk: 30.0,
            credit_stress: 4.5,
            credit_calm: 3.5,
            credit_high_risk: 6.0,
            dollar_move: 2.0,
            curve_inversion: 0.0,
            funding_pressure_bps: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreSettings {
    pub min_history: usize,
    pub window: usize,
    pub momentum_window: usize,
    pub trend_window: usize,
    pub trend_threshold: f64,
    pub large_delta: f64,
    pub missing_field_penalty: f64,
    pub staleness_grace_days: i64,
    pub staleness_penalty_per_day: f64,
    pub staleness_penalty_cap: f64,
}

impl Default for ScoreSettings {
    fn default() -> Self {
        Self {
            min_history: 30,
            window: 90,
            momentum_window: 30,
            trend_window: 7,
            trend_threshold: 3.0,
            large_delta: 100_000.0,
            missing_field_penalty: 10.0,
            staleness_grace_days: 7,
            staleness_penalty_per_day: 3.0,
            staleness_penalty_cap: 30.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadingSettings {
    pub min_history: usize,
    /// Change in RRP velocity (billions/day) between weeks that counts as acceleration
    pub acceleration_threshold: f64,
}

impl Default for LeadingSettings {
    fn default() -> Self {
        Self {
            min_history: 14,
            acceleration_threshold: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternSettings {
    pub cycle_start_pct: f64,
    pub transition_reserves_pct: f64,
    pub transition_balance_sheet_pct: f64,
    pub stagnation_pct: f64,
    pub stagnation_window: usize,
    pub min_cycle_days: i64,
    pub regime_window: usize,
    pub anomaly_z: f64,
}

impl Default for PatternSettings {
    fn default() -> Self {
        Self {
            cycle_start_pct: 2.0,
            transition_reserves_pct: 5.0,
            transition_balance_sheet_pct: 1.0,
            stagnation_pct: 0.5,
            stagnation_window: 10,
            min_cycle_days: 30,
            regime_window: 30,
            anomaly_z: 2.5,
        }
    }
}
