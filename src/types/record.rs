use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::SeriesKey;
use crate::leading::LeadingIndicators;
use crate::normalize::{FilledRow, Seed, SeedValue};
use crate::regime::{QualifierInputs, Qualifiers, Regime, RegimeClassification, RegimeInputs};
use crate::score::LiquidityScore;

/// 4-week deltas, each in its parent series' unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Deltas {
    pub walcl: Option<f64>,
    pub wresbal: Option<f64>,
    pub rrp: Option<f64>,
    pub dxy: Option<f64>,
    pub yield_curve: Option<f64>,
}

/// One calendar day: forward-filled inputs plus everything derived from them.
/// Upserted by `date`; recomputation overwrites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub walcl: Option<f64>,
    pub wresbal: Option<f64>,
    pub rrp: Option<f64>,
    pub vix: Option<f64>,
    pub hy_spread: Option<f64>,
    pub dgs10: Option<f64>,
    pub dgs2: Option<f64>,
    pub sofr: Option<f64>,
    pub iorb: Option<f64>,
    pub effr: Option<f64>,
    pub dxy: Option<f64>,
    /// 10y-2y, percent
    pub yield_curve: Option<f64>,
    /// SOFR-IORB, basis points
    pub sofr_iorb_spread: Option<f64>,
    pub deltas: Deltas,
    /// Date of the latest genuine observation behind each carried value
    #[serde(default)]
    pub last_observed: BTreeMap<SeriesKey, NaiveDate>,
    pub regime: Option<RegimeClassification>,
    pub qualifiers: Option<Qualifiers>,
    pub score: Option<LiquidityScore>,
    pub leading: Option<LeadingIndicators>,
}

impl DailyRecord {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            walcl: None,
            wresbal: None,
            rrp: None,
            vix: None,
            hy_spread: None,
            dgs10: None,
            dgs2: None,
            sofr: None,
            iorb: None,
            effr: None,
            dxy: None,
            yield_curve: None,
            sofr_iorb_spread: None,
            deltas: Deltas::default(),
            last_observed: BTreeMap::new(),
            regime: None,
            qualifiers: None,
            score: None,
            leading: None,
        }
    }

    pub fn from_filled(row: &FilledRow) -> Self {
        let mut record = Self::empty(row.date);
        for (key, value) in &row.values {
            record.set_value(*key, Some(*value));
        }
        record.last_observed = row.last_observed.clone();
        record.refresh_spreads();
        record
    }

    pub fn value(&self, key: SeriesKey) -> Option<f64> {
        match key {
            SeriesKey::BalanceSheet => self.walcl,
            SeriesKey::Reserves => self.wresbal,
            SeriesKey::ReverseRepo => self.rrp,
            SeriesKey::Vix => self.vix,
            SeriesKey::HighYieldSpread => self.hy_spread,
            SeriesKey::Treasury10y => self.dgs10,
            SeriesKey::Treasury2y => self.dgs2,
            SeriesKey::Sofr => self.sofr,
            SeriesKey::Iorb => self.iorb,
            SeriesKey::FedFunds => self.effr,
            SeriesKey::Dollar => self.dxy,
        }
    }

    pub fn set_value(&mut self, key: SeriesKey, value: Option<f64>) {
        let slot = match key {
            SeriesKey::BalanceSheet => &mut self.walcl,
            SeriesKey::Reserves => &mut self.wresbal,
            SeriesKey::ReverseRepo => &mut self.rrp,
            SeriesKey::Vix => &mut self.vix,
            SeriesKey::HighYieldSpread => &mut self.hy_spread,
            SeriesKey::Treasury10y => &mut self.dgs10,
            SeriesKey::Treasury2y => &mut self.dgs2,
            SeriesKey::Sofr => &mut self.sofr,
            SeriesKey::Iorb => &mut self.iorb,
            SeriesKey::FedFunds => &mut self.effr,
            SeriesKey::Dollar => &mut self.dxy,
        };
        *slot = value;
    }

    /// Recompute the derived spreads from the raw fields.
    pub fn refresh_spreads(&mut self) {
        self.yield_curve = match (self.dgs10, self.dgs2) {
            (Some(long), Some(short)) => Some(long - short),
            _ => None,
        };
        self.sofr_iorb_spread = match (self.sofr, self.iorb) {
            (Some(sofr), Some(iorb)) => Some((sofr - iorb) * 100.0),
            _ => None,
        };
    }

    /// Carry-forward seed for the next run.
    pub fn seed(&self) -> Seed {
        SeriesKey::ALL
            .iter()
            .filter_map(|key| {
                let value = self.value(*key)?;
                let observed = self.last_observed.get(key).copied().unwrap_or(self.date);
                Some((*key, SeedValue { value, observed }))
            })
            .collect()
    }

    pub fn missing_critical_fields(&self) -> usize {
        SeriesKey::ALL
            .iter()
            .filter(|key| key.is_critical() && self.value(**key).is_none())
            .count()
    }

    pub fn regime_inputs(&self) -> RegimeInputs {
        RegimeInputs {
            balance_sheet: self.deltas.walcl,
            reserves: self.deltas.wresbal,
            rrp: self.deltas.rrp,
        }
    }

    pub fn qualifier_inputs(&self) -> QualifierInputs {
        QualifierInputs {
            vix: self.vix,
            credit_spread: self.hy_spread,
            dollar_delta: self.deltas.dxy,
            yield_curve: self.yield_curve,
            yield_curve_delta: self.deltas.yield_curve,
            funding_spread_bps: self.sofr_iorb_spread,
            balance_sheet_delta: self.deltas.walcl,
            reserves_delta: self.deltas.wresbal,
            rrp_delta: self.deltas.rrp,
        }
    }

    pub fn score_total(&self) -> Option<f64> {
        self.score.as_ref().map(|s| s.total)
    }

    /// Score total, skipping the fixed default returned for thin history.
    pub fn sufficient_score_total(&self) -> Option<f64> {
        self.score.as_ref().filter(|s| s.sufficient_history).map(|s| s.total)
    }

    pub fn snapshot(&self) -> RegimeSnapshot {
        RegimeSnapshot {
            date: self.date,
            regime: self.regime.as_ref().map(|r| r.regime),
            qualifiers: self.qualifiers.clone(),
            score: self.score.clone(),
        }
    }
}

/// The unit a notifier consumes: label, qualifiers and score for one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeSnapshot {
    pub date: NaiveDate,
    pub regime: Option<Regime>,
    pub qualifiers: Option<Qualifiers>,
    pub score: Option<LiquidityScore>,
}

impl RegimeSnapshot {
    /// Absent values read "not available", never a default regime.
    pub fn regime_label(&self) -> &'static str {
        self.regime.map(|r| r.as_str()).unwrap_or("not available")
    }

    pub fn headline(&self) -> String {
        let score = self
            .score
            .as_ref()
            .map(|s| format!("{:.1} ({})", s.total, s.grade))
            .unwrap_or_else(|| "not available".to_string());
        format!("{} regime={} score={}", self.date, self.regime_label(), score)
    }
}
