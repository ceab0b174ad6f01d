use serde::{Deserialize, Serialize};

use super::Regime;
use crate::config::RegimeThresholds;

/// The three 4-week deltas the classifier reads, in their series units.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RegimeInputs {
    pub balance_sheet: Option<f64>,
    pub reserves: Option<f64>,
    pub rrp: Option<f64>,
}

/// Boolean facts evaluated once per classification, kept for auditing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegimeFacts {
    pub balance_sheet_expanding: bool,
    pub reserves_expanding: bool,
    pub balance_sheet_contracting: bool,
    pub reserves_contracting: bool,
    pub rrp_draining: bool,
    pub rrp_draining_mildly: bool,
    pub reserves_flat_or_rising: bool,
    pub balance_sheet_not_contracting: bool,
    pub balance_sheet_flat: bool,
    pub reserves_growing: bool,
    pub balance_sheet_growing: bool,
}

impl RegimeFacts {
    pub fn evaluate(balance_sheet: f64, reserves: f64, rrp: f64, t: &RegimeThresholds) -> Self {
        Self {
            balance_sheet_expanding: balance_sheet > t.qe_balance_sheet,
            reserves_expanding: reserves > t.qe_reserves,
            balance_sheet_contracting: balance_sheet < -t.qt_balance_sheet,
            reserves_contracting: reserves < -t.qt_reserves,
            rrp_draining: rrp < -t.rrp_drain,
            rrp_draining_mildly: rrp < -t.rrp_drain_mild,
            reserves_flat_or_rising: reserves >= 0.0,
            balance_sheet_not_contracting: balance_sheet > -t.flat_band,
            balance_sheet_flat: balance_sheet >= -t.flat_band && balance_sheet <= t.flat_band,
            reserves_growing: reserves > t.stealth_reserves_growth,
            balance_sheet_growing: balance_sheet > t.stealth_balance_sheet_growth,
        }
    }
}

struct RegimeRule {
    name: &'static str,
    regime: Regime,
    applies: fn(&RegimeFacts) -> bool,
}

/// Evaluated top to bottom, first match wins. QT sits between QE and the stealth
/// rules so a genuine contraction is never reported as a rotation.
const RULES: [RegimeRule; 5] = [
    RegimeRule {
        name: "qe: balance sheet and reserves expanding",
        regime: Regime::Qe,
        applies: |f| f.balance_sheet_expanding && f.reserves_expanding,
    },
    RegimeRule {
        name: "qt: balance sheet or reserves contracting",
        regime: Regime::Qt,
        applies: |f| f.balance_sheet_contracting || f.reserves_contracting,
    },
    RegimeRule {
        name: "stealth_qe: rrp draining into reserves",
        regime: Regime::StealthQe,
        applies: |f| f.rrp_draining && f.reserves_flat_or_rising && f.balance_sheet_not_contracting,
    },
    RegimeRule {
        name: "stealth_qe: reserves growing on a flat balance sheet",
        regime: Regime::StealthQe,
        applies: |f| f.reserves_growing && f.balance_sheet_flat,
    },
    RegimeRule {
        name: "stealth_qe: balance sheet growing while rrp drains",
        regime: Regime::StealthQe,
        applies: |f| f.balance_sheet_growing && f.rrp_draining_mildly,
    },
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeClassification {
    pub regime: Regime,
    /// `None` when an input delta was missing and no rule was evaluated.
    pub facts: Option<RegimeFacts>,
    pub matched_rule: Option<String>,
}

impl RegimeClassification {
    pub fn neutral() -> Self {
        Self {
            regime: Regime::Neutral,
            facts: None,
            matched_rule: None,
        }
    }
}

/// Classify the policy stance. Any missing delta yields `Neutral` without partial evaluation.
pub fn classify_regime(inputs: &RegimeInputs, thresholds: &RegimeThresholds) -> RegimeClassification {
    let (balance_sheet, reserves, rrp) = match (inputs.balance_sheet, inputs.reserves, inputs.rrp) {
        (Some(bs), Some(res), Some(rrp)) => (bs, res, rrp),
        _ => return RegimeClassification::neutral(),
    };

    let facts = RegimeFacts::evaluate(balance_sheet, reserves, rrp, thresholds);

    match RULES.iter().find(|rule| (rule.applies)(&facts)) {
        Some(rule) => RegimeClassification {
            regime: rule.regime,
            facts: Some(facts),
            matched_rule: Some(rule.name.to_string()),
        },
        None => RegimeClassification {
            regime: Regime::Neutral,
            facts: Some(facts),
            matched_rule: None,
        },
    }
}
