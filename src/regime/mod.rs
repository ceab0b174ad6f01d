pub mod classifier;
pub mod qualifiers;

pub use classifier::*;
pub use qualifiers::*;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Policy stance label. Exactly one per daily record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    Qe,
    StealthQe,
    Qt,
    Neutral,
}

impl Regime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Regime::Qe => "qe",
            Regime::StealthQe => "stealth_qe",
            Regime::Qt => "qt",
            Regime::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
