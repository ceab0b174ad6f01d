use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upstream series the monitor consumes. Serialized by upstream id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SeriesKey {
    #[serde(rename = "WALCL")]
    BalanceSheet,
    #[serde(rename = "WRESBAL")]
    Reserves,
    #[serde(rename = "RRPONTSYD")]
    ReverseRepo,
    #[serde(rename = "VIXCLS")]
    Vix,
    #[serde(rename = "BAMLH0A0HYM2")]
    HighYieldSpread,
    #[serde(rename = "DGS10")]
    Treasury10y,
    #[serde(rename = "DGS2")]
    Treasury2y,
    #[serde(rename = "SOFR")]
    Sofr,
    #[serde(rename = "IORB")]
    Iorb,
    #[serde(rename = "DFF")]
    FedFunds,
    #[serde(rename = "DTWEXBGS")]
    Dollar,
}

impl SeriesKey {
    pub const ALL: [SeriesKey; 11] = [
        SeriesKey::BalanceSheet,
        SeriesKey::Reserves,
        SeriesKey::ReverseRepo,
        SeriesKey::Vix,
        SeriesKey::HighYieldSpread,
        SeriesKey::Treasury10y,
        SeriesKey::Treasury2y,
        SeriesKey::Sofr,
        SeriesKey::Iorb,
        SeriesKey::FedFunds,
        SeriesKey::Dollar,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesKey::BalanceSheet => "WALCL",
            SeriesKey::Reserves => "WRESBAL",
            SeriesKey::ReverseRepo => "RRPONTSYD",
            SeriesKey::Vix => "VIXCLS",
            SeriesKey::HighYieldSpread => "BAMLH0A0HYM2",
            SeriesKey::Treasury10y => "DGS10",
            SeriesKey::Treasury2y => "DGS2",
            SeriesKey::Sofr => "SOFR",
            SeriesKey::Iorb => "IORB",
            SeriesKey::FedFunds => "DFF",
            SeriesKey::Dollar => "DTWEXBGS",
        }
    }

    /// Storage unit of the series. Thresholds are expressed in this unit.
    pub fn unit(&self) -> Unit {
        match self {
            SeriesKey::BalanceSheet | SeriesKey::Reserves => Unit::MillionsUsd,
            SeriesKey::ReverseRepo => Unit::BillionsUsd,
            SeriesKey::Vix | SeriesKey::Dollar => Unit::IndexPoints,
            SeriesKey::HighYieldSpread
            | SeriesKey::Treasury10y
            | SeriesKey::Treasury2y
            | SeriesKey::Sofr
            | SeriesKey::Iorb
            | SeriesKey::FedFunds => Unit::Percent,
        }
    }

    /// Fields whose absence costs score confidence.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            SeriesKey::BalanceSheet
                | SeriesKey::Reserves
                | SeriesKey::ReverseRepo
                | SeriesKey::Vix
                | SeriesKey::HighYieldSpread
                | SeriesKey::Sofr
                | SeriesKey::Iorb
        )
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SeriesKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SeriesKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown series id: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    MillionsUsd,
    BillionsUsd,
    Percent,
    IndexPoints,
}

impl Unit {
    /// Presentation-only conversion: dollar amounts are shown in billions.
    pub fn to_display(&self, value: f64) -> (f64, &'static str) {
        match self {
            Unit::MillionsUsd => (value / 1_000.0, "$B"),
            Unit::BillionsUsd => (value, "$B"),
            Unit::Percent => (value, "%"),
            Unit::IndexPoints => (value, "pts"),
        }
    }
}

/// One upstream observation, value still in its raw string form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    pub date: NaiveDate,
    pub raw: String,
}

impl RawObservation {
    pub fn new(date: NaiveDate, raw: impl Into<String>) -> Self {
        Self { date, raw: raw.into() }
    }

    pub fn value(&self) -> Option<f64> {
        parse_raw_value(&self.raw)
    }
}

/// Parse an upstream value. Sentinels (".", "", "NaN", "#N/A") become `None`, never 0.
pub fn parse_raw_value(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let decimal = Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()?;
    decimal.to_f64().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_raw_value() {
        assert_eq!(parse_raw_value("7700000"), Some(7_700_000.0));
        assert_eq!(parse_raw_value(" 4.33 "), Some(4.33));
        assert_eq!(parse_raw_value("-12.5"), Some(-12.5));
        assert_eq!(parse_raw_value("1.5e3"), Some(1500.0));
    }

    #[test]
    fn test_sentinels_are_absent() {
        for raw in [".", "", "NaN", "nan", "inf", "#N/A", "null"] {
            assert_eq!(parse_raw_value(raw), None, "{raw} should be absent");
        }
    }

    #[test]
    fn test_series_key_round_trip() {
        for key in SeriesKey::ALL {
            assert_eq!(key.as_str().parse::<SeriesKey>(), Ok(key));
        }
        assert!("UNKNOWN".parse::<SeriesKey>().is_err());
        assert_eq!("walcl".parse::<SeriesKey>(), Ok(SeriesKey::BalanceSheet));
    }

    #[test]
    fn test_units() {
        assert_eq!(SeriesKey::BalanceSheet.unit(), SeriesKey::Reserves.unit());
        assert_eq!(SeriesKey::ReverseRepo.unit(), Unit::BillionsUsd);
        let (shown, label) = Unit::MillionsUsd.to_display(60_000.0);
        assert_eq!(shown, 60.0);
        assert_eq!(label, "$B");
    }
}
