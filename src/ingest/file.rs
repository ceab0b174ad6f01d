use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

use super::ObservationSource;
use crate::error::Result;
use crate::types::{RawObservation, SeriesKey};

/// Observations read from a JSON export shaped as
/// `{ "WALCL": [["2024-01-03", "7700000"], ...], ... }`.
///
/// Values stay as raw strings; sentinels such as `"."` are rejected later by the normalizer.
#[derive(Debug, Clone, Default)]
pub struct JsonFileSource {
    series: BTreeMap<SeriesKey, Vec<RawObservation>>,
}

impl JsonFileSource {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let text = tokio::fs::read_to_string(path.as_ref()).await?;
        let source = Self::from_json(&text)?;
        debug!("Loaded {} series from {}", source.series.len(), path.as_ref().display());
        Ok(source)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let parsed: BTreeMap<String, Vec<(NaiveDate, String)>> = serde_json::from_str(text)?;

        let mut series = BTreeMap::new();
        for (id, rows) in parsed {
            match SeriesKey::from_str(&id) {
                Ok(key) => {
                    let observations = rows
                        .into_iter()
                        .map(|(date, raw)| RawObservation::new(date, raw))
                        .collect();
                    series.insert(key, observations);
                }
                Err(e) => warn!("Skipping {}", e),
            }
        }

        Ok(Self { series })
    }
}

#[async_trait]
impl ObservationSource for JsonFileSource {
    async fn fetch(&self, series: SeriesKey) -> Result<Vec<RawObservation>> {
        Ok(self.series.get(&series).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::fetch_all;

    const EXPORT: &str = r#"{
        "WALCL": [["2024-01-03", "7700000"], ["2024-01-10", "7690000"]],
        "rrpontsyd": [["2024-01-03", "."]],
        "NOT_A_SERIES": [["2024-01-03", "1"]]
    }"#;

    #[tokio::test]
    async fn test_reads_known_series() {
        let source = JsonFileSource::from_json(EXPORT).unwrap();

        let walcl = source.fetch(SeriesKey::BalanceSheet).await.unwrap();
        assert_eq!(walcl.len(), 2);
        assert_eq!(walcl[1].value(), Some(7_690_000.0));

        let rrp = source.fetch(SeriesKey::ReverseRepo).await.unwrap();
        assert_eq!(rrp.len(), 1);
        assert_eq!(rrp[0].value(), None);

        assert!(source.fetch(SeriesKey::Vix).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_from_disk() {
        let path = std::env::temp_dir().join("liquidity-monitor-ingest-test.json");
        tokio::fs::write(&path, EXPORT).await.unwrap();

        let source = JsonFileSource::open(&path).await.unwrap();
        let all = fetch_all(&source).await;
        assert_eq!(all[&SeriesKey::BalanceSheet].len(), 2);

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[test]
    fn test_malformed_export_is_an_error() {
        assert!(JsonFileSource::from_json("[1, 2]").is_err());
    }
}
