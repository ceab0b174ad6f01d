pub mod file;

pub use file::*;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{info, warn};

use crate::error::Result;
use crate::normalize::SeriesObservations;
use crate::types::{RawObservation, SeriesKey};

/// Anything that can hand back the raw observations of one upstream series.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObservationSource: Send + Sync {
    async fn fetch(&self, series: SeriesKey) -> Result<Vec<RawObservation>>;
}

/// Fetch every series concurrently. A failed series is logged and comes back empty,
/// so the normalizer carries it as permanently absent.
pub async fn fetch_all<S>(source: &S) -> SeriesObservations
where
    S: ObservationSource + ?Sized,
{
    let results = join_all(SeriesKey::ALL.iter().map(|key| async move { (*key, source.fetch(*key).await) })).await;

    let mut observations = SeriesObservations::new();
    for (key, result) in results {
        let rows = match result {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Fetch failed for {}, treating as missing: {}", key, e);
                Vec::new()
            }
        };
        observations.insert(key, rows);
    }

    let total: usize = observations.values().map(Vec::len).sum();
    info!("Fetched {} observations across {} series", total, observations.len());
    observations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MonitorError;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_failed_series_resolves_empty() {
        let mut source = MockObservationSource::new();
        source.expect_fetch().times(SeriesKey::ALL.len()).returning(|key| match key {
            SeriesKey::Vix => Err(MonitorError::Fetch {
                series: key,
                reason: "timeout".to_string(),
            }),
            _ => Ok(vec![RawObservation::new(
                NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
                "1.5",
            )]),
        });

        let observations = fetch_all(&source).await;
        assert_eq!(observations.len(), SeriesKey::ALL.len());
        assert!(observations[&SeriesKey::Vix].is_empty());
        assert_eq!(observations[&SeriesKey::Sofr].len(), 1);
        assert_eq!(observations[&SeriesKey::Sofr][0].value(), Some(1.5));
    }
}
