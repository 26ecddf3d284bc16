//! JSON file bar provider
//!
//! Reads candles captured to disk, one JSON file per market and timeframe
//! (`BTC-USD-1h.json` holding an array of bars).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

use super::{Bar, HistoricalDataProvider, Timeframe};
use crate::error::EngineError;

/// Provider backed by a directory of JSON bar files
pub struct JsonBarProvider {
    dir: PathBuf,
}

impl JsonBarProvider {
    /// Create a provider reading from `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File path for a market/timeframe pair
    pub fn file_path(&self, market: &str, timeframe: Timeframe) -> PathBuf {
        let name = format!("{}-{}.json", market.replace('/', "-"), timeframe);
        self.dir.join(name)
    }

    /// Write a bar series to the file this provider would read it from.
    /// Used by capture tooling and test fixtures.
    pub async fn write_bars(
        &self,
        market: &str,
        timeframe: Timeframe,
        bars: &[Bar],
    ) -> anyhow::Result<()> {
        let path = self.file_path(market, timeframe);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(bars)?;
        tokio::fs::write(&path, json).await?;
        Ok(())
    }

    fn unavailable(
        &self,
        market: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EngineError {
        EngineError::DataUnavailable {
            market: market.to_string(),
            timeframe: timeframe.to_string(),
            start,
            end,
        }
    }
}

#[async_trait]
impl HistoricalDataProvider for JsonBarProvider {
    async fn get_bars(
        &self,
        market: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, EngineError> {
        let path = self.file_path(market, timeframe);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "bar file not readable");
                return Err(self.unavailable(market, timeframe, start, end));
            }
        };

        let mut bars: Vec<Bar> = serde_json::from_slice(&raw).map_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "bar file is not valid JSON");
            self.unavailable(market, timeframe, start, end)
        })?;

        bars.retain(|b| b.timestamp >= start && b.timestamp < end);
        bars.sort_by_key(|b| b.timestamp);

        if bars.is_empty() {
            return Err(self.unavailable(market, timeframe, start, end));
        }
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn bar_at(hour: u32) -> Bar {
        let ts = Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).unwrap();
        Bar {
            timestamp: ts,
            open: dec!(50000),
            high: dec!(50100),
            low: dec!(49900),
            close: dec!(50050),
            volume: dec!(10),
        }
    }

    #[tokio::test]
    async fn test_roundtrip_and_range_filter() {
        let dir = tempfile::tempdir().unwrap();
        let provider = JsonBarProvider::new(dir.path());
        let bars: Vec<Bar> = (0..6).map(bar_at).collect();
        provider
            .write_bars("BTC/USD", Timeframe::H1, &bars)
            .await
            .unwrap();

        let start = Utc.with_ymd_and_hms(2025, 6, 1, 2, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 6, 1, 5, 0, 0).unwrap();
        let got = provider
            .get_bars("BTC/USD", Timeframe::H1, start, end)
            .await
            .unwrap();

        assert_eq!(got.len(), 3);
        assert_eq!(got[0].timestamp, start);
    }

    #[tokio::test]
    async fn test_missing_file_is_data_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let provider = JsonBarProvider::new(dir.path());
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap();

        let err = provider
            .get_bars("BTC/USD", Timeframe::H1, start, end)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No historical data"));
    }

    #[tokio::test]
    async fn test_empty_range_is_data_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let provider = JsonBarProvider::new(dir.path());
        let bars: Vec<Bar> = (0..3).map(bar_at).collect();
        provider
            .write_bars("BTC/USD", Timeframe::H1, &bars)
            .await
            .unwrap();

        // start == end selects nothing
        let t = Utc.with_ymd_and_hms(2025, 6, 1, 1, 0, 0).unwrap();
        let err = provider
            .get_bars("BTC/USD", Timeframe::H1, t, t)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No historical data"));
    }
}
