//! Historical market data
//!
//! The engine core never fetches or generates candles itself: everything
//! arrives through the [`HistoricalDataProvider`] collaborator. Two concrete
//! providers ship with the crate, a JSON file reader for captured candles
//! and a seeded synthetic random-walk generator.

mod file;
mod synthetic;
mod types;

pub use file::JsonBarProvider;
pub use synthetic::SyntheticProvider;
pub use types::{Bar, Timeframe};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::EngineError;

/// Source of historical candles for one market and timeframe
#[async_trait]
pub trait HistoricalDataProvider: Send + Sync {
    /// Return the bars covering `[start, end)`, ordered by ascending
    /// timestamp. A range with no bars is reported as
    /// [`EngineError::DataUnavailable`].
    async fn get_bars(
        &self,
        market: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, EngineError>;
}
