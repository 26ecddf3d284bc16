//! Market data types

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One OHLCV sample for a fixed time interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Bar open timestamp
    pub timestamp: DateTime<Utc>,
    /// Opening price
    pub open: Decimal,
    /// Highest traded price
    pub high: Decimal,
    /// Lowest traded price
    pub low: Decimal,
    /// Closing price
    pub close: Decimal,
    /// Traded volume
    pub volume: Decimal,
}

/// Candle interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    /// One minute
    #[serde(rename = "1m")]
    M1,
    /// Five minutes
    #[serde(rename = "5m")]
    M5,
    /// Fifteen minutes
    #[serde(rename = "15m")]
    M15,
    /// One hour
    #[serde(rename = "1h")]
    H1,
    /// Four hours
    #[serde(rename = "4h")]
    H4,
    /// One day
    #[serde(rename = "1d")]
    D1,
}

impl Timeframe {
    /// Duration of one bar
    pub fn duration(&self) -> Duration {
        match self {
            Timeframe::M1 => Duration::minutes(1),
            Timeframe::M5 => Duration::minutes(5),
            Timeframe::M15 => Duration::minutes(15),
            Timeframe::H1 => Duration::hours(1),
            Timeframe::H4 => Duration::hours(4),
            Timeframe::D1 => Duration::days(1),
        }
    }

    /// Canonical string form ("1m", "1h", ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1m" => Ok(Timeframe::M1),
            "5m" => Ok(Timeframe::M5),
            "15m" => Ok(Timeframe::M15),
            "1h" => Ok(Timeframe::H1),
            "4h" => Ok(Timeframe::H4),
            "1d" => Ok(Timeframe::D1),
            other => Err(format!("unknown timeframe '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_timeframe_roundtrip() {
        for tf in [
            Timeframe::M1,
            Timeframe::M5,
            Timeframe::M15,
            Timeframe::H1,
            Timeframe::H4,
            Timeframe::D1,
        ] {
            assert_eq!(tf.as_str().parse::<Timeframe>().unwrap(), tf);
        }
    }

    #[test]
    fn test_timeframe_parse_unknown() {
        assert!("7m".parse::<Timeframe>().is_err());
    }

    #[test]
    fn test_timeframe_duration() {
        assert_eq!(Timeframe::H1.duration(), Duration::hours(1));
        assert_eq!(Timeframe::D1.duration(), Duration::days(1));
    }

    #[test]
    fn test_bar_serde_roundtrip() {
        let bar = Bar {
            timestamp: Utc::now(),
            open: dec!(50000),
            high: dec!(50500),
            low: dec!(49800),
            close: dec!(50200),
            volume: dec!(12.5),
        };
        let json = serde_json::to_string(&bar).unwrap();
        let back: Bar = serde_json::from_str(&json).unwrap();
        assert_eq!(bar, back);
    }
}
