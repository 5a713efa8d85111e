use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::MarketDataError;

/// One OHLCV bar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoricalBar {
    /// Bar open time
    pub date: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Option<u64>,
}

/// Response body of the history endpoint.
///
/// An empty `data` array is a normal outcome, not an error.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistorySeries {
    pub symbol: String,
    pub data: Vec<HistoricalBar>,
}

impl HistorySeries {
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            data: Vec::new(),
        }
    }
}

/// Lookback window for historical data.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Period {
    OneDay,
    FiveDays,
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    TwoYears,
    FiveYears,
    TenYears,
    YearToDate,
    Max,
}

impl Period {
    pub const ALL: [Period; 11] = [
        Period::OneDay,
        Period::FiveDays,
        Period::OneMonth,
        Period::ThreeMonths,
        Period::SixMonths,
        Period::OneYear,
        Period::TwoYears,
        Period::FiveYears,
        Period::TenYears,
        Period::YearToDate,
        Period::Max,
    ];

    /// Chart API spelling (`6mo`, `1y`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::OneDay => "1d",
            Period::FiveDays => "5d",
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
            Period::FiveYears => "5y",
            Period::TenYears => "10y",
            Period::YearToDate => "ytd",
            Period::Max => "max",
        }
    }

    /// Approximate calendar days covered; `ytd` is measured from `today`.
    pub fn approx_days(&self, today: DateTime<Utc>) -> u32 {
        use chrono::Datelike;
        match self {
            Period::OneDay => 1,
            Period::FiveDays => 5,
            Period::OneMonth => 31,
            Period::ThreeMonths => 92,
            Period::SixMonths => 183,
            Period::OneYear => 366,
            Period::TwoYears => 731,
            Period::FiveYears => 1827,
            Period::TenYears => 3653,
            Period::YearToDate => today.ordinal(),
            Period::Max => 36_500,
        }
    }
}

impl FromStr for Period {
    type Err = MarketDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Period::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| {
                MarketDataError::invalid_input(format!(
                    "Invalid period '{}'. Allowed: {}",
                    s,
                    Period::ALL.map(|p| p.as_str()).join(", ")
                ))
            })
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bar width for historical data.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Interval {
    OneMinute,
    TwoMinutes,
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    SixtyMinutes,
    NinetyMinutes,
    OneHour,
    OneDay,
    FiveDays,
    OneWeek,
    OneMonth,
    ThreeMonths,
}

impl Interval {
    pub const ALL: [Interval; 13] = [
        Interval::OneMinute,
        Interval::TwoMinutes,
        Interval::FiveMinutes,
        Interval::FifteenMinutes,
        Interval::ThirtyMinutes,
        Interval::SixtyMinutes,
        Interval::NinetyMinutes,
        Interval::OneHour,
        Interval::OneDay,
        Interval::FiveDays,
        Interval::OneWeek,
        Interval::OneMonth,
        Interval::ThreeMonths,
    ];

    /// Chart API spelling (`1d`, `1wk`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneMinute => "1m",
            Interval::TwoMinutes => "2m",
            Interval::FiveMinutes => "5m",
            Interval::FifteenMinutes => "15m",
            Interval::ThirtyMinutes => "30m",
            Interval::SixtyMinutes => "60m",
            Interval::NinetyMinutes => "90m",
            Interval::OneHour => "1h",
            Interval::OneDay => "1d",
            Interval::FiveDays => "5d",
            Interval::OneWeek => "1wk",
            Interval::OneMonth => "1mo",
            Interval::ThreeMonths => "3mo",
        }
    }

    /// Bar width in minutes.
    pub fn minutes(&self) -> u32 {
        match self {
            Interval::OneMinute => 1,
            Interval::TwoMinutes => 2,
            Interval::FiveMinutes => 5,
            Interval::FifteenMinutes => 15,
            Interval::ThirtyMinutes => 30,
            Interval::SixtyMinutes | Interval::OneHour => 60,
            Interval::NinetyMinutes => 90,
            Interval::OneDay => 1_440,
            Interval::FiveDays => 7_200,
            Interval::OneWeek => 10_080,
            Interval::OneMonth => 43_200,
            Interval::ThreeMonths => 129_600,
        }
    }
}

impl FromStr for Interval {
    type Err = MarketDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Interval::ALL
            .into_iter()
            .find(|i| i.as_str() == wanted)
            .ok_or_else(|| {
                MarketDataError::invalid_input(format!(
                    "Invalid interval '{}'. Allowed: {}",
                    s,
                    Interval::ALL.map(|i| i.as_str()).join(", ")
                ))
            })
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A (period, interval) request for historical bars.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct HistoryRange {
    pub period: Period,
    pub interval: Interval,
}

impl HistoryRange {
    pub fn new(period: Period, interval: Interval) -> Self {
        Self { period, interval }
    }

    /// Range retried once when the requested one yields nothing.
    pub fn fallback() -> Self {
        Self::new(Period::OneYear, Interval::OneDay)
    }

    /// Parse query-string values, defaulting to `6mo` / `1d`.
    pub fn parse(period: Option<&str>, interval: Option<&str>) -> Result<Self, MarketDataError> {
        let period = match period.filter(|p| !p.trim().is_empty()) {
            Some(p) => p.parse()?,
            None => Period::SixMonths,
        };
        let interval = match interval.filter(|i| !i.trim().is_empty()) {
            Some(i) => i.parse()?,
            None => Interval::OneDay,
        };
        Ok(Self::new(period, interval))
    }
}

impl Default for HistoryRange {
    fn default() -> Self {
        Self::new(Period::SixMonths, Interval::OneDay)
    }
}
