//! Bar and Resolution Types
//!
//! Core types for historical and live OHLCV data:
//!
//! - [`Bar`]: one OHLCV record keyed by its bucket start time
//! - [`Resolution`]: parsed bar-granularity token from the charting widget
//! - [`Timespan`]: provider-side bucket unit for aggregate requests
//! - [`HistoryStatus`]: continuation hint returned with every history fetch
//!
//! # Resolution Mapping
//!
//! Resolution tokens map to provider `(multiplier, timespan)` pairs under a
//! fixed total rule:
//!
//! | Token        | Provider parameters |
//! |--------------|---------------------|
//! | `"1"`        | `(1, minute)`       |
//! | `"45"`       | `(45, minute)`      |
//! | `"60"`       | `(1, hour)`         |
//! | `"240"`      | `(4, hour)`         |
//! | `"D"`/`"1D"` | `(1, day)`          |

use std::str::FromStr;

use serde::{Deserialize, Serialize};

// =============================================================================
// Bar
// =============================================================================

/// One OHLCV bar.
///
/// Produced by reshaping provider aggregate records. A bar has no identity
/// beyond its timestamp; callers receiving live updates replace any bar
/// carrying the same `time`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Bucket start time, milliseconds since the Unix epoch.
    pub time: i64,
    /// Open price.
    pub open: f64,
    /// High price.
    pub high: f64,
    /// Low price.
    pub low: f64,
    /// Close price.
    pub close: f64,
    /// Volume over the bucket.
    pub volume: f64,
}

// =============================================================================
// History Continuation Hint
// =============================================================================

/// Signal returned with a historical fetch indicating whether an earlier
/// time boundary may exist for further pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistoryStatus {
    /// True when the fetch produced no bars for the requested range.
    pub no_data: bool,
}

impl HistoryStatus {
    /// Derive the hint from a fetched bar sequence.
    #[must_use]
    pub const fn from_bars(bars: &[Bar]) -> Self {
        Self {
            no_data: bars.is_empty(),
        }
    }
}

// =============================================================================
// Timespan
// =============================================================================

/// Provider-side bucket unit for aggregate-bar requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timespan {
    /// One-minute buckets.
    Minute,
    /// One-hour buckets.
    Hour,
    /// One-day buckets.
    Day,
}

impl Timespan {
    /// Path segment used by the aggregate-bars endpoint.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
        }
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// A parsed bar-granularity token.
///
/// The charting widget expresses granularity as a string: a minute count
/// (`"1"`, `"45"`, `"240"`) or a day marker (`"D"`, `"1D"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
    /// Intraday granularity in minutes.
    Minutes(u32),
    /// Daily granularity.
    Daily,
}

impl Resolution {
    /// Provider `(multiplier, timespan)` pair for this resolution.
    ///
    /// Sub-hour granularities keep a minute timespan with the minute count
    /// as multiplier; exact hour multiples collapse to an hour timespan.
    #[must_use]
    pub const fn provider_params(&self) -> (u32, Timespan) {
        match self {
            Self::Minutes(n) => {
                if *n >= 60 && *n % 60 == 0 {
                    (*n / 60, Timespan::Hour)
                } else {
                    (*n, Timespan::Minute)
                }
            }
            Self::Daily => (1, Timespan::Day),
        }
    }

    /// Whether this resolution is eligible for live subscription.
    ///
    /// Only the finest supported granularity (one minute) is streamed; all
    /// coarser resolutions are history-only.
    #[must_use]
    pub const fn supports_streaming(&self) -> bool {
        matches!(self, Self::Minutes(1))
    }

    /// The canonical token for this resolution.
    #[must_use]
    pub fn token(&self) -> String {
        match self {
            Self::Minutes(n) => n.to_string(),
            Self::Daily => "1D".to_string(),
        }
    }
}

/// Error produced when a resolution token is outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported resolution token: {0:?}")]
pub struct ResolutionError(pub String);

impl FromStr for Resolution {
    type Err = ResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "D" | "1D" => Ok(Self::Daily),
            token => match token.parse::<u32>() {
                Ok(n) if n > 0 => Ok(Self::Minutes(n)),
                _ => Err(ResolutionError(token.to_string())),
            },
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.token())
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("1", 1, Timespan::Minute; "one minute")]
    #[test_case("45", 45, Timespan::Minute; "forty five minutes")]
    #[test_case("60", 1, Timespan::Hour; "one hour")]
    #[test_case("240", 4, Timespan::Hour; "four hours")]
    #[test_case("D", 1, Timespan::Day; "day marker")]
    #[test_case("1D", 1, Timespan::Day; "one day")]
    fn resolution_mapping_is_total(token: &str, multiplier: u32, timespan: Timespan) {
        let resolution: Resolution = token.parse().unwrap();
        assert_eq!(resolution.provider_params(), (multiplier, timespan));
    }

    #[test]
    fn unknown_tokens_are_rejected() {
        assert!("".parse::<Resolution>().is_err());
        assert!("0".parse::<Resolution>().is_err());
        assert!("1W".parse::<Resolution>().is_err());
        assert!("fast".parse::<Resolution>().is_err());
    }

    #[test]
    fn only_one_minute_streams() {
        assert!(Resolution::Minutes(1).supports_streaming());
        assert!(!Resolution::Minutes(5).supports_streaming());
        assert!(!Resolution::Minutes(60).supports_streaming());
        assert!(!Resolution::Daily.supports_streaming());
    }

    #[test]
    fn history_status_reflects_emptiness() {
        assert!(HistoryStatus::from_bars(&[]).no_data);

        let bar = Bar {
            time: 1_700_000_000_000,
            open: 1.0,
            high: 2.0,
            low: 0.5,
            close: 1.5,
            volume: 100.0,
        };
        assert!(!HistoryStatus::from_bars(&[bar]).no_data);
    }

    #[test]
    fn token_round_trips() {
        for token in ["1", "45", "240", "1D"] {
            let resolution: Resolution = token.parse().unwrap();
            assert_eq!(resolution.token(), token);
        }
        // "D" canonicalizes to "1D"
        assert_eq!("D".parse::<Resolution>().unwrap().token(), "1D");
    }
}
