//! Core data types shared across the Marketdesk modules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::market::Market;

/// A single OHLCV bar of price history.
///
/// Bars arrive from the provider ordered by timestamp ascending and are
/// never mutated after the fetch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Bar {
    /// Bar timestamp (open time for intraday intervals, session date for daily)
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Typical price, used by volume-weighted indicators.
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}

/// Metadata attached to every fetch result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchMetadata {
    /// Normalized ticker symbol (uppercase)
    pub ticker: String,
    /// Market the ticker trades on, detected from its suffix
    pub market: Market,
    /// Quote currency for that market
    pub currency: String,
    pub period: String,
    pub interval: String,
    /// When the payload was fetched from the provider
    pub fetched_at: DateTime<Utc>,
    /// True when the payload was served from the local cache
    pub cached: bool,
    /// Provider that produced the payload
    pub source: String,
}

/// Snapshot of the most recent prices in a fetch result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<u64>,
    /// Change vs. the previous close
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_pct: Option<f64>,
}

impl PriceSummary {
    /// Build a summary from the last bars of a history.
    ///
    /// `current_price` overrides the last close when the provider reports a
    /// live regular-market price.
    pub fn from_bars(bars: &[Bar], current_price: Option<f64>) -> Self {
        let last = match bars.last() {
            Some(bar) => bar,
            None => return Self::default(),
        };

        let current = current_price.or(Some(last.close));
        let previous_close = bars.len().checked_sub(2).map(|i| bars[i].close);

        let (change, change_pct) = match (current, previous_close) {
            (Some(cur), Some(prev)) if prev != 0.0 => {
                let change = cur - prev;
                (Some(change), Some(change / prev * 100.0))
            }
            _ => (None, None),
        };

        Self {
            current,
            open: Some(last.open),
            high: Some(last.high),
            low: Some(last.low),
            volume: Some(last.volume),
            change,
            change_pct,
        }
    }
}

/// A complete fetch result: metadata, latest prices and the bar history.
///
/// This is also the payload stored in the data cache, so it must round-trip
/// through serde unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockData {
    pub metadata: FetchMetadata,
    pub price: PriceSummary,
    pub bars: Vec<Bar>,
}

impl StockData {
    /// Closing prices of the history, in bar order.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}

/// API response wrapper printed by every CLI command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::daily_bars;
    use super::*;

    #[test]
    fn test_price_summary_from_bars() {
        let bars = daily_bars(&[100.0, 104.0]);
        let summary = PriceSummary::from_bars(&bars, None);

        assert_eq!(summary.current, Some(104.0));
        assert_eq!(summary.change, Some(4.0));
        assert!((summary.change_pct.unwrap() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_price_summary_prefers_live_price() {
        let bars = daily_bars(&[100.0, 104.0]);
        let summary = PriceSummary::from_bars(&bars, Some(105.5));

        assert_eq!(summary.current, Some(105.5));
        assert_eq!(summary.change, Some(5.5));
    }

    #[test]
    fn test_price_summary_empty_history() {
        let summary = PriceSummary::from_bars(&[], None);
        assert!(summary.current.is_none());
        assert!(summary.change.is_none());
    }

    #[test]
    fn test_typical_price() {
        let bar = daily_bars(&[100.0])[0];
        assert!((bar.typical_price() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_api_response() {
        let response: ApiResponse<String> = ApiResponse::ok("test".to_string());
        assert!(response.ok);
        assert_eq!(response.data, Some("test".to_string()));

        let err_response: ApiResponse<String> = ApiResponse::err("error");
        assert!(!err_response.ok);
        assert_eq!(err_response.error, Some("error".to_string()));
    }
}
