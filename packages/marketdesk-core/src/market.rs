//! Market detection and input validation.
//!
//! Tickers carry their exchange in the suffix (`0700.HK`, `600519.SS`,
//! `BTC-USD`); anything without a recognized suffix is treated as a US
//! listing. Validation happens before any fetch so malformed input never
//! reaches the provider.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Exchanges the fetcher knows how to label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Market {
    Us,
    HongKong,
    ChinaAShares,
    Crypto,
}

/// Static per-market configuration.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MarketConfig {
    pub name: &'static str,
    pub timezone: &'static str,
    pub currency: &'static str,
    pub trading_hours: &'static str,
}

impl Market {
    /// Detect the market from the ticker suffix.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use marketdesk_core::market::Market;
    ///
    /// assert_eq!(Market::detect("AAPL"), Market::Us);
    /// assert_eq!(Market::detect("0700.HK"), Market::HongKong);
    /// assert_eq!(Market::detect("600519.SS"), Market::ChinaAShares);
    /// assert_eq!(Market::detect("BTC-USD"), Market::Crypto);
    /// ```
    pub fn detect(ticker: &str) -> Self {
        let upper = ticker.to_uppercase();

        if upper.ends_with(".HK") {
            return Market::HongKong;
        }
        if upper.ends_with(".SS") || upper.ends_with(".SZ") {
            return Market::ChinaAShares;
        }
        if ["-USD", "-BTC", "-ETH"].iter().any(|s| upper.contains(s)) {
            return Market::Crypto;
        }

        Market::Us
    }

    pub fn config(&self) -> MarketConfig {
        match self {
            Market::Us => MarketConfig {
                name: "US Market",
                timezone: "America/New_York",
                currency: "USD",
                trading_hours: "09:30-16:00",
            },
            Market::HongKong => MarketConfig {
                name: "Hong Kong Stock Exchange",
                timezone: "Asia/Hong_Kong",
                currency: "HKD",
                trading_hours: "09:30-16:00",
            },
            Market::ChinaAShares => MarketConfig {
                name: "China A-Shares",
                timezone: "Asia/Shanghai",
                currency: "CNY",
                trading_hours: "09:30-15:00",
            },
            Market::Crypto => MarketConfig {
                name: "Cryptocurrency",
                timezone: "UTC",
                currency: "USD",
                trading_hours: "24/7",
            },
        }
    }

    pub fn currency(&self) -> &'static str {
        self.config().currency
    }
}

/// Normalize a ticker symbol: uppercase, surrounding whitespace stripped.
pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

/// Periods the provider accepts.
pub const VALID_PERIODS: [&str; 11] = [
    "1d", "5d", "1mo", "3mo", "6mo", "1y", "2y", "5y", "10y", "ytd", "max",
];

/// Intervals the provider accepts.
pub const VALID_INTERVALS: [&str; 13] = [
    "1m", "2m", "5m", "15m", "30m", "60m", "90m", "1h", "1d", "5d", "1wk", "1mo", "3mo",
];

/// Validate a ticker symbol before it is used in a fetch.
pub fn validate_ticker(ticker: &str) -> Result<()> {
    let ticker = ticker.trim();

    if ticker.is_empty() {
        return Err(Error::InvalidParameter("Ticker cannot be empty".to_string()));
    }

    if ticker.len() > 10 {
        return Err(Error::InvalidParameter(
            "Ticker too long (max 10 characters)".to_string(),
        ));
    }

    if !ticker
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return Err(Error::InvalidParameter(
            "Ticker contains invalid characters".to_string(),
        ));
    }

    Ok(())
}

pub fn validate_period(period: &str) -> Result<()> {
    if VALID_PERIODS.contains(&period) {
        Ok(())
    } else {
        Err(Error::InvalidParameter(format!(
            "Invalid period '{}'. Must be one of: {}",
            period,
            VALID_PERIODS.join(", ")
        )))
    }
}

pub fn validate_interval(interval: &str) -> Result<()> {
    if VALID_INTERVALS.contains(&interval) {
        Ok(())
    } else {
        Err(Error::InvalidParameter(format!(
            "Invalid interval '{}'. Must be one of: {}",
            interval,
            VALID_INTERVALS.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_us_default() {
        assert_eq!(Market::detect("AAPL"), Market::Us);
        assert_eq!(Market::detect("msft"), Market::Us);
    }

    #[test]
    fn test_detect_suffixes() {
        assert_eq!(Market::detect("0700.HK"), Market::HongKong);
        assert_eq!(Market::detect("600519.SS"), Market::ChinaAShares);
        assert_eq!(Market::detect("000001.SZ"), Market::ChinaAShares);
        assert_eq!(Market::detect("BTC-USD"), Market::Crypto);
        assert_eq!(Market::detect("eth-btc"), Market::Crypto);
    }

    #[test]
    fn test_currency() {
        assert_eq!(Market::detect("AAPL").currency(), "USD");
        assert_eq!(Market::detect("0700.HK").currency(), "HKD");
        assert_eq!(Market::detect("600519.SS").currency(), "CNY");
    }

    #[test]
    fn test_normalize_ticker() {
        assert_eq!(normalize_ticker("  aapl "), "AAPL");
        assert_eq!(normalize_ticker("0700.hk"), "0700.HK");
    }

    #[test]
    fn test_validate_ticker() {
        assert!(validate_ticker("AAPL").is_ok());
        assert!(validate_ticker("0700.HK").is_ok());
        assert!(validate_ticker("BTC-USD").is_ok());

        assert!(validate_ticker("").is_err());
        assert!(validate_ticker("WAYTOOLONGTICKER").is_err());
        assert!(validate_ticker("AA PL").is_err());
        assert!(validate_ticker("AAPL$").is_err());
    }

    #[test]
    fn test_validate_period_and_interval() {
        assert!(validate_period("1mo").is_ok());
        assert!(validate_period("2y").is_ok());
        assert!(validate_period("7w").is_err());

        assert!(validate_interval("1d").is_ok());
        assert!(validate_interval("1wk").is_ok());
        assert!(validate_interval("42h").is_err());
    }
}
