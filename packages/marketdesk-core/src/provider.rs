//! Quote provider and the cache-backed data fetcher.
//!
//! `QuoteProvider` is the seam between the fetch pipeline and the outside
//! world; `YahooChartClient` is the production implementation against the
//! v8 chart API. Provider failures are never retried automatically — the
//! mitigation for a transient failure is re-invoking with the cache
//! bypassed.

use chrono::{TimeZone, Utc};
use serde::Deserialize;

use crate::cache::{CacheKey, DataCache};
use crate::market::{self, Market};
use crate::types::{Bar, FetchMetadata, PriceSummary, StockData};
use crate::{Error, Result};

/// Raw history payload returned by a provider.
#[derive(Debug, Clone)]
pub struct ProviderSnapshot {
    /// OHLCV bars ordered by timestamp ascending
    pub bars: Vec<Bar>,
    /// Live regular-market price, when the provider reports one
    pub current_price: Option<f64>,
}

/// Upstream source of OHLCV history.
pub trait QuoteProvider {
    /// Short identifier recorded in fetch metadata.
    fn name(&self) -> &'static str;

    /// Fetch price history for a ticker over the given period/interval.
    fn fetch_history(&self, ticker: &str, period: &str, interval: &str)
        -> Result<ProviderSnapshot>;
}

const YAHOO_CHART_BASE: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Chart API response structures.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

/// Blocking client for the public chart API.
pub struct YahooChartClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooChartClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            base_url: YAHOO_CHART_BASE.to_string(),
        }
    }

    /// Client against a different endpoint, for self-hosted mirrors.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl Default for YahooChartClient {
    fn default() -> Self {
        Self::new()
    }
}

impl QuoteProvider for YahooChartClient {
    fn name(&self) -> &'static str {
        "yahoo_chart"
    }

    fn fetch_history(
        &self,
        ticker: &str,
        period: &str,
        interval: &str,
    ) -> Result<ProviderSnapshot> {
        let url = format!(
            "{}/{}?range={}&interval={}",
            self.base_url, ticker, period, interval
        );
        log::debug!("fetching {}", url);

        let response: ChartResponse = self
            .client
            .get(&url)
            .header("User-Agent", "Mozilla/5.0")
            .send()?
            .error_for_status()?
            .json()?;

        if let Some(error) = response.chart.error {
            return Err(Error::Provider(format!(
                "{}: {}",
                error.code, error.description
            )));
        }

        let result = response
            .chart
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| Error::Provider(format!("No data returned for {}", ticker)))?;

        let timestamps = result.timestamp.unwrap_or_default();
        let quote = result
            .indicators
            .quote
            .into_iter()
            .next()
            .unwrap_or_default();

        let mut bars = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            // Rows without a close are market holidays or pre-listing gaps
            let close = match quote.close.get(i).copied().flatten() {
                Some(close) => close,
                None => continue,
            };
            let timestamp = match Utc.timestamp_opt(ts, 0).single() {
                Some(timestamp) => timestamp,
                None => continue,
            };

            bars.push(Bar {
                timestamp,
                open: quote.open.get(i).copied().flatten().unwrap_or(close),
                high: quote.high.get(i).copied().flatten().unwrap_or(close),
                low: quote.low.get(i).copied().flatten().unwrap_or(close),
                close,
                volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
            });
        }

        if bars.is_empty() {
            return Err(Error::Provider(format!("No data returned for {}", ticker)));
        }

        Ok(ProviderSnapshot {
            bars,
            current_price: result.meta.regular_market_price,
        })
    }
}

/// Cache-first fetcher combining a provider with the TTL file cache.
pub struct DataFetcher<P = YahooChartClient> {
    provider: P,
    cache: DataCache,
}

impl<P: QuoteProvider> DataFetcher<P> {
    pub fn new(provider: P, cache: DataCache) -> Self {
        Self { provider, cache }
    }

    /// Fetch history for `ticker`, consulting the cache first.
    ///
    /// On a fresh cache hit the payload comes back with `cached: true` in
    /// its metadata. `bypass_cache` skips the read but the fresh result
    /// still overwrites the cache entry. Input is validated before
    /// anything touches the disk or the network.
    pub fn fetch(
        &self,
        ticker: &str,
        period: &str,
        interval: &str,
        bypass_cache: bool,
    ) -> Result<StockData> {
        market::validate_ticker(ticker)?;
        market::validate_period(period)?;
        market::validate_interval(interval)?;

        let ticker = market::normalize_ticker(ticker);
        let key = CacheKey::new(&ticker, period, interval);

        if !bypass_cache {
            if let Some(mut data) = self.cache.get::<StockData>(&key) {
                data.metadata.cached = true;
                return Ok(data);
            }
        }

        let snapshot = self.provider.fetch_history(&ticker, period, interval)?;

        let detected = Market::detect(&ticker);
        let data = StockData {
            metadata: FetchMetadata {
                ticker: ticker.clone(),
                market: detected,
                currency: detected.currency().to_string(),
                period: period.to_string(),
                interval: interval.to_string(),
                fetched_at: Utc::now(),
                cached: false,
                source: self.provider.name().to_string(),
            },
            price: PriceSummary::from_bars(&snapshot.bars, snapshot.current_price),
            bars: snapshot.bars,
        };

        // A failed cache write should not fail the fetch
        if let Err(err) = self.cache.put(&key, &data) {
            log::warn!("cache write failed for {}: {}", ticker, err);
        }

        Ok(data)
    }
}
