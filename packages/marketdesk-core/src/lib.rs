//! Marketdesk Core - Market data and analysis library.
//!
//! This crate provides the core functionality behind the Marketdesk agent
//! skills:
//!
//! - **Data fetching**: OHLCV history from the quote provider, behind a
//!   TTL file cache
//! - **Technical indicators**: SMA, EMA, RSI, MACD, ADX, Bollinger Bands
//!   and friends, plus trading-signal generation
//! - **Backtesting**: bar-by-bar simulation of SMA-crossover and
//!   RSI-reversal rules with performance metrics
//! - **Portfolio tracking**: position management with cost averaging and
//!   a rule-based portfolio advisor
//!
//! # Example
//!
//! ```rust,no_run
//! use marketdesk_core::backtest::{run, StrategyRule};
//! use marketdesk_core::provider::{DataFetcher, YahooChartClient};
//! use marketdesk_core::cache::DataCache;
//!
//! let fetcher = DataFetcher::new(YahooChartClient::new(), DataCache::with_defaults());
//! let data = fetcher.fetch("AAPL", "2y", "1d", false).unwrap();
//!
//! let rule = StrategyRule::sma_crossover(50, 200);
//! let report = run(&data.bars, &rule, 10_000.0, "1d").unwrap();
//! println!("total return: {:.2}%", report.metrics.total_return_pct);
//! ```

pub mod analysis;
pub mod backtest;
pub mod cache;
pub mod indicators;
pub mod market;
pub mod portfolio;
pub mod provider;
pub mod types;

// Re-export commonly used types
pub use types::{ApiResponse, Bar, FetchMetadata, PriceSummary, StockData};

// Re-export main functionality
pub use analysis::{generate_signals, Recommendation, SignalReport, TechnicalSummary};
pub use backtest::{
    get_strategy, list_strategies, run, BacktestReport, StrategyRule, BUILTIN_STRATEGIES,
};
pub use cache::{CacheKey, DataCache};
pub use market::Market;
pub use portfolio::{PortfolioPerformance, PortfolioTracker};
pub use provider::{DataFetcher, QuoteProvider, YahooChartClient};

/// Error types for marketdesk-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Position not found: {0}")]
    PositionNotFound(String),

    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Provider(err.to_string())
    }
}

/// Result type for marketdesk-core operations.
pub type Result<T> = std::result::Result<T, Error>;
