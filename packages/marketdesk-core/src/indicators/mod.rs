//! Technical indicators for market analysis.
//!
//! Indicators are grouped the way the analyzer reports them:
//!
//! - **Moving averages**: SMA, EMA, and the incremental `RollingSma`
//! - **Momentum**: RSI (Wilder smoothing, plus incremental `WilderRsi`),
//!   stochastic oscillator, ROC, CCI
//! - **Trend**: MACD, ADX
//! - **Volatility**: Bollinger Bands, ATR, rolling standard deviation
//! - **Volume**: OBV, VWAP, volume ratio
//!
//! Batch functions return a vector aligned with the input series, with
//! neutral fill values before the warm-up window is complete. The
//! incremental types return `None` until their window fills, and are what
//! the backtest engine feeds bar by bar.

mod momentum;
mod moving_averages;
mod trend;
mod volatility;
mod volume;

pub use momentum::{cci, roc, rsi, stochastic, Stochastic, WilderRsi};
pub use moving_averages::{ema, sma, RollingSma};
pub use trend::{adx, macd, Macd};
pub use volatility::{atr, bollinger_bands, rolling_std, BollingerBands};
pub use volume::{obv, volume_ratio, vwap};
