//! Indicator snapshots and trading-signal generation.
//!
//! `TechnicalSummary` condenses the full indicator set down to the latest
//! value of each, with `None` wherever the history is too short — the
//! shape the analyze command reports. `generate_signals` turns a summary
//! into per-indicator signals and an overall recommendation.

use serde::{Deserialize, Serialize};

use crate::indicators::{
    adx, atr, bollinger_bands, cci, ema, macd, obv, roc, rolling_std, rsi, sma, stochastic,
    volume_ratio, vwap,
};
use crate::types::Bar;

/// Latest MACD values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MacdSummary {
    pub macd: Option<f64>,
    pub signal: Option<f64>,
    pub histogram: Option<f64>,
}

/// Snapshot of every indicator at the last bar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnicalSummary {
    // Trend
    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub sma_200: Option<f64>,
    pub ema_12: Option<f64>,
    pub ema_26: Option<f64>,
    pub macd: MacdSummary,
    pub adx: Option<f64>,
    // Momentum
    pub rsi_14: Option<f64>,
    pub stoch_k: Option<f64>,
    pub stoch_d: Option<f64>,
    pub cci: Option<f64>,
    pub roc: Option<f64>,
    // Volatility
    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
    pub bb_bandwidth: Option<f64>,
    pub atr: Option<f64>,
    pub stdev: Option<f64>,
    // Volume
    pub obv: Option<i64>,
    pub vwap: Option<f64>,
}

fn last_if(available: bool, values: &[f64]) -> Option<f64> {
    if available {
        values.last().copied()
    } else {
        None
    }
}

impl TechnicalSummary {
    /// Compute the snapshot from a bar history.
    pub fn from_bars(bars: &[Bar]) -> Self {
        let n = bars.len();
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

        let macd_summary = if n >= 26 {
            let result = macd(&closes, 12, 26, 9);
            MacdSummary {
                macd: result.macd_line.last().copied(),
                signal: result.signal_line.last().copied(),
                histogram: result.histogram.last().copied(),
            }
        } else {
            MacdSummary::default()
        };

        let (stoch_k, stoch_d) = if n >= 14 {
            let stoch = stochastic(bars, 14, 3, 3);
            (stoch.k.last().copied(), stoch.d.last().copied())
        } else {
            (None, None)
        };

        let (bb_upper, bb_middle, bb_lower, bb_bandwidth) = if n >= 20 {
            let bb = bollinger_bands(&closes, 20, 2.0);
            let upper = bb.upper.last().copied();
            let middle = bb.middle.last().copied();
            let lower = bb.lower.last().copied();
            let bandwidth = match (upper, middle, lower) {
                (Some(u), Some(m), Some(l)) if m != 0.0 => Some((u - l) / m * 100.0),
                _ => None,
            };
            (upper, middle, lower, bandwidth)
        } else {
            (None, None, None, None)
        };

        Self {
            sma_20: last_if(n >= 20, &sma(&closes, 20)),
            sma_50: last_if(n >= 50, &sma(&closes, 50)),
            sma_200: last_if(n >= 200, &sma(&closes, 200)),
            ema_12: last_if(n >= 12, &ema(&closes, 12)),
            ema_26: last_if(n >= 26, &ema(&closes, 26)),
            macd: macd_summary,
            adx: last_if(n > 28, &adx(bars, 14)),
            rsi_14: last_if(n > 14, &rsi(&closes, 14)),
            stoch_k,
            stoch_d,
            cci: last_if(n >= 20, &cci(bars, 20)),
            roc: last_if(n > 12, &roc(&closes, 12)),
            bb_upper,
            bb_middle,
            bb_lower,
            bb_bandwidth,
            atr: last_if(n > 14, &atr(bars, 14)),
            stdev: last_if(n >= 20, &rolling_std(&closes, 20)),
            obv: if n > 0 { obv(bars).last().copied() } else { None },
            vwap: last_if(n > 0, &vwap(bars)).filter(|&v| v > 0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MomentumSignal {
    Overbought,
    Oversold,
    Neutral,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MacdSignal {
    Bullish,
    Bearish,
    Neutral,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BollingerSignal {
    Overbought,
    Oversold,
    Normal,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendSignal {
    StrongUptrend,
    Uptrend,
    Downtrend,
    StrongDowntrend,
    Sideways,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeSignal {
    High,
    Low,
    Normal,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

/// Per-indicator signals plus the overall recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalReport {
    pub rsi: MomentumSignal,
    pub macd: MacdSignal,
    pub bollinger: BollingerSignal,
    pub trend: TrendSignal,
    pub stochastic: MomentumSignal,
    pub volume: VolumeSignal,
    pub recommendation: Recommendation,
}

/// Generate trading signals from an indicator summary.
pub fn generate_signals(summary: &TechnicalSummary, bars: &[Bar]) -> SignalReport {
    let price = bars.last().map(|b| b.close);

    let rsi = rsi_signal(summary.rsi_14);
    let macd = macd_signal(&summary.macd);
    let bollinger = bollinger_signal(price, summary.bb_upper, summary.bb_lower);
    let trend = trend_signal(price, summary.sma_50, summary.sma_200);
    let stochastic = stochastic_signal(summary.stoch_k, summary.stoch_d);
    let volume = volume_signal(bars);

    let recommendation = overall_recommendation(rsi, macd, bollinger, trend, stochastic);

    SignalReport {
        rsi,
        macd,
        bollinger,
        trend,
        stochastic,
        volume,
        recommendation,
    }
}

fn rsi_signal(rsi: Option<f64>) -> MomentumSignal {
    match rsi {
        None => MomentumSignal::Unknown,
        Some(value) if value >= 70.0 => MomentumSignal::Overbought,
        Some(value) if value <= 30.0 => MomentumSignal::Oversold,
        Some(_) => MomentumSignal::Neutral,
    }
}

fn macd_signal(macd: &MacdSummary) -> MacdSignal {
    match macd.histogram {
        None => MacdSignal::Unknown,
        Some(histogram) if histogram > 0.0 => MacdSignal::Bullish,
        Some(histogram) if histogram < 0.0 => MacdSignal::Bearish,
        Some(_) => MacdSignal::Neutral,
    }
}

fn bollinger_signal(price: Option<f64>, upper: Option<f64>, lower: Option<f64>) -> BollingerSignal {
    match (price, upper, lower) {
        (Some(price), Some(upper), Some(lower)) => {
            if price >= upper {
                BollingerSignal::Overbought
            } else if price <= lower {
                BollingerSignal::Oversold
            } else {
                BollingerSignal::Normal
            }
        }
        _ => BollingerSignal::Unknown,
    }
}

fn trend_signal(price: Option<f64>, sma_50: Option<f64>, sma_200: Option<f64>) -> TrendSignal {
    let price = match price {
        Some(price) => price,
        None => return TrendSignal::Unknown,
    };

    // Golden/death cross reading when both long averages are available
    if let (Some(sma_50), Some(sma_200)) = (sma_50, sma_200) {
        if price > sma_50 && sma_50 > sma_200 {
            return TrendSignal::StrongUptrend;
        }
        if price < sma_50 && sma_50 < sma_200 {
            return TrendSignal::StrongDowntrend;
        }
    }

    match sma_50 {
        Some(sma_50) if price > sma_50 => TrendSignal::Uptrend,
        Some(sma_50) if price < sma_50 => TrendSignal::Downtrend,
        _ => TrendSignal::Sideways,
    }
}

fn stochastic_signal(k: Option<f64>, d: Option<f64>) -> MomentumSignal {
    match (k, d) {
        (Some(k), Some(d)) => {
            if k >= 80.0 && d >= 80.0 {
                MomentumSignal::Overbought
            } else if k <= 20.0 && d <= 20.0 {
                MomentumSignal::Oversold
            } else {
                MomentumSignal::Neutral
            }
        }
        _ => MomentumSignal::Unknown,
    }
}

fn volume_signal(bars: &[Bar]) -> VolumeSignal {
    match volume_ratio(bars, 20) {
        None => VolumeSignal::Unknown,
        Some(ratio) if ratio > 1.5 => VolumeSignal::High,
        Some(ratio) if ratio < 0.5 => VolumeSignal::Low,
        Some(_) => VolumeSignal::Normal,
    }
}

fn overall_recommendation(
    rsi: MomentumSignal,
    macd: MacdSignal,
    bollinger: BollingerSignal,
    trend: TrendSignal,
    stochastic: MomentumSignal,
) -> Recommendation {
    let mut bullish = 0u32;
    let mut bearish = 0u32;

    match rsi {
        MomentumSignal::Oversold => bullish += 1,
        MomentumSignal::Overbought => bearish += 1,
        _ => {}
    }

    match macd {
        MacdSignal::Bullish => bullish += 1,
        MacdSignal::Bearish => bearish += 1,
        _ => {}
    }

    match bollinger {
        BollingerSignal::Oversold => bullish += 1,
        BollingerSignal::Overbought => bearish += 1,
        _ => {}
    }

    // Trend counts double
    match trend {
        TrendSignal::StrongUptrend | TrendSignal::Uptrend => bullish += 2,
        TrendSignal::StrongDowntrend | TrendSignal::Downtrend => bearish += 2,
        _ => {}
    }

    match stochastic {
        MomentumSignal::Oversold => bullish += 1,
        MomentumSignal::Overbought => bearish += 1,
        _ => {}
    }

    let total = bullish + bearish;
    if total == 0 {
        return Recommendation::Hold;
    }

    let bullish_ratio = bullish as f64 / total as f64;
    if bullish_ratio >= 0.75 {
        Recommendation::StrongBuy
    } else if bullish_ratio >= 0.6 {
        Recommendation::Buy
    } else if bullish_ratio <= 0.25 {
        Recommendation::StrongSell
    } else if bullish_ratio <= 0.4 {
        Recommendation::Sell
    } else {
        Recommendation::Hold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::test_support::daily_bars;

    #[test]
    fn test_summary_short_history_is_sparse() {
        let bars = daily_bars(&(0..10).map(|i| 100.0 + i as f64).collect::<Vec<_>>());
        let summary = TechnicalSummary::from_bars(&bars);

        assert!(summary.sma_20.is_none());
        assert!(summary.sma_200.is_none());
        assert!(summary.rsi_14.is_none());
        assert!(summary.macd.macd.is_none());
        assert!(summary.adx.is_none());
        assert!(summary.obv.is_some());
    }

    #[test]
    fn test_summary_long_history_is_complete() {
        let bars = daily_bars(
            &(0..250)
                .map(|i| 100.0 + (i as f64 * 0.1).sin() * 5.0 + i as f64 * 0.05)
                .collect::<Vec<_>>(),
        );
        let summary = TechnicalSummary::from_bars(&bars);

        assert!(summary.sma_20.is_some());
        assert!(summary.sma_50.is_some());
        assert!(summary.sma_200.is_some());
        assert!(summary.ema_12.is_some());
        assert!(summary.macd.histogram.is_some());
        assert!(summary.adx.is_some());
        assert!(summary.rsi_14.is_some());
        assert!(summary.stoch_k.is_some());
        assert!(summary.bb_upper.is_some());
        assert!(summary.atr.is_some());
        assert!(summary.vwap.is_some());
    }

    #[test]
    fn test_rsi_signal_thresholds() {
        assert_eq!(rsi_signal(Some(75.0)), MomentumSignal::Overbought);
        assert_eq!(rsi_signal(Some(25.0)), MomentumSignal::Oversold);
        assert_eq!(rsi_signal(Some(50.0)), MomentumSignal::Neutral);
        assert_eq!(rsi_signal(None), MomentumSignal::Unknown);
    }

    #[test]
    fn test_trend_signal_strong_uptrend() {
        assert_eq!(
            trend_signal(Some(110.0), Some(105.0), Some(100.0)),
            TrendSignal::StrongUptrend
        );
        assert_eq!(
            trend_signal(Some(90.0), Some(95.0), Some(100.0)),
            TrendSignal::StrongDowntrend
        );
        assert_eq!(
            trend_signal(Some(110.0), Some(105.0), None),
            TrendSignal::Uptrend
        );
        assert_eq!(trend_signal(None, None, None), TrendSignal::Unknown);
    }

    #[test]
    fn test_recommendation_all_bullish() {
        let rec = overall_recommendation(
            MomentumSignal::Oversold,
            MacdSignal::Bullish,
            BollingerSignal::Oversold,
            TrendSignal::Uptrend,
            MomentumSignal::Oversold,
        );
        assert_eq!(rec, Recommendation::StrongBuy);
    }

    #[test]
    fn test_recommendation_all_bearish() {
        let rec = overall_recommendation(
            MomentumSignal::Overbought,
            MacdSignal::Bearish,
            BollingerSignal::Overbought,
            TrendSignal::StrongDowntrend,
            MomentumSignal::Overbought,
        );
        assert_eq!(rec, Recommendation::StrongSell);
    }

    #[test]
    fn test_recommendation_no_signals_holds() {
        let rec = overall_recommendation(
            MomentumSignal::Neutral,
            MacdSignal::Neutral,
            BollingerSignal::Normal,
            TrendSignal::Sideways,
            MomentumSignal::Neutral,
        );
        assert_eq!(rec, Recommendation::Hold);
    }

    #[test]
    fn test_generate_signals_uptrend() {
        let bars = daily_bars(&(0..250).map(|i| 100.0 + i as f64 * 0.5).collect::<Vec<_>>());
        let summary = TechnicalSummary::from_bars(&bars);
        let report = generate_signals(&summary, &bars);

        assert_eq!(report.trend, TrendSignal::StrongUptrend);
        assert!(matches!(
            report.recommendation,
            Recommendation::Buy | Recommendation::StrongBuy | Recommendation::Hold
        ));
    }

    #[test]
    fn test_signal_serialization_vocabulary() {
        let json = serde_json::to_string(&TrendSignal::StrongUptrend).unwrap();
        assert_eq!(json, "\"strong_uptrend\"");
        let json = serde_json::to_string(&Recommendation::StrongBuy).unwrap();
        assert_eq!(json, "\"strong_buy\"");
    }
}
