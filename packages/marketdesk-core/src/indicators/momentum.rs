//! Momentum indicators: RSI, stochastic oscillator, ROC, CCI.

use crate::indicators::sma;
use crate::types::Bar;

/// RSI value from average gain and average loss.
/// Edge cases: no losses (RSI=100), no gains (RSI=0), no change (RSI=50).
#[inline]
fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss <= 0.0 {
        if avg_gain <= 0.0 {
            50.0
        } else {
            100.0
        }
    } else if avg_gain <= 0.0 {
        0.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - (100.0 / (1.0 + rs))
    }
}

/// Calculate Relative Strength Index with Wilder smoothing.
///
/// 1. Split price changes into gains and losses
/// 2. Seed the averages with an SMA over the first `period` changes
/// 3. Smooth subsequent averages with `avg = alpha * x + (1-alpha) * avg`,
///    `alpha = 1/period`
/// 4. `RSI = 100 - 100 / (1 + avg_gain/avg_loss)`
///
/// # Arguments
///
/// * `prices` - Price series (typically closing prices)
/// * `period` - Lookback period (typically 14)
///
/// # Returns
///
/// Vector of RSI values (0-100). Values before the warm-up default to the
/// neutral 50. Below 30 reads as oversold, above 70 as overbought.
pub fn rsi(prices: &[f64], period: usize) -> Vec<f64> {
    let n = prices.len();
    let mut result = vec![50.0; n];

    if n < 2 || period == 0 || n <= period {
        return result;
    }

    let mut gains = vec![0.0; n];
    let mut losses = vec![0.0; n];
    for i in 1..n {
        let change = prices[i] - prices[i - 1];
        if change > 0.0 {
            gains[i] = change;
        } else {
            losses[i] = -change;
        }
    }

    let mut avg_gain: f64 = gains[1..=period].iter().sum::<f64>() / period as f64;
    let mut avg_loss: f64 = losses[1..=period].iter().sum::<f64>() / period as f64;
    result[period] = rsi_value(avg_gain, avg_loss);

    let alpha = 1.0 / period as f64;
    for i in (period + 1)..n {
        avg_gain = alpha * gains[i] + (1.0 - alpha) * avg_gain;
        avg_loss = alpha * losses[i] + (1.0 - alpha) * avg_loss;
        result[i] = rsi_value(avg_gain, avg_loss);
    }

    result
}

/// Incrementally maintained Wilder RSI.
///
/// Feed one close per bar; `push` returns the RSI once `period + 1` closes
/// have been seen. The seed average over the first `period` changes and the
/// smoothing update match the batch [`rsi`] exactly.
#[derive(Debug, Clone)]
pub struct WilderRsi {
    period: usize,
    prev_close: Option<f64>,
    changes_seen: usize,
    avg_gain: f64,
    avg_loss: f64,
}

impl WilderRsi {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            prev_close: None,
            changes_seen: 0,
            avg_gain: 0.0,
            avg_loss: 0.0,
        }
    }

    /// Push the next close; returns the RSI once the warm-up completes.
    pub fn push(&mut self, close: f64) -> Option<f64> {
        let prev = match self.prev_close.replace(close) {
            Some(prev) => prev,
            None => return None,
        };

        let change = close - prev;
        let (gain, loss) = if change > 0.0 {
            (change, 0.0)
        } else {
            (0.0, -change)
        };

        self.changes_seen += 1;
        let period = self.period as f64;

        if self.changes_seen <= self.period {
            // Accumulating the SMA seed
            self.avg_gain += gain / period;
            self.avg_loss += loss / period;
            if self.changes_seen < self.period {
                return None;
            }
        } else {
            let alpha = 1.0 / period;
            self.avg_gain = alpha * gain + (1.0 - alpha) * self.avg_gain;
            self.avg_loss = alpha * loss + (1.0 - alpha) * self.avg_loss;
        }

        Some(rsi_value(self.avg_gain, self.avg_loss))
    }
}

/// Stochastic oscillator output.
#[derive(Debug, Clone)]
pub struct Stochastic {
    /// Smoothed %K line
    pub k: Vec<f64>,
    /// %D line (SMA of %K)
    pub d: Vec<f64>,
}

/// Calculate the stochastic oscillator.
///
/// Raw %K compares the close with the high/low range over `k_period`
/// bars; %K is its `smooth_k`-bar SMA and %D the `d_period`-bar SMA of
/// %K. Typical parameters are 14/3/3. Warm-up values default to the
/// neutral 50.
pub fn stochastic(bars: &[Bar], k_period: usize, smooth_k: usize, d_period: usize) -> Stochastic {
    let n = bars.len();
    let mut raw = vec![50.0; n];

    if k_period == 0 || n < k_period {
        return Stochastic {
            k: raw.clone(),
            d: raw,
        };
    }

    for i in (k_period - 1)..n {
        let window = &bars[i + 1 - k_period..=i];
        let low = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        let high = window
            .iter()
            .map(|b| b.high)
            .fold(f64::NEG_INFINITY, f64::max);

        let range = high - low;
        raw[i] = if range > 0.0 {
            (bars[i].close - low) / range * 100.0
        } else {
            50.0
        };
    }

    let k = smooth_series(&raw, smooth_k, k_period - 1);
    let d = smooth_series(&k, d_period, k_period - 1);

    Stochastic { k, d }
}

/// SMA over `series` starting at `valid_from`, with earlier values left as
/// they are so warm-up stays neutral.
fn smooth_series(series: &[f64], period: usize, valid_from: usize) -> Vec<f64> {
    let n = series.len();
    let mut result = series.to_vec();

    if period <= 1 {
        return result;
    }

    for i in valid_from..n {
        let start = i.saturating_sub(period - 1).max(valid_from);
        let window = &series[start..=i];
        result[i] = window.iter().sum::<f64>() / window.len() as f64;
    }

    result
}

/// Rate of change over `period` bars, as a percentage.
pub fn roc(data: &[f64], period: usize) -> Vec<f64> {
    let n = data.len();
    let mut result = vec![0.0; n];

    if period == 0 {
        return result;
    }

    for i in period..n {
        if data[i - period] != 0.0 {
            result[i] = (data[i] - data[i - period]) / data[i - period] * 100.0;
        }
    }

    result
}

/// Commodity Channel Index over `period` bars.
///
/// `CCI = (TP - SMA(TP)) / (0.015 * mean deviation)` with the typical
/// price `(high + low + close) / 3`.
pub fn cci(bars: &[Bar], period: usize) -> Vec<f64> {
    let n = bars.len();
    let mut result = vec![0.0; n];

    if period == 0 || n < period {
        return result;
    }

    let typical: Vec<f64> = bars.iter().map(|b| b.typical_price()).collect();
    let means = sma(&typical, period);

    for i in (period - 1)..n {
        let window = &typical[i + 1 - period..=i];
        let mean = means[i];
        let mean_dev = window.iter().map(|tp| (tp - mean).abs()).sum::<f64>() / period as f64;

        if mean_dev > 0.0 {
            result[i] = (typical[i] - mean) / (0.015 * mean_dev);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::test_support::daily_bars;

    #[test]
    fn test_rsi_trending() {
        let up: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let rsi_up = rsi(&up, 14);
        assert!(rsi_up[19] > 70.0);

        let down: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        let rsi_down = rsi(&down, 14);
        assert!(rsi_down[19] < 30.0);
    }

    #[test]
    fn test_rsi_range() {
        let prices: Vec<f64> = (0..50)
            .map(|i| 100.0 + (i as f64 * 0.5).sin() * 10.0)
            .collect();
        for value in rsi(&prices, 14) {
            assert!((0.0..=100.0).contains(&value));
        }
    }

    #[test]
    fn test_rsi_short_data_stays_neutral() {
        let prices = vec![100.0, 101.0, 102.0];
        assert!(rsi(&prices, 14).iter().all(|&v| v == 50.0));
    }

    #[test]
    fn test_wilder_rsi_matches_batch() {
        let prices: Vec<f64> = (0..40)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 8.0)
            .collect();
        let batch = rsi(&prices, 14);

        let mut incremental = WilderRsi::new(14);
        for (i, &price) in prices.iter().enumerate() {
            match incremental.push(price) {
                Some(value) => assert!((value - batch[i]).abs() < 1e-9, "bar {}", i),
                None => assert!(i < 14),
            }
        }
    }

    #[test]
    fn test_stochastic_range_and_extremes() {
        let mut bars = daily_bars(&(0..30).map(|i| 100.0 + i as f64).collect::<Vec<_>>());
        for bar in &mut bars {
            bar.high = bar.close + 1.0;
            bar.low = bar.close - 1.0;
        }

        let stoch = stochastic(&bars, 14, 3, 3);
        for (&k, &d) in stoch.k.iter().zip(&stoch.d) {
            assert!((0.0..=100.0).contains(&k));
            assert!((0.0..=100.0).contains(&d));
        }
        // Steady uptrend closes near the top of the range
        assert!(stoch.k[29] > 80.0);
    }

    #[test]
    fn test_roc() {
        let data = vec![100.0, 105.0, 110.0, 108.0, 112.0];
        let result = roc(&data, 2);
        // (110 - 100) / 100 = 10%
        assert!((result[2] - 10.0).abs() < 0.001);
    }

    #[test]
    fn test_cci_sign() {
        // Flat series then a spike: CCI turns strongly positive
        let mut closes = vec![100.0; 25];
        closes.push(110.0);
        let bars = daily_bars(&closes);

        let result = cci(&bars, 20);
        assert!(result[25] > 100.0);
        // Flat stretch has zero deviation, stays at the 0 fill
        assert_eq!(result[20], 0.0);
    }
}
