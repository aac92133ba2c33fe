//! Trend indicators: MACD and ADX.

use crate::indicators::ema;
use crate::types::Bar;

/// MACD (Moving Average Convergence Divergence) result.
#[derive(Debug, Clone)]
pub struct Macd {
    /// MACD line (fast EMA - slow EMA)
    pub macd_line: Vec<f64>,
    /// Signal line (EMA of MACD line)
    pub signal_line: Vec<f64>,
    /// Histogram (MACD - Signal)
    pub histogram: Vec<f64>,
}

/// Calculate MACD.
///
/// # Arguments
///
/// * `data` - Price series
/// * `fast_period` - Fast EMA period (typically 12)
/// * `slow_period` - Slow EMA period (typically 26)
/// * `signal_period` - Signal line EMA period (typically 9)
pub fn macd(data: &[f64], fast_period: usize, slow_period: usize, signal_period: usize) -> Macd {
    let fast_ema = ema(data, fast_period);
    let slow_ema = ema(data, slow_period);

    let n = data.len();
    let mut macd_line = vec![0.0; n];
    for i in 0..n {
        macd_line[i] = fast_ema[i] - slow_ema[i];
    }

    let signal_line = ema(&macd_line, signal_period);

    let mut histogram = vec![0.0; n];
    for i in 0..n {
        histogram[i] = macd_line[i] - signal_line[i];
    }

    Macd {
        macd_line,
        signal_line,
        histogram,
    }
}

/// Calculate the Average Directional Index.
///
/// Wilder's construction: smoothed true range and directional movement
/// give +DI/-DI, their normalized spread is DX, and ADX is the Wilder
/// average of DX. Values are 0.0 until the `2 * period` warm-up is over.
///
/// Readings above 25 conventionally indicate a trending market.
pub fn adx(bars: &[Bar], period: usize) -> Vec<f64> {
    let n = bars.len();
    let mut result = vec![0.0; n];

    if period == 0 || n <= 2 * period {
        return result;
    }

    // True range and directional movement, defined from the second bar
    let mut tr = vec![0.0; n];
    let mut plus_dm = vec![0.0; n];
    let mut minus_dm = vec![0.0; n];

    for i in 1..n {
        let high = bars[i].high;
        let low = bars[i].low;
        let prev_close = bars[i - 1].close;

        tr[i] = (high - low)
            .max((high - prev_close).abs())
            .max((low - prev_close).abs());

        let up_move = high - bars[i - 1].high;
        let down_move = bars[i - 1].low - low;

        if up_move > down_move && up_move > 0.0 {
            plus_dm[i] = up_move;
        }
        if down_move > up_move && down_move > 0.0 {
            minus_dm[i] = down_move;
        }
    }

    // Wilder-smoothed sums, seeded over the first `period` bars
    let mut tr_smooth: f64 = tr[1..=period].iter().sum();
    let mut plus_smooth: f64 = plus_dm[1..=period].iter().sum();
    let mut minus_smooth: f64 = minus_dm[1..=period].iter().sum();

    let mut dx = vec![0.0; n];
    dx[period] = dx_value(plus_smooth, minus_smooth, tr_smooth);

    for i in (period + 1)..n {
        tr_smooth = tr_smooth - tr_smooth / period as f64 + tr[i];
        plus_smooth = plus_smooth - plus_smooth / period as f64 + plus_dm[i];
        minus_smooth = minus_smooth - minus_smooth / period as f64 + minus_dm[i];
        dx[i] = dx_value(plus_smooth, minus_smooth, tr_smooth);
    }

    // ADX: seed with the average DX, then Wilder-update
    let mut adx_value: f64 = dx[period..2 * period].iter().sum::<f64>() / period as f64;
    result[2 * period - 1] = adx_value;

    for i in (2 * period)..n {
        adx_value = (adx_value * (period as f64 - 1.0) + dx[i]) / period as f64;
        result[i] = adx_value;
    }

    result
}

#[inline]
fn dx_value(plus_smooth: f64, minus_smooth: f64, tr_smooth: f64) -> f64 {
    if tr_smooth <= 0.0 {
        return 0.0;
    }
    let plus_di = 100.0 * plus_smooth / tr_smooth;
    let minus_di = 100.0 * minus_smooth / tr_smooth;
    let sum = plus_di + minus_di;
    if sum <= 0.0 {
        0.0
    } else {
        100.0 * (plus_di - minus_di).abs() / sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::test_support::daily_bars;

    #[test]
    fn test_macd() {
        let data: Vec<f64> = (0..50).map(|i| 100.0 + (i as f64).sin() * 5.0).collect();
        let result = macd(&data, 12, 26, 9);

        assert_eq!(result.macd_line.len(), 50);
        assert_eq!(result.signal_line.len(), 50);
        assert_eq!(result.histogram.len(), 50);
    }

    #[test]
    fn test_macd_positive_in_uptrend() {
        let data: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let result = macd(&data, 12, 26, 9);
        // Fast EMA leads the slow one when prices keep rising
        assert!(result.macd_line[59] > 0.0);
    }

    #[test]
    fn test_adx_trending_market() {
        let mut bars = daily_bars(&(0..60).map(|i| 100.0 + i as f64 * 2.0).collect::<Vec<_>>());
        for bar in &mut bars {
            bar.high = bar.close + 1.0;
            bar.low = bar.close - 1.0;
        }

        let result = adx(&bars, 14);
        assert_eq!(result[26], 0.0);
        // Strong one-way trend reads as trending
        assert!(result[59] > 25.0);
        assert!(result[59] <= 100.0);
    }

    #[test]
    fn test_adx_short_series_stays_zero() {
        let bars = daily_bars(&(0..20).map(|i| 100.0 + i as f64).collect::<Vec<_>>());
        assert!(adx(&bars, 14).iter().all(|&v| v == 0.0));
    }
}
