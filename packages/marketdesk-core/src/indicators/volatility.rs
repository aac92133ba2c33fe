//! Volatility indicators: Bollinger Bands, ATR, rolling standard deviation.

use crate::indicators::sma;
use crate::types::Bar;

/// Bollinger Bands result.
#[derive(Debug, Clone)]
pub struct BollingerBands {
    /// Middle band (SMA)
    pub middle: Vec<f64>,
    /// Upper band (middle + num_std * std)
    pub upper: Vec<f64>,
    /// Lower band (middle - num_std * std)
    pub lower: Vec<f64>,
}

/// Calculate Bollinger Bands over an inclusive window ending at each bar.
///
/// # Arguments
///
/// * `data` - Price series
/// * `period` - Lookback period (typically 20)
/// * `num_std` - Number of standard deviations (typically 2.0)
pub fn bollinger_bands(data: &[f64], period: usize, num_std: f64) -> BollingerBands {
    let n = data.len();
    let mut middle = vec![0.0; n];
    let mut upper = vec![0.0; n];
    let mut lower = vec![0.0; n];

    if period == 0 || n < period {
        return BollingerBands {
            middle,
            upper,
            lower,
        };
    }

    for i in (period - 1)..n {
        let window = &data[i + 1 - period..=i];
        let mean: f64 = window.iter().sum::<f64>() / period as f64;
        let variance: f64 =
            window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / period as f64;
        let std = variance.sqrt();

        middle[i] = mean;
        upper[i] = mean + num_std * std;
        lower[i] = mean - num_std * std;
    }

    BollingerBands {
        middle,
        upper,
        lower,
    }
}

/// Calculate the Average True Range with Wilder smoothing.
///
/// True range spans the bar itself and any gap from the previous close.
/// Values are 0.0 until `period + 1` bars have been seen.
pub fn atr(bars: &[Bar], period: usize) -> Vec<f64> {
    let n = bars.len();
    let mut result = vec![0.0; n];

    if period == 0 || n <= period {
        return result;
    }

    let mut tr = vec![0.0; n];
    for i in 1..n {
        let high = bars[i].high;
        let low = bars[i].low;
        let prev_close = bars[i - 1].close;

        tr[i] = (high - low)
            .max((high - prev_close).abs())
            .max((low - prev_close).abs());
    }

    let mut value: f64 = tr[1..=period].iter().sum::<f64>() / period as f64;
    result[period] = value;

    for i in (period + 1)..n {
        value = (value * (period as f64 - 1.0) + tr[i]) / period as f64;
        result[i] = value;
    }

    result
}

/// Rolling population standard deviation over an inclusive window.
pub fn rolling_std(data: &[f64], period: usize) -> Vec<f64> {
    let n = data.len();
    let mut result = vec![0.0; n];

    if period == 0 || n < period {
        return result;
    }

    let means = sma(data, period);
    for i in (period - 1)..n {
        let window = &data[i + 1 - period..=i];
        let mean = means[i];
        let variance =
            window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / period as f64;
        result[i] = variance.sqrt();
    }

    result
}
