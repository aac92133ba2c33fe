//! Simple and exponential moving averages.

use std::collections::VecDeque;

/// Calculate Simple Moving Average.
///
/// # Arguments
///
/// * `data` - Price series
/// * `period` - Lookback period
///
/// # Returns
///
/// Vector of SMA values. The first `period-1` values are 0.0.
///
/// # Example
///
/// ```rust
/// use marketdesk_core::indicators::sma;
///
/// let prices = vec![10.0, 11.0, 12.0, 11.0, 10.0];
/// let values = sma(&prices, 3);
///
/// // SMA at index 2 = (10 + 11 + 12) / 3 = 11.0
/// assert!((values[2] - 11.0).abs() < 0.001);
/// ```
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    let n = data.len();
    let mut result = vec![0.0; n];

    if period == 0 || period > n {
        return result;
    }

    let mut sum: f64 = data[..period].iter().sum();
    result[period - 1] = sum / period as f64;

    // Rolling window for the rest
    for i in period..n {
        sum = sum - data[i - period] + data[i];
        result[i] = sum / period as f64;
    }

    result
}

/// Calculate Exponential Moving Average.
///
/// Uses `EMA[i] = alpha * price[i] + (1 - alpha) * EMA[i-1]` with
/// `alpha = 2 / (period + 1)`, seeded from the first value.
pub fn ema(data: &[f64], period: usize) -> Vec<f64> {
    let n = data.len();
    let mut result = vec![0.0; n];

    if period == 0 || n == 0 {
        return result;
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    result[0] = data[0];

    for i in 1..n {
        result[i] = alpha * data[i] + (1.0 - alpha) * result[i - 1];
    }

    result
}

/// Incrementally maintained simple moving average.
///
/// The backtest engine feeds one close per bar; `push` returns the mean
/// once the window is full and `None` during warm-up. Constant work per
/// bar regardless of series length.
#[derive(Debug, Clone)]
pub struct RollingSma {
    period: usize,
    window: VecDeque<f64>,
    sum: f64,
}

impl RollingSma {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            window: VecDeque::with_capacity(period + 1),
            sum: 0.0,
        }
    }

    /// Push the next value; returns the window mean once full.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        self.window.push_back(value);
        self.sum += value;

        if self.window.len() > self.period {
            if let Some(old) = self.window.pop_front() {
                self.sum -= old;
            }
        }

        if self.window.len() == self.period {
            Some(self.sum / self.period as f64)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma_basic() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = sma(&data, 3);

        assert!((result[2] - 2.0).abs() < 0.001);
        assert!((result[3] - 3.0).abs() < 0.001);
        assert!((result[4] - 4.0).abs() < 0.001);
    }

    #[test]
    fn test_sma_period_larger_than_data() {
        let data = vec![1.0, 2.0, 3.0];
        let result = sma(&data, 10);
        assert!(result.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_ema_basic() {
        let data = vec![10.0, 11.0, 12.0, 11.0, 10.0];
        let result = ema(&data, 3);

        // Seeded from the first value
        assert!((result[0] - 10.0).abs() < 0.001);

        for value in &result {
            assert!(*value >= 9.0 && *value <= 13.0);
        }
    }

    #[test]
    fn test_ema_responsiveness() {
        // EMA reacts faster to a level shift than SMA
        let data: Vec<f64> = (0..20)
            .map(|i| if i < 10 { 100.0 } else { 150.0 })
            .collect();

        let sma_result = sma(&data, 5);
        let ema_result = ema(&data, 5);
        assert!(ema_result[11] > sma_result[11]);
    }

    #[test]
    fn test_rolling_sma_matches_batch() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let batch = sma(&data, 3);
        let mut rolling = RollingSma::new(3);

        for (i, &value) in data.iter().enumerate() {
            let incremental = rolling.push(value);
            if i < 2 {
                assert!(incremental.is_none());
            } else {
                assert!((incremental.unwrap() - batch[i]).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_empty_data() {
        let data: Vec<f64> = vec![];
        assert!(sma(&data, 3).is_empty());
        assert!(ema(&data, 3).is_empty());
    }
}
