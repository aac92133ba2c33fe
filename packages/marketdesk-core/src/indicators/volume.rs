//! Volume indicators: OBV, VWAP, volume ratio.

use crate::types::Bar;

/// On-Balance Volume: cumulative volume signed by the close direction.
pub fn obv(bars: &[Bar]) -> Vec<i64> {
    let n = bars.len();
    let mut result = vec![0_i64; n];

    if n == 0 {
        return result;
    }

    result[0] = bars[0].volume as i64;
    for i in 1..n {
        let volume = bars[i].volume as i64;
        result[i] = if bars[i].close > bars[i - 1].close {
            result[i - 1] + volume
        } else if bars[i].close < bars[i - 1].close {
            result[i - 1] - volume
        } else {
            result[i - 1]
        };
    }

    result
}

/// Volume-weighted average price, cumulative over the series.
///
/// Bars with zero volume carry the previous value forward; a series with
/// no volume at all stays at 0.0.
pub fn vwap(bars: &[Bar]) -> Vec<f64> {
    let n = bars.len();
    let mut result = vec![0.0; n];

    let mut pv_sum = 0.0;
    let mut volume_sum = 0.0;

    for i in 0..n {
        pv_sum += bars[i].typical_price() * bars[i].volume as f64;
        volume_sum += bars[i].volume as f64;
        if volume_sum > 0.0 {
            result[i] = pv_sum / volume_sum;
        }
    }

    result
}

/// Ratio of the latest volume to its `period`-bar average.
///
/// Returns `None` when the series is shorter than `period` or the average
/// volume is zero.
pub fn volume_ratio(bars: &[Bar], period: usize) -> Option<f64> {
    if period == 0 || bars.len() < period {
        return None;
    }

    let window = &bars[bars.len() - period..];
    let avg = window.iter().map(|b| b.volume as f64).sum::<f64>() / period as f64;
    if avg <= 0.0 {
        return None;
    }

    let current = bars[bars.len() - 1].volume as f64;
    Some(current / avg)
}
