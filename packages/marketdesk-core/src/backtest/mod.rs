//! Bar-by-bar backtest simulator.
//!
//! The engine walks the bar series once, feeding each close into
//! incrementally maintained indicator state (rolling SMA windows or a
//! Wilder RSI), and trades a single position on the rule's transitions:
//! at most one position open at a time, whole shares, fills at the bar
//! close. Metrics are computed once from the completed trade log and the
//! equity curve.

mod strategies;

pub use strategies::{
    get_strategy, list_strategies, Strategy, StrategyParameters, StrategyRule,
    BUILTIN_STRATEGIES, DEFAULT_FAST_PERIOD, DEFAULT_OVERBOUGHT, DEFAULT_OVERSOLD,
    DEFAULT_RSI_PERIOD, DEFAULT_SLOW_PERIOD,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::indicators::{RollingSma, WilderRsi};
use crate::types::Bar;
use crate::{Error, Result};

/// A completed round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub entered_at: DateTime<Utc>,
    pub exited_at: DateTime<Utc>,
    pub entry_price: f64,
    pub exit_price: f64,
    pub shares: u64,
    pub profit: f64,
    pub return_pct: f64,
}

/// A position still open when the series ended. Kept out of the realized
/// trade statistics, reported with its mark-to-market value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenPosition {
    pub entered_at: DateTime<Utc>,
    pub entry_price: f64,
    pub shares: u64,
    pub last_price: f64,
    pub unrealized_pnl: f64,
    pub unrealized_return_pct: f64,
}

/// Summary metrics over the completed simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestMetrics {
    pub final_equity: f64,
    pub total_return_pct: f64,
    pub annualized_return_pct: f64,
    /// Closed trades only
    pub total_trades: usize,
    pub win_rate_pct: f64,
    pub max_drawdown_pct: f64,
    pub sharpe_ratio: f64,
}

/// Result of a backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    pub strategy: StrategyRule,
    pub initial_capital: f64,
    pub metrics: BacktestMetrics,
    /// Round trips in execution order
    pub trades: Vec<Trade>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_position: Option<OpenPosition>,
    /// Chart image path, attached by the host when it renders one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    Buy,
    Sell,
    Hold,
}

/// Incremental per-bar state for a strategy rule.
enum RuleState {
    Crossover {
        fast: RollingSma,
        slow: RollingSma,
        prev_diff: Option<f64>,
    },
    Reversal {
        rsi: WilderRsi,
        prev_rsi: Option<f64>,
        oversold: f64,
        overbought: f64,
    },
}

impl RuleState {
    fn new(rule: &StrategyRule) -> Self {
        match *rule {
            StrategyRule::SmaCrossover { fast, slow } => RuleState::Crossover {
                fast: RollingSma::new(fast),
                slow: RollingSma::new(slow),
                prev_diff: None,
            },
            StrategyRule::RsiReversal {
                period,
                oversold,
                overbought,
            } => RuleState::Reversal {
                rsi: WilderRsi::new(period),
                prev_rsi: None,
                oversold,
                overbought,
            },
        }
    }

    fn on_bar(&mut self, close: f64) -> Signal {
        match self {
            RuleState::Crossover {
                fast,
                slow,
                prev_diff,
            } => {
                let fast_value = fast.push(close);
                let slow_value = slow.push(close);

                let diff = match (fast_value, slow_value) {
                    (Some(fast), Some(slow)) => fast - slow,
                    _ => return Signal::Hold,
                };

                match prev_diff.replace(diff) {
                    Some(prev) if prev <= 0.0 && diff > 0.0 => Signal::Buy,
                    Some(prev) if prev >= 0.0 && diff < 0.0 => Signal::Sell,
                    _ => Signal::Hold,
                }
            }
            RuleState::Reversal {
                rsi,
                prev_rsi,
                oversold,
                overbought,
            } => {
                let current = match rsi.push(close) {
                    Some(current) => current,
                    None => return Signal::Hold,
                };

                match prev_rsi.replace(current) {
                    Some(prev) if prev < *oversold && current > prev => Signal::Buy,
                    Some(prev) if prev > *overbought && current < prev => Signal::Sell,
                    _ => Signal::Hold,
                }
            }
        }
    }
}

/// Run a backtest over `bars` (timestamp ascending).
///
/// `interval` picks the annualization factor for the Sharpe ratio. Fails
/// with `InvalidParameter` on bad strategy parameters or non-positive
/// capital, and `InsufficientData` when the series cannot cover the
/// rule's warm-up window.
pub fn run(
    bars: &[Bar],
    rule: &StrategyRule,
    initial_capital: f64,
    interval: &str,
) -> Result<BacktestReport> {
    rule.validate()?;

    if initial_capital <= 0.0 {
        return Err(Error::InvalidParameter(
            "Initial capital must be positive".to_string(),
        ));
    }

    let warm_up = rule.warm_up();
    if bars.len() <= warm_up {
        return Err(Error::InsufficientData(format!(
            "{} needs more than {} bars, got {}",
            rule.id(),
            warm_up,
            bars.len()
        )));
    }

    let mut state = RuleState::new(rule);
    let mut cash = initial_capital;
    let mut position: Option<(DateTime<Utc>, f64, u64)> = None;
    let mut trades = Vec::new();
    let mut equity_curve = Vec::with_capacity(bars.len() - warm_up);

    for (i, bar) in bars.iter().enumerate() {
        let signal = state.on_bar(bar.close);

        match signal {
            Signal::Buy if position.is_none() && bar.close > 0.0 => {
                let shares = (cash / bar.close).floor() as u64;
                if shares > 0 {
                    cash -= shares as f64 * bar.close;
                    position = Some((bar.timestamp, bar.close, shares));
                    log::debug!("buy {} shares at {} ({})", shares, bar.close, bar.timestamp);
                }
            }
            Signal::Sell => {
                if let Some((entered_at, entry_price, shares)) = position.take() {
                    let cost = shares as f64 * entry_price;
                    let proceeds = shares as f64 * bar.close;
                    cash += proceeds;
                    let profit = proceeds - cost;
                    log::debug!("sell {} shares at {} ({})", shares, bar.close, bar.timestamp);
                    trades.push(Trade {
                        entered_at,
                        exited_at: bar.timestamp,
                        entry_price,
                        exit_price: bar.close,
                        shares,
                        profit,
                        return_pct: profit / cost * 100.0,
                    });
                }
            }
            _ => {}
        }

        // Equity sampled only over the evaluated window
        if i >= warm_up {
            let held = position
                .map(|(_, _, shares)| shares as f64 * bar.close)
                .unwrap_or(0.0);
            equity_curve.push(cash + held);
        }
    }

    let open_position = position.map(|(entered_at, entry_price, shares)| {
        let last_price = bars[bars.len() - 1].close;
        let cost = shares as f64 * entry_price;
        let unrealized_pnl = shares as f64 * last_price - cost;
        OpenPosition {
            entered_at,
            entry_price,
            shares,
            last_price,
            unrealized_pnl,
            unrealized_return_pct: if cost > 0.0 {
                unrealized_pnl / cost * 100.0
            } else {
                0.0
            },
        }
    });

    let final_equity = equity_curve.last().copied().unwrap_or(initial_capital);
    let total_return = final_equity / initial_capital - 1.0;

    let elapsed_days = (bars[bars.len() - 1].timestamp - bars[warm_up].timestamp).num_days();
    let annualized_return = if elapsed_days >= 1 {
        (1.0 + total_return).powf(365.0 / elapsed_days as f64) - 1.0
    } else {
        total_return
    };

    let wins = trades.iter().filter(|t| t.profit > 0.0).count();
    let win_rate_pct = if trades.is_empty() {
        0.0
    } else {
        wins as f64 / trades.len() as f64 * 100.0
    };

    let metrics = BacktestMetrics {
        final_equity,
        total_return_pct: total_return * 100.0,
        annualized_return_pct: annualized_return * 100.0,
        total_trades: trades.len(),
        win_rate_pct,
        max_drawdown_pct: max_drawdown(&equity_curve) * 100.0,
        sharpe_ratio: sharpe_ratio(&equity_curve, periods_per_year(interval)),
    };

    Ok(BacktestReport {
        strategy: rule.clone(),
        initial_capital,
        metrics,
        trades,
        open_position,
        chart: None,
    })
}

/// Largest peak-to-trough decline of an equity curve, as a fraction.
pub fn max_drawdown(equity: &[f64]) -> f64 {
    let mut peak = match equity.first() {
        Some(&first) => first,
        None => return 0.0,
    };
    let mut max_dd = 0.0;

    for &value in equity {
        if value > peak {
            peak = value;
        }
        if peak > 0.0 {
            let drawdown = (peak - value) / peak;
            if drawdown > max_dd {
                max_dd = drawdown;
            }
        }
    }

    max_dd
}

/// Annualized Sharpe ratio of the bar-to-bar returns of an equity curve.
///
/// Reports 0.0 when the return series has fewer than two points or no
/// variance, never NaN.
pub fn sharpe_ratio(equity: &[f64], periods_per_year: f64) -> f64 {
    let returns: Vec<f64> = equity
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect();

    if returns.len() < 2 {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt();

    if std < 1e-9 {
        return 0.0;
    }

    mean / std * periods_per_year.sqrt()
}

/// Annualization factor for the Sharpe ratio by bar interval.
fn periods_per_year(interval: &str) -> f64 {
    match interval {
        "1wk" => 52.0,
        "1mo" => 12.0,
        "3mo" => 4.0,
        // Daily and intraday intervals use trading days
        _ => 252.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::test_support::daily_bars;

    /// 60 flat bars at 100, then 20 bars rising linearly to 150.
    fn flat_then_rising() -> Vec<Bar> {
        let mut closes = vec![100.0; 60];
        for i in 1..=20 {
            closes.push(100.0 + 2.5 * i as f64);
        }
        daily_bars(&closes)
    }

    /// 20 bars falling, 20 bars rising, one final down bar.
    fn v_shape_with_tail() -> Vec<Bar> {
        let mut closes: Vec<f64> = (0..20).map(|i| 140.0 - 2.0 * i as f64).collect();
        closes.extend((0..20).map(|i| 105.0 + 3.0 * i as f64));
        closes.push(160.0);
        daily_bars(&closes)
    }

    #[test]
    fn test_crossover_single_buy_no_sell() {
        let bars = flat_then_rising();
        let rule = StrategyRule::sma_crossover(5, 20);
        let report = run(&bars, &rule, 10_000.0, "1d").unwrap();

        // One buy fires at the crossover, never closed before series end
        assert!(report.trades.is_empty());
        let open = report.open_position.expect("position should still be open");
        // First rising bar tips the fast SMA over the slow one
        assert_eq!(open.entered_at, bars[60].timestamp);
        assert!(open.unrealized_pnl > 0.0);
        assert!(report.metrics.total_return_pct > 0.0);
    }

    #[test]
    fn test_crossover_no_signal_on_flat_series() {
        let bars = daily_bars(&vec![100.0; 250]);
        let rule = StrategyRule::sma_crossover(50, 200);
        let report = run(&bars, &rule, 10_000.0, "1d").unwrap();

        assert!(report.trades.is_empty());
        assert!(report.open_position.is_none());
        assert_eq!(report.metrics.total_trades, 0);
        assert_eq!(report.metrics.win_rate_pct, 0.0);
        assert_eq!(report.metrics.total_return_pct, 0.0);
        assert_eq!(report.metrics.max_drawdown_pct, 0.0);
        assert_eq!(report.metrics.sharpe_ratio, 0.0);
    }

    #[test]
    fn test_rsi_reversal_round_trip() {
        let bars = v_shape_with_tail();
        let rule = StrategyRule::rsi_reversal(14);
        let report = run(&bars, &rule, 10_000.0, "1d").unwrap();

        // Buy at the first up-tick out of oversold (bar 20), sell at the
        // first down-tick from overbought (the final bar)
        assert_eq!(report.trades.len(), 1);
        let trade = &report.trades[0];
        assert_eq!(trade.entered_at, bars[20].timestamp);
        assert_eq!(trade.exited_at, bars[40].timestamp);
        assert!((trade.entry_price - 105.0).abs() < 1e-9);
        assert!(trade.profit > 0.0);
        assert_eq!(report.metrics.win_rate_pct, 100.0);
        assert!(report.open_position.is_none());
    }

    #[test]
    fn test_equity_reflects_whole_share_fills() {
        let bars = v_shape_with_tail();
        let rule = StrategyRule::rsi_reversal(14);
        let report = run(&bars, &rule, 10_000.0, "1d").unwrap();

        let trade = &report.trades[0];
        // 10_000 / 105 = 95 whole shares
        assert_eq!(trade.shares, 95);
        let expected_final = 10_000.0 + trade.profit;
        assert!((report.metrics.final_equity - expected_final).abs() < 1e-6);
    }

    #[test]
    fn test_insufficient_data() {
        let bars = daily_bars(&vec![100.0; 50]);
        let rule = StrategyRule::sma_crossover(50, 200);
        assert!(matches!(
            run(&bars, &rule, 10_000.0, "1d"),
            Err(Error::InsufficientData(_))
        ));
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let bars = daily_bars(&vec![100.0; 250]);

        let inverted = StrategyRule::sma_crossover(200, 50);
        assert!(matches!(
            run(&bars, &inverted, 10_000.0, "1d"),
            Err(Error::InvalidParameter(_))
        ));

        let rule = StrategyRule::sma_crossover(50, 200);
        assert!(matches!(
            run(&bars, &rule, 0.0, "1d"),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_max_drawdown_monotone_is_zero() {
        let equity: Vec<f64> = (0..50).map(|i| 100.0 + i as f64).collect();
        assert_eq!(max_drawdown(&equity), 0.0);
    }

    #[test]
    fn test_max_drawdown_peak_to_trough() {
        let equity = vec![100.0, 150.0, 100.0, 200.0];
        let dd = max_drawdown(&equity);
        // (150 - 100) / 150
        assert!((dd - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_sharpe_zero_variance_is_zero() {
        let flat = vec![100.0; 30];
        assert_eq!(sharpe_ratio(&flat, 252.0), 0.0);

        // Constant growth rate: zero variance, still 0, never NaN
        let compounding: Vec<f64> = (0..30).map(|i| 100.0 * 1.02_f64.powi(i)).collect();
        let sharpe = sharpe_ratio(&compounding, 252.0);
        assert!(sharpe.is_finite());
        assert_eq!(sharpe, 0.0);
    }

    #[test]
    fn test_sharpe_too_few_points_is_zero() {
        assert_eq!(sharpe_ratio(&[], 252.0), 0.0);
        assert_eq!(sharpe_ratio(&[100.0], 252.0), 0.0);
        assert_eq!(sharpe_ratio(&[100.0, 101.0], 252.0), 0.0);
    }

    #[test]
    fn test_sharpe_sign_follows_returns() {
        let rising: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64) + (i % 3) as f64).collect();
        assert!(sharpe_ratio(&rising, 252.0) > 0.0);

        let falling: Vec<f64> = (0..40).map(|i| 100.0 - (i as f64) + (i % 3) as f64).collect();
        assert!(sharpe_ratio(&falling, 252.0) < 0.0);
    }

    #[test]
    fn test_annualized_return_scales_with_time() {
        // ~40 evaluated days with a positive return annualizes higher
        let bars = v_shape_with_tail();
        let rule = StrategyRule::rsi_reversal(14);
        let report = run(&bars, &rule, 10_000.0, "1d").unwrap();

        assert!(report.metrics.total_return_pct > 0.0);
        assert!(report.metrics.annualized_return_pct > report.metrics.total_return_pct);
    }
}
