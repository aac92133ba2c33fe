//! Portfolio performance summary.

use serde::{Deserialize, Serialize};

use crate::portfolio::Portfolio;

/// Aggregate view of a portfolio's cost, value and unrealized P&L.
///
/// Gain figures need positions priced via `Position::with_price`; without
/// prices they simply read zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioPerformance {
    pub total_cost: f64,
    pub total_market_value: f64,
    pub total_gain_loss: f64,
    pub total_gain_loss_percent: f64,
    pub cash: f64,
    pub position_count: usize,
    pub positions_in_profit: usize,
    pub positions_in_loss: usize,
}

impl PortfolioPerformance {
    pub fn from_portfolio(portfolio: &Portfolio) -> Self {
        let total_cost = portfolio.total_cost();
        let total_market_value = portfolio.total_market_value();
        let total_gain_loss = total_market_value - total_cost - portfolio.cash;

        let total_gain_loss_percent = if total_cost > 0.0 {
            (total_gain_loss / total_cost) * 100.0
        } else {
            0.0
        };

        let positions_in_profit = portfolio
            .positions
            .iter()
            .filter(|p| p.gain_loss.map(|g| g > 0.0).unwrap_or(false))
            .count();

        let positions_in_loss = portfolio
            .positions
            .iter()
            .filter(|p| p.gain_loss.map(|g| g < 0.0).unwrap_or(false))
            .count();

        Self {
            total_cost,
            total_market_value,
            total_gain_loss,
            total_gain_loss_percent,
            cash: portfolio.cash,
            position_count: portfolio.positions.len(),
            positions_in_profit,
            positions_in_loss,
        }
    }
}
