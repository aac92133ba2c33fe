//! Portfolio position tracking and persistence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::{Error, Result};

/// A position in the portfolio representing shares owned of an asset.
///
/// Deserializes both the tracker's own format and the advisor holdings
/// format (`ticker` / `quantity` field names).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Position {
    /// Ticker symbol (uppercase)
    #[serde(alias = "ticker")]
    pub symbol: String,
    /// Number of shares owned
    #[serde(alias = "quantity")]
    pub shares: f64,
    /// Average cost per share
    pub cost_basis: f64,
    /// Sector, when the holdings file declares one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gain_loss: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gain_loss_percent: Option<f64>,
}

impl Position {
    pub fn new(symbol: &str, shares: f64, cost_basis: f64) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            shares,
            cost_basis,
            sector: None,
            current_price: None,
            market_value: None,
            gain_loss: None,
            gain_loss_percent: None,
        }
    }

    /// Total cost of this position.
    pub fn total_cost(&self) -> f64 {
        self.shares * self.cost_basis
    }

    /// Copy of the position with market price and derived metrics set.
    pub fn with_price(&self, current_price: f64) -> Self {
        let market_value = self.shares * current_price;
        let total_cost = self.total_cost();
        let gain_loss = market_value - total_cost;
        let gain_loss_percent = if total_cost > 0.0 {
            (gain_loss / total_cost) * 100.0
        } else {
            0.0
        };

        Self {
            current_price: Some(current_price),
            market_value: Some(market_value),
            gain_loss: Some(gain_loss),
            gain_loss_percent: Some(gain_loss_percent),
            ..self.clone()
        }
    }
}

/// A portfolio containing cash and positions.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Portfolio {
    pub positions: Vec<Position>,
    pub cash: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total cost basis of all positions.
    pub fn total_cost(&self) -> f64 {
        self.positions.iter().map(|p| p.total_cost()).sum()
    }

    /// Total market value including cash (requires prices to be set).
    pub fn total_market_value(&self) -> f64 {
        self.positions
            .iter()
            .filter_map(|p| p.market_value)
            .sum::<f64>()
            + self.cash
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }
}

/// Portfolio tracker that manages positions and persists to JSON.
#[derive(Debug)]
pub struct PortfolioTracker {
    path: PathBuf,
    portfolio: Portfolio,
}

impl PortfolioTracker {
    /// Tracker at the default path (`~/.marketdesk/portfolio.json`,
    /// overridable with `MARKETDESK_PORTFOLIO_FILE`).
    pub fn new() -> Self {
        let path = Self::default_path();
        let portfolio = Self::load_from_path(&path).unwrap_or_default();
        Self { path, portfolio }
    }

    /// Tracker backed by a specific file.
    pub fn with_path(path: PathBuf) -> Self {
        let portfolio = Self::load_from_path(&path).unwrap_or_default();
        Self { path, portfolio }
    }

    /// In-memory tracker (no persistence).
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::new(),
            portfolio: Portfolio::default(),
        }
    }

    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("MARKETDESK_PORTFOLIO_FILE") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".marketdesk/portfolio.json"))
            .unwrap_or_else(|| PathBuf::from("portfolio.json"))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Load a portfolio from a file.
    ///
    /// Accepts the tracker's own object format and the advisor holdings
    /// format: a bare array of `{ticker, quantity, cost_basis}` entries.
    pub fn load_from_path(path: &PathBuf) -> Result<Portfolio> {
        if !path.exists() {
            return Ok(Portfolio::default());
        }

        let content = fs::read_to_string(path)?;
        let data: serde_json::Value = serde_json::from_str(&content)?;

        if data.is_array() {
            let positions: Vec<Position> = serde_json::from_value(data)?;
            return Ok(Portfolio {
                positions,
                cash: 0.0,
                created_at: None,
                updated_at: None,
            });
        }

        Ok(serde_json::from_value(data)?)
    }

    /// Save the current portfolio to disk.
    pub fn save(&mut self) -> Result<()> {
        // In-memory trackers have nowhere to save
        if self.path.as_os_str().is_empty() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        if self.portfolio.created_at.is_none() {
            self.portfolio.created_at = Some(Utc::now());
        }
        self.portfolio.updated_at = Some(Utc::now());

        let content = serde_json::to_string_pretty(&self.portfolio)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn get(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn positions(&self) -> &[Position] {
        &self.portfolio.positions
    }

    pub fn find_position(&self, symbol: &str) -> Option<&Position> {
        let symbol_upper = symbol.to_uppercase();
        self.portfolio
            .positions
            .iter()
            .find(|p| p.symbol == symbol_upper)
    }

    /// Add or update a position, cost-averaging into an existing one.
    ///
    /// Returns the resulting position and whether it was an update.
    pub fn add_position(&mut self, symbol: &str, shares: f64, cost_basis: f64) -> (Position, bool) {
        let symbol_upper = symbol.to_uppercase();

        if let Some(idx) = self
            .portfolio
            .positions
            .iter()
            .position(|p| p.symbol == symbol_upper)
        {
            let existing = &self.portfolio.positions[idx];
            let total_shares = existing.shares + shares;
            let avg_cost = if total_shares > 0.0 {
                (existing.total_cost() + shares * cost_basis) / total_shares
            } else {
                0.0
            };

            let mut position = Position::new(&symbol_upper, total_shares, avg_cost);
            position.sector = existing.sector.clone();
            self.portfolio.positions[idx] = position.clone();
            (position, true)
        } else {
            let position = Position::new(&symbol_upper, shares, cost_basis);
            self.portfolio.positions.push(position.clone());
            (position, false)
        }
    }

    /// Remove a position, returning it if found.
    pub fn remove_position(&mut self, symbol: &str) -> Result<Position> {
        let symbol_upper = symbol.to_uppercase();

        if let Some(idx) = self
            .portfolio
            .positions
            .iter()
            .position(|p| p.symbol == symbol_upper)
        {
            Ok(self.portfolio.positions.remove(idx))
        } else {
            Err(Error::PositionNotFound(symbol_upper))
        }
    }

    pub fn cash(&self) -> f64 {
        self.portfolio.cash
    }

    pub fn set_cash(&mut self, cash: f64) {
        self.portfolio.cash = cash;
    }
}

impl Default for PortfolioTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_add_new_position() {
        let mut tracker = PortfolioTracker::in_memory();
        let (position, was_update) = tracker.add_position("aapl", 10.0, 150.0);

        assert!(!was_update);
        assert_eq!(position.symbol, "AAPL");
        assert_eq!(position.shares, 10.0);
        assert_eq!(tracker.positions().len(), 1);
    }

    #[test]
    fn test_add_position_cost_averaging() {
        let mut tracker = PortfolioTracker::in_memory();
        tracker.add_position("AAPL", 10.0, 150.0);
        let (position, was_update) = tracker.add_position("AAPL", 10.0, 170.0);

        assert!(was_update);
        assert_eq!(position.shares, 20.0);
        // (10 * 150 + 10 * 170) / 20 = 160
        assert_eq!(position.cost_basis, 160.0);
    }

    #[test]
    fn test_remove_position() {
        let mut tracker = PortfolioTracker::in_memory();
        tracker.add_position("AAPL", 10.0, 150.0);
        tracker.add_position("GOOGL", 5.0, 100.0);

        let removed = tracker.remove_position("AAPL").unwrap();
        assert_eq!(removed.symbol, "AAPL");
        assert_eq!(tracker.positions().len(), 1);

        assert!(matches!(
            tracker.remove_position("MSFT"),
            Err(Error::PositionNotFound(_))
        ));
    }

    #[test]
    fn test_find_position_case_insensitive() {
        let mut tracker = PortfolioTracker::in_memory();
        tracker.add_position("AAPL", 10.0, 150.0);

        assert!(tracker.find_position("aapl").is_some());
        assert!(tracker.find_position("GOOGL").is_none());
    }

    #[test]
    fn test_with_price() {
        let position = Position::new("AAPL", 10.0, 150.0).with_price(175.0);

        assert_eq!(position.market_value, Some(1750.0));
        assert_eq!(position.gain_loss, Some(250.0));
        assert!((position.gain_loss_percent.unwrap() - 16.666666666666668).abs() < 0.001);
    }

    #[test]
    fn test_persistence_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("portfolio.json");

        {
            let mut tracker = PortfolioTracker::with_path(path.clone());
            tracker.add_position("AAPL", 10.0, 150.0);
            tracker.set_cash(5000.0);
            tracker.save().unwrap();
        }

        {
            let tracker = PortfolioTracker::with_path(path);
            assert_eq!(tracker.positions().len(), 1);
            assert_eq!(tracker.positions()[0].symbol, "AAPL");
            assert_eq!(tracker.cash(), 5000.0);
        }
    }

    #[test]
    fn test_load_advisor_holdings_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("holdings.json");
        fs::write(
            &path,
            r#"[
                {"ticker": "AAPL", "quantity": 10, "cost_basis": 150.0, "sector": "Technology"},
                {"ticker": "JPM", "quantity": 5, "cost_basis": 140.0}
            ]"#,
        )
        .unwrap();

        let portfolio = PortfolioTracker::load_from_path(&path).unwrap();
        assert_eq!(portfolio.positions.len(), 2);
        assert_eq!(portfolio.positions[0].symbol, "AAPL");
        assert_eq!(portfolio.positions[0].shares, 10.0);
        assert_eq!(
            portfolio.positions[0].sector.as_deref(),
            Some("Technology")
        );
        assert_eq!(portfolio.cash, 0.0);
    }

    #[test]
    fn test_total_cost() {
        let mut tracker = PortfolioTracker::in_memory();
        tracker.add_position("AAPL", 10.0, 150.0);
        tracker.add_position("GOOGL", 5.0, 100.0);
        assert_eq!(tracker.get().total_cost(), 2000.0);
    }
}
