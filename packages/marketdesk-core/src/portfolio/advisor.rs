//! Rule-based portfolio advisor.
//!
//! Consumes a portfolio plus per-ticker stats (latest price, 6-month
//! return, sector) and produces holding reports and suggestions:
//! stop-loss warnings, profit-taking prompts, concentration risks,
//! sector-peer swap ideas and theme-exposure ideas. The peer and theme
//! tables are static fallbacks, not a live screener.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::portfolio::Portfolio;
use crate::{Error, Result};

/// Loss threshold (percent) that triggers a stop-loss warning.
const STOP_LOSS_PCT: f64 = -15.0;
/// Gain threshold (percent) that triggers a profit-taking prompt.
const PROFIT_TAKING_PCT: f64 = 50.0;
/// Portfolio weight above which a holding is flagged as concentrated.
const CONCENTRATION_WEIGHT: f64 = 0.20;
/// 6-month-return edge a peer needs before a swap is suggested.
const PEER_EDGE: f64 = 0.20;
/// Minimum 6-month return for a theme suggestion.
const THEME_MOMENTUM: f64 = 0.10;

/// Sector peers used for swap suggestions.
pub static SECTOR_PEERS: LazyLock<HashMap<&'static str, Vec<&'static str>>> =
    LazyLock::new(|| {
        let mut peers = HashMap::new();
        peers.insert(
            "Technology",
            vec!["AAPL", "MSFT", "NVDA", "ORCL", "ADBE", "CRM"],
        );
        peers.insert(
            "Communication Services",
            vec!["GOOGL", "META", "NFLX", "DIS"],
        );
        peers.insert("Consumer Cyclical", vec!["AMZN", "TSLA", "HD", "NKE", "MCD"]);
        peers.insert("Financial Services", vec!["JPM", "BAC", "V", "MA", "GS"]);
        peers.insert("Healthcare", vec!["LLY", "JNJ", "UNH", "PFE", "ABBV"]);
        peers
    });

/// Investment themes checked for missing exposure.
pub static THEMES: LazyLock<HashMap<&'static str, Vec<&'static str>>> = LazyLock::new(|| {
    let mut themes = HashMap::new();
    themes.insert(
        "AI & Chips",
        vec!["NVDA", "AMD", "AVGO", "SMCI", "TSM", "MSFT", "GOOGL"],
    );
    themes.insert("Green Energy", vec!["FSLR", "ENPH", "NEE", "TSLA"]);
    themes.insert("GLP-1 / Obesity", vec!["LLY", "NVO"]);
    themes
});

/// Per-ticker market stats the advisor works from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerStats {
    pub price: f64,
    /// 6-month return as a fraction (0.25 = +25%)
    pub return_6mo: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
}

/// 6-month return from a close series, as a fraction.
pub fn six_month_return(closes: &[f64]) -> f64 {
    match (closes.first(), closes.last()) {
        (Some(&first), Some(&last)) if first != 0.0 => (last - first) / first,
        _ => 0.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    Warning,
    Opportunity,
    SwapOpportunity,
    NewOpportunity,
    Risk,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    pub symbol: String,
    pub message: String,
}

/// One holding with market values applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldingReport {
    pub symbol: String,
    pub shares: f64,
    pub cost_basis: f64,
    pub current_price: f64,
    pub market_value: f64,
    pub unrealized_pl: f64,
    pub unrealized_pl_pct: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    pub return_6mo: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total_value: f64,
    pub total_cost: f64,
    pub total_pl: f64,
    pub total_pl_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioReport {
    pub summary: PortfolioSummary,
    pub holdings: Vec<HoldingReport>,
    pub suggestions: Vec<Suggestion>,
}

/// Tickers worth fetching stats for before calling [`analyze`]: sector
/// peers of holdings currently under water, and members of themes the
/// portfolio has no exposure to.
pub fn peer_candidates(portfolio: &Portfolio, stats: &HashMap<String, TickerStats>) -> Vec<String> {
    let held: Vec<&str> = portfolio
        .positions
        .iter()
        .map(|p| p.symbol.as_str())
        .collect();
    let mut candidates = Vec::new();

    for position in &portfolio.positions {
        let ticker_stats = match stats.get(&position.symbol) {
            Some(ticker_stats) => ticker_stats,
            None => continue,
        };
        if position.shares * ticker_stats.price >= position.total_cost() {
            continue;
        }

        let sector = match sector_of(position, ticker_stats) {
            Some(sector) => sector,
            None => continue,
        };
        if let Some(peers) = SECTOR_PEERS.get(sector.as_str()) {
            for peer in peers {
                if !held.contains(peer) {
                    candidates.push(peer.to_string());
                }
            }
        }
    }

    for tickers in THEMES.values() {
        if tickers.iter().any(|t| held.contains(t)) {
            continue;
        }
        for ticker in tickers {
            if !held.contains(ticker) {
                candidates.push(ticker.to_string());
            }
        }
    }

    candidates.sort();
    candidates.dedup();
    candidates
}

fn sector_of(
    position: &crate::portfolio::Position,
    stats: &TickerStats,
) -> Option<String> {
    stats.sector.clone().or_else(|| position.sector.clone())
}

/// Analyze a portfolio against per-ticker stats.
///
/// `stats` should cover the holdings and, for swap/theme suggestions, the
/// candidates from [`peer_candidates`]. Holdings without stats are valued
/// at zero, as the original advisor did for unfetchable tickers.
pub fn analyze(
    portfolio: &Portfolio,
    stats: &HashMap<String, TickerStats>,
) -> Result<PortfolioReport> {
    if portfolio.positions.is_empty() {
        return Err(Error::InvalidOperation("Empty portfolio".to_string()));
    }

    let held: Vec<&str> = portfolio
        .positions
        .iter()
        .map(|p| p.symbol.as_str())
        .collect();

    let mut holdings = Vec::with_capacity(portfolio.positions.len());
    let mut suggestions = Vec::new();
    let mut total_value = 0.0;
    let mut total_cost = 0.0;

    for position in &portfolio.positions {
        let ticker_stats = stats.get(&position.symbol);
        let price = ticker_stats.map(|s| s.price).unwrap_or(0.0);
        let priced = position.with_price(price);

        let market_value = priced.market_value.unwrap_or(0.0);
        let unrealized_pl = priced.gain_loss.unwrap_or(0.0);
        let unrealized_pl_pct = priced.gain_loss_percent.unwrap_or(0.0);

        total_value += market_value;
        total_cost += position.total_cost();

        if unrealized_pl_pct < STOP_LOSS_PCT {
            suggestions.push(Suggestion {
                kind: SuggestionKind::Warning,
                symbol: position.symbol.clone(),
                message: format!(
                    "Stop loss warning: {} is down {:.1}%.",
                    position.symbol, unrealized_pl_pct
                ),
            });
        }

        if unrealized_pl_pct > PROFIT_TAKING_PCT {
            suggestions.push(Suggestion {
                kind: SuggestionKind::Opportunity,
                symbol: position.symbol.clone(),
                message: format!(
                    "Profit taking: {} is up {:.1}%. Consider trimming.",
                    position.symbol, unrealized_pl_pct
                ),
            });
        }

        holdings.push(HoldingReport {
            symbol: position.symbol.clone(),
            shares: position.shares,
            cost_basis: position.cost_basis,
            current_price: price,
            market_value,
            unrealized_pl,
            unrealized_pl_pct,
            sector: ticker_stats
                .and_then(|s| sector_of(position, s))
                .or_else(|| position.sector.clone()),
            return_6mo: ticker_stats.map(|s| s.return_6mo).unwrap_or(0.0),
        });
    }

    let total_pl = total_value - total_cost;
    let total_pl_pct = if total_cost > 0.0 {
        total_pl / total_cost * 100.0
    } else {
        0.0
    };

    // Swap ideas: a losing holding lagging a sector peer by a wide margin
    for holding in holdings.iter().filter(|h| h.unrealized_pl_pct < 0.0) {
        let sector = match &holding.sector {
            Some(sector) => sector,
            None => continue,
        };
        let peers = match SECTOR_PEERS.get(sector.as_str()) {
            Some(peers) => peers,
            None => continue,
        };

        let mut best_peer: Option<(&str, f64)> = None;
        for peer in peers {
            if held.contains(peer) {
                continue;
            }
            if let Some(peer_stats) = stats.get(*peer) {
                if peer_stats.return_6mo > holding.return_6mo + PEER_EDGE
                    && best_peer.map(|(_, r)| peer_stats.return_6mo > r).unwrap_or(true)
                {
                    best_peer = Some((peer, peer_stats.return_6mo));
                }
            }
        }

        if let Some((peer, peer_return)) = best_peer {
            suggestions.push(Suggestion {
                kind: SuggestionKind::SwapOpportunity,
                symbol: holding.symbol.clone(),
                message: format!(
                    "Swap opportunity: {} ({:.1}% 6mo) is lagging {} ({:.1}% 6mo) in {}.",
                    holding.symbol,
                    holding.return_6mo * 100.0,
                    peer,
                    peer_return * 100.0,
                    sector
                ),
            });
        }
    }

    // Theme ideas: no exposure and a member with real momentum
    for (theme, tickers) in THEMES.iter() {
        if tickers.iter().any(|t| held.contains(t)) {
            continue;
        }

        let mut best: Option<(&str, f64)> = None;
        for ticker in tickers {
            if let Some(ticker_stats) = stats.get(*ticker) {
                if best.map(|(_, r)| ticker_stats.return_6mo > r).unwrap_or(true) {
                    best = Some((ticker, ticker_stats.return_6mo));
                }
            }
        }

        if let Some((ticker, ret)) = best {
            if ret > THEME_MOMENTUM {
                suggestions.push(Suggestion {
                    kind: SuggestionKind::NewOpportunity,
                    symbol: ticker.to_string(),
                    message: format!(
                        "Theme opportunity: no exposure to '{}'. Consider {} which is up {:.1}% in 6mo.",
                        theme,
                        ticker,
                        ret * 100.0
                    ),
                });
            }
        }
    }

    // Concentration check
    if total_value > 0.0 {
        for holding in &holdings {
            let weight = holding.market_value / total_value;
            if weight > CONCENTRATION_WEIGHT {
                suggestions.push(Suggestion {
                    kind: SuggestionKind::Risk,
                    symbol: holding.symbol.clone(),
                    message: format!(
                        "Concentration risk: {} makes up {:.1}% of portfolio (>{:.0}%).",
                        holding.symbol,
                        weight * 100.0,
                        CONCENTRATION_WEIGHT * 100.0
                    ),
                });
            }
        }
    }

    Ok(PortfolioReport {
        summary: PortfolioSummary {
            total_value,
            total_cost,
            total_pl,
            total_pl_pct,
        },
        holdings,
        suggestions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::Position;

    fn stats(entries: &[(&str, f64, f64, Option<&str>)]) -> HashMap<String, TickerStats> {
        entries
            .iter()
            .map(|&(symbol, price, return_6mo, sector)| {
                (
                    symbol.to_string(),
                    TickerStats {
                        price,
                        return_6mo,
                        sector: sector.map(String::from),
                    },
                )
            })
            .collect()
    }

    fn portfolio_of(positions: Vec<Position>) -> Portfolio {
        Portfolio {
            positions,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_portfolio_rejected() {
        let portfolio = Portfolio::default();
        assert!(matches!(
            analyze(&portfolio, &HashMap::new()),
            Err(Error::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_summary_totals() {
        let portfolio = portfolio_of(vec![
            Position::new("AAPL", 10.0, 100.0),
            Position::new("JPM", 5.0, 100.0),
        ]);
        let stats = stats(&[
            ("AAPL", 120.0, 0.1, Some("Technology")),
            ("JPM", 110.0, 0.05, Some("Financial Services")),
        ]);

        let report = analyze(&portfolio, &stats).unwrap();
        assert_eq!(report.summary.total_cost, 1500.0);
        assert_eq!(report.summary.total_value, 1750.0); // 1200 + 550
        assert_eq!(report.summary.total_pl, 250.0);
        assert_eq!(report.holdings.len(), 2);
    }

    #[test]
    fn test_stop_loss_warning() {
        let portfolio = portfolio_of(vec![Position::new("AAPL", 10.0, 100.0)]);
        let stats = stats(&[("AAPL", 80.0, -0.2, Some("Technology"))]);

        let report = analyze(&portfolio, &stats).unwrap();
        assert!(report
            .suggestions
            .iter()
            .any(|s| s.kind == SuggestionKind::Warning && s.symbol == "AAPL"));
    }

    #[test]
    fn test_profit_taking_suggestion() {
        let portfolio = portfolio_of(vec![Position::new("NVDA", 10.0, 100.0)]);
        let stats = stats(&[("NVDA", 160.0, 0.6, Some("Technology"))]);

        let report = analyze(&portfolio, &stats).unwrap();
        assert!(report
            .suggestions
            .iter()
            .any(|s| s.kind == SuggestionKind::Opportunity && s.symbol == "NVDA"));
    }

    #[test]
    fn test_swap_suggestion_for_lagging_loser() {
        let portfolio = portfolio_of(vec![
            Position::new("ORCL", 10.0, 100.0),
            // Second position keeps ORCL under the concentration radar
            Position::new("JPM", 50.0, 100.0),
        ]);
        let stats = stats(&[
            ("ORCL", 90.0, -0.10, Some("Technology")),
            ("JPM", 100.0, 0.02, Some("Financial Services")),
            ("NVDA", 500.0, 0.45, Some("Technology")),
            ("MSFT", 400.0, 0.20, Some("Technology")),
        ]);

        let report = analyze(&portfolio, &stats).unwrap();
        let swap = report
            .suggestions
            .iter()
            .find(|s| s.kind == SuggestionKind::SwapOpportunity)
            .expect("expected a swap suggestion");
        assert_eq!(swap.symbol, "ORCL");
        // Best peer by 6-month return wins
        assert!(swap.message.contains("NVDA"));
    }

    #[test]
    fn test_no_swap_without_edge() {
        let portfolio = portfolio_of(vec![Position::new("ORCL", 10.0, 100.0)]);
        let stats = stats(&[
            ("ORCL", 95.0, -0.02, Some("Technology")),
            ("MSFT", 400.0, 0.10, Some("Technology")),
        ]);

        let report = analyze(&portfolio, &stats).unwrap();
        assert!(!report
            .suggestions
            .iter()
            .any(|s| s.kind == SuggestionKind::SwapOpportunity));
    }

    #[test]
    fn test_theme_suggestion_when_unexposed() {
        let portfolio = portfolio_of(vec![Position::new("JPM", 10.0, 100.0)]);
        let stats = stats(&[
            ("JPM", 110.0, 0.05, Some("Financial Services")),
            ("LLY", 700.0, 0.30, Some("Healthcare")),
            ("NVO", 100.0, 0.12, Some("Healthcare")),
        ]);

        let report = analyze(&portfolio, &stats).unwrap();
        let theme = report
            .suggestions
            .iter()
            .find(|s| s.kind == SuggestionKind::NewOpportunity && s.message.contains("GLP-1"))
            .expect("expected a theme suggestion");
        assert_eq!(theme.symbol, "LLY");
    }

    #[test]
    fn test_no_theme_suggestion_when_held() {
        let portfolio = portfolio_of(vec![Position::new("NVO", 10.0, 100.0)]);
        let stats = stats(&[
            ("NVO", 110.0, 0.15, Some("Healthcare")),
            ("LLY", 700.0, 0.30, Some("Healthcare")),
        ]);

        let report = analyze(&portfolio, &stats).unwrap();
        assert!(!report
            .suggestions
            .iter()
            .any(|s| s.kind == SuggestionKind::NewOpportunity && s.message.contains("GLP-1")));
    }

    #[test]
    fn test_concentration_risk() {
        let portfolio = portfolio_of(vec![
            Position::new("AAPL", 90.0, 100.0),
            Position::new("JPM", 10.0, 100.0),
        ]);
        let stats = stats(&[
            ("AAPL", 100.0, 0.0, Some("Technology")),
            ("JPM", 100.0, 0.0, Some("Financial Services")),
        ]);

        let report = analyze(&portfolio, &stats).unwrap();
        assert!(report
            .suggestions
            .iter()
            .any(|s| s.kind == SuggestionKind::Risk && s.symbol == "AAPL"));
        assert!(!report
            .suggestions
            .iter()
            .any(|s| s.kind == SuggestionKind::Risk && s.symbol == "JPM"));
    }

    #[test]
    fn test_peer_candidates() {
        let portfolio = portfolio_of(vec![Position::new("ORCL", 10.0, 100.0)]);
        let stats = stats(&[("ORCL", 80.0, -0.2, Some("Technology"))]);

        let candidates = peer_candidates(&portfolio, &stats);
        // Technology peers of the loser, minus the holding itself
        assert!(candidates.contains(&"NVDA".to_string()));
        assert!(candidates.contains(&"MSFT".to_string()));
        assert!(!candidates.contains(&"ORCL".to_string()));
        // Unheld theme members are included
        assert!(candidates.contains(&"LLY".to_string()));
    }

    #[test]
    fn test_six_month_return() {
        assert!((six_month_return(&[100.0, 110.0, 125.0]) - 0.25).abs() < 1e-9);
        assert_eq!(six_month_return(&[]), 0.0);
        assert_eq!(six_month_return(&[0.0, 10.0]), 0.0);
    }
}
