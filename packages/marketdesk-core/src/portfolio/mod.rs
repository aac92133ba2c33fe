//! Portfolio management: position tracking, performance and advice.

mod advisor;
mod performance;
mod tracker;

pub use advisor::{
    analyze, peer_candidates, six_month_return, HoldingReport, PortfolioReport, PortfolioSummary,
    Suggestion, SuggestionKind, TickerStats, SECTOR_PEERS, THEMES,
};
pub use performance::PortfolioPerformance;
pub use tracker::{Portfolio, PortfolioTracker, Position};
