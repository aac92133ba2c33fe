//! Marketdesk CLI - JSON command surface for the agent skills.
//!
//! Every command prints a single `ApiResponse` envelope on stdout so the
//! host can parse success and failure uniformly.

use std::collections::HashMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::json;

use marketdesk_core::{
    analysis::{generate_signals, TechnicalSummary},
    backtest::{self, get_strategy, list_strategies, StrategyRule},
    cache::DataCache,
    portfolio::{self, PortfolioPerformance, PortfolioTracker, TickerStats},
    provider::{DataFetcher, QuoteProvider, YahooChartClient},
    ApiResponse,
};

#[derive(Parser)]
#[command(name = "marketdesk")]
#[command(about = "Marketdesk CLI - stock analysis, backtesting and portfolio tools")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and analyze a ticker
    Analyze {
        /// Ticker symbol (e.g. AAPL, 0700.HK, BTC-USD)
        #[arg(short, long)]
        ticker: String,
        /// Time period of history to fetch
        #[arg(short, long, default_value = "1mo")]
        period: String,
        /// Bar interval
        #[arg(short, long, default_value = "1d")]
        interval: String,
        /// Include technical indicators and signals
        #[arg(long)]
        technical: bool,
        /// Bypass the cache (fresh data is still cached)
        #[arg(long)]
        no_cache: bool,
        /// Cache directory override
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
    /// Backtest a strategy against a ticker's history
    Backtest {
        /// Ticker symbol
        #[arg(short, long)]
        ticker: String,
        /// Strategy id (sma_crossover, rsi_reversal)
        #[arg(short, long)]
        strategy: String,
        /// Time period of history to fetch
        #[arg(short, long, default_value = "2y")]
        period: String,
        /// Starting capital
        #[arg(short = 'c', long, default_value = "10000")]
        initial_capital: f64,
        /// Fast SMA period override
        #[arg(long)]
        fast: Option<usize>,
        /// Slow SMA period override
        #[arg(long)]
        slow: Option<usize>,
        /// RSI period override
        #[arg(long)]
        rsi_period: Option<usize>,
        /// Bypass the cache
        #[arg(long)]
        no_cache: bool,
        /// Cache directory override
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
    /// Strategy registry commands
    Strategy {
        #[command(subcommand)]
        action: StrategyAction,
    },
    /// Portfolio management commands
    Portfolio {
        #[command(subcommand)]
        action: PortfolioAction,
    },
    /// Cache maintenance commands
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum StrategyAction {
    /// List available strategies
    List,
    /// Get strategy details
    Get {
        /// Strategy id
        #[arg(short, long)]
        id: String,
    },
}

#[derive(Subcommand)]
enum PortfolioAction {
    /// Get portfolio status
    Status,
    /// Add a position
    Add {
        /// Ticker symbol
        #[arg(short, long)]
        symbol: String,
        /// Number of shares
        #[arg(short = 'n', long)]
        shares: f64,
        /// Cost per share
        #[arg(short, long)]
        cost: f64,
    },
    /// Remove a position
    Remove {
        /// Ticker symbol
        #[arg(short, long)]
        symbol: String,
    },
    /// Get or set cash balance
    Cash {
        /// Cash amount to set (optional)
        #[arg(short, long)]
        set: Option<f64>,
    },
    /// Analyze holdings and suggest actions
    Advise {
        /// Holdings file (defaults to the tracked portfolio)
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Cache directory override
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Remove all cache entries
    Clear {
        /// Cache directory override
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
    /// Remove cache entries older than the given age
    ClearOld {
        /// Maximum age in days
        #[arg(short, long, default_value = "7")]
        days: i64,
        /// Cache directory override
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let output = match cli.command {
        Commands::Analyze {
            ticker,
            period,
            interval,
            technical,
            no_cache,
            cache_dir,
        } => handle_analyze(&ticker, &period, &interval, technical, no_cache, cache_dir),
        Commands::Backtest {
            ticker,
            strategy,
            period,
            initial_capital,
            fast,
            slow,
            rsi_period,
            no_cache,
            cache_dir,
        } => handle_backtest(
            &ticker,
            &strategy,
            &period,
            initial_capital,
            fast,
            slow,
            rsi_period,
            no_cache,
            cache_dir,
        ),
        Commands::Strategy { action } => handle_strategy(action),
        Commands::Portfolio { action } => handle_portfolio(action),
        Commands::Cache { action } => handle_cache(action),
    };

    println!("{}", output);
}

fn cache_at(cache_dir: Option<PathBuf>) -> DataCache {
    match cache_dir {
        Some(dir) => DataCache::new(dir, marketdesk_core::cache::DEFAULT_TTL_MINUTES),
        None => DataCache::with_defaults(),
    }
}

fn fetcher_at(cache_dir: Option<PathBuf>) -> DataFetcher {
    DataFetcher::new(YahooChartClient::new(), cache_at(cache_dir))
}

fn to_json<T: serde::Serialize>(response: &ApiResponse<T>) -> String {
    serde_json::to_string_pretty(response)
        .unwrap_or_else(|err| format!("{{\"ok\":false,\"error\":\"{}\"}}", err))
}

fn err_json(error: impl ToString) -> String {
    to_json(&ApiResponse::<()>::err(error.to_string()))
}

fn handle_analyze(
    ticker: &str,
    period: &str,
    interval: &str,
    technical: bool,
    no_cache: bool,
    cache_dir: Option<PathBuf>,
) -> String {
    let fetcher = fetcher_at(cache_dir);

    let data = match fetcher.fetch(ticker, period, interval, no_cache) {
        Ok(data) => data,
        Err(err) => return err_json(err),
    };

    // Last 10 bars keep the envelope small; the full history stays cached
    let history: Vec<_> = data.bars.iter().rev().take(10).rev().collect();

    let mut payload = json!({
        "metadata": data.metadata,
        "price": data.price,
        "history": history,
    });

    if technical {
        let summary = TechnicalSummary::from_bars(&data.bars);
        let signals = generate_signals(&summary, &data.bars);
        payload["technical"] = json!({
            "indicators": summary,
            "signals": signals,
        });
    }

    to_json(&ApiResponse::ok(payload))
}

#[allow(clippy::too_many_arguments)]
fn handle_backtest(
    ticker: &str,
    strategy: &str,
    period: &str,
    initial_capital: f64,
    fast: Option<usize>,
    slow: Option<usize>,
    rsi_period: Option<usize>,
    no_cache: bool,
    cache_dir: Option<PathBuf>,
) -> String {
    let rule = match StrategyRule::from_id(strategy, fast, slow, rsi_period) {
        Ok(rule) => rule,
        Err(err) => return err_json(err),
    };

    // Short periods cannot cover a 200-bar warm-up; widen the fetch
    let fetch_period = match &rule {
        StrategyRule::SmaCrossover { .. }
            if ["1mo", "3mo", "6mo", "1y"].contains(&period) =>
        {
            "2y"
        }
        _ => period,
    };

    let fetcher = fetcher_at(cache_dir);
    let data = match fetcher.fetch(ticker, fetch_period, "1d", no_cache) {
        Ok(data) => data,
        Err(err) => return err_json(err),
    };

    match backtest::run(&data.bars, &rule, initial_capital, "1d") {
        Ok(report) => to_json(&ApiResponse::ok(json!({
            "metadata": {
                "ticker": data.metadata.ticker,
                "strategy": rule.id(),
                "period": period,
                "fetch_period": fetch_period,
                "initial_capital": initial_capital,
            },
            "report": report,
        }))),
        Err(err) => err_json(err),
    }
}

fn handle_strategy(action: StrategyAction) -> String {
    match action {
        StrategyAction::List => to_json(&ApiResponse::ok(json!({
            "strategies": list_strategies(),
        }))),
        StrategyAction::Get { id } => match get_strategy(&id) {
            Some(strategy) => to_json(&ApiResponse::ok(strategy)),
            None => err_json(format!("Strategy not found: {}", id)),
        },
    }
}

fn handle_portfolio(action: PortfolioAction) -> String {
    match action {
        PortfolioAction::Status => {
            let tracker = PortfolioTracker::new();
            let portfolio = tracker.get();
            to_json(&ApiResponse::ok(json!({
                "positions": portfolio.positions,
                "performance": PortfolioPerformance::from_portfolio(portfolio),
                "updated_at": portfolio.updated_at,
            })))
        }
        PortfolioAction::Add {
            symbol,
            shares,
            cost,
        } => {
            let mut tracker = PortfolioTracker::new();
            let (position, was_update) = tracker.add_position(&symbol, shares, cost);
            if let Err(err) = tracker.save() {
                return err_json(err);
            }
            to_json(&ApiResponse::ok(json!({
                "position": position,
                "action": if was_update { "updated" } else { "added" },
            })))
        }
        PortfolioAction::Remove { symbol } => {
            let mut tracker = PortfolioTracker::new();
            match tracker.remove_position(&symbol) {
                Ok(removed) => {
                    if let Err(err) = tracker.save() {
                        return err_json(err);
                    }
                    to_json(&ApiResponse::ok(json!({ "removed": removed })))
                }
                Err(err) => err_json(err),
            }
        }
        PortfolioAction::Cash { set } => {
            let mut tracker = PortfolioTracker::new();
            if let Some(amount) = set {
                tracker.set_cash(amount);
                if let Err(err) = tracker.save() {
                    return err_json(err);
                }
            }
            to_json(&ApiResponse::ok(json!({ "cash": tracker.cash() })))
        }
        PortfolioAction::Advise { file, cache_dir } => handle_advise(file, cache_dir),
    }
}

fn handle_advise(file: Option<PathBuf>, cache_dir: Option<PathBuf>) -> String {
    let portfolio = match file {
        Some(path) => match PortfolioTracker::load_from_path(&path) {
            Ok(portfolio) => portfolio,
            Err(err) => return err_json(format!("Failed to load portfolio: {}", err)),
        },
        None => PortfolioTracker::new().get().clone(),
    };

    let fetcher = fetcher_at(cache_dir);

    let holdings: Vec<String> = portfolio.positions.iter().map(|p| p.symbol.clone()).collect();
    let mut stats = fetch_stats(&fetcher, &holdings);

    // Peers and theme members are only fetched once the losers are known
    let candidates = portfolio::peer_candidates(&portfolio, &stats);
    stats.extend(fetch_stats(&fetcher, &candidates));

    match portfolio::analyze(&portfolio, &stats) {
        Ok(report) => to_json(&ApiResponse::ok(report)),
        Err(err) => err_json(err),
    }
}

fn fetch_stats<P: QuoteProvider>(
    fetcher: &DataFetcher<P>,
    tickers: &[String],
) -> HashMap<String, TickerStats> {
    let mut stats = HashMap::new();

    for ticker in tickers {
        match fetcher.fetch(ticker, "6mo", "1d", false) {
            Ok(data) => {
                let closes = data.closes();
                let price = data
                    .price
                    .current
                    .or_else(|| closes.last().copied())
                    .unwrap_or(0.0);
                stats.insert(
                    data.metadata.ticker.clone(),
                    TickerStats {
                        price,
                        return_6mo: portfolio::six_month_return(&closes),
                        sector: None,
                    },
                );
            }
            Err(err) => log::warn!("skipping {}: {}", ticker, err),
        }
    }

    stats
}

fn handle_cache(action: CacheAction) -> String {
    match action {
        CacheAction::Clear { cache_dir } => match cache_at(cache_dir).clear_all() {
            Ok(removed) => to_json(&ApiResponse::ok(json!({ "removed": removed }))),
            Err(err) => err_json(err),
        },
        CacheAction::ClearOld { days, cache_dir } => {
            match cache_at(cache_dir).clear_old(days) {
                Ok(removed) => to_json(&ApiResponse::ok(json!({
                    "removed": removed,
                    "max_age_days": days,
                }))),
                Err(err) => err_json(err),
            }
        }
    }
}
