//! Strategy rules for the backtest simulator.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::{Error, Result};

pub const DEFAULT_FAST_PERIOD: usize = 50;
pub const DEFAULT_SLOW_PERIOD: usize = 200;
pub const DEFAULT_RSI_PERIOD: usize = 14;
pub const DEFAULT_OVERSOLD: f64 = 30.0;
pub const DEFAULT_OVERBOUGHT: f64 = 70.0;

/// A fully parameterized strategy rule.
///
/// - `SmaCrossover`: buy when the fast SMA moves from at-or-below the slow
///   SMA to above it between two consecutive bars; sell on the reverse
///   transition.
/// - `RsiReversal`: buy when the previous bar's RSI is below `oversold`
///   and RSI rises on the current bar; sell when the previous bar's RSI is
///   above `overbought` and RSI falls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum StrategyRule {
    SmaCrossover {
        fast: usize,
        slow: usize,
    },
    RsiReversal {
        period: usize,
        oversold: f64,
        overbought: f64,
    },
}

impl StrategyRule {
    pub fn sma_crossover(fast: usize, slow: usize) -> Self {
        StrategyRule::SmaCrossover { fast, slow }
    }

    pub fn rsi_reversal(period: usize) -> Self {
        StrategyRule::RsiReversal {
            period,
            oversold: DEFAULT_OVERSOLD,
            overbought: DEFAULT_OVERBOUGHT,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            StrategyRule::SmaCrossover { .. } => "sma_crossover",
            StrategyRule::RsiReversal { .. } => "rsi_reversal",
        }
    }

    /// Reject bad parameters before any computation begins.
    pub fn validate(&self) -> Result<()> {
        match *self {
            StrategyRule::SmaCrossover { fast, slow } => {
                if fast == 0 || slow == 0 {
                    return Err(Error::InvalidParameter(
                        "SMA periods must be positive".to_string(),
                    ));
                }
                if fast >= slow {
                    return Err(Error::InvalidParameter(format!(
                        "Fast period ({}) must be smaller than slow period ({})",
                        fast, slow
                    )));
                }
            }
            StrategyRule::RsiReversal {
                period,
                oversold,
                overbought,
            } => {
                if period == 0 {
                    return Err(Error::InvalidParameter(
                        "RSI period must be positive".to_string(),
                    ));
                }
                if oversold >= overbought {
                    return Err(Error::InvalidParameter(format!(
                        "Oversold threshold ({}) must be below overbought ({})",
                        oversold, overbought
                    )));
                }
            }
        }
        Ok(())
    }

    /// Bars consumed before the first signal can fire.
    pub fn warm_up(&self) -> usize {
        match *self {
            StrategyRule::SmaCrossover { slow, .. } => slow,
            StrategyRule::RsiReversal { period, .. } => period + 1,
        }
    }

    /// Resolve a strategy id plus optional parameter overrides into a
    /// validated rule.
    pub fn from_id(
        id: &str,
        fast: Option<usize>,
        slow: Option<usize>,
        rsi_period: Option<usize>,
    ) -> Result<Self> {
        let rule = match id.to_lowercase().as_str() {
            "sma_crossover" => StrategyRule::SmaCrossover {
                fast: fast.unwrap_or(DEFAULT_FAST_PERIOD),
                slow: slow.unwrap_or(DEFAULT_SLOW_PERIOD),
            },
            "rsi_reversal" => StrategyRule::rsi_reversal(rsi_period.unwrap_or(DEFAULT_RSI_PERIOD)),
            _ => {
                let available: Vec<&str> = BUILTIN_STRATEGIES.keys().map(|k| k.as_str()).collect();
                return Err(Error::UnknownStrategy(format!(
                    "{} (available: {})",
                    id,
                    available.join(", ")
                )));
            }
        };
        rule.validate()?;
        Ok(rule)
    }
}

/// Strategy descriptor shown by `strategy list` / `strategy get`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Strategy {
    pub id: String,
    pub name: String,
    pub description: String,
    pub parameters: StrategyParameters,
}

/// Default parameters of a built-in strategy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategyParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fast_period: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slow_period: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi_period: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oversold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overbought: Option<f64>,
}

/// Built-in backtest strategies.
pub static BUILTIN_STRATEGIES: LazyLock<HashMap<String, Strategy>> = LazyLock::new(|| {
    let mut strategies = HashMap::new();

    strategies.insert(
        "sma_crossover".to_string(),
        Strategy {
            id: "sma_crossover".to_string(),
            name: "SMA Crossover".to_string(),
            description: "Buy when the fast SMA crosses above the slow SMA, sell on the reverse cross".to_string(),
            parameters: StrategyParameters {
                fast_period: Some(DEFAULT_FAST_PERIOD),
                slow_period: Some(DEFAULT_SLOW_PERIOD),
                ..Default::default()
            },
        },
    );

    strategies.insert(
        "rsi_reversal".to_string(),
        Strategy {
            id: "rsi_reversal".to_string(),
            name: "RSI Reversal".to_string(),
            description: "Buy when RSI turns up from oversold (<30), sell when it turns down from overbought (>70)".to_string(),
            parameters: StrategyParameters {
                rsi_period: Some(DEFAULT_RSI_PERIOD),
                oversold: Some(DEFAULT_OVERSOLD),
                overbought: Some(DEFAULT_OVERBOUGHT),
                ..Default::default()
            },
        },
    );

    strategies
});

/// List all available strategies.
pub fn list_strategies() -> Vec<Strategy> {
    let mut strategies: Vec<Strategy> = BUILTIN_STRATEGIES.values().cloned().collect();
    strategies.sort_by(|a, b| a.id.cmp(&b.id));
    strategies
}

/// Get a specific strategy by id.
pub fn get_strategy(id: &str) -> Option<Strategy> {
    BUILTIN_STRATEGIES.get(&id.to_lowercase()).cloned()
}
