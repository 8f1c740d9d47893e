//! Trade Types
//!
//! Append-only trade history plus the rolling performance statistics
//! computed over it.

use crate::types::{AssetRef, SignalKind};
use serde::{Deserialize, Serialize};

/// Order side of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl std::fmt::Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "buy"),
            TradeSide::Sell => write!(f, "sell"),
        }
    }
}

/// Lifecycle status of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeStatus {
    Pending,
    Filled,
    Partial,
    Cancelled,
    Rejected,
}

impl TradeStatus {
    /// Whether this status is terminal. Terminal trades are immutable.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TradeStatus::Filled | TradeStatus::Cancelled | TradeStatus::Rejected
        )
    }
}

impl std::fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeStatus::Pending => write!(f, "pending"),
            TradeStatus::Filled => write!(f, "filled"),
            TradeStatus::Partial => write!(f, "partial"),
            TradeStatus::Cancelled => write!(f, "cancelled"),
            TradeStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// Fees charged on a trade.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeFees {
    pub trading: f64,
    pub gas: f64,
    pub total: f64,
}

/// Fill details, set when a trade transitions to filled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeExecution {
    pub filled_size: f64,
    pub avg_price: f64,
    pub filled_value: f64,
    /// Unix timestamp (milliseconds) of the fill.
    pub filled_at: i64,
    pub tx_hash: String,
}

/// PnL breakdown for a trade.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradePnl {
    pub realized: f64,
    pub unrealized: f64,
    pub total: f64,
}

/// Per-trade performance figures.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradePerformance {
    /// Return percent at fill, leverage applied.
    pub return_percent: f64,
    /// Minutes between creation and fill.
    pub duration_minutes: i64,
    /// Worst return seen, <= 0.
    pub max_drawdown: f64,
    /// Best return seen, >= 0.
    pub max_gain: f64,
}

/// A trade against a signal. Trades are append-only history: terminal
/// states are immutable and nothing is ever deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    /// Unique trade ID.
    pub trade_id: String,
    pub user_id: String,
    /// Signal this trade executes.
    pub signal_id: String,
    pub asset: AssetRef,
    /// Strategy kind of the originating signal.
    #[serde(rename = "type")]
    pub kind: SignalKind,
    pub side: TradeSide,
    /// Requested size in asset units.
    pub size: f64,
    /// Requested price.
    pub price: f64,
    /// size * price.
    pub value: f64,
    pub leverage: f64,
    pub fees: TradeFees,
    pub status: TradeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution: Option<TradeExecution>,
    pub pnl: TradePnl,
    pub performance: TradePerformance,
    /// Unix timestamp (milliseconds) when created.
    pub created_at: i64,
}

/// Rolling window for performance queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceWindow {
    Day,
    Week,
    Month,
    Year,
    #[default]
    All,
}

impl PerformanceWindow {
    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "day" | "24h" | "1d" => Some(Self::Day),
            "week" | "7d" | "1w" => Some(Self::Week),
            "month" | "30d" | "1m" => Some(Self::Month),
            "year" | "365d" | "1y" => Some(Self::Year),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    /// Inclusive lower bound (milliseconds) for trades in this window.
    pub fn cutoff_millis(&self, now: i64) -> i64 {
        const DAY_MS: i64 = 24 * 60 * 60 * 1000;
        match self {
            Self::Day => now - DAY_MS,
            Self::Week => now - 7 * DAY_MS,
            Self::Month => now - 30 * DAY_MS,
            Self::Year => now - 365 * DAY_MS,
            Self::All => 0,
        }
    }
}

/// Aggregate performance over a user's filled trades in a window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceStats {
    pub total_trades: u32,
    pub winning_trades: u32,
    pub losing_trades: u32,
    pub total_pnl: f64,
    pub total_fees: f64,
    /// winning / total * 100, 0 when no trades.
    pub win_rate: f64,
    /// Mean of per-trade return percent.
    pub avg_return: f64,
    /// Peak-to-trough decline on cumulative return percent, <= 0.
    pub max_drawdown: f64,
    /// Best single-trade return percent in the window.
    pub max_gain: f64,
    /// Annualized excess return over annualized volatility; 0 on zero
    /// variance.
    pub sharpe_ratio: f64,
}
