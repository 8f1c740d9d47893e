//! Portfolio Types
//!
//! One portfolio per user: open positions plus aggregate valuation, PnL,
//! allocation and exposure breakdowns.

use crate::types::SignalKind;
use serde::{Deserialize, Serialize};

/// Which way a position points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionSide {
    Long,
    Short,
}

impl std::fmt::Display for PositionSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionSide::Long => write!(f, "long"),
            PositionSide::Short => write!(f, "short"),
        }
    }
}

/// Minimal asset reference carried by a position.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRef {
    pub symbol: String,
    pub name: String,
}

/// An open holding inside a portfolio, created when a trade fills.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    /// Unique position ID.
    pub id: String,
    pub asset: AssetRef,
    /// Strategy kind of the originating signal.
    #[serde(rename = "type")]
    pub kind: SignalKind,
    pub side: PositionSide,
    /// Position size in asset units.
    pub size: f64,
    pub entry_price: f64,
    pub current_price: f64,
    /// Mark value: size * current price.
    pub value: f64,
    /// Cost basis at open.
    pub invested: f64,
    /// (current - entry) * size * leverage, negated for shorts.
    pub unrealized_pnl: f64,
    pub leverage: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    /// Unix timestamp (milliseconds) when opened.
    pub opened_at: i64,
    /// Signal this position was opened from.
    pub signal_id: String,
}

impl Position {
    /// Re-mark the position at a new price, refreshing value and
    /// unrealized PnL.
    pub fn refresh(&mut self, current_price: f64) {
        self.current_price = current_price;
        self.value = self.size * current_price;
        let delta = (current_price - self.entry_price) * self.size * self.leverage;
        self.unrealized_pnl = match self.side {
            PositionSide::Long => delta,
            PositionSide::Short => -delta,
        };
    }
}

/// Percentage of portfolio value held per strategy kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    pub quick: f64,
    pub spot: f64,
    pub hodl: f64,
    pub degen: f64,
}

impl Allocation {
    /// Sum of all buckets. At most 100 barring rounding.
    pub fn total(&self) -> f64 {
        self.quick + self.spot + self.hodl + self.degen
    }
}

/// Percentage of portfolio value concentrated per asset bucket.
///
/// Symbols are matched case-insensitively against btc/eth/sol; everything
/// else lands in `other`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exposure {
    pub btc: f64,
    pub eth: f64,
    pub sol: f64,
    pub other: f64,
}

impl Exposure {
    /// Sum of all buckets. At most 100 barring rounding.
    pub fn total(&self) -> f64 {
        self.btc + self.eth + self.sol + self.other
    }
}

/// A user's portfolio. One per user, created on first trade.
///
/// `allocation` and `exposure` are always recomputed in full from
/// `positions` after any mutation; they are never patched incrementally.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    /// Owner's user ID.
    pub user_id: String,
    /// Sum of position mark values.
    pub total_value: f64,
    /// Sum of position cost bases.
    pub total_invested: f64,
    /// Sum of position unrealized PnL.
    pub unrealized_pnl: f64,
    /// PnL banked from closed positions.
    pub realized_pnl: f64,
    /// realized + unrealized.
    pub total_pnl: f64,
    pub allocation: Allocation,
    pub exposure: Exposure,
    pub positions: Vec<Position>,
    /// Optimistic-concurrency version, bumped on every write.
    #[serde(default)]
    pub version: i64,
    /// Unix timestamp (milliseconds) when created.
    pub created_at: i64,
    /// Unix timestamp (milliseconds) when last updated.
    pub updated_at: i64,
}

impl Portfolio {
    /// Create an empty portfolio for a user.
    pub fn new(user_id: String) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            user_id,
            total_value: 0.0,
            total_invested: 0.0,
            unrealized_pnl: 0.0,
            realized_pnl: 0.0,
            total_pnl: 0.0,
            allocation: Allocation::default(),
            exposure: Exposure::default(),
            positions: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }
}
