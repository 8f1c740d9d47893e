//! Signal Types
//!
//! Generated trading signals: strategy kind, action, confidence, execution
//! levels and lifecycle status.

use serde::{Deserialize, Serialize};

/// Strategy kind a signal belongs to.
///
/// Each kind carries its own ROI band, timeframe, leverage range, execution
/// levels and expiry; the table lives on this enum so every consumer reads
/// the same numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// Short momentum play, minutes to an hour.
    Quick,
    /// Unleveraged spot entry over a few hours.
    Spot,
    /// Long hold, days to weeks.
    Hodl,
    /// High-leverage, high-volatility play.
    Degen,
}

impl SignalKind {
    /// All kinds, for the random fallback when no selection rule matches.
    pub const ALL: [SignalKind; 4] = [
        SignalKind::Quick,
        SignalKind::Spot,
        SignalKind::Hodl,
        SignalKind::Degen,
    ];

    /// Base expected-ROI band (min, max) in percent, before confidence scaling.
    pub fn roi_base(&self) -> (f64, f64) {
        match self {
            SignalKind::Quick => (5.0, 25.0),
            SignalKind::Spot => (2.0, 8.0),
            SignalKind::Hodl => (50.0, 200.0),
            SignalKind::Degen => (20.0, 50.0),
        }
    }

    /// Holding timeframe for this kind.
    pub fn timeframe(&self) -> Timeframe {
        match self {
            SignalKind::Quick => Timeframe { min: 5, max: 60, unit: TimeUnit::Minutes },
            SignalKind::Spot => Timeframe { min: 1, max: 3, unit: TimeUnit::Hours },
            SignalKind::Hodl => Timeframe { min: 7, max: 30, unit: TimeUnit::Days },
            SignalKind::Degen => Timeframe { min: 1, max: 6, unit: TimeUnit::Hours },
        }
    }

    /// Allowed leverage range (min, max).
    pub fn leverage_range(&self) -> (f64, f64) {
        match self {
            SignalKind::Quick => (3.0, 5.0),
            SignalKind::Spot => (1.0, 1.0),
            SignalKind::Hodl => (1.0, 1.0),
            SignalKind::Degen => (5.0, 10.0),
        }
    }

    /// Take-profit distance from entry, as a fraction.
    pub fn take_profit_pct(&self) -> f64 {
        match self {
            SignalKind::Quick => 0.05,
            SignalKind::Spot => 0.03,
            SignalKind::Hodl => 0.20,
            SignalKind::Degen => 0.10,
        }
    }

    /// Stop-loss distance from entry, as a fraction. Uniform across kinds.
    pub fn stop_loss_pct(&self) -> f64 {
        0.02
    }

    /// Base position size as a percentage of portfolio, before confidence
    /// scaling.
    pub fn base_position_pct(&self) -> f64 {
        match self {
            SignalKind::Quick => 3.0,
            SignalKind::Spot => 5.0,
            SignalKind::Hodl => 10.0,
            SignalKind::Degen => 2.0,
        }
    }

    /// How long a signal of this kind stays active.
    pub fn expiry(&self) -> chrono::Duration {
        match self {
            SignalKind::Quick => chrono::Duration::hours(2),
            SignalKind::Spot => chrono::Duration::hours(6),
            SignalKind::Hodl => chrono::Duration::days(7),
            SignalKind::Degen => chrono::Duration::hours(4),
        }
    }
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalKind::Quick => write!(f, "quick"),
            SignalKind::Spot => write!(f, "spot"),
            SignalKind::Hodl => write!(f, "hodl"),
            SignalKind::Degen => write!(f, "degen"),
        }
    }
}

/// Recommended action for a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalAction {
    Buy,
    Sell,
    Hold,
}

impl std::fmt::Display for SignalAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalAction::Buy => write!(f, "buy"),
            SignalAction::Sell => write!(f, "sell"),
            SignalAction::Hold => write!(f, "hold"),
        }
    }
}

/// Risk classification of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Lifecycle status of a signal.
///
/// Transitions only leave `Active`; every other status is terminal and the
/// signal is immutable once it gets there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalStatus {
    Active,
    Executed,
    Expired,
    Cancelled,
}

impl SignalStatus {
    /// Whether a transition from `self` to `target` is legal.
    pub fn can_transition(&self, target: SignalStatus) -> bool {
        matches!(self, SignalStatus::Active)
            && matches!(
                target,
                SignalStatus::Executed | SignalStatus::Expired | SignalStatus::Cancelled
            )
    }

    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SignalStatus::Active)
    }
}

impl std::fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalStatus::Active => write!(f, "active"),
            SignalStatus::Executed => write!(f, "executed"),
            SignalStatus::Expired => write!(f, "expired"),
            SignalStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Unit for a signal timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Minutes,
    Hours,
    Days,
}

/// Expected holding window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeframe {
    pub min: u32,
    pub max: u32,
    pub unit: TimeUnit,
}

/// Expected-ROI band in percent, scaled by confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoiBand {
    pub min: f64,
    pub max: f64,
}

/// Asset block embedded in a signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalAsset {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub market_cap: f64,
    pub volume_24h: f64,
}

/// Execution levels attached to a signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPlan {
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    /// Expected slippage on execution, percent.
    pub slippage_pct: f64,
    /// Flat gas estimate in USD.
    pub gas_estimate: f64,
    /// Per-unit PnL at the take-profit level, leverage applied.
    pub projected_pnl: f64,
}

/// A generated trading signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    /// Unique signal ID.
    pub signal_id: String,
    /// Strategy kind.
    #[serde(rename = "type")]
    pub kind: SignalKind,
    pub asset: SignalAsset,
    pub action: SignalAction,
    /// Heuristic confidence, integer in [60, 95].
    pub confidence: u8,
    pub expected_roi: RoiBand,
    pub timeframe: Timeframe,
    pub risk_level: RiskLevel,
    /// Leverage multiplier, >= 1.
    pub leverage: f64,
    /// Suggested position size as a percentage of portfolio, in [1, 100].
    pub position_size_pct: u8,
    pub execution: ExecutionPlan,
    pub status: SignalStatus,
    /// Unix timestamp (milliseconds) after which the signal expires.
    pub expires_at: i64,
    /// Unix timestamp (milliseconds) when generated.
    pub created_at: i64,
}
