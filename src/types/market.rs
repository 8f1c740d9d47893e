//! Market Data Types
//!
//! Snapshot data supplied by the market data source and the technical
//! features derived from it.

use serde::{Deserialize, Serialize};

/// Point-in-time market data for a single asset.
///
/// Snapshots are ephemeral: they are fetched (or served from the snapshot
/// cache) on demand and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    /// Ticker symbol (e.g. "BTC").
    pub symbol: String,
    /// Human-readable asset name (e.g. "Bitcoin").
    pub name: String,
    /// Current price in USD.
    pub current_price: f64,
    /// Market capitalization in USD.
    pub market_cap: f64,
    /// Trading volume over the last 24 hours in USD.
    pub volume_24h: f64,
    /// Price change over the last 24 hours, percent.
    pub price_change_pct_24h: f64,
    /// Price change over the last 7 days, percent.
    pub price_change_pct_7d: f64,
}

impl MarketSnapshot {
    /// Volume-to-market-cap ratio, the liquidity input for scoring.
    ///
    /// A zero (or negative, from a malformed upstream row) market cap yields
    /// `0.0` rather than dividing.
    pub fn volume_ratio(&self) -> f64 {
        if self.market_cap <= 0.0 {
            0.0
        } else {
            self.volume_24h / self.market_cap.max(1.0)
        }
    }
}

/// Price trend classification over the 24h/7d windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    StrongBullish,
    Bullish,
    Sideways,
    Bearish,
    StrongBearish,
}

impl Trend {
    /// Whether this trend is in the bullish family.
    pub fn is_bullish(&self) -> bool {
        matches!(self, Trend::Bullish | Trend::StrongBullish)
    }

    /// Whether this trend is in the bearish family.
    pub fn is_bearish(&self) -> bool {
        matches!(self, Trend::Bearish | Trend::StrongBearish)
    }

    /// Whether this is one of the strong variants.
    pub fn is_strong(&self) -> bool {
        matches!(self, Trend::StrongBullish | Trend::StrongBearish)
    }
}

/// Volatility bucket derived from the absolute 24h change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolatilityLevel {
    Low,
    Medium,
    High,
}

impl VolatilityLevel {
    /// Numeric volatility score used by downstream consumers.
    pub fn score(&self) -> f64 {
        match self {
            VolatilityLevel::Low => 20.0,
            VolatilityLevel::Medium => 50.0,
            VolatilityLevel::High => 80.0,
        }
    }
}

/// Momentum bucket derived from 24h change and volume ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MomentumLevel {
    Weak,
    Moderate,
    Strong,
}

/// Liquidity bucket derived from the volume ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiquidityLevel {
    Low,
    Medium,
    High,
}

/// Technical features derived from a single snapshot.
///
/// All bounded fields are clamped to their documented ranges before use.
/// `support` and `resistance` are display-only values inside a bounded
/// random band; no consumer may rely on their exact value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Features {
    pub trend: Trend,
    pub volatility: VolatilityLevel,
    /// Numeric volatility score, one of 20/50/80.
    pub volatility_score: f64,
    pub momentum: MomentumLevel,
    pub liquidity: LiquidityLevel,
    /// Volume-to-market-cap ratio the momentum/liquidity buckets came from.
    pub volume_ratio: f64,
    /// Linear RSI approximation from the 24h change, clamped to 0-100.
    /// Not a true RSI.
    pub rsi_approx: f64,
    /// Linear MACD proxy.
    pub macd_approx: f64,
    /// Display-only support level, within [0.95, 1.00] x price.
    pub support: f64,
    /// Display-only resistance level, within [1.05, 1.15] x price.
    pub resistance: f64,
}
