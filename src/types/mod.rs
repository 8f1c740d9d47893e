pub mod market;
pub mod portfolio;
pub mod signal;
pub mod trade;

pub use market::{
    Features, LiquidityLevel, MarketSnapshot, MomentumLevel, Trend, VolatilityLevel,
};
pub use portfolio::{Allocation, AssetRef, Exposure, Portfolio, Position, PositionSide};
pub use signal::{
    ExecutionPlan, RiskLevel, RoiBand, Signal, SignalAction, SignalAsset, SignalKind,
    SignalStatus, TimeUnit, Timeframe,
};
pub use trade::{
    PerformanceStats, PerformanceWindow, Trade, TradeExecution, TradeFees, TradePerformance,
    TradePnl, TradeSide, TradeStatus,
};
