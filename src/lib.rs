//! Omen - Cryptocurrency signal generation and portfolio analytics server
//!
//! Turns market snapshots into typed trading signals through a
//! deterministic rule set, tracks their lifecycle, and values user
//! portfolios and trade performance over them.

pub mod config;
pub mod error;
pub mod services;
pub mod sources;
pub mod types;

pub use error::{AppError, Result};
pub use services::{
    PerformanceService, PortfolioService, SignalEngine, SignalStore, SqliteStore, TradeService,
};
pub use types::*;
