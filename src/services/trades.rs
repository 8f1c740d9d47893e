//! Trade execution.
//!
//! Trades run against active signals: placed as `pending`, then either
//! filled (which opens the position and marks the signal executed) or
//! cancelled. Terminal trades are immutable, and the history is
//! append-only.

use crate::error::{AppError, Result};
use crate::services::{PortfolioService, SignalStore, SqliteStore};
use crate::types::{
    AssetRef, Position, PositionSide, SignalAction, SignalStatus, Trade, TradeExecution,
    TradeFees, TradePerformance, TradePnl, TradeSide, TradeStatus,
};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Trading fee as a fraction of trade value.
const TRADING_FEE_PCT: f64 = 0.001;

/// Trade execution service.
pub struct TradeService {
    sqlite: Arc<SqliteStore>,
    signals: Arc<SignalStore>,
    portfolios: Arc<PortfolioService>,
}

impl TradeService {
    /// Create a new trade service.
    pub fn new(
        sqlite: Arc<SqliteStore>,
        signals: Arc<SignalStore>,
        portfolios: Arc<PortfolioService>,
    ) -> Arc<Self> {
        Arc::new(Self {
            sqlite,
            signals,
            portfolios,
        })
    }

    /// Place a pending trade against an active signal.
    pub fn place(&self, user_id: &str, signal_id: &str, size: f64) -> Result<Trade> {
        if !size.is_finite() || size <= 0.0 {
            return Err(AppError::Validation(format!("invalid trade size {}", size)));
        }

        let signal = self.signals.get(signal_id)?;
        if signal.status != SignalStatus::Active {
            return Err(AppError::Validation(format!(
                "signal {} is {}, not active",
                signal_id, signal.status
            )));
        }

        let side = match signal.action {
            SignalAction::Buy => TradeSide::Buy,
            SignalAction::Sell => TradeSide::Sell,
            SignalAction::Hold => {
                return Err(AppError::Validation(
                    "cannot trade against a hold signal".to_string(),
                ))
            }
        };

        let price = signal.execution.entry_price;
        let value = size * price;
        let trading_fee = value * TRADING_FEE_PCT;
        let gas = signal.execution.gas_estimate;

        let trade = Trade {
            trade_id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            signal_id: signal_id.to_string(),
            asset: AssetRef {
                symbol: signal.asset.symbol.clone(),
                name: signal.asset.name.clone(),
            },
            kind: signal.kind,
            side,
            size,
            price,
            value,
            leverage: signal.leverage,
            fees: TradeFees {
                trading: trading_fee,
                gas,
                total: trading_fee + gas,
            },
            status: TradeStatus::Pending,
            execution: None,
            pnl: TradePnl::default(),
            performance: TradePerformance::default(),
            created_at: chrono::Utc::now().timestamp_millis(),
        };

        self.sqlite.insert_trade(&trade)?;
        debug!(
            "Placed trade {} ({} {} {}) for user {}",
            trade.trade_id, trade.side, trade.size, trade.asset.symbol, user_id
        );
        Ok(trade)
    }

    /// Fill a pending trade at the given average price.
    ///
    /// Computes PnL against the requested price, opens the position in the
    /// user's portfolio and marks the originating signal executed.
    pub fn fill(&self, trade_id: &str, avg_price: f64) -> Result<Trade> {
        if !avg_price.is_finite() || avg_price <= 0.0 {
            return Err(AppError::Validation(format!(
                "invalid fill price {}",
                avg_price
            )));
        }

        let mut trade = self.get(trade_id)?;
        if trade.status != TradeStatus::Pending {
            return Err(AppError::invalid_transition(trade.status, TradeStatus::Filled));
        }

        let now = chrono::Utc::now().timestamp_millis();
        let filled_value = trade.size * avg_price;
        trade.execution = Some(TradeExecution {
            filled_size: trade.size,
            avg_price,
            filled_value,
            filled_at: now,
            tx_hash: format!("0x{}", Uuid::new_v4().simple()),
        });

        let delta = (avg_price - trade.price) * trade.size * trade.leverage;
        let unrealized = match trade.side {
            TradeSide::Buy => delta,
            TradeSide::Sell => -delta,
        };
        trade.pnl = TradePnl {
            realized: 0.0,
            unrealized,
            total: unrealized,
        };

        let return_percent = if trade.value > 0.0 {
            unrealized / trade.value * 100.0
        } else {
            0.0
        };
        trade.performance = TradePerformance {
            return_percent,
            duration_minutes: (now - trade.created_at) / 60_000,
            max_drawdown: return_percent.min(0.0),
            max_gain: return_percent.max(0.0),
        };

        trade.status = TradeStatus::Filled;
        self.sqlite.update_trade(&trade)?;

        self.open_position_for(&trade, avg_price)?;

        // A second fill against the same signal finds it already executed;
        // that is not this trade's problem.
        match self.signals.transition(&trade.signal_id, SignalStatus::Executed) {
            Ok(_) => {}
            Err(AppError::InvalidTransition { .. }) => {
                debug!("Signal {} already terminal", trade.signal_id)
            }
            Err(e) => return Err(e),
        }

        info!(
            "Filled trade {} at {:.4} (return {:.2}%)",
            trade.trade_id, avg_price, return_percent
        );
        Ok(trade)
    }

    /// Cancel a pending trade.
    pub fn cancel(&self, trade_id: &str) -> Result<Trade> {
        let mut trade = self.get(trade_id)?;
        if trade.status != TradeStatus::Pending {
            return Err(AppError::invalid_transition(
                trade.status,
                TradeStatus::Cancelled,
            ));
        }
        trade.status = TradeStatus::Cancelled;
        self.sqlite.update_trade(&trade)?;
        debug!("Cancelled trade {}", trade.trade_id);
        Ok(trade)
    }

    /// Get a trade by id.
    pub fn get(&self, trade_id: &str) -> Result<Trade> {
        self.sqlite
            .get_trade(trade_id)?
            .ok_or_else(|| AppError::NotFound(format!("trade {}", trade_id)))
    }

    fn open_position_for(&self, trade: &Trade, avg_price: f64) -> Result<()> {
        let signal = self.signals.get(&trade.signal_id)?;
        let execution = trade
            .execution
            .as_ref()
            .ok_or_else(|| AppError::Validation("fill without execution".to_string()))?;

        let position = Position {
            id: Uuid::new_v4().to_string(),
            asset: trade.asset.clone(),
            kind: trade.kind,
            side: match trade.side {
                TradeSide::Buy => PositionSide::Long,
                TradeSide::Sell => PositionSide::Short,
            },
            size: execution.filled_size,
            entry_price: avg_price,
            current_price: avg_price,
            value: execution.filled_value,
            invested: execution.filled_value,
            unrealized_pnl: 0.0,
            leverage: trade.leverage,
            stop_loss: signal.execution.stop_loss,
            take_profit: signal.execution.take_profit,
            opened_at: execution.filled_at,
            signal_id: trade.signal_id.clone(),
        };

        self.portfolios.open_position(&trade.user_id, position)?;
        Ok(())
    }
}
