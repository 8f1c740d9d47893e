//! Portfolio valuation.
//!
//! Allocation and exposure are free functions over the positions list and
//! are always recomputed in full after any mutation; per-user mutations run
//! under a lock so concurrent fills for the same user serialize.

use crate::error::{AppError, Result};
use crate::services::SqliteStore;
use crate::types::{Allocation, Exposure, Portfolio, Position, SignalKind};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Percentage of portfolio value held per strategy kind.
///
/// Returns all-zero when the positions are worthless in aggregate.
pub fn compute_allocation(positions: &[Position]) -> Allocation {
    let total: f64 = positions.iter().map(|p| p.value).sum();
    let mut allocation = Allocation::default();
    if total == 0.0 {
        return allocation;
    }

    for position in positions {
        let pct = 100.0 * position.value / total;
        match position.kind {
            SignalKind::Quick => allocation.quick += pct,
            SignalKind::Spot => allocation.spot += pct,
            SignalKind::Hodl => allocation.hodl += pct,
            SignalKind::Degen => allocation.degen += pct,
        }
    }
    allocation
}

/// Percentage of portfolio value per asset bucket, case-insensitive on the
/// symbol; anything that is not btc/eth/sol lands in `other`.
pub fn compute_exposure(positions: &[Position]) -> Exposure {
    let total: f64 = positions.iter().map(|p| p.value).sum();
    let mut exposure = Exposure::default();
    if total == 0.0 {
        return exposure;
    }

    for position in positions {
        let pct = 100.0 * position.value / total;
        match position.asset.symbol.to_lowercase().as_str() {
            "btc" => exposure.btc += pct,
            "eth" => exposure.eth += pct,
            "sol" => exposure.sol += pct,
            _ => exposure.other += pct,
        }
    }
    exposure
}

/// Recompute every aggregate from the positions list. Never patches
/// incrementally.
pub fn recompute(portfolio: &mut Portfolio) {
    portfolio.total_value = portfolio.positions.iter().map(|p| p.value).sum();
    portfolio.total_invested = portfolio.positions.iter().map(|p| p.invested).sum();
    portfolio.unrealized_pnl = portfolio.positions.iter().map(|p| p.unrealized_pnl).sum();
    portfolio.total_pnl = portfolio.realized_pnl + portfolio.unrealized_pnl;
    portfolio.allocation = compute_allocation(&portfolio.positions);
    portfolio.exposure = compute_exposure(&portfolio.positions);
    portfolio.updated_at = chrono::Utc::now().timestamp_millis();
}

/// Portfolio valuation service.
pub struct PortfolioService {
    sqlite: Arc<SqliteStore>,
    /// Per-user write locks.
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl PortfolioService {
    /// Create a new portfolio service.
    pub fn new(sqlite: Arc<SqliteStore>) -> Arc<Self> {
        Arc::new(Self {
            sqlite,
            locks: DashMap::new(),
        })
    }

    fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Get a user's portfolio.
    pub fn get(&self, user_id: &str) -> Result<Portfolio> {
        self.sqlite
            .get_portfolio(user_id)?
            .ok_or_else(|| AppError::NotFound(format!("portfolio {}", user_id)))
    }

    /// Re-mark every position against fresh prices and recompute the
    /// aggregates. Symbols missing from the price map keep their last mark.
    pub fn refresh(&self, user_id: &str, prices: &HashMap<String, f64>) -> Result<Portfolio> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().unwrap();

        let mut portfolio = self.get(user_id)?;
        for position in &mut portfolio.positions {
            if let Some(price) = prices.get(&position.asset.symbol.to_lowercase()) {
                position.refresh(*price);
            } else {
                // Keep the stored mark; still refresh derived fields.
                position.refresh(position.current_price);
            }
        }
        recompute(&mut portfolio);
        self.save(&mut portfolio)?;

        debug!(
            "Refreshed portfolio {}: value {:.2}, pnl {:.2}",
            user_id, portfolio.total_value, portfolio.total_pnl
        );
        Ok(portfolio)
    }

    /// Add a position created by a trade fill. Creates the portfolio on the
    /// user's first trade.
    pub fn open_position(&self, user_id: &str, position: Position) -> Result<Portfolio> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().unwrap();

        let mut portfolio = match self.sqlite.get_portfolio(user_id)? {
            Some(p) => p,
            None => {
                info!("Creating portfolio for user {}", user_id);
                Portfolio::new(user_id.to_string())
            }
        };

        portfolio.positions.push(position);
        recompute(&mut portfolio);
        self.save(&mut portfolio)?;
        Ok(portfolio)
    }

    /// Close a position: its unrealized PnL is folded into realized PnL
    /// (total PnL is unchanged by the close), the position is removed, and
    /// the aggregates are recomputed.
    pub fn close_position(&self, user_id: &str, position_id: &str) -> Result<Portfolio> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().unwrap();

        let mut portfolio = self.get(user_id)?;
        let index = portfolio
            .positions
            .iter()
            .position(|p| p.id == position_id)
            .ok_or_else(|| AppError::NotFound(format!("position {}", position_id)))?;

        let closed = portfolio.positions.remove(index);
        portfolio.realized_pnl += closed.unrealized_pnl;
        recompute(&mut portfolio);
        self.save(&mut portfolio)?;

        info!(
            "Closed position {} for user {}: realized {:.2}",
            position_id, user_id, closed.unrealized_pnl
        );
        Ok(portfolio)
    }

    fn save(&self, portfolio: &mut Portfolio) -> Result<()> {
        if portfolio.version == 0 {
            portfolio.version = 1;
            match self.sqlite.insert_portfolio(portfolio) {
                Ok(()) => Ok(()),
                Err(AppError::Conflict(_)) => {
                    // Row appeared since load; retry as a versioned update.
                    self.sqlite.update_portfolio(portfolio)
                }
                Err(e) => Err(e),
            }
        } else {
            portfolio.version += 1;
            self.sqlite.update_portfolio(portfolio)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AssetRef, PositionSide};

    fn position(symbol: &str, kind: SignalKind, value: f64) -> Position {
        Position {
            id: uuid::Uuid::new_v4().to_string(),
            asset: AssetRef {
                symbol: symbol.to_string(),
                name: symbol.to_string(),
            },
            kind,
            side: PositionSide::Long,
            size: 1.0,
            entry_price: value,
            current_price: value,
            value,
            invested: value,
            unrealized_pnl: 0.0,
            leverage: 1.0,
            stop_loss: value * 0.98,
            take_profit: value * 1.05,
            opened_at: 0,
            signal_id: "sig".to_string(),
        }
    }

    #[test]
    fn test_allocation_sums_to_100() {
        let positions = vec![
            position("BTC", SignalKind::Quick, 400.0),
            position("ETH", SignalKind::Hodl, 400.0),
            position("SOL", SignalKind::Degen, 200.0),
        ];
        let allocation = compute_allocation(&positions);
        assert!((allocation.total() - 100.0).abs() < 0.01);
        assert!((allocation.quick - 40.0).abs() < 1e-9);
        assert!((allocation.hodl - 40.0).abs() < 1e-9);
        assert!((allocation.degen - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_exposure_buckets_case_insensitive() {
        let positions = vec![
            position("Btc", SignalKind::Quick, 500.0),
            position("DOGE", SignalKind::Degen, 500.0),
        ];
        let exposure = compute_exposure(&positions);
        assert!((exposure.btc - 50.0).abs() < 1e-9);
        assert!((exposure.other - 50.0).abs() < 1e-9);
        assert_eq!(exposure.eth, 0.0);
    }

    #[test]
    fn test_empty_positions_yield_zero_maps() {
        let allocation = compute_allocation(&[]);
        let exposure = compute_exposure(&[]);
        assert_eq!(allocation.total(), 0.0);
        assert_eq!(exposure.total(), 0.0);
    }

    #[test]
    fn test_order_independence() {
        let mut positions = vec![
            position("BTC", SignalKind::Quick, 123.0),
            position("ETH", SignalKind::Spot, 456.0),
            position("SOL", SignalKind::Hodl, 789.0),
        ];
        let before = compute_allocation(&positions);
        positions.reverse();
        let after = compute_allocation(&positions);
        assert!((before.total() - after.total()).abs() < 1e-9);
        assert!((before.quick - after.quick).abs() < 1e-9);
        assert!((before.hodl - after.hodl).abs() < 1e-9);
    }
}
