//! Performance analysis over a user's filled trades.
//!
//! Win rate, average return, peak-to-trough drawdown and an annualized
//! Sharpe ratio, computed over a rolling window of trade history.

use crate::error::Result;
use crate::services::SqliteStore;
use crate::types::{PerformanceStats, PerformanceWindow, Trade, TradeStatus};
use std::sync::Arc;
use tracing::debug;

/// Annual risk-free rate used by the Sharpe ratio.
const RISK_FREE_RATE: f64 = 0.02;
/// Annualization factor for per-trade returns.
const PERIODS_PER_YEAR: f64 = 365.0;

/// Compute aggregate statistics over filled trades.
///
/// Trades are processed in fill order; drawdown is the worst peak-to-trough
/// decline of the cumulative return series, reported as a non-positive
/// percentage.
pub fn analyze(trades: &[Trade]) -> PerformanceStats {
    let returns: Vec<f64> = trades
        .iter()
        .map(|t| t.performance.return_percent)
        .collect();

    if returns.is_empty() {
        return PerformanceStats::default();
    }

    let total_trades = returns.len() as u32;
    let winning_trades = returns.iter().filter(|&&r| r > 0.0).count() as u32;
    let losing_trades = returns.iter().filter(|&&r| r < 0.0).count() as u32;

    let total_pnl: f64 = trades.iter().map(|t| t.pnl.total).sum();
    let total_fees: f64 = trades.iter().map(|t| t.fees.total).sum();

    let win_rate = winning_trades as f64 / total_trades as f64 * 100.0;
    let avg_return = returns.iter().sum::<f64>() / returns.len() as f64;
    let max_gain = returns.iter().cloned().fold(f64::MIN, f64::max);

    // Peak-to-trough on the cumulative return series, starting from a flat
    // account: a losing first trade already counts as drawdown.
    let mut cumulative = 0.0;
    let mut peak = 0.0;
    let mut max_decline = 0.0f64;
    for r in &returns {
        cumulative += r;
        peak = f64::max(peak, cumulative);
        max_decline = f64::max(max_decline, peak - cumulative);
    }
    let max_drawdown = -max_decline;

    PerformanceStats {
        total_trades,
        winning_trades,
        losing_trades,
        total_pnl,
        total_fees,
        win_rate,
        avg_return,
        max_drawdown,
        max_gain,
        sharpe_ratio: sharpe_ratio(&returns, avg_return),
    }
}

/// Annualized Sharpe ratio over per-trade return percentages.
///
/// Population standard deviation; zero variance yields zero rather than a
/// division.
fn sharpe_ratio(returns: &[f64], mean: f64) -> f64 {
    let variance =
        returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / returns.len() as f64;
    let std_dev = variance.sqrt();
    if std_dev == 0.0 {
        return 0.0;
    }

    let annualized_mean = mean * PERIODS_PER_YEAR;
    let annualized_std = std_dev * PERIODS_PER_YEAR.sqrt();
    (annualized_mean - RISK_FREE_RATE * 100.0) / annualized_std
}

/// Performance query service.
pub struct PerformanceService {
    sqlite: Arc<SqliteStore>,
}

impl PerformanceService {
    /// Create a new performance service.
    pub fn new(sqlite: Arc<SqliteStore>) -> Arc<Self> {
        Arc::new(Self { sqlite })
    }

    /// Statistics over a user's filled trades inside the window.
    pub fn get_performance(
        &self,
        user_id: &str,
        window: PerformanceWindow,
    ) -> Result<PerformanceStats> {
        let now = chrono::Utc::now().timestamp_millis();
        let since = window.cutoff_millis(now);

        let mut trades: Vec<Trade> = self
            .sqlite
            .user_trades(user_id, since)?
            .into_iter()
            .filter(|t| t.status == TradeStatus::Filled)
            .collect();
        trades.sort_by_key(|t| t.execution.as_ref().map(|e| e.filled_at).unwrap_or(t.created_at));

        debug!(
            "Performance for {} over {:?}: {} filled trades",
            user_id,
            window,
            trades.len()
        );
        Ok(analyze(&trades))
    }
}
