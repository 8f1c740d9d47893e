//! Performance analyzer tests: win rate, Sharpe, drawdown and windowing.

use omen::services::{analyze, PerformanceService, SqliteStore};
use omen::types::*;
use std::sync::Arc;

fn filled_trade(user: &str, return_percent: f64, pnl: f64, fees: f64, created_at: i64) -> Trade {
    Trade {
        trade_id: uuid::Uuid::new_v4().to_string(),
        user_id: user.to_string(),
        signal_id: "sig".to_string(),
        asset: AssetRef {
            symbol: "BTC".to_string(),
            name: "Bitcoin".to_string(),
        },
        kind: SignalKind::Quick,
        side: TradeSide::Buy,
        size: 1.0,
        price: 100.0,
        value: 100.0,
        leverage: 1.0,
        fees: TradeFees {
            trading: fees,
            gas: 0.0,
            total: fees,
        },
        status: TradeStatus::Filled,
        execution: Some(TradeExecution {
            filled_size: 1.0,
            avg_price: 100.0 + return_percent,
            filled_value: 100.0 + return_percent,
            filled_at: created_at,
            tx_hash: "0xabc".to_string(),
        }),
        pnl: TradePnl {
            realized: 0.0,
            unrealized: pnl,
            total: pnl,
        },
        performance: TradePerformance {
            return_percent,
            duration_minutes: 5,
            max_drawdown: return_percent.min(0.0),
            max_gain: return_percent.max(0.0),
        },
        created_at,
    }
}

#[test]
fn test_empty_history_is_all_zero() {
    let stats = analyze(&[]);
    assert_eq!(stats.total_trades, 0);
    assert_eq!(stats.win_rate, 0.0);
    assert_eq!(stats.sharpe_ratio, 0.0);
    assert_eq!(stats.max_drawdown, 0.0);
}

#[test]
fn test_win_rate_and_totals() {
    let now = chrono::Utc::now().timestamp_millis();
    let trades = vec![
        filled_trade("u", 10.0, 10.0, 0.5, now),
        filled_trade("u", -5.0, -5.0, 0.5, now),
        filled_trade("u", 7.0, 7.0, 0.5, now),
    ];
    let stats = analyze(&trades);

    assert_eq!(stats.total_trades, 3);
    assert_eq!(stats.winning_trades, 2);
    assert_eq!(stats.losing_trades, 1);
    assert!((stats.win_rate - 66.666).abs() < 0.01);
    assert!((stats.avg_return - 4.0).abs() < 1e-9);
    assert!((stats.total_pnl - 12.0).abs() < 1e-9);
    assert!((stats.total_fees - 1.5).abs() < 1e-9);
    assert_eq!(stats.max_gain, 10.0);
}

#[test]
fn test_sharpe_is_zero_on_zero_variance() {
    let now = chrono::Utc::now().timestamp_millis();
    // Identical returns in every trade: no variance, no ratio.
    let trades: Vec<Trade> = (0..5).map(|_| filled_trade("u", 3.0, 3.0, 0.0, now)).collect();
    let stats = analyze(&trades);
    assert_eq!(stats.sharpe_ratio, 0.0);
}

#[test]
fn test_sharpe_sign_follows_mean() {
    let now = chrono::Utc::now().timestamp_millis();
    let winners = vec![
        filled_trade("u", 10.0, 10.0, 0.0, now),
        filled_trade("u", 6.0, 6.0, 0.0, now),
    ];
    assert!(analyze(&winners).sharpe_ratio > 0.0);

    let losers = vec![
        filled_trade("u", -10.0, -10.0, 0.0, now),
        filled_trade("u", -6.0, -6.0, 0.0, now),
    ];
    assert!(analyze(&losers).sharpe_ratio < 0.0);
}

#[test]
fn test_drawdown_is_peak_to_trough_on_cumulative() {
    let now = chrono::Utc::now().timestamp_millis();
    // Cumulative path: 10, -5, 0, -10. Peak 10, trough -10.
    let trades = vec![
        filled_trade("u", 10.0, 10.0, 0.0, now),
        filled_trade("u", -15.0, -15.0, 0.0, now + 1),
        filled_trade("u", 5.0, 5.0, 0.0, now + 2),
        filled_trade("u", -10.0, -10.0, 0.0, now + 3),
    ];
    let stats = analyze(&trades);
    assert_eq!(stats.max_drawdown, -20.0);
    assert_eq!(stats.max_gain, 10.0);
}

#[test]
fn test_drawdown_counts_initial_loss() {
    let now = chrono::Utc::now().timestamp_millis();
    let trades = vec![filled_trade("u", -8.0, -8.0, 0.0, now)];
    let stats = analyze(&trades);
    assert_eq!(stats.max_drawdown, -8.0);
}

#[test]
fn test_window_filters_old_trades() {
    let sqlite = Arc::new(SqliteStore::new_in_memory().expect("in-memory store"));
    let service = PerformanceService::new(sqlite.clone());

    let now = chrono::Utc::now().timestamp_millis();
    let day_ms = 24 * 60 * 60 * 1000;
    sqlite.insert_trade(&filled_trade("u", 10.0, 10.0, 0.0, now - 1_000)).unwrap();
    sqlite
        .insert_trade(&filled_trade("u", -50.0, -50.0, 0.0, now - 40 * day_ms))
        .unwrap();

    let week = service.get_performance("u", PerformanceWindow::Week).unwrap();
    assert_eq!(week.total_trades, 1);
    assert_eq!(week.max_gain, 10.0);

    let all = service.get_performance("u", PerformanceWindow::All).unwrap();
    assert_eq!(all.total_trades, 2);
    assert!((all.avg_return - (-20.0)).abs() < 1e-9);
}

#[test]
fn test_pending_trades_are_excluded() {
    let sqlite = Arc::new(SqliteStore::new_in_memory().expect("in-memory store"));
    let service = PerformanceService::new(sqlite.clone());

    let now = chrono::Utc::now().timestamp_millis();
    let mut pending = filled_trade("u", 10.0, 10.0, 0.0, now);
    pending.status = TradeStatus::Pending;
    pending.execution = None;
    sqlite.insert_trade(&pending).unwrap();
    sqlite.insert_trade(&filled_trade("u", 4.0, 4.0, 0.0, now)).unwrap();

    let stats = service.get_performance("u", PerformanceWindow::All).unwrap();
    assert_eq!(stats.total_trades, 1);
    assert!((stats.avg_return - 4.0).abs() < 1e-9);
}

#[test]
fn test_window_parsing() {
    assert_eq!(PerformanceWindow::from_str("day"), Some(PerformanceWindow::Day));
    assert_eq!(PerformanceWindow::from_str("1w"), Some(PerformanceWindow::Week));
    assert_eq!(PerformanceWindow::from_str("MONTH"), Some(PerformanceWindow::Month));
    assert_eq!(PerformanceWindow::from_str("all"), Some(PerformanceWindow::All));
    assert_eq!(PerformanceWindow::from_str("fortnight"), None);
}
