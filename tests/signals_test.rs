//! Signal lifecycle tests: creation, expiry and status transitions.

use omen::services::{SignalStore, SqliteStore};
use omen::types::*;
use omen::AppError;
use std::sync::Arc;

fn store() -> Arc<SignalStore> {
    let sqlite = Arc::new(SqliteStore::new_in_memory().expect("in-memory store"));
    SignalStore::new(sqlite)
}

fn test_signal(id: &str, expires_at: i64) -> Signal {
    let now = chrono::Utc::now().timestamp_millis();
    Signal {
        signal_id: id.to_string(),
        kind: SignalKind::Quick,
        asset: SignalAsset {
            symbol: "BTC".to_string(),
            name: "Bitcoin".to_string(),
            price: 50_000.0,
            market_cap: 1_000_000_000_000.0,
            volume_24h: 150_000_000_000.0,
        },
        action: SignalAction::Buy,
        confidence: 85,
        expected_roi: RoiBand { min: 4.0, max: 21.0 },
        timeframe: SignalKind::Quick.timeframe(),
        risk_level: RiskLevel::Medium,
        leverage: 3.0,
        position_size_pct: 3,
        execution: ExecutionPlan {
            entry_price: 50_000.0,
            stop_loss: 49_000.0,
            take_profit: 52_500.0,
            slippage_pct: 0.5,
            gas_estimate: 3.0,
            projected_pnl: 7_500.0,
        },
        status: SignalStatus::Active,
        expires_at,
        created_at: now,
    }
}

fn far_future() -> i64 {
    chrono::Utc::now().timestamp_millis() + 86_400_000
}

#[test]
fn test_create_and_get() {
    let store = store();
    store.create(test_signal("sig-1", far_future())).unwrap();

    let loaded = store.get("sig-1").unwrap();
    assert_eq!(loaded.signal_id, "sig-1");
    assert_eq!(loaded.status, SignalStatus::Active);
}

#[test]
fn test_duplicate_id_is_rejected() {
    let store = store();
    store.create(test_signal("sig-1", far_future())).unwrap();

    let err = store.create(test_signal("sig-1", far_future())).unwrap_err();
    assert!(matches!(err, AppError::DuplicateSignalId(_)));
}

#[test]
fn test_get_unknown_is_not_found() {
    let store = store();
    let err = store.get("missing").unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[test]
fn test_transition_to_executed() {
    let store = store();
    store.create(test_signal("sig-1", far_future())).unwrap();

    let executed = store.transition("sig-1", SignalStatus::Executed).unwrap();
    assert_eq!(executed.status, SignalStatus::Executed);

    // Terminal signals are immutable.
    let err = store.transition("sig-1", SignalStatus::Cancelled).unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition { .. }));
}

#[test]
fn test_transition_to_cancelled() {
    let store = store();
    store.create(test_signal("sig-1", far_future())).unwrap();

    let cancelled = store.transition("sig-1", SignalStatus::Cancelled).unwrap();
    assert_eq!(cancelled.status, SignalStatus::Cancelled);
}

#[test]
fn test_expired_is_not_a_transition_target() {
    let store = store();
    store.create(test_signal("sig-1", far_future())).unwrap();

    // Expiry happens through the sweep or at read time, never by request.
    let err = store.transition("sig-1", SignalStatus::Expired).unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition { .. }));

    let err = store.transition("sig-1", SignalStatus::Active).unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition { .. }));
}

#[test]
fn test_expire_due_is_idempotent() {
    let store = store();
    let now = chrono::Utc::now().timestamp_millis();
    store.create(test_signal("old-1", now - 1_000)).unwrap();
    store.create(test_signal("old-2", now - 2_000)).unwrap();
    store.create(test_signal("new-1", far_future())).unwrap();

    assert_eq!(store.expire_due(now).unwrap(), 2);
    // Second sweep with the same clock finds nothing to do.
    assert_eq!(store.expire_due(now).unwrap(), 0);

    assert_eq!(store.get("old-1").unwrap().status, SignalStatus::Expired);
    assert_eq!(store.get("old-2").unwrap().status, SignalStatus::Expired);
    assert_eq!(store.get("new-1").unwrap().status, SignalStatus::Active);
}

#[test]
fn test_read_expires_overdue_signal() {
    let store = store();
    let now = chrono::Utc::now().timestamp_millis();
    store.create(test_signal("sig-1", now - 500)).unwrap();

    let loaded = store.get("sig-1").unwrap();
    assert_eq!(loaded.status, SignalStatus::Expired);

    // And an expired signal cannot be executed afterwards.
    let err = store.transition("sig-1", SignalStatus::Executed).unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition { .. }));
}

#[test]
fn test_active_listing_excludes_terminal() {
    let store = store();
    store.create(test_signal("a", far_future())).unwrap();
    store.create(test_signal("b", far_future())).unwrap();
    store.transition("b", SignalStatus::Cancelled).unwrap();

    let active = store.active().unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].signal_id, "a");
}
