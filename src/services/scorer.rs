//! Signal scoring.
//!
//! Converts extracted features into a typed trading signal: strategy kind,
//! action, confidence, execution levels and expiry. The only inputs are the
//! snapshot, the derived features and the injected RNG, so a seeded run is
//! fully reproducible.

use crate::error::{AppError, Result};
use crate::services::features::extract_features;
use crate::types::{
    ExecutionPlan, Features, MarketSnapshot, MomentumLevel, RiskLevel, RoiBand, Signal,
    SignalAction, SignalAsset, SignalKind, SignalStatus, Trend, VolatilityLevel,
};
use rand::Rng;
use uuid::Uuid;

/// Signals scoring below this are suppressed, never persisted.
pub const MIN_CONFIDENCE: f64 = 60.0;
/// Upper bound for confidence, applied both before and after noise.
pub const MAX_CONFIDENCE: f64 = 95.0;

const BASE_CONFIDENCE: f64 = 75.0;
const NOISE_RANGE: f64 = 10.0;

/// Expected execution slippage attached to every signal, percent.
const SLIPPAGE_PCT: f64 = 0.5;
/// Flat per-execution gas estimate, USD.
const GAS_ESTIMATE_USD: f64 = 3.0;

/// Score a snapshot into a signal.
///
/// Returns `Ok(None)` when the signal is suppressed by the confidence
/// floor. Hold signals are produced like any other; suppression is the only
/// reason nothing comes back.
pub fn generate_signal(snapshot: &MarketSnapshot, rng: &mut impl Rng) -> Result<Option<Signal>> {
    validate_snapshot(snapshot)?;

    let features = extract_features(snapshot, rng);

    let kind = select_kind(&features)
        .unwrap_or_else(|| SignalKind::ALL[rng.gen_range(0..SignalKind::ALL.len())]);

    let noise = rng.gen_range(-NOISE_RANGE..=NOISE_RANGE);
    let raw = raw_confidence(&features).min(MAX_CONFIDENCE) + noise;
    let confidence = match finalize_confidence(raw) {
        Some(c) => c,
        None => return Ok(None),
    };

    let action = select_action(features.trend, confidence);
    Ok(Some(build_signal(snapshot, &features, kind, action, confidence, rng)))
}

fn validate_snapshot(snapshot: &MarketSnapshot) -> Result<()> {
    let fields = [
        snapshot.current_price,
        snapshot.market_cap,
        snapshot.volume_24h,
        snapshot.price_change_pct_24h,
        snapshot.price_change_pct_7d,
    ];
    if fields.iter().any(|v| !v.is_finite()) {
        return Err(AppError::Validation(format!(
            "non-finite market data for {}",
            snapshot.symbol
        )));
    }
    if snapshot.current_price <= 0.0 {
        return Err(AppError::Validation(format!(
            "non-positive price {} for {}",
            snapshot.current_price, snapshot.symbol
        )));
    }
    if snapshot.market_cap < 0.0 || snapshot.volume_24h < 0.0 {
        return Err(AppError::Validation(format!(
            "negative market cap or volume for {}",
            snapshot.symbol
        )));
    }
    Ok(())
}

/// Pick the strategy kind. First matching rule wins; `None` means no rule
/// matched and the caller falls back to a random kind.
fn select_kind(features: &Features) -> Option<SignalKind> {
    if features.volatility == VolatilityLevel::High && features.momentum == MomentumLevel::Strong {
        Some(SignalKind::Degen)
    } else if features.trend.is_bullish() && features.volatility == VolatilityLevel::Medium {
        Some(SignalKind::Quick)
    } else if features.trend == Trend::Sideways && features.momentum == MomentumLevel::Moderate {
        Some(SignalKind::Spot)
    } else if features.trend.is_bullish() && features.volatility == VolatilityLevel::Low {
        Some(SignalKind::Hodl)
    } else {
        None
    }
}

/// Pre-noise confidence: base plus trend, momentum and volume bonuses.
fn raw_confidence(features: &Features) -> f64 {
    let mut score = BASE_CONFIDENCE;

    if features.trend.is_strong() {
        score += 15.0;
    } else if features.trend.is_bullish() || features.trend.is_bearish() {
        score += 10.0;
    }

    score += match features.momentum {
        MomentumLevel::Strong => 10.0,
        MomentumLevel::Moderate => 5.0,
        MomentumLevel::Weak => 0.0,
    };

    if features.volume_ratio > 0.1 {
        score += 10.0;
    } else if features.volume_ratio > 0.05 {
        score += 5.0;
    }

    score
}

/// Apply the confidence floor and final clamp.
///
/// The floor is checked on the noisy raw value, before clamping: anything
/// under [`MIN_CONFIDENCE`] is suppressed rather than rounded up to it.
pub(crate) fn finalize_confidence(raw: f64) -> Option<u8> {
    if raw < MIN_CONFIDENCE {
        return None;
    }
    Some(raw.round().clamp(MIN_CONFIDENCE, MAX_CONFIDENCE) as u8)
}

fn select_action(trend: Trend, confidence: u8) -> SignalAction {
    if trend.is_bullish() && confidence > 70 {
        SignalAction::Buy
    } else if trend.is_bearish() && confidence > 70 {
        SignalAction::Sell
    } else {
        SignalAction::Hold
    }
}

fn build_signal(
    snapshot: &MarketSnapshot,
    features: &Features,
    kind: SignalKind,
    action: SignalAction,
    confidence: u8,
    rng: &mut impl Rng,
) -> Signal {
    let conf_scale = confidence as f64 / 100.0;
    let (roi_min, roi_max) = kind.roi_base();

    let entry_price = snapshot.current_price;
    // Sell signals invert the level placement; hold keeps the long-side
    // orientation for display.
    let (stop_loss, take_profit) = match action {
        SignalAction::Sell => (
            entry_price * (1.0 + kind.stop_loss_pct()),
            entry_price * (1.0 - kind.take_profit_pct()),
        ),
        SignalAction::Buy | SignalAction::Hold => (
            entry_price * (1.0 - kind.stop_loss_pct()),
            entry_price * (1.0 + kind.take_profit_pct()),
        ),
    };

    let (lev_min, lev_max) = kind.leverage_range();
    let leverage = if lev_min == lev_max {
        lev_min
    } else {
        rng.gen_range(lev_min..=lev_max).round()
    };

    let position_size_pct =
        (kind.base_position_pct() * conf_scale).round().clamp(1.0, 100.0) as u8;

    let risk_level = if kind == SignalKind::Degen || confidence < 70 {
        RiskLevel::High
    } else if kind == SignalKind::Quick || confidence < 80 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    let now = chrono::Utc::now().timestamp_millis();
    let expires_at = now + kind.expiry().num_milliseconds();

    let signal = Signal {
        signal_id: Uuid::new_v4().to_string(),
        kind,
        asset: SignalAsset {
            symbol: snapshot.symbol.clone(),
            name: snapshot.name.clone(),
            price: snapshot.current_price,
            market_cap: snapshot.market_cap,
            volume_24h: snapshot.volume_24h,
        },
        action,
        confidence,
        expected_roi: RoiBand {
            min: (roi_min * conf_scale).round(),
            max: (roi_max * conf_scale).round(),
        },
        timeframe: kind.timeframe(),
        risk_level,
        leverage,
        position_size_pct,
        execution: ExecutionPlan {
            entry_price,
            stop_loss,
            take_profit,
            slippage_pct: SLIPPAGE_PCT,
            gas_estimate: GAS_ESTIMATE_USD,
            projected_pnl: (take_profit - entry_price).abs() * leverage,
        },
        status: SignalStatus::Active,
        expires_at,
        created_at: now,
    };

    tracing::debug!(
        symbol = %signal.asset.symbol,
        kind = %signal.kind,
        action = %signal.action,
        confidence = signal.confidence,
        trend = ?features.trend,
        "generated signal"
    );

    signal
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn btc_snapshot() -> MarketSnapshot {
        MarketSnapshot {
            symbol: "BTC".to_string(),
            name: "Bitcoin".to_string(),
            current_price: 50_000.0,
            market_cap: 1_000_000_000_000.0,
            volume_24h: 150_000_000_000.0,
            price_change_pct_24h: 6.0,
            price_change_pct_7d: 12.0,
        }
    }

    #[test]
    fn test_confidence_floor_suppresses() {
        assert_eq!(finalize_confidence(59.9), None);
        assert_eq!(finalize_confidence(0.0), None);
        assert_eq!(finalize_confidence(60.0), Some(60));
    }

    #[test]
    fn test_confidence_is_clamped_integer() {
        assert_eq!(finalize_confidence(200.0), Some(95));
        assert_eq!(finalize_confidence(82.4), Some(82));
        assert_eq!(finalize_confidence(82.6), Some(83));
    }

    #[test]
    fn test_btc_example_scores_quick_buy() {
        // volatility medium (5 < 6 <= 10), trend strong_bullish, momentum
        // strong, volume ratio 0.15: raw = 75 + 15 + 10 + 10 = 110, capped
        // at 95 before noise, so confidence lands in [85, 95].
        let snap = btc_snapshot();
        let mut rng = StdRng::seed_from_u64(7);
        let signal = generate_signal(&snap, &mut rng)
            .expect("valid snapshot")
            .expect("confidence floor unreachable here");

        assert_eq!(signal.kind, SignalKind::Quick);
        assert_eq!(signal.action, SignalAction::Buy);
        assert!((85..=95).contains(&signal.confidence));
        assert_eq!(
            signal.expected_roi.max,
            (25.0 * signal.confidence as f64 / 100.0).round()
        );
        assert_eq!(signal.status, SignalStatus::Active);
        assert!(signal.expires_at > signal.created_at);
        assert!((3.0..=5.0).contains(&signal.leverage));
    }

    #[test]
    fn test_negative_price_is_rejected() {
        let mut snap = btc_snapshot();
        snap.current_price = -1.0;
        let mut rng = StdRng::seed_from_u64(7);
        let err = generate_signal(&snap, &mut rng).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_kind_selection_order() {
        let mut features = Features {
            trend: Trend::StrongBullish,
            volatility: VolatilityLevel::High,
            volatility_score: 80.0,
            momentum: MomentumLevel::Strong,
            liquidity: crate::types::LiquidityLevel::High,
            volume_ratio: 0.2,
            rsi_approx: 62.0,
            macd_approx: 0.6,
            support: 0.0,
            resistance: 0.0,
        };
        // degen wins over quick even for a bullish trend
        assert_eq!(select_kind(&features), Some(SignalKind::Degen));

        features.volatility = VolatilityLevel::Medium;
        assert_eq!(select_kind(&features), Some(SignalKind::Quick));

        features.trend = Trend::Sideways;
        features.momentum = MomentumLevel::Moderate;
        assert_eq!(select_kind(&features), Some(SignalKind::Spot));

        features.trend = Trend::Bullish;
        features.volatility = VolatilityLevel::Low;
        features.momentum = MomentumLevel::Weak;
        assert_eq!(select_kind(&features), Some(SignalKind::Hodl));

        features.trend = Trend::Bearish;
        assert_eq!(select_kind(&features), None);
    }

    #[test]
    fn test_hold_action_below_threshold() {
        assert_eq!(select_action(Trend::Bullish, 70), SignalAction::Hold);
        assert_eq!(select_action(Trend::Bullish, 71), SignalAction::Buy);
        assert_eq!(select_action(Trend::StrongBearish, 80), SignalAction::Sell);
        assert_eq!(select_action(Trend::Sideways, 95), SignalAction::Hold);
    }

    #[test]
    fn test_sell_levels_invert() {
        let snap = MarketSnapshot {
            symbol: "DOGE".to_string(),
            name: "Dogecoin".to_string(),
            current_price: 100.0,
            market_cap: 1_000_000.0,
            volume_24h: 200_000.0,
            price_change_pct_24h: -12.0,
            price_change_pct_7d: -15.0,
        };
        let mut rng = StdRng::seed_from_u64(3);
        let signal = generate_signal(&snap, &mut rng).unwrap().unwrap();
        assert_eq!(signal.action, SignalAction::Sell);
        assert!(signal.execution.stop_loss > signal.execution.entry_price);
        assert!(signal.execution.take_profit < signal.execution.entry_price);
    }
}
