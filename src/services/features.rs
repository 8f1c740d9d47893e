//! Technical feature extraction.
//!
//! Pure derivation of trend/momentum/volatility/liquidity buckets from a
//! single market snapshot. No I/O, no side effects; the only nondeterminism
//! is the display-only support/resistance band drawn from the injected RNG.

use crate::types::{
    Features, LiquidityLevel, MarketSnapshot, MomentumLevel, Trend, VolatilityLevel,
};
use rand::Rng;

/// Derive technical features from a snapshot.
pub fn extract_features(snapshot: &MarketSnapshot, rng: &mut impl Rng) -> Features {
    let pct_24h = snapshot.price_change_pct_24h;
    let pct_7d = snapshot.price_change_pct_7d;
    let volume_ratio = snapshot.volume_ratio();

    let trend = classify_trend(pct_24h, pct_7d);
    let volatility = classify_volatility(pct_24h);
    let momentum = classify_momentum(pct_24h, volume_ratio);
    let liquidity = classify_liquidity(volume_ratio);

    let rsi_approx = (50.0 + pct_24h * 2.0).clamp(0.0, 100.0);
    let macd_approx = pct_24h * 0.1;

    let support = snapshot.current_price * rng.gen_range(0.95..=1.0);
    let resistance = snapshot.current_price * rng.gen_range(1.05..=1.15);

    Features {
        trend,
        volatility,
        volatility_score: volatility.score(),
        momentum,
        liquidity,
        volume_ratio,
        rsi_approx,
        macd_approx,
        support,
        resistance,
    }
}

fn classify_trend(pct_24h: f64, pct_7d: f64) -> Trend {
    if pct_24h > 5.0 && pct_7d > 10.0 {
        Trend::StrongBullish
    } else if pct_24h > 2.0 && pct_7d > 5.0 {
        Trend::Bullish
    } else if pct_24h < -5.0 && pct_7d < -10.0 {
        Trend::StrongBearish
    } else if pct_24h < -2.0 && pct_7d < -5.0 {
        Trend::Bearish
    } else {
        Trend::Sideways
    }
}

fn classify_volatility(pct_24h: f64) -> VolatilityLevel {
    let abs = pct_24h.abs();
    if abs > 10.0 {
        VolatilityLevel::High
    } else if abs > 5.0 {
        VolatilityLevel::Medium
    } else {
        VolatilityLevel::Low
    }
}

fn classify_momentum(pct_24h: f64, volume_ratio: f64) -> MomentumLevel {
    if pct_24h > 3.0 && volume_ratio > 0.1 {
        MomentumLevel::Strong
    } else if pct_24h > 1.0 && volume_ratio > 0.05 {
        MomentumLevel::Moderate
    } else {
        MomentumLevel::Weak
    }
}

fn classify_liquidity(volume_ratio: f64) -> LiquidityLevel {
    if volume_ratio > 0.1 {
        LiquidityLevel::High
    } else if volume_ratio > 0.05 {
        LiquidityLevel::Medium
    } else {
        LiquidityLevel::Low
    }
}
