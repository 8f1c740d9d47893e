//! CoinGecko market data source.
//!
//! Serves snapshots from a short-TTL cache; a fetch failure degrades to the
//! last known value for that key instead of failing the caller, and only
//! returns `UpstreamUnavailable` when there is nothing to fall back to.

use crate::error::{AppError, Result};
use crate::services::TtlCache;
use crate::types::MarketSnapshot;
use dashmap::DashMap;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";
const COINGECKO_PRO_API_URL: &str = "https://pro-api.coingecko.com/api/v3";

/// Symbol to CoinGecko ID mapping for single-asset lookups.
pub const SYMBOL_TO_ID: &[(&str, &str)] = &[
    ("btc", "bitcoin"),
    ("eth", "ethereum"),
    ("bnb", "binancecoin"),
    ("sol", "solana"),
    ("xrp", "ripple"),
    ("doge", "dogecoin"),
    ("ada", "cardano"),
    ("avax", "avalanche-2"),
    ("dot", "polkadot"),
    ("link", "chainlink"),
];

/// One row of the `/coins/markets` response.
#[derive(Debug, Deserialize)]
struct CoinGeckoMarket {
    symbol: String,
    name: String,
    current_price: Option<f64>,
    market_cap: Option<f64>,
    total_volume: Option<f64>,
    price_change_percentage_24h: Option<f64>,
    price_change_percentage_7d_in_currency: Option<f64>,
}

impl CoinGeckoMarket {
    fn into_snapshot(self) -> MarketSnapshot {
        MarketSnapshot {
            symbol: self.symbol.to_uppercase(),
            name: self.name,
            current_price: self.current_price.unwrap_or(0.0),
            market_cap: self.market_cap.unwrap_or(0.0),
            volume_24h: self.total_volume.unwrap_or(0.0),
            price_change_pct_24h: self.price_change_percentage_24h.unwrap_or(0.0),
            price_change_pct_7d: self.price_change_percentage_7d_in_currency.unwrap_or(0.0),
        }
    }
}

/// CoinGecko REST client with snapshot caching.
pub struct CoinGeckoClient {
    client: Client,
    api_key: Option<String>,
    /// Fresh snapshots, per-symbol key.
    snapshots: TtlCache<MarketSnapshot>,
    /// Fresh pages, "page:{page}:{per_page}" key.
    pages: TtlCache<Vec<MarketSnapshot>>,
    /// Last successful fetch per key, no expiry; the degrade path.
    last_known: DashMap<String, MarketSnapshot>,
    last_known_pages: DashMap<String, Vec<MarketSnapshot>>,
}

impl CoinGeckoClient {
    /// Create a new client.
    pub fn new(api_key: Option<String>, snapshot_ttl: Duration, request_timeout: Duration) -> Self {
        let client = Client::builder()
            .user_agent("Omen/0.1 (Signal Generation Server)")
            .timeout(request_timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_key,
            snapshots: TtlCache::new(snapshot_ttl),
            pages: TtlCache::new(snapshot_ttl),
            last_known: DashMap::new(),
            last_known_pages: DashMap::new(),
        }
    }

    fn base_url(&self) -> &str {
        if self.api_key.is_some() {
            COINGECKO_PRO_API_URL
        } else {
            COINGECKO_API_URL
        }
    }

    fn with_key(&self, mut url: String) -> String {
        if let Some(ref key) = self.api_key {
            url.push_str(&format!("&x_cg_pro_api_key={}", key));
        }
        url
    }

    /// Get a snapshot for a single symbol.
    pub async fn get_snapshot(&self, symbol: &str) -> Result<MarketSnapshot> {
        let key = symbol.to_lowercase();
        if let Some(cached) = self.snapshots.get(&key) {
            return Ok(cached);
        }

        let id = SYMBOL_TO_ID
            .iter()
            .find(|(s, _)| *s == key)
            .map(|(_, id)| *id)
            .ok_or_else(|| AppError::NotFound(format!("unknown symbol {}", symbol)))?;

        let url = self.with_key(format!(
            "{}/coins/markets?vs_currency=usd&ids={}&price_change_percentage=24h,7d",
            self.base_url(),
            id
        ));

        match self.fetch_markets(&url).await {
            Ok(mut snapshots) if !snapshots.is_empty() => {
                let snapshot = snapshots.remove(0);
                self.snapshots.insert(key.clone(), snapshot.clone());
                self.last_known.insert(key, snapshot.clone());
                Ok(snapshot)
            }
            Ok(_) => Err(AppError::NotFound(format!("no market data for {}", symbol))),
            Err(e) => self.degrade_symbol(&key, e),
        }
    }

    /// Get one page of market snapshots ordered by market cap.
    pub async fn get_snapshots(&self, page: u32, per_page: u32) -> Result<Vec<MarketSnapshot>> {
        let key = format!("page:{}:{}", page, per_page);
        if let Some(cached) = self.pages.get(&key) {
            return Ok(cached);
        }

        let url = self.with_key(format!(
            "{}/coins/markets?vs_currency=usd&order=market_cap_desc&page={}&per_page={}&price_change_percentage=24h,7d",
            self.base_url(),
            page,
            per_page
        ));

        match self.fetch_markets(&url).await {
            Ok(snapshots) => {
                self.pages.insert(key.clone(), snapshots.clone());
                self.last_known_pages.insert(key, snapshots.clone());
                for snapshot in &snapshots {
                    let symbol_key = snapshot.symbol.to_lowercase();
                    self.snapshots.insert(symbol_key.clone(), snapshot.clone());
                    self.last_known.insert(symbol_key, snapshot.clone());
                }
                Ok(snapshots)
            }
            Err(e) => {
                if let Some(stale) = self.last_known_pages.get(&key) {
                    warn!("CoinGecko page fetch failed ({}), serving last known data", e);
                    return Ok(stale.value().clone());
                }
                Err(AppError::UpstreamUnavailable(format!(
                    "coingecko page {}: {}",
                    page, e
                )))
            }
        }
    }

    async fn fetch_markets(&self, url: &str) -> Result<Vec<MarketSnapshot>> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!(
                "CoinGecko API returned {}: {}",
                status,
                &text[..text.len().min(200)]
            );
            return Err(AppError::UpstreamUnavailable(format!(
                "coingecko returned {}",
                status
            )));
        }

        let markets: Vec<CoinGeckoMarket> = response.json().await?;
        debug!("Fetched {} market rows from CoinGecko", markets.len());
        Ok(markets.into_iter().map(CoinGeckoMarket::into_snapshot).collect())
    }

    fn degrade_symbol(&self, key: &str, err: AppError) -> Result<MarketSnapshot> {
        if let Some(stale) = self.last_known.get(key) {
            warn!("CoinGecko fetch failed ({}), serving last known {}", err, key);
            return Ok(stale.value().clone());
        }
        Err(AppError::UpstreamUnavailable(format!(
            "coingecko {}: {}",
            key, err
        )))
    }
}
