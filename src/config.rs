use std::env;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// CoinGecko API key (optional, for pro tier).
    pub coingecko_api_key: Option<String>,
    /// Path to the SQLite database file.
    pub db_path: String,
    /// Interval between signal generation runs (seconds).
    pub poll_interval_secs: u64,
    /// TTL for cached market snapshots (seconds).
    pub snapshot_ttl_secs: u64,
    /// How many assets to pull per market page.
    pub snapshots_per_page: u32,
    /// Bounded timeout for upstream requests (seconds).
    pub request_timeout_secs: u64,
    /// Seed for the signal engine RNG. Unset means entropy-seeded.
    pub rng_seed: Option<u64>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            coingecko_api_key: env::var("COINGECKO_API_KEY").ok(),
            db_path: env::var("DB_PATH").unwrap_or_else(|_| "omen.db".to_string()),
            poll_interval_secs: env::var("POLL_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(120),
            snapshot_ttl_secs: env::var("SNAPSHOT_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            snapshots_per_page: env::var("SNAPSHOTS_PER_PAGE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(50),
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            rng_seed: env::var("RNG_SEED").ok().and_then(|v| v.parse().ok()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config {
            coingecko_api_key: None,
            db_path: "omen.db".to_string(),
            poll_interval_secs: 120,
            snapshot_ttl_secs: 30,
            snapshots_per_page: 50,
            request_timeout_secs: 10,
            rng_seed: None,
        };

        assert_eq!(config.db_path, "omen.db");
        assert_eq!(config.poll_interval_secs, 120);
        assert_eq!(config.snapshot_ttl_secs, 30);
        assert_eq!(config.snapshots_per_page, 50);
        assert!(config.rng_seed.is_none());
    }

    #[test]
    fn test_config_with_api_key() {
        let config = Config {
            coingecko_api_key: Some("gecko-key".to_string()),
            db_path: "/var/lib/omen/omen.db".to_string(),
            poll_interval_secs: 60,
            snapshot_ttl_secs: 15,
            snapshots_per_page: 100,
            request_timeout_secs: 5,
            rng_seed: Some(42),
        };

        assert_eq!(config.coingecko_api_key, Some("gecko-key".to_string()));
        assert_eq!(config.rng_seed, Some(42));
    }
}
