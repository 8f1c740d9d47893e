use omen::config::Config;
use omen::services::{PortfolioService, SignalEngine, SignalStore, SqliteStore};
use omen::sources::CoinGeckoClient;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Long-lived services shared by the pipeline loops.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sqlite: Arc<SqliteStore>,
    pub signal_store: Arc<SignalStore>,
    pub portfolio_service: Arc<PortfolioService>,
    pub engine: Arc<SignalEngine>,
    pub coingecko: Arc<CoinGeckoClient>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "omen=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env());
    info!(
        "Starting Omen (db: {}, poll every {}s)",
        config.db_path, config.poll_interval_secs
    );

    let sqlite = Arc::new(SqliteStore::new(&config.db_path)?);
    let signal_store = SignalStore::new(sqlite.clone());
    let portfolio_service = PortfolioService::new(sqlite.clone());
    let engine = SignalEngine::new(signal_store.clone(), config.rng_seed);

    let coingecko = Arc::new(CoinGeckoClient::new(
        config.coingecko_api_key.clone(),
        Duration::from_secs(config.snapshot_ttl_secs),
        Duration::from_secs(config.request_timeout_secs),
    ));

    let state = AppState {
        config,
        sqlite,
        signal_store: signal_store.clone(),
        portfolio_service,
        engine,
        coingecko,
    };

    // Expiry sweep, decoupled from the generation cadence.
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(60));
        loop {
            ticker.tick().await;
            let now = chrono::Utc::now().timestamp_millis();
            if let Err(e) = signal_store.expire_due(now) {
                error!("Expiry sweep failed: {}", e);
            }
        }
    });

    run_pipeline(state).await;
    Ok(())
}

/// Fetch, score, and revalue on the poll interval. Runs forever.
async fn run_pipeline(state: AppState) {
    let mut ticker = tokio::time::interval(Duration::from_secs(state.config.poll_interval_secs));

    loop {
        ticker.tick().await;

        let snapshots = match state
            .coingecko
            .get_snapshots(1, state.config.snapshots_per_page)
            .await
        {
            Ok(snapshots) => snapshots,
            Err(e) => {
                warn!("Snapshot fetch failed, skipping cycle: {}", e);
                continue;
            }
        };

        let signals = state.engine.generate_signals(&snapshots);
        info!("Cycle produced {} signals", signals.len());

        let now = chrono::Utc::now().timestamp_millis();
        if let Err(e) = state.signal_store.expire_due(now) {
            error!("Expiry pass failed: {}", e);
        }

        // Refresh every stored portfolio against the fresh marks.
        let prices: HashMap<String, f64> = snapshots
            .iter()
            .map(|s| (s.symbol.to_lowercase(), s.current_price))
            .collect();

        match state.sqlite.portfolio_user_ids() {
            Ok(users) => {
                for user_id in users {
                    if let Err(e) = state.portfolio_service.refresh(&user_id, &prices) {
                        warn!("Portfolio refresh failed for {}: {}", user_id, e);
                    }
                }
            }
            Err(e) => error!("Could not list portfolios: {}", e),
        }
    }
}
