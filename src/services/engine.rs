//! Signal engine.
//!
//! Batch orchestration: extract, score and persist a signal per snapshot,
//! isolating failures to the single symbol that caused them. The RNG is
//! owned here and seedable from config so whole runs can be reproduced.

use crate::services::{scorer, SignalStore};
use crate::types::{MarketSnapshot, Signal};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Drives signal generation over snapshot batches.
pub struct SignalEngine {
    store: Arc<SignalStore>,
    rng: Mutex<StdRng>,
}

impl SignalEngine {
    /// Create a new engine. A seed pins every noise term, fallback kind and
    /// display level for the run; `None` seeds from entropy.
    pub fn new(store: Arc<SignalStore>, seed: Option<u64>) -> Arc<Self> {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Arc::new(Self {
            store,
            rng: Mutex::new(rng),
        })
    }

    /// Generate and persist signals for a batch of snapshots.
    ///
    /// One bad symbol never aborts the batch: validation failures and store
    /// errors are logged and skipped, suppressed signals are skipped
    /// silently.
    pub fn generate_signals(&self, snapshots: &[MarketSnapshot]) -> Vec<Signal> {
        let mut generated = Vec::new();

        for snapshot in snapshots {
            let scored = {
                let mut rng = self.rng.lock().unwrap();
                scorer::generate_signal(snapshot, &mut *rng)
            };

            match scored {
                Ok(Some(signal)) => match self.store.create(signal) {
                    Ok(signal) => generated.push(signal),
                    Err(e) => warn!("Failed to persist signal for {}: {}", snapshot.symbol, e),
                },
                Ok(None) => debug!("Signal for {} suppressed by confidence floor", snapshot.symbol),
                Err(e) => warn!("Skipping {}: {}", snapshot.symbol, e),
            }
        }

        info!(
            "Generated {} signals from {} snapshots",
            generated.len(),
            snapshots.len()
        );
        generated
    }
}
