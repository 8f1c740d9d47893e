//! Signal lifecycle store.
//!
//! SQLite-backed with a DashMap read cache. Signals leave `active` exactly
//! once: executed or cancelled through [`SignalStore::transition`], expired
//! through the sweep or opportunistically at read time. Nothing is ever
//! hard-deleted.

use crate::error::{AppError, Result};
use crate::services::SqliteStore;
use crate::types::{Signal, SignalStatus};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Store for generated signals.
pub struct SignalStore {
    sqlite: Arc<SqliteStore>,
    /// Read cache, signal_id -> Signal.
    cache: DashMap<String, Signal>,
}

impl SignalStore {
    /// Create a new signal store.
    pub fn new(sqlite: Arc<SqliteStore>) -> Arc<Self> {
        Arc::new(Self {
            sqlite,
            cache: DashMap::new(),
        })
    }

    /// Persist a freshly generated signal.
    pub fn create(&self, signal: Signal) -> Result<Signal> {
        self.sqlite.insert_signal(&signal)?;
        self.cache.insert(signal.signal_id.clone(), signal.clone());
        Ok(signal)
    }

    /// Get a signal by id, expiring it on the way out if it is overdue.
    pub fn get(&self, id: &str) -> Result<Signal> {
        let signal = match self.cache.get(id) {
            Some(cached) => cached.value().clone(),
            None => {
                let loaded = self
                    .sqlite
                    .get_signal(id)?
                    .ok_or_else(|| AppError::NotFound(format!("signal {}", id)))?;
                self.cache.insert(id.to_string(), loaded.clone());
                loaded
            }
        };

        let now = chrono::Utc::now().timestamp_millis();
        if signal.status == SignalStatus::Active && signal.expires_at <= now {
            return self.mark_expired(signal);
        }
        Ok(signal)
    }

    /// Transition a signal out of `active`.
    ///
    /// Only `executed` and `cancelled` are reachable here; expiry goes
    /// through [`SignalStore::expire_due`]. Anything else, or a transition
    /// from a terminal status, is an `InvalidTransition`.
    pub fn transition(&self, id: &str, target: SignalStatus) -> Result<Signal> {
        let mut signal = self.get(id)?;

        if !matches!(target, SignalStatus::Executed | SignalStatus::Cancelled)
            || !signal.status.can_transition(target)
        {
            return Err(AppError::invalid_transition(signal.status, target));
        }

        signal.status = target;
        self.sqlite.update_signal(&signal)?;
        self.cache.insert(signal.signal_id.clone(), signal.clone());
        debug!("Signal {} -> {}", signal.signal_id, target);
        Ok(signal)
    }

    /// Expire every active signal whose `expires_at` has passed.
    ///
    /// Idempotent: the query only sees signals still active, so a second
    /// sweep with the same `now` finds nothing.
    pub fn expire_due(&self, now: i64) -> Result<usize> {
        let due = self.sqlite.signals_due(now)?;
        let count = due.len();

        for signal in due {
            self.mark_expired(signal)?;
        }

        if count > 0 {
            info!("Expired {} overdue signals", count);
        }
        Ok(count)
    }

    /// All signals still active.
    pub fn active(&self) -> Result<Vec<Signal>> {
        self.sqlite.signals_with_status(SignalStatus::Active)
    }

    fn mark_expired(&self, mut signal: Signal) -> Result<Signal> {
        signal.status = SignalStatus::Expired;
        self.sqlite.update_signal(&signal)?;
        self.cache.insert(signal.signal_id.clone(), signal.clone());
        debug!("Signal {} expired", signal.signal_id);
        Ok(signal)
    }
}
