//! SQLite persistence layer for signals, portfolios and trades.
//!
//! Entities are document-shaped and stored as JSON payloads with the few
//! columns the queries need (status, expiry, ownership) promoted alongside.
//! Portfolios carry a version column for optimistic-concurrency writes.

use crate::error::{AppError, Result};
use crate::types::{Portfolio, Signal, SignalStatus, Trade};
use rusqlite::{params, Connection, ErrorCode};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// SQLite store behind a single connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Create a new store at the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        info!("SQLite store initialized");
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        debug!("In-memory SQLite store initialized");
        Ok(store)
    }

    /// Initialize database schema.
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS signals (
                id TEXT PRIMARY KEY,
                symbol TEXT NOT NULL,
                kind TEXT NOT NULL,
                status TEXT NOT NULL,
                expires_at INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                payload_json TEXT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_signals_status ON signals(status)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_signals_expiry ON signals(status, expires_at)",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS portfolios (
                user_id TEXT PRIMARY KEY,
                version INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                payload_json TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS trades (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                signal_id TEXT,
                status TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                payload_json TEXT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_trades_user ON trades(user_id, created_at DESC)",
            [],
        )?;

        info!("SQLite schema initialized");
        Ok(())
    }

    // ========== Signal Methods ==========

    /// Insert a new signal. Fails with `DuplicateSignalId` if the id exists.
    pub fn insert_signal(&self, signal: &Signal) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let payload = serde_json::to_string(signal)?;

        let result = conn.execute(
            "INSERT INTO signals (id, symbol, kind, status, expires_at, created_at, payload_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                signal.signal_id,
                signal.asset.symbol.to_lowercase(),
                signal.kind.to_string(),
                signal.status.to_string(),
                signal.expires_at,
                signal.created_at,
                payload,
            ],
        );

        match result {
            Ok(_) => {
                debug!("Inserted signal {} for {}", signal.signal_id, signal.asset.symbol);
                Ok(())
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                Err(AppError::DuplicateSignalId(signal.signal_id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Get a signal by id.
    pub fn get_signal(&self, id: &str) -> Result<Option<Signal>> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            "SELECT payload_json FROM signals WHERE id = ?1",
            params![id],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Rewrite a signal after a status change.
    pub fn update_signal(&self, signal: &Signal) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let payload = serde_json::to_string(signal)?;
        conn.execute(
            "UPDATE signals SET status = ?1, payload_json = ?2 WHERE id = ?3",
            params![signal.status.to_string(), payload, signal.signal_id],
        )?;
        Ok(())
    }

    /// Active signals whose expiry has passed.
    pub fn signals_due(&self, now: i64) -> Result<Vec<Signal>> {
        self.query_signals(
            "SELECT payload_json FROM signals
             WHERE status = 'active' AND expires_at <= ?1
             ORDER BY expires_at",
            params![now],
        )
    }

    /// All signals currently in a given status.
    pub fn signals_with_status(&self, status: SignalStatus) -> Result<Vec<Signal>> {
        self.query_signals(
            "SELECT payload_json FROM signals WHERE status = ?1 ORDER BY created_at DESC",
            params![status.to_string()],
        )
    }

    fn query_signals(&self, sql: &str, args: impl rusqlite::Params) -> Result<Vec<Signal>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(args, |row| row.get::<_, String>(0))?;

        let mut signals = Vec::new();
        for payload in rows {
            signals.push(serde_json::from_str(&payload?)?);
        }
        Ok(signals)
    }

    // ========== Portfolio Methods ==========

    /// Get a portfolio by user id. The version column is authoritative.
    pub fn get_portfolio(&self, user_id: &str) -> Result<Option<Portfolio>> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            "SELECT payload_json, version FROM portfolios WHERE user_id = ?1",
            params![user_id],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
        );

        match result {
            Ok((payload, version)) => {
                let mut portfolio: Portfolio = serde_json::from_str(&payload)?;
                portfolio.version = version;
                Ok(Some(portfolio))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Insert a brand new portfolio.
    pub fn insert_portfolio(&self, portfolio: &Portfolio) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let payload = serde_json::to_string(portfolio)?;

        let result = conn.execute(
            "INSERT INTO portfolios (user_id, version, updated_at, payload_json)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                portfolio.user_id,
                portfolio.version,
                portfolio.updated_at,
                payload
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                Err(AppError::Conflict(format!("portfolio {}", portfolio.user_id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write a portfolio whose version the caller already bumped. The write
    /// only lands if nobody else bumped it in between.
    pub fn update_portfolio(&self, portfolio: &Portfolio) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let payload = serde_json::to_string(portfolio)?;

        let affected = conn.execute(
            "UPDATE portfolios SET version = ?1, updated_at = ?2, payload_json = ?3
             WHERE user_id = ?4 AND version = ?5",
            params![
                portfolio.version,
                portfolio.updated_at,
                payload,
                portfolio.user_id,
                portfolio.version - 1,
            ],
        )?;

        if affected == 0 {
            return Err(AppError::Conflict(format!("portfolio {}", portfolio.user_id)));
        }
        Ok(())
    }

    /// User ids of every stored portfolio.
    pub fn portfolio_user_ids(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT user_id FROM portfolios ORDER BY user_id")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut ids = Vec::new();
        for id in rows {
            ids.push(id?);
        }
        Ok(ids)
    }

    // ========== Trade Methods ==========

    /// Append a new trade.
    pub fn insert_trade(&self, trade: &Trade) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let payload = serde_json::to_string(trade)?;
        conn.execute(
            "INSERT INTO trades (id, user_id, signal_id, status, created_at, payload_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                trade.trade_id,
                trade.user_id,
                trade.signal_id,
                trade.status.to_string(),
                trade.created_at,
                payload,
            ],
        )?;
        debug!("Inserted trade {} for user {}", trade.trade_id, trade.user_id);
        Ok(())
    }

    /// Rewrite a trade after a lifecycle change.
    pub fn update_trade(&self, trade: &Trade) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let payload = serde_json::to_string(trade)?;
        conn.execute(
            "UPDATE trades SET status = ?1, payload_json = ?2 WHERE id = ?3",
            params![trade.status.to_string(), payload, trade.trade_id],
        )?;
        Ok(())
    }

    /// Get a trade by id.
    pub fn get_trade(&self, id: &str) -> Result<Option<Trade>> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            "SELECT payload_json FROM trades WHERE id = ?1",
            params![id],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// A user's trades created at or after `since` (milliseconds).
    pub fn user_trades(&self, user_id: &str, since: i64) -> Result<Vec<Trade>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT payload_json FROM trades
             WHERE user_id = ?1 AND created_at >= ?2
             ORDER BY created_at",
        )?;
        let rows = stmt.query_map(params![user_id, since], |row| row.get::<_, String>(0))?;

        let mut trades = Vec::new();
        for payload in rows {
            trades.push(serde_json::from_str(&payload?)?);
        }
        Ok(trades)
    }
}
