use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// How long an unfinished claim blocks redeliveries before another delivery
/// may take it over (the first worker is assumed to have died).
pub const DEFAULT_CLAIM_TTL: Duration = Duration::from_secs(300);

/// Errors from a ledger backend. A failed claim must not be read as
/// "already processed", so these are surfaced instead of folded into a result.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

/// Result of trying to claim an order id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// This delivery owns the order and must run the handler, then call
    /// `complete` or `release`.
    Acquired,
    /// Another delivery is running the handler right now.
    InProgress,
    /// The handler already succeeded for this order.
    Processed,
}

/// Record of notifications whose business effect has been applied.
///
/// PayTR redelivers a notification until it reads `OK`, and may deliver the
/// same one concurrently. An order moves from in-progress (claimed, handler
/// running) to processed (handler succeeded). Only a processed order may be
/// acknowledged without running the handler.
///
/// Implementations must be thread-safe (`Send + Sync`).
pub trait NotificationLedger: Send + Sync {
    /// Atomically claim an order id for processing. An in-progress claim
    /// older than the ledger's claim TTL is taken over.
    fn try_claim(&self, merchant_oid: &str) -> Result<Claim, LedgerError>;

    /// Mark a claimed order as processed.
    fn complete(&self, merchant_oid: &str) -> Result<(), LedgerError>;

    /// Drop an in-progress claim so a redelivery can run the handler again.
    /// Processed orders are left alone.
    fn release(&self, merchant_oid: &str);

    /// True once the handler has succeeded for this order.
    fn is_processed(&self, merchant_oid: &str) -> bool;

    /// Forget processed orders older than `max_age_secs`. Returns the number
    /// of entries removed.
    fn purge_expired(&self, max_age_secs: u64) -> usize;
}

/// Purge processed orders older than `retention_secs` once a minute.
/// Must be called from within a tokio runtime.
pub fn start_purge_task(ledger: Arc<dyn NotificationLedger>, retention_secs: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            let purged = ledger.purge_expired(retention_secs);
            if purged > 0 {
                tracing::info!(purged, "purged expired ledger entries");
            }
        }
    });
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    processed: bool,
    at: Instant,
}

/// In-memory ledger backed by DashMap. Lost on restart.
pub struct InMemoryLedger {
    entries: DashMap<String, Entry>,
    claim_ttl: Duration,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            claim_ttl: DEFAULT_CLAIM_TTL,
        }
    }

    pub fn with_claim_ttl(mut self, claim_ttl: Duration) -> Self {
        self.claim_ttl = claim_ttl;
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationLedger for InMemoryLedger {
    fn try_claim(&self, merchant_oid: &str) -> Result<Claim, LedgerError> {
        use dashmap::mapref::entry::Entry as MapEntry;
        match self.entries.entry(merchant_oid.to_string()) {
            MapEntry::Occupied(mut o) => {
                let entry = o.get_mut();
                if entry.processed {
                    Ok(Claim::Processed)
                } else if entry.at.elapsed() < self.claim_ttl {
                    Ok(Claim::InProgress)
                } else {
                    entry.at = Instant::now();
                    Ok(Claim::Acquired)
                }
            }
            MapEntry::Vacant(v) => {
                v.insert(Entry {
                    processed: false,
                    at: Instant::now(),
                });
                Ok(Claim::Acquired)
            }
        }
    }

    fn complete(&self, merchant_oid: &str) -> Result<(), LedgerError> {
        self.entries.insert(
            merchant_oid.to_string(),
            Entry {
                processed: true,
                at: Instant::now(),
            },
        );
        Ok(())
    }

    fn release(&self, merchant_oid: &str) {
        self.entries
            .remove_if(merchant_oid, |_, entry| !entry.processed);
    }

    fn is_processed(&self, merchant_oid: &str) -> bool {
        self.entries
            .get(merchant_oid)
            .map(|entry| entry.processed)
            .unwrap_or(false)
    }

    fn purge_expired(&self, max_age_secs: u64) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| !entry.processed || entry.at.elapsed().as_secs() < max_age_secs);
        before - self.entries.len()
    }
}

const STATE_IN_PROGRESS: &str = "in_progress";
const STATE_PROCESSED: &str = "processed";

/// Persistent ledger backed by SQLite. Survives restarts: a processed order
/// stays processed, and a claim left behind by a crashed worker blocks
/// redeliveries only until it is older than the claim TTL.
pub struct SqliteLedger {
    conn: Mutex<rusqlite::Connection>,
    claim_ttl: Duration,
}

impl SqliteLedger {
    /// Open (or create) the ledger database at `path`.
    ///
    /// On Unix the file is restricted to 0600.
    pub fn open(path: &str) -> Result<Self, LedgerError> {
        let conn = rusqlite::Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS notifications (
                merchant_oid TEXT PRIMARY KEY,
                state TEXT NOT NULL,
                recorded_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_notifications_recorded_at
                ON notifications(recorded_at);
            PRAGMA journal_mode=WAL;",
        )?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(e) =
                std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            {
                tracing::warn!(
                    path = %path,
                    error = %e,
                    "failed to set ledger database file permissions to 0600"
                );
            }
        }

        Ok(Self {
            conn: Mutex::new(conn),
            claim_ttl: DEFAULT_CLAIM_TTL,
        })
    }

    pub fn with_claim_ttl(mut self, claim_ttl: Duration) -> Self {
        self.claim_ttl = claim_ttl;
        self
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, rusqlite::Connection> {
        match self.conn.lock() {
            Ok(c) => c,
            Err(poisoned) => {
                tracing::error!("ledger mutex poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

fn secs(d: Duration) -> i64 {
    i64::try_from(d.as_secs()).unwrap_or(i64::MAX)
}

impl NotificationLedger for SqliteLedger {
    fn try_claim(&self, merchant_oid: &str) -> Result<Claim, LedgerError> {
        let conn = self.conn();
        let now = unix_now();

        // Each statement is atomic against other workers and processes.
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO notifications (merchant_oid, state, recorded_at)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![merchant_oid, STATE_IN_PROGRESS, now],
        )?;
        if inserted == 1 {
            return Ok(Claim::Acquired);
        }

        let taken_over = conn.execute(
            "UPDATE notifications SET recorded_at = ?2
             WHERE merchant_oid = ?1 AND state = ?3 AND recorded_at <= ?4",
            rusqlite::params![
                merchant_oid,
                now,
                STATE_IN_PROGRESS,
                now.saturating_sub(secs(self.claim_ttl))
            ],
        )?;
        if taken_over == 1 {
            tracing::warn!(merchant_oid = %merchant_oid, "taking over stale ledger claim");
            return Ok(Claim::Acquired);
        }

        let state: String = conn.query_row(
            "SELECT state FROM notifications WHERE merchant_oid = ?1",
            [merchant_oid],
            |row| row.get(0),
        )?;
        Ok(if state == STATE_PROCESSED {
            Claim::Processed
        } else {
            Claim::InProgress
        })
    }

    fn complete(&self, merchant_oid: &str) -> Result<(), LedgerError> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO notifications (merchant_oid, state, recorded_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(merchant_oid) DO UPDATE SET state = ?2, recorded_at = ?3",
            rusqlite::params![merchant_oid, STATE_PROCESSED, unix_now()],
        )?;
        Ok(())
    }

    fn release(&self, merchant_oid: &str) {
        let conn = self.conn();
        if let Err(e) = conn.execute(
            "DELETE FROM notifications WHERE merchant_oid = ?1 AND state = ?2",
            rusqlite::params![merchant_oid, STATE_IN_PROGRESS],
        ) {
            tracing::error!(
                merchant_oid = %merchant_oid,
                error = %e,
                "failed to release ledger claim; redeliveries wait for the claim to expire"
            );
        }
    }

    fn is_processed(&self, merchant_oid: &str) -> bool {
        let conn = self.conn();
        conn.query_row(
            "SELECT COUNT(*) FROM notifications WHERE merchant_oid = ?1 AND state = ?2",
            rusqlite::params![merchant_oid, STATE_PROCESSED],
            |row| row.get::<_, i64>(0),
        )
        .map(|count| count > 0)
        .unwrap_or(false)
    }

    fn purge_expired(&self, max_age_secs: u64) -> usize {
        let conn = self.conn();
        let cutoff = unix_now().saturating_sub(i64::try_from(max_age_secs).unwrap_or(i64::MAX));
        match conn.execute(
            "DELETE FROM notifications WHERE state = ?1 AND recorded_at < ?2",
            rusqlite::params![STATE_PROCESSED, cutoff],
        ) {
            Ok(n) => n,
            Err(e) => {
                tracing::error!(error = %e, "failed to purge ledger");
                0
            }
        }
    }
}
