use crate::{CacheStore, CachedValue};
use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sled::{Db, IVec, Tree};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const TREE_ENTRIES: &str = "entries";

/// Writes between two full sweeps of the tree.
const SWEEP_EVERY: u64 = 64;

#[derive(Serialize, Deserialize)]
struct Envelope {
    /// Wall-clock expiry so it survives restarts.
    expires_at_ms: Option<i64>,
    stored_at_ms: i64,
    value: CachedValue,
}

impl Envelope {
    fn is_expired(&self, now_ms: i64) -> bool {
        self.expires_at_ms.is_some_and(|at| at <= now_ms)
    }
}

/// Persistent cache backed by a sled tree.
///
/// Expired entries are dropped when read, on `open`, and by a sweep every
/// `SWEEP_EVERY` writes. With a capacity set, the oldest live entries are
/// evicted once the tree grows past it. Writes are not flushed individually;
/// sled flushes in the background and `flush` forces it.
#[derive(Clone)]
pub struct SledStore {
    db: Db,
    entries: Tree,
    max_entries: Option<usize>,
    writes: Arc<AtomicU64>,
}

impl SledStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path).context("open sled cache")?;
        let entries = db.open_tree(TREE_ENTRIES)?;
        let store = Self {
            db,
            entries,
            max_entries: None,
            writes: Arc::new(AtomicU64::new(0)),
        };
        let swept = store.sweep_expired()?;
        info!(entries = store.len(), swept, "sled cache opened");
        Ok(store)
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries.max(1));
        self
    }

    /// Stored entry count, expired ones included until the next sweep.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    /// Removes expired and undecodable entries, returning how many went.
    pub fn sweep_expired(&self) -> Result<usize> {
        let now_ms = Utc::now().timestamp_millis();
        let mut removed = 0;
        for item in self.entries.iter() {
            let (key, bytes) = item?;
            let stale = match bincode::deserialize::<Envelope>(&bytes) {
                Ok(envelope) => envelope.is_expired(now_ms),
                Err(_) => true,
            };
            if stale {
                self.entries.remove(&key)?;
                removed += 1;
            }
        }
        if removed > 0 {
            debug!(removed, "swept sled cache");
        }
        Ok(removed)
    }

    /// Evicts the oldest live entries until the tree fits `max_entries`.
    fn enforce_capacity(&self, max_entries: usize) -> Result<()> {
        if self.entries.len() <= max_entries {
            return Ok(());
        }
        self.sweep_expired()?;
        let overflow = self.entries.len().saturating_sub(max_entries);
        if overflow == 0 {
            return Ok(());
        }
        let mut ages: Vec<(i64, IVec)> = Vec::with_capacity(self.entries.len());
        for item in self.entries.iter() {
            let (key, bytes) = item?;
            let envelope: Envelope = bincode::deserialize(&bytes).context("decode cache entry")?;
            ages.push((envelope.stored_at_ms, key));
        }
        ages.sort_by_key(|(stored_at, _)| *stored_at);
        for (_, key) in ages.into_iter().take(overflow) {
            self.entries.remove(&key)?;
        }
        debug!(evicted = overflow, "sled cache over capacity");
        Ok(())
    }
}

impl CacheStore for SledStore {
    fn get(&self, key: &str) -> Result<Option<CachedValue>> {
        let Some(bytes) = self.entries.get(key)? else {
            return Ok(None);
        };
        let envelope: Envelope =
            bincode::deserialize(&bytes).with_context(|| format!("decode cache entry {key}"))?;
        if envelope.is_expired(Utc::now().timestamp_millis()) {
            debug!(key, "dropping expired cache entry");
            self.entries.remove(key)?;
            return Ok(None);
        }
        Ok(Some(envelope.value))
    }

    fn set(&self, key: &str, value: &CachedValue, ttl: Option<Duration>) -> Result<()> {
        let now_ms = Utc::now().timestamp_millis();
        let expires_at_ms = ttl.map(|ttl| {
            let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
            now_ms.saturating_add(ttl_ms)
        });
        let envelope = Envelope {
            expires_at_ms,
            stored_at_ms: now_ms,
            value: value.clone(),
        };
        self.entries.insert(key, bincode::serialize(&envelope)?)?;

        if let Some(max_entries) = self.max_entries {
            self.enforce_capacity(max_entries)?;
        }
        if (self.writes.fetch_add(1, Ordering::Relaxed) + 1) % SWEEP_EVERY == 0 {
            self.sweep_expired()?;
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.remove(key)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.entries.clear()?;
        Ok(())
    }
}
