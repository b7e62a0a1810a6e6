use crate::{CacheStore, CachedValue};
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::debug;

struct Entry {
    value: CachedValue,
    expires_at: Option<Instant>,
    /// Insertion order, used to pick the eviction victim.
    seq: u64,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

#[derive(Default)]
struct State {
    entries: HashMap<String, Entry>,
    next_seq: u64,
    stats: CacheStats,
}

/// Process-local store. With `max_entries` set, inserting a new key into a
/// full store drops expired entries first, then the oldest insertion.
#[derive(Default)]
pub struct MemoryStore {
    max_entries: Option<usize>,
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries.max(1));
        self
    }

    pub fn stats(&self) -> Result<CacheStats> {
        Ok(self.lock()?.stats)
    }

    /// Live (unexpired) entry count.
    pub fn len(&self) -> Result<usize> {
        let now = Instant::now();
        Ok(self
            .lock()?
            .entries
            .values()
            .filter(|e| !e.is_expired(now))
            .count())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("memory cache lock poisoned"))
    }

    fn make_room(state: &mut State, max_entries: usize, now: Instant) {
        state.entries.retain(|_, e| !e.is_expired(now));
        while state.entries.len() >= max_entries {
            let Some(oldest) = state
                .entries
                .iter()
                .min_by_key(|(_, e)| e.seq)
                .map(|(k, _)| k.clone())
            else {
                break;
            };
            state.entries.remove(&oldest);
            state.stats.evictions += 1;
            debug!(key = %oldest, "evicted cache entry");
        }
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<CachedValue>> {
        let now = Instant::now();
        let mut state = self.lock()?;
        let expired = state.entries.get(key).map(|e| e.is_expired(now));
        let hit = match expired {
            Some(false) => state.entries.get(key).map(|e| e.value.clone()),
            Some(true) => {
                state.entries.remove(key);
                None
            }
            None => None,
        };
        if hit.is_some() {
            state.stats.hits += 1;
        } else {
            state.stats.misses += 1;
        }
        Ok(hit)
    }

    fn set(&self, key: &str, value: &CachedValue, ttl: Option<Duration>) -> Result<()> {
        let now = Instant::now();
        let mut state = self.lock()?;
        if let Some(max) = self.max_entries {
            if !state.entries.contains_key(key) {
                Self::make_room(&mut state, max, now);
            }
        }
        let seq = state.next_seq;
        state.next_seq += 1;
        state.entries.insert(
            key.to_string(),
            Entry {
                value: value.clone(),
                // a TTL past the end of `Instant` never expires
                expires_at: ttl.and_then(|ttl| now.checked_add(ttl)),
                seq,
            },
        );
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.entries.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.lock()?.entries.clear();
        Ok(())
    }
}
