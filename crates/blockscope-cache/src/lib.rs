pub mod memory_store;
pub mod sled_store;

use anyhow::Result;
use blockscope_core::{RawBlock, RawBlockDetail};
use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What the facade keeps per key: the raw upstream payload, shaped again on
/// every read so handlers never hand out or mutate the stored original.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CachedValue {
    /// Keyed by bucket key.
    Blocks(Vec<RawBlock>),
    /// Keyed by block hash.
    Block(RawBlockDetail),
}

/// Key-value store with optional per-entry expiry.
///
/// Implementations report backend failures as errors; callers treat any
/// error as a miss and go to the upstream directly.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<CachedValue>>;
    fn set(&self, key: &str, value: &CachedValue, ttl: Option<Duration>) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Bucket key for the block list: UTC midnight of the day before `now`, in
/// milliseconds. Every request on the same UTC day maps to the same key.
pub fn bucket_key_for(now: DateTime<Utc>) -> String {
    let today = now.date_naive();
    let yesterday = today.pred_opt().unwrap_or(today);
    yesterday
        .and_time(NaiveTime::MIN)
        .and_utc()
        .timestamp_millis()
        .to_string()
}

pub fn current_bucket_key() -> String {
    bucket_key_for(Utc::now())
}

/// Truncates a client-supplied millisecond timestamp to the start of its UTC day.
pub fn bucket_key_from_millis(millis: i64) -> Option<String> {
    let at = DateTime::from_timestamp_millis(millis)?;
    Some(
        at.date_naive()
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp_millis()
            .to_string(),
    )
}
