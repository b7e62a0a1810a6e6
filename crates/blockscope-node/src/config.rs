use crate::constants::*;
use std::time::Duration;

/// Runtime settings the handlers and upstream client read.
#[derive(Clone, Debug)]
pub struct Config {
    pub upstream: String,
    pub timeout: Duration,
    /// `None` keeps entries until overwritten or evicted.
    pub list_ttl: Option<Duration>,
    pub block_ttl: Option<Duration>,
    /// Fetch and key the block list by the client's `time` parameter
    /// instead of the current bucket.
    pub honor_time_param: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upstream: DEFAULT_UPSTREAM.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            list_ttl: ttl_from_secs(DEFAULT_LIST_TTL_SECS),
            block_ttl: ttl_from_secs(DEFAULT_BLOCK_TTL_SECS),
            honor_time_param: false,
        }
    }
}

/// `0` means no expiry.
pub fn ttl_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
