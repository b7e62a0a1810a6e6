pub const DEFAULT_LISTEN: &str = "127.0.0.1:8080";
pub const DEFAULT_UPSTREAM: &str = "https://blockchain.info";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_LIST_TTL_SECS: u64 = 300;
/// Mined blocks do not change, so hash-keyed entries can live much longer.
pub const DEFAULT_BLOCK_TTL_SECS: u64 = 3600;
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 1024;

pub(crate) const BLOCKS_KEY_PREFIX: &str = "blocks:";
pub(crate) const BLOCK_KEY_PREFIX: &str = "block:";
