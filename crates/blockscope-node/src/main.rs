use blockscope_cache::{memory_store::MemoryStore, sled_store::SledStore, CacheStore};
use blockscope_node::config::{ttl_from_secs, Config};
use blockscope_node::constants::*;
use blockscope_node::{router, AppState, HttpBlockSource};
use clap::{Parser, ValueEnum};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tracing::{info, Level};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CacheBackend {
    Memory,
    Sled,
}

#[derive(Parser, Debug)]
struct Args {
    /// Address to listen on, e.g. 127.0.0.1:8080
    #[arg(long, default_value = DEFAULT_LISTEN)]
    listen: String,

    /// Base URL of the explorer API
    #[arg(long, default_value = DEFAULT_UPSTREAM)]
    upstream: String,

    /// Per-request upstream timeout
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    #[arg(long, value_enum, default_value_t = CacheBackend::Memory)]
    cache: CacheBackend,

    /// Data directory for the sled cache
    #[arg(long, default_value = "./data")]
    data_dir: String,

    /// Cache capacity in entries, for either backend
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_ENTRIES)]
    cache_max_entries: usize,

    /// Block list TTL, 0 disables expiry
    #[arg(long, default_value_t = DEFAULT_LIST_TTL_SECS)]
    list_ttl_secs: u64,

    /// Block-by-hash TTL, 0 disables expiry
    #[arg(long, default_value_t = DEFAULT_BLOCK_TTL_SECS)]
    block_ttl_secs: u64,

    /// Fetch the block list for the client's `time` instead of the current bucket
    #[arg(long)]
    honor_time_param: bool,
}

impl Args {
    fn config(&self) -> Config {
        Config {
            upstream: self.upstream.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            list_ttl: ttl_from_secs(self.list_ttl_secs),
            block_ttl: ttl_from_secs(self.block_ttl_secs),
            honor_time_param: self.honor_time_param,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = args.config();

    let cache: Arc<dyn CacheStore> = match args.cache {
        CacheBackend::Memory => Arc::new(MemoryStore::new().with_max_entries(args.cache_max_entries)),
        CacheBackend::Sled => Arc::new(SledStore::open(&args.data_dir)?.with_max_entries(args.cache_max_entries)),
    };
    let source = Arc::new(HttpBlockSource::new(&config.upstream, config.timeout)?);
    info!(upstream = %config.upstream, cache = ?args.cache, "blockscope-node starting");

    let app = router(AppState::new(source, cache, config));

    let addr: SocketAddr = args.listen.parse()?;
    info!("blockscope-node listening on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
