//! HTTP surface: three read-only block endpoints plus health checks.
//!
//! Every block endpoint follows the same path: cache lookup, upstream fetch
//! on a miss, shaping, then (for lists) the query pipeline.

use crate::config::Config;
use crate::constants::{BLOCKS_KEY_PREFIX, BLOCK_KEY_PREFIX};
use crate::error::ApiError;
use crate::upstream::BlockSource;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use blockscope_cache::{bucket_key_from_millis, current_bucket_key, CacheStore, CachedValue};
use blockscope_core::shape::{shape_block_detail, shape_block_summaries, shape_block_transactions};
use blockscope_core::{query, BlockDetail, BlockSummary, Page, QueryParams, RawBlock, RawBlockDetail, Transaction};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn BlockSource>,
    pub cache: Arc<dyn CacheStore>,
    pub config: Config,
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

#[derive(Debug, Default, Deserialize)]
pub struct BlocksQuery {
    /// Millisecond timestamp; only consulted with `honor_time_param`.
    pub time: Option<String>,
    #[serde(flatten)]
    pub query: QueryParams,
}

pub fn router(state: AppState) -> Router {
    let blocks = Router::new()
        .route("/blocks", get(list_blocks))
        .route("/blocks/", get(list_blocks))
        .route("/blocks/{hash}", get(block_detail))
        .route("/blocks/{hash}/", get(block_detail))
        .route("/blocks/{hash}/transactions", get(block_transactions))
        .route("/blocks/{hash}/transactions/", get(block_transactions));

    Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .merge(blocks.clone())
        .nest("/api", blocks)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn list_blocks(
    State(state): State<AppState>,
    query: Result<Query<BlocksQuery>, QueryRejection>,
) -> Result<Json<Page<BlockSummary>>, ApiError> {
    let Query(params) = query?;
    let bucket = state.bucket_key(params.time.as_deref())?;
    let raw = state.load_blocks(&bucket).await?;
    let shaped = shape_block_summaries(&raw, &Local)?;
    Ok(Json(query::run(&shaped, &params.query)?))
}

async fn block_detail(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<Json<BlockDetail>, ApiError> {
    let raw = state.load_block(&hash).await?;
    Ok(Json(shape_block_detail(&raw, &Local)?))
}

async fn block_transactions(
    State(state): State<AppState>,
    Path(hash): Path<String>,
    query: Result<Query<QueryParams>, QueryRejection>,
) -> Result<Json<Page<Transaction>>, ApiError> {
    let Query(params) = query?;
    let raw = state.load_block(&hash).await?;
    let shaped = shape_block_transactions(&raw, &Local)?;
    Ok(Json(query::run(&shaped, &params)?))
}

impl AppState {
    pub fn new(source: Arc<dyn BlockSource>, cache: Arc<dyn CacheStore>, config: Config) -> Self {
        Self {
            source,
            cache,
            config,
        }
    }

    /// The current day's bucket, unless the client's `time` is honored.
    fn bucket_key(&self, time: Option<&str>) -> Result<String, ApiError> {
        match time {
            Some(raw) if self.config.honor_time_param => raw
                .trim()
                .parse::<i64>()
                .ok()
                .and_then(bucket_key_from_millis)
                .ok_or_else(|| ApiError::InvalidTime(raw.to_string())),
            _ => Ok(current_bucket_key()),
        }
    }

    async fn load_blocks(&self, bucket: &str) -> Result<Vec<RawBlock>, ApiError> {
        let key = format!("{BLOCKS_KEY_PREFIX}{bucket}");
        if let Some(CachedValue::Blocks(blocks)) = self.cache_get(&key) {
            return Ok(blocks);
        }
        let blocks = self.source.fetch_blocks_in_bucket(bucket).await?;
        self.cache_set(&key, &CachedValue::Blocks(blocks.clone()), self.config.list_ttl);
        Ok(blocks)
    }

    async fn load_block(&self, hash: &str) -> Result<RawBlockDetail, ApiError> {
        let key = format!("{BLOCK_KEY_PREFIX}{hash}");
        if let Some(CachedValue::Block(block)) = self.cache_get(&key) {
            return Ok(block);
        }
        let block = self.source.fetch_block_by_hash(hash).await?;
        self.cache_set(&key, &CachedValue::Block(block.clone()), self.config.block_ttl);
        Ok(block)
    }

    /// A failing store reads as a miss.
    fn cache_get(&self, key: &str) -> Option<CachedValue> {
        match self.cache.get(key) {
            Ok(Some(value)) => {
                debug!(key, "cache hit");
                Some(value)
            }
            Ok(None) => {
                debug!(key, "cache miss");
                None
            }
            Err(err) => {
                warn!(key, error = %err, "cache read failed, going to upstream");
                None
            }
        }
    }

    fn cache_set(&self, key: &str, value: &CachedValue, ttl: Option<Duration>) {
        if let Err(err) = self.cache.set(key, value, ttl) {
            warn!(key, error = %err, "cache write failed");
        }
    }
}
