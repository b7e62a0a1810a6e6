#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use blockscope_cache::{memory_store::MemoryStore, CacheStore, CachedValue};
use blockscope_core::{RawBlock, RawBlockDetail, RawTransaction};
use blockscope_node::{router, AppState, BlockSource, Config, UpstreamError};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

/// In-memory stand-in for the explorer that counts every call.
#[derive(Default)]
pub struct FakeSource {
    pub blocks: Vec<RawBlock>,
    pub details: HashMap<String, RawBlockDetail>,
    pub fail_with: Mutex<Option<fn() -> UpstreamError>>,
    pub list_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
    pub buckets: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    pub fn fail(&self, err: fn() -> UpstreamError) {
        *self.fail_with.lock().unwrap() = Some(err);
    }

    fn failure(&self) -> Option<UpstreamError> {
        self.fail_with.lock().unwrap().map(|f| f())
    }
}

#[async_trait]
impl BlockSource for FakeSource {
    async fn fetch_blocks_in_bucket(&self, bucket_ms: &str) -> Result<Vec<RawBlock>, UpstreamError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.buckets.lock().unwrap().push(bucket_ms.to_string());
        if let Some(err) = self.failure() {
            return Err(err);
        }
        Ok(self.blocks.clone())
    }

    async fn fetch_block_by_hash(&self, hash: &str) -> Result<RawBlockDetail, UpstreamError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.failure() {
            return Err(err);
        }
        self.details
            .get(hash)
            .cloned()
            .ok_or_else(|| UpstreamError::NotFound(hash.to_string()))
    }
}

/// Store whose backend is always down.
pub struct BrokenCache;

impl CacheStore for BrokenCache {
    fn get(&self, _key: &str) -> Result<Option<CachedValue>> {
        Err(anyhow!("connection refused"))
    }
    fn set(&self, _key: &str, _value: &CachedValue, _ttl: Option<Duration>) -> Result<()> {
        Err(anyhow!("connection refused"))
    }
    fn remove(&self, _key: &str) -> Result<()> {
        Err(anyhow!("connection refused"))
    }
    fn clear(&self) -> Result<()> {
        Err(anyhow!("connection refused"))
    }
}

pub fn raw_block(height: u64) -> RawBlock {
    RawBlock {
        hash: Some(format!("{height:064x}")),
        height: Some(height),
        time: Some(1_700_000_000 + height as i64 * 600),
        block_index: Some(height),
    }
}

pub fn raw_tx(hash: &str, fee: u64) -> RawTransaction {
    RawTransaction {
        hash: Some(hash.to_string()),
        time: Some(1_700_000_000),
        size: Some(226),
        weight: Some(904),
        fee: Some(fee),
    }
}

pub fn raw_detail(hash: &str, txs: Vec<RawTransaction>) -> RawBlockDetail {
    RawBlockDetail {
        hash: Some(hash.to_string()),
        time: Some(1_700_000_000),
        fee: Some(txs.iter().filter_map(|t| t.fee).sum()),
        size: Some(1_234_567),
        height: Some(820_000),
        weight: Some(3_993_000),
        block_index: Some(820_000),
        prev_block: Some("00".repeat(32)),
        tx: Some(txs),
    }
}

/// Five transactions, three of which carry "ab" in their hash.
pub fn sample_source() -> FakeSource {
    let txs = vec![
        raw_tx("ab01", 10),
        raw_tx("cd02", 99),
        raw_tx("xab3", 50),
        raw_tx("ef04", 70),
        raw_tx("05ab", 30),
    ];
    let mut details = HashMap::new();
    details.insert("deadbeef".to_string(), raw_detail("deadbeef", txs));
    FakeSource {
        blocks: (1..=25).map(raw_block).collect(),
        details,
        ..Default::default()
    }
}

pub struct TestApp {
    pub app: Router,
    pub source: Arc<FakeSource>,
    pub cache: Arc<MemoryStore>,
}

pub fn test_app(source: FakeSource, config: Config) -> TestApp {
    let source = Arc::new(source);
    let cache = Arc::new(MemoryStore::new());
    let app = router(AppState::new(source.clone(), cache.clone(), config));
    TestApp { app, source, cache }
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let res = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

pub async fn get_as<T: DeserializeOwned>(app: &Router, uri: &str) -> (StatusCode, T) {
    let (status, json) = get(app, uri).await;
    (status, serde_json::from_value(json).expect("unexpected response shape"))
}
