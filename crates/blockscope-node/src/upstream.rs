//! Client for the public explorer API the facade sits in front of.

use async_trait::async_trait;
use blockscope_core::{RawBlock, RawBlockDetail};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream unavailable: {0}")]
    Unavailable(String),
    #[error("upstream did not answer within {0:?}")]
    Timeout(Duration),
    #[error("upstream answered with status {0}")]
    Status(StatusCode),
    #[error("block `{0}` not found")]
    NotFound(String),
}

/// The two reads the facade needs from the explorer.
#[async_trait]
pub trait BlockSource: Send + Sync {
    /// `bucket_ms` is a millisecond timestamp selecting one day of blocks.
    async fn fetch_blocks_in_bucket(&self, bucket_ms: &str) -> Result<Vec<RawBlock>, UpstreamError>;

    async fn fetch_block_by_hash(&self, hash: &str) -> Result<RawBlockDetail, UpstreamError>;
}

/// The list resource has been seen both bare and wrapped in `{"blocks": ..}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum BlocksPayload {
    List(Vec<RawBlock>),
    Wrapped { blocks: Vec<RawBlock> },
}

impl From<BlocksPayload> for Vec<RawBlock> {
    fn from(payload: BlocksPayload) -> Self {
        match payload {
            BlocksPayload::List(blocks) | BlocksPayload::Wrapped { blocks } => blocks,
        }
    }
}

/// Hashes and block indexes are plain alphanumerics; anything else cannot
/// name a block and must not be spliced into the upstream URL.
pub fn is_block_identifier(hash: &str) -> bool {
    !hash.is_empty() && hash.len() <= 128 && hash.bytes().all(|b| b.is_ascii_alphanumeric())
}

#[derive(Clone)]
pub struct HttpBlockSource {
    http: Client,
    base: String,
    timeout: Duration,
}

impl HttpBlockSource {
    pub fn new(base: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base: base.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn classify(&self, err: reqwest::Error) -> UpstreamError {
        if err.is_timeout() {
            UpstreamError::Timeout(self.timeout)
        } else {
            UpstreamError::Unavailable(err.to_string())
        }
    }

    async fn get(&self, url: &str) -> Result<Response, UpstreamError> {
        debug!(%url, "upstream request");
        self.http.get(url).send().await.map_err(|e| self.classify(e))
    }
}

#[async_trait]
impl BlockSource for HttpBlockSource {
    async fn fetch_blocks_in_bucket(&self, bucket_ms: &str) -> Result<Vec<RawBlock>, UpstreamError> {
        let url = format!("{}/blocks/{bucket_ms}?format=json", self.base);
        let res = self.get(&url).await?;
        let status = res.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status));
        }
        let payload: BlocksPayload = res.json().await.map_err(|e| self.classify(e))?;
        let blocks: Vec<RawBlock> = payload.into();
        info!(bucket_ms, count = blocks.len(), "fetched blocks from upstream");
        Ok(blocks)
    }

    async fn fetch_block_by_hash(&self, hash: &str) -> Result<RawBlockDetail, UpstreamError> {
        if !is_block_identifier(hash) {
            return Err(UpstreamError::NotFound(hash.to_string()));
        }
        let url = format!("{}/rawblock/{hash}", self.base);
        let res = self.get(&url).await?;
        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Err(UpstreamError::NotFound(hash.to_string()));
        }
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default().to_lowercase();
            if body.contains("not found") || body.contains("not-found") {
                return Err(UpstreamError::NotFound(hash.to_string()));
            }
            return Err(UpstreamError::Status(status));
        }
        let block: RawBlockDetail = res.json().await.map_err(|e| self.classify(e))?;
        info!(hash, "fetched block from upstream");
        Ok(block)
    }
}
