#![allow(dead_code)]

use std::fs;

use blockscope_cache::{sled_store::SledStore, CachedValue};
use blockscope_core::{RawBlock, RawBlockDetail, RawTransaction};
use tempfile::{tempdir, TempDir};

pub fn create_temp_store() -> (TempDir, SledStore) {
    // Each test gets its own sled directory
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let db_path = temp_dir.path().to_path_buf();
    (
        temp_dir,
        SledStore::open(db_path).expect("Failed to open SledStore"),
    )
}

pub fn teardown_store(temp_dir: TempDir, store: SledStore) {
    let db_path = temp_dir.path().to_path_buf();
    drop(store);
    temp_dir.close().expect("Failed to delete temp dir");
    let _ = fs::remove_dir_all(&db_path);
    assert!(!db_path.exists(), "Cache directory should be removed");
}

pub fn raw_blocks(n: u64) -> CachedValue {
    CachedValue::Blocks(
        (0..n)
            .map(|i| RawBlock {
                hash: Some(format!("{i:064x}")),
                height: Some(800_000 + i),
                time: Some(1_700_000_000 + i as i64 * 600),
                block_index: Some(800_000 + i),
            })
            .collect(),
    )
}

pub fn raw_block(hash: &str, n_tx: u64) -> CachedValue {
    CachedValue::Block(RawBlockDetail {
        hash: Some(hash.to_string()),
        time: Some(1_700_000_000),
        fee: Some(1_000),
        size: Some(1_000_000),
        height: Some(800_000),
        weight: Some(3_990_000),
        block_index: Some(800_000),
        prev_block: Some("00".repeat(32)),
        tx: Some(
            (0..n_tx)
                .map(|i| RawTransaction {
                    hash: Some(format!("tx{i}")),
                    time: Some(1_700_000_000),
                    size: Some(200 + i),
                    weight: Some(800 + i),
                    fee: Some(i * 10),
                })
                .collect(),
        ),
    })
}
