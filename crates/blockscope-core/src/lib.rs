use serde::{Deserialize, Serialize};

pub mod constants;
pub mod error;
pub mod query;

pub use error::{QueryError, ShapeError};
pub use query::{FieldValue, Page, QueryParams, Record, SortOrder};

/// One entry of the upstream "blocks in time bucket" array.
///
/// Only the fields the shaper reads are kept; everything else the upstream
/// sends is dropped during deserialization.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBlock {
    pub hash: Option<String>,
    pub height: Option<u64>,
    pub time: Option<i64>,
    pub block_index: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    pub hash: Option<String>,
    pub time: Option<i64>,
    pub size: Option<u64>,
    pub weight: Option<u64>,
    pub fee: Option<u64>,
}

/// Upstream "raw block" object, transactions included.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBlockDetail {
    pub hash: Option<String>,
    pub time: Option<i64>,
    pub fee: Option<u64>,
    pub size: Option<u64>,
    pub height: Option<u64>,
    pub weight: Option<u64>,
    pub block_index: Option<u64>,
    pub prev_block: Option<String>,
    pub tx: Option<Vec<RawTransaction>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSummary {
    pub hash: String,
    pub height: u64,
    pub time: i64,
    pub block_index: u64,
    pub human_time: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDetail {
    pub hash: String,
    pub time: i64,
    pub human_time: String,
    pub fee: u64,
    pub size: u64,
    pub height: u64,
    pub weight: u64,
    pub block_index: u64,
    pub prev_block: String,
    pub n_tx: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub hash: String,
    pub time: i64,
    pub human_time: String,
    pub size: u64,
    pub weight: u64,
    pub fee: u64,
}

pub mod shape {
    //! Maps raw upstream payloads onto the fixed-shape records served to clients.
    //!
    //! Timestamps are unix seconds. `human_time` renders the same instant in
    //! the caller-supplied time zone (the server uses `chrono::Local`).

    use super::*;
    use crate::constants::HUMAN_TIME_FORMAT;
    use chrono::{DateTime, TimeZone};
    use std::fmt::Display;

    pub fn human_time<Tz: TimeZone>(time: i64, tz: &Tz) -> Option<String>
    where
        Tz::Offset: Display,
    {
        DateTime::from_timestamp(time, 0)
            .map(|utc| utc.with_timezone(tz).format(HUMAN_TIME_FORMAT).to_string())
    }

    fn require<T: Clone>(
        value: &Option<T>,
        record: &'static str,
        field: &'static str,
    ) -> Result<T, ShapeError> {
        value
            .clone()
            .ok_or(ShapeError::MissingField { record, field })
    }

    fn render<Tz: TimeZone>(time: i64, tz: &Tz, record: &'static str) -> Result<String, ShapeError>
    where
        Tz::Offset: Display,
    {
        human_time(time, tz).ok_or(ShapeError::InvalidTimestamp { record, time })
    }

    pub fn shape_block_summary<Tz: TimeZone>(raw: &RawBlock, tz: &Tz) -> Result<BlockSummary, ShapeError>
    where
        Tz::Offset: Display,
    {
        const RECORD: &str = "block";
        let time = require(&raw.time, RECORD, "time")?;
        Ok(BlockSummary {
            hash: require(&raw.hash, RECORD, "hash")?,
            height: require(&raw.height, RECORD, "height")?,
            time,
            block_index: require(&raw.block_index, RECORD, "block_index")?,
            human_time: render(time, tz, RECORD)?,
        })
    }

    pub fn shape_block_summaries<Tz: TimeZone>(
        raw: &[RawBlock],
        tz: &Tz,
    ) -> Result<Vec<BlockSummary>, ShapeError>
    where
        Tz::Offset: Display,
    {
        raw.iter().map(|b| shape_block_summary(b, tz)).collect()
    }

    pub fn shape_block_detail<Tz: TimeZone>(raw: &RawBlockDetail, tz: &Tz) -> Result<BlockDetail, ShapeError>
    where
        Tz::Offset: Display,
    {
        const RECORD: &str = "block detail";
        let time = require(&raw.time, RECORD, "time")?;
        let txs = raw
            .tx
            .as_ref()
            .ok_or(ShapeError::MissingField { record: RECORD, field: "tx" })?;
        Ok(BlockDetail {
            hash: require(&raw.hash, RECORD, "hash")?,
            time,
            human_time: render(time, tz, RECORD)?,
            fee: require(&raw.fee, RECORD, "fee")?,
            size: require(&raw.size, RECORD, "size")?,
            height: require(&raw.height, RECORD, "height")?,
            weight: require(&raw.weight, RECORD, "weight")?,
            block_index: require(&raw.block_index, RECORD, "block_index")?,
            prev_block: require(&raw.prev_block, RECORD, "prev_block")?,
            n_tx: txs.len(),
        })
    }

    pub fn shape_transaction<Tz: TimeZone>(raw: &RawTransaction, tz: &Tz) -> Result<Transaction, ShapeError>
    where
        Tz::Offset: Display,
    {
        const RECORD: &str = "transaction";
        let time = require(&raw.time, RECORD, "time")?;
        Ok(Transaction {
            hash: require(&raw.hash, RECORD, "hash")?,
            time,
            human_time: render(time, tz, RECORD)?,
            size: require(&raw.size, RECORD, "size")?,
            weight: require(&raw.weight, RECORD, "weight")?,
            fee: require(&raw.fee, RECORD, "fee")?,
        })
    }

    /// Shapes every transaction of a raw block, in upstream order.
    pub fn shape_block_transactions<Tz: TimeZone>(
        raw: &RawBlockDetail,
        tz: &Tz,
    ) -> Result<Vec<Transaction>, ShapeError>
    where
        Tz::Offset: Display,
    {
        raw.tx
            .as_deref()
            .ok_or(ShapeError::MissingField { record: "block detail", field: "tx" })?
            .iter()
            .map(|t| shape_transaction(t, tz))
            .collect()
    }
}
