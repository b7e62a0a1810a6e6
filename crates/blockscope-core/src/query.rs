//! Search, sort and paginate over shaped records.
//!
//! Stages run in a fixed order: filter by substring, stable sort by one
//! named field, then slice out a 1-indexed page. The input slice is only
//! borrowed; every stage works on an owned copy.

use crate::constants::{DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE};
use crate::{BlockSummary, QueryError, Transaction};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;
use tracing::debug;

/// Query-string parameters shared by the list endpoints.
///
/// Kept as raw strings so malformed numbers surface as structured
/// `QueryError`s instead of extractor rejections.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams {
    pub search: Option<String>,
    pub sort_field: Option<String>,
    pub sort_order: Option<String>,
    pub page_number: Option<String>,
    pub page_size: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// `"desc"` sorts descending; anything else, absent included, is ascending.
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("desc") => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }
}

/// Borrowed value of one record field, used for both matching and ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum FieldValue<'a> {
    Signed(i64),
    Unsigned(u64),
    Text(&'a str),
}

impl FieldValue<'_> {
    pub fn contains(&self, term: &str) -> bool {
        match self {
            FieldValue::Text(s) => s.contains(term),
            other => other.to_string().contains(term),
        }
    }
}

impl fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Signed(v) => write!(f, "{v}"),
            FieldValue::Unsigned(v) => write!(f, "{v}"),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

/// A shaped record the pipeline can search and sort.
pub trait Record: Clone {
    type Field: Copy + FromStr<Err = QueryError> + 'static;

    /// Fields whose stringified value is matched against a search term.
    const SEARCHABLE: &'static [Self::Field];

    fn field(&self, field: Self::Field) -> FieldValue<'_>;

    fn matches(&self, term: &str) -> bool {
        Self::SEARCHABLE.iter().any(|f| self.field(*f).contains(term))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<R> {
    /// Count after search, before pagination.
    #[serde(rename = "totalSize")]
    pub total_size: usize,
    pub results: Vec<R>,
}

/// Case-sensitive substring filter. An empty term keeps everything.
pub fn filter<R: Record>(records: &[R], search: Option<&str>) -> Vec<R> {
    match search.filter(|t| !t.is_empty()) {
        Some(term) => records.iter().filter(|r| r.matches(term)).cloned().collect(),
        None => records.to_vec(),
    }
}

/// Stable sort. Descending uses a reversed comparator so equal keys keep
/// their incoming order in both directions.
pub fn sort<R: Record>(records: &mut [R], field: R::Field, order: SortOrder) {
    records.sort_by(|a, b| {
        let ord: Ordering = a.field(field).cmp(&b.field(field));
        match order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
}

/// Number of the last page; an empty list still has page 1.
pub fn last_page(total: usize, page_size: NonZeroUsize) -> usize {
    total.div_ceil(page_size.get()).max(1)
}

pub fn paginate<R>(records: Vec<R>, page_number: i64, page_size: NonZeroUsize) -> Result<Vec<R>, QueryError> {
    let last = last_page(records.len(), page_size);
    if page_number < 1 || page_number as u64 > last as u64 {
        return Err(QueryError::PageOutOfRange {
            page: page_number,
            last,
        });
    }
    let size = page_size.get();
    let start = (page_number as usize - 1).saturating_mul(size);
    Ok(records.into_iter().skip(start).take(size).collect())
}

pub fn parse_page_size(value: Option<&str>) -> Result<NonZeroUsize, QueryError> {
    let raw = match value {
        Some(raw) => raw.to_string(),
        None => DEFAULT_PAGE_SIZE.to_string(),
    };
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(|size| usize::try_from(size).ok())
        .and_then(NonZeroUsize::new)
        .ok_or(QueryError::InvalidPageSize(raw))
}

pub fn parse_page_number(value: Option<&str>) -> Result<i64, QueryError> {
    match value {
        None => Ok(DEFAULT_PAGE_NUMBER),
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|_| QueryError::InvalidPageNumber(raw.to_string())),
    }
}

/// Runs search, sort and pagination over `records` in that order.
pub fn run<R: Record>(records: &[R], params: &QueryParams) -> Result<Page<R>, QueryError> {
    let page_size = parse_page_size(params.page_size.as_deref())?;
    let sort_field = params
        .sort_field
        .as_deref()
        .map(str::parse::<R::Field>)
        .transpose()?;

    let mut selected = filter(records, params.search.as_deref());
    if let Some(field) = sort_field {
        sort(&mut selected, field, SortOrder::from_param(params.sort_order.as_deref()));
    }

    let page_number = parse_page_number(params.page_number.as_deref())?;
    let total_size = selected.len();
    let results = paginate(selected, page_number, page_size)?;
    debug!(total_size, page_number, page_size = page_size.get(), returned = results.len(), "query pipeline");
    Ok(Page {
        total_size,
        results,
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockField {
    Hash,
    Height,
    Time,
    BlockIndex,
    HumanTime,
}

impl FromStr for BlockField {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hash" => Ok(BlockField::Hash),
            "height" => Ok(BlockField::Height),
            "time" => Ok(BlockField::Time),
            "block_index" => Ok(BlockField::BlockIndex),
            "human_time" => Ok(BlockField::HumanTime),
            other => Err(QueryError::InvalidSortField(other.to_string())),
        }
    }
}

impl Record for BlockSummary {
    type Field = BlockField;

    const SEARCHABLE: &'static [BlockField] = &[
        BlockField::Hash,
        BlockField::HumanTime,
        BlockField::Height,
        BlockField::BlockIndex,
    ];

    fn field(&self, field: BlockField) -> FieldValue<'_> {
        match field {
            BlockField::Hash => FieldValue::Text(&self.hash),
            BlockField::Height => FieldValue::Unsigned(self.height),
            BlockField::Time => FieldValue::Signed(self.time),
            BlockField::BlockIndex => FieldValue::Unsigned(self.block_index),
            BlockField::HumanTime => FieldValue::Text(&self.human_time),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionField {
    Hash,
    Time,
    Size,
    Weight,
    Fee,
    HumanTime,
}

impl FromStr for TransactionField {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hash" => Ok(TransactionField::Hash),
            "time" => Ok(TransactionField::Time),
            "size" => Ok(TransactionField::Size),
            "weight" => Ok(TransactionField::Weight),
            "fee" => Ok(TransactionField::Fee),
            "human_time" => Ok(TransactionField::HumanTime),
            other => Err(QueryError::InvalidSortField(other.to_string())),
        }
    }
}

impl Record for Transaction {
    type Field = TransactionField;

    const SEARCHABLE: &'static [TransactionField] = &[
        TransactionField::Hash,
        TransactionField::HumanTime,
        TransactionField::Size,
        TransactionField::Weight,
        TransactionField::Fee,
    ];

    fn field(&self, field: TransactionField) -> FieldValue<'_> {
        match field {
            TransactionField::Hash => FieldValue::Text(&self.hash),
            TransactionField::Time => FieldValue::Signed(self.time),
            TransactionField::Size => FieldValue::Unsigned(self.size),
            TransactionField::Weight => FieldValue::Unsigned(self.weight),
            TransactionField::Fee => FieldValue::Unsigned(self.fee),
            TransactionField::HumanTime => FieldValue::Text(&self.human_time),
        }
    }
}
