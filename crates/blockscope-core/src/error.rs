use thiserror::Error;

/// Raised when an upstream payload cannot be mapped onto a shaped record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("{record} is missing required field `{field}`")]
    MissingField {
        record: &'static str,
        field: &'static str,
    },
    #[error("{record} has an unrepresentable timestamp {time}")]
    InvalidTimestamp { record: &'static str, time: i64 },
}

/// Client input the query pipeline rejects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("unknown sort field `{0}`")]
    InvalidSortField(String),
    #[error("page_size must be a positive integer, got `{0}`")]
    InvalidPageSize(String),
    #[error("page_number must be an integer, got `{0}`")]
    InvalidPageNumber(String),
    #[error("page {page} is out of range, last page is {last}")]
    PageOutOfRange { page: i64, last: usize },
}

impl QueryError {
    /// Stable machine-readable name used in error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            QueryError::InvalidSortField(_) => "invalid_sort_field",
            QueryError::InvalidPageSize(_) => "invalid_page_size",
            QueryError::InvalidPageNumber(_) => "invalid_page_number",
            QueryError::PageOutOfRange { .. } => "page_out_of_range",
        }
    }
}
