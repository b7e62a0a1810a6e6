pub mod api;
pub mod config;
pub mod constants;
pub mod error;
pub mod upstream;

pub use api::{router, AppState};
pub use config::Config;
pub use error::ApiError;
pub use upstream::{BlockSource, HttpBlockSource, UpstreamError};
