pub const DEFAULT_PAGE_NUMBER: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 10;
/// `05-Jan-2024 (13:45:02)`
pub const HUMAN_TIME_FORMAT: &str = "%d-%b-%Y (%H:%M:%S)";
