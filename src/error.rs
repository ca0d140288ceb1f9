use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeltaError {
    #[error("Request error: {0}")]
    Request(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("{0} ticker not found")]
    TickerNotFound(String),

    #[error("Invalid number in field '{field}': {value}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Invalid table key '{0}': expected 8 ASCII digits (YYYYMMDD)")]
    InvalidTableName(String),
}

impl From<reqwest::Error> for DeltaError {
    fn from(err: reqwest::Error) -> Self {
        DeltaError::Request(err.to_string())
    }
}

impl From<serde_json::Error> for DeltaError {
    fn from(err: serde_json::Error) -> Self {
        DeltaError::Parse(err.to_string())
    }
}
