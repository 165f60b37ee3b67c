use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TargetEngineError {
    #[error("Target is not configured: {0}")]
    NotConfigured(String),

    #[error("Invalid date range: end date {end} is before start date {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Rollup violation in {field} for period {label}: daily sum {daily} != aggregated sum {aggregated}")]
    RollupViolation {
        field: &'static str,
        label: String,
        daily: f64,
        aggregated: f64,
    },

    #[error(
        "Required-revenue partition violation: daily requirements sum to {allocated}, target is {target}"
    )]
    RequiredPartitionViolation { target: f64, allocated: f64 },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TargetEngineError>;
