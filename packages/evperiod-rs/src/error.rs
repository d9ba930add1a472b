use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvPeriodError {
    #[error("Invalid cutoff period {0}: must be finite and at least 2 events per cycle")]
    InvalidCutoffPeriod(f64),

    #[error("Unstable filter poles (alpha={alpha}, beta={beta}): both must lie in (0, 1)")]
    UnstablePoles { alpha: f64, beta: f64 },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Timestamps not monotonic at event {index}: {current} < {previous}")]
    NonMonotonicTimestamps {
        index: usize,
        previous: i64,
        current: i64,
    },

    #[error("Failed to parse event data: {0}")]
    ParseError(String),

    #[error("Input file not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EvPeriodError>;
