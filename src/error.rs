use thiserror::Error;

/// Failure to obtain a usable payload of tracked-object records.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("request failed: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("could not read payload: {0}")]
    Io(#[from] std::io::Error),
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload is empty")]
    EmptyPayload,
    #[error("upstream reported an error: {0}")]
    Upstream(String),
    #[error("payload has no recognizable records")]
    NoRecords,
}

/// A single record that cannot be turned into orbital state.
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("invalid element set: {0}")]
    ElementSet(String),
    #[error("field `{0}` is not a finite number")]
    NonFinite(&'static str),
    #[error("no valid position at load time")]
    InitialPropagation,
}

#[derive(Debug, Error, PartialEq)]
pub enum ClockError {
    #[error("fixed step must be between 0 and 1e12 milliseconds, got {0}")]
    InvalidStep(f64),
    #[error("time multiplier must be between 0 and 1e9, got {0}")]
    InvalidMultiplier(f64),
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error(transparent)]
    Clock(#[from] ClockError),
    #[error("{name} must be a positive length, got {value}")]
    InvalidRadius { name: &'static str, value: f64 },
    #[error("frame rate must be at least 1")]
    InvalidFramerate,
}
