use thiserror::Error;

/// Failure to obtain a usable payload for one city.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no forecast location known for city '{0}'")]
    UnknownCity(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("source responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {0}")]
    Request(String),

    #[error("invalid JSON in response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid payload: expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(err.to_string())
        } else if err.is_connect() {
            FetchError::Connection(err.to_string())
        } else {
            FetchError::Request(err.to_string())
        }
    }
}

/// Failure to reduce an otherwise fetched payload.
#[derive(Debug, Error)]
pub enum ReduceError {
    #[error("payload has no 'forecasts' field")]
    MissingForecasts,

    #[error("'forecasts' must be an array")]
    ForecastsNotArray,

    #[error("reduction worker terminated before reporting a result")]
    WorkerLost,
}

/// Errors that abort a whole pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to build reduce worker pool: {0}")]
    ReducePool(#[from] rayon::ThreadPoolBuildError),

    #[error("invalid pipeline setting: {0}")]
    Setting(String),
}
