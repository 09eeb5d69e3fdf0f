/// Error types shared by the store and the HTTP layer.
///
/// Startup errors (configuration, database validation) live next to the
/// code that produces them in `config` and `db`; this module covers what
/// can go wrong while answering a request.

use thiserror::Error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Failure talking to the climate store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to connect to the climate database: {0}")]
    Connect(#[source] BoxedSource),

    #[error("query failed: {0}")]
    Query(#[source] BoxedSource),
}

impl StoreError {
    pub fn connect(e: impl Into<BoxedSource>) -> Self {
        StoreError::Connect(e.into())
    }

    pub fn query(e: impl Into<BoxedSource>) -> Self {
        StoreError::Query(e.into())
    }
}

/// Request-level failure, mapped onto an HTTP status by the endpoint.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid date '{0}': expected yyyy-mm-dd")]
    InvalidDate(String),

    #[error("Not found")]
    NotFound,

    #[error("method {0} not allowed")]
    MethodNotAllowed(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to serialize response: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::InvalidDate(_) => 400,
            ApiError::NotFound => 404,
            ApiError::MethodNotAllowed(_) => 405,
            ApiError::Store(_) | ApiError::Serialize(_) => 500,
        }
    }
}
