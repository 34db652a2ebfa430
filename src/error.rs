// Error types module
use thiserror::Error;

/// Failure modes of a single fetch invocation.
///
/// Every variant surfaces to the caller as the same 500 envelope; the
/// distinction exists for logs.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Connection error: {0}")]
    Connection(#[source] tokio_postgres::Error),

    #[error("Query error: {0}")]
    Query(#[source] tokio_postgres::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl FetchError {
    /// Stable variant tag for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Connection(_) => "connection",
            FetchError::Query(_) => "query",
            FetchError::Serialization(_) => "serialization",
        }
    }
}
