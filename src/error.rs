use thiserror::Error;

/// Failure of an outbound fetch (search page or profile page).
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

/// Per-query terminal outcomes. None of these abort the batch.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid query format")]
    InvalidQueryFormat,
    #[error("US News link not found")]
    LinkNotFound,
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl QueryError {
    /// Short tag stored in the run log.
    pub fn kind(&self) -> &'static str {
        match self {
            QueryError::InvalidQueryFormat => "invalid",
            QueryError::LinkNotFound => "not_found",
            QueryError::Fetch(_) => "fetch_error",
        }
    }
}
