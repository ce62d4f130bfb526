//! Error types and HTTP responses for the peer-facing server.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use yocache::{CacheError, CodecError};

/// Errors returned by the peer endpoint.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// The requested group is not registered on this node.
    #[error("no such group: {0}")]
    NoSuchGroup(String),

    /// The group lookup failed (loader or upstream peer).
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The value could not be encoded for the wire.
    #[error("encoding response body: {0}")]
    Encode(#[from] CodecError),
}

impl PoolError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NoSuchGroup(_) => StatusCode::NOT_FOUND,
            Self::Cache(CacheError::KeyRequired) => StatusCode::BAD_REQUEST,
            Self::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PoolError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), self.to_string()).into_response()
    }
}
