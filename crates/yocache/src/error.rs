//! Error types for the cache core.

use std::sync::Arc;

/// Boxed error returned by application loaders and peer getters.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by a group lookup.
///
/// `Clone` so a single-flight result — including a failure — can be
/// handed verbatim to every waiter of the same flight; the underlying
/// sources are shared behind an `Arc` for that reason.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// A lookup was attempted with an empty key.
    #[error("key is required")]
    KeyRequired,

    /// The application loader failed. Never cached.
    #[error("loader error: {0}")]
    Loader(Arc<dyn std::error::Error + Send + Sync + 'static>),

    /// Fetching the value from the owning peer failed (transport error,
    /// non-2xx status, or undecodable body).
    #[error("peer error: {0}")]
    Peer(Arc<dyn std::error::Error + Send + Sync + 'static>),
}

impl CacheError {
    /// Wrap a loader failure.
    pub(crate) fn loader(err: BoxError) -> Self {
        Self::Loader(Arc::from(err))
    }

    /// Wrap a peer fetch failure.
    pub(crate) fn peer(err: BoxError) -> Self {
        Self::Peer(Arc::from(err))
    }
}

/// Errors from encoding or decoding a value for peer transfer.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The compressed stream could not be produced or consumed — a
    /// corrupt header or truncated body surfaces here on decode.
    #[error("gzip stream error: {0}")]
    Io(#[from] std::io::Error),
}
