//! Routing abstractions for reaching remote peers.
//!
//! These two traits are the only seam between a [`Group`](crate::Group)
//! and the network. The HTTP realization lives in `yocache-http`; tests
//! substitute in-memory fakes.

use std::sync::Arc;

use crate::byteview::ByteView;
use crate::error::BoxError;

/// Locates the peer that owns a key.
pub trait PeerPicker: Send + Sync {
    /// Return the getter for the remote peer that owns `key`, or `None`
    /// when the local node is the owner (or no peers are configured).
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>>;
}

/// Fetches a value from the remote peer that owns it.
#[async_trait::async_trait]
pub trait PeerGetter: Send + Sync {
    /// Fetch the value for `key` in `group`, already decoded from the
    /// wire encoding.
    async fn get(&self, group: &str, key: &str) -> Result<ByteView, BoxError>;
}
