//! HTTP peer transport for yocache.
//!
//! Provides an [`HttpPool`] that plays both sides of the peer protocol:
//!
//! - **Server**: an axum router answering
//!   `GET {base_path}{group}/{key}` with the encoded value as
//!   `application/octet-stream` (`404` for an unknown group, `400` for a
//!   malformed path, `500` when the load or encode fails).
//! - **Client**: a [`PeerPicker`] that routes each key over a consistent
//!   hash ring to the owning peer's [`HttpGetter`].
//!
//! Every node in a cluster runs one pool, registered on its groups; the
//! ring is rebuilt wholesale by [`HttpPool::set_peers`], and concurrent
//! lookups observe either the old or the new routing, never a mix.

mod error;
mod getter;


use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tracing::{debug, info};
use yocache::{Codec, PeerGetter, PeerPicker, RawCodec, Registry};
use yocache_ring::{HashFn, Ring};

pub use error::PoolError;
pub use getter::{FetchError, HttpGetter};

/// Default URL prefix under which the pool serves peers.
pub const DEFAULT_BASE_PATH: &str = "/_yocache/";

/// Configuration for an [`HttpPool`].
///
/// The codec is fixed for the pool's lifetime: the server handler and
/// every getter built by `set_peers` capture it here, and both ends of a
/// peer connection must be configured identically.
#[derive(Clone)]
pub struct HttpPoolConfig {
    /// URL prefix under which the pool serves, with a trailing slash.
    pub base_path: String,
    /// Virtual points per peer on the ring.
    pub replicas: usize,
    /// Ring hash override; `None` uses CRC-32/IEEE.
    pub hash: Option<HashFn>,
    /// Wire encoding for peer request bodies.
    pub codec: Arc<dyn Codec>,
}

impl Default for HttpPoolConfig {
    fn default() -> Self {
        Self {
            base_path: DEFAULT_BASE_PATH.to_string(),
            replicas: Ring::DEFAULT_REPLICAS,
            hash: None,
            codec: Arc::new(RawCodec),
        }
    }
}

/// Peer routing state, swapped wholesale on every `set_peers`.
struct RouteTable {
    ring: Ring,
    /// Getters keyed by peer base URL.
    getters: HashMap<String, Arc<HttpGetter>>,
}

struct PoolInner {
    /// This node's own base URL, e.g. `"http://10.0.0.2:4890"`.
    self_url: String,
    config: HttpPoolConfig,
    registry: Registry,
    client: reqwest::Client,
    routes: Mutex<RouteTable>,
}

/// A pool of HTTP peers: the server endpoint plus key→peer routing.
///
/// Cheap to clone; all clones share the same routing state.
#[derive(Clone)]
pub struct HttpPool {
    inner: Arc<PoolInner>,
}

impl HttpPool {
    /// Create a pool for the node reachable at `self_url`, serving the
    /// groups of `registry`.
    pub fn new(self_url: impl Into<String>, registry: Registry, config: HttpPoolConfig) -> Self {
        let empty = RouteTable {
            ring: new_ring(&config),
            getters: HashMap::new(),
        };
        Self {
            inner: Arc::new(PoolInner {
                self_url: self_url.into(),
                config,
                registry,
                client: reqwest::Client::new(),
                routes: Mutex::new(empty),
            }),
        }
    }

    /// Replace the pool's peer set.
    ///
    /// Each entry is a peer base URL, this node's own URL included. The
    /// ring and the getter table are rebuilt from scratch and swapped in
    /// under one lock, so concurrent picks see a consistent view.
    pub fn set_peers<S: AsRef<str>>(&self, peers: &[S]) {
        let mut ring = new_ring(&self.inner.config);
        ring.add(peers);

        let getters = peers
            .iter()
            .map(|peer| {
                let peer = peer.as_ref().to_string();
                let getter = Arc::new(HttpGetter::new(
                    format!("{peer}{}", self.inner.config.base_path),
                    self.inner.client.clone(),
                    self.inner.config.codec.clone(),
                ));
                (peer, getter)
            })
            .collect();

        let mut routes = self.inner.routes.lock().expect("routes lock poisoned");
        *routes = RouteTable { ring, getters };
        info!(self_url = %self.inner.self_url, peers = peers.len(), "peer set updated");
    }

    /// Build the axum router serving this pool's base path.
    pub fn router(&self) -> Router {
        let peer_routes = Router::new()
            .route("/{group}/{*key}", get(serve_value))
            // Anything else under the base path is malformed.
            .fallback(|| async { (StatusCode::BAD_REQUEST, "bad request") })
            .with_state(self.clone());

        let base = self.inner.config.base_path.trim_end_matches('/');
        if base.is_empty() {
            peer_routes
        } else {
            Router::new().nest(base, peer_routes)
        }
    }

    /// Serve the peer endpoint on the given TCP address.
    pub async fn serve(&self, addr: &str) -> Result<(), std::io::Error> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(addr, self_url = %self.inner.self_url, "peer endpoint listening");
        axum::serve(listener, self.router()).await
    }

    /// Serve the peer endpoint with graceful shutdown.
    ///
    /// When `shutdown` completes, the server stops accepting new
    /// connections and waits for in-flight requests to finish.
    pub async fn serve_with_shutdown(
        &self,
        addr: &str,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), std::io::Error> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(addr, self_url = %self.inner.self_url, "peer endpoint listening");
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
    }
}

impl PeerPicker for HttpPool {
    /// Pick the peer owning `key`; `None` when this node is the owner or
    /// no peers are configured.
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>> {
        let routes = self.inner.routes.lock().expect("routes lock poisoned");
        let owner = routes.ring.get(key)?;
        if owner == self.inner.self_url {
            return None;
        }
        debug!(key, owner, "picked remote peer");
        routes
            .getters
            .get(owner)
            .cloned()
            .map(|getter| getter as Arc<dyn PeerGetter>)
    }
}

impl std::fmt::Debug for HttpPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPool")
            .field("self_url", &self.inner.self_url)
            .field("base_path", &self.inner.config.base_path)
            .finish()
    }
}

fn new_ring(config: &HttpPoolConfig) -> Ring {
    match config.hash {
        Some(hash) => Ring::with_hasher(config.replicas, hash),
        None => Ring::new(config.replicas),
    }
}

/// `GET {base_path}{group}/{key}` — serve one value to a peer.
async fn serve_value(
    State(pool): State<HttpPool>,
    Path((group_name, key)): Path<(String, String)>,
) -> Result<Response, PoolError> {
    debug!(group = %group_name, key = %key, "peer request");

    let group = pool
        .inner
        .registry
        .get_group(&group_name)
        .ok_or(PoolError::NoSuchGroup(group_name))?;

    let view = group.get(&key).await?;
    let body = pool.inner.config.codec.encode(&view)?;

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        body,
    )
        .into_response())
}
