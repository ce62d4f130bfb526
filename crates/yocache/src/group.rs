//! Named cache groups and the process registry.
//!
//! A [`Group`] ties together the local LRU, the single-flight
//! coordinator, the peer routing seam, and the application [`Loader`].
//! Groups are created once through a [`Registry`] and live for the
//! process lifetime.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};
use std::time::Duration;

use tracing::{debug, info, trace, warn};

use crate::byteview::ByteView;
use crate::cache::ConcurrentCache;
use crate::error::{BoxError, CacheError};
use crate::peers::{PeerGetter, PeerPicker};
use crate::singleflight::SingleFlight;

/// Loads a value from the backing source on a cache miss.
///
/// Must tolerate concurrent invocation across distinct keys; the group
/// guarantees at most one in-flight load per key per node.
#[async_trait::async_trait]
pub trait Loader: Send + Sync {
    /// Produce the value for `key`.
    async fn load(&self, key: &str) -> Result<ByteView, BoxError>;
}

/// Configuration for creating a [`Group`].
#[derive(Debug, Clone)]
pub struct GroupConfig {
    /// Group name, unique within the registry.
    pub name: String,
    /// Byte budget for the local LRU; 0 disables capacity eviction.
    pub cache_bytes: u64,
    /// Lifetime of cached entries; `None` = entries never expire.
    pub ttl: Option<Duration>,
    /// Fall back to the local loader when a peer fetch fails.
    ///
    /// Off by default: a failed peer fetch surfaces its error, because
    /// silently loading locally masks misrouting and duplicates work.
    pub peer_fallback: bool,
}

impl GroupConfig {
    /// Config with no TTL and no peer fallback.
    pub fn new(name: impl Into<String>, cache_bytes: u64) -> Self {
        Self {
            name: name.into(),
            cache_bytes,
            ttl: None,
            peer_fallback: false,
        }
    }
}

struct GroupInner {
    name: String,
    cache: ConcurrentCache,
    loader: Arc<dyn Loader>,
    flight: SingleFlight<Result<ByteView, CacheError>>,
    /// Installed at most once, after construction.
    peers: OnceLock<Arc<dyn PeerPicker>>,
    peer_fallback: bool,
}

/// A named read-through cache.
///
/// Cheap to clone; all clones share the same state.
#[derive(Clone)]
pub struct Group {
    inner: Arc<GroupInner>,
}

impl Group {
    /// The group's registered name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Install the peer picker that routes keys to their owners.
    ///
    /// # Panics
    ///
    /// Panics if a picker was already installed — registering twice is a
    /// programming error.
    pub fn register_peer_picker(&self, picker: Arc<dyn PeerPicker>) {
        if self.inner.peers.set(picker).is_err() {
            panic!(
                "peer picker already registered for group {:?}",
                self.inner.name
            );
        }
    }

    /// Look up the value for `key`.
    ///
    /// A local cache hit returns immediately. On a miss, concurrent
    /// callers for the same key collapse into one load: the key's owner
    /// is fetched over the peer seam if it is remote, otherwise the
    /// [`Loader`] runs and the result enters the local cache under the
    /// group's TTL.
    pub async fn get(&self, key: &str) -> Result<ByteView, CacheError> {
        if key.is_empty() {
            return Err(CacheError::KeyRequired);
        }

        if let Some(view) = self.inner.cache.get(key) {
            trace!(group = %self.inner.name, key, "cache hit");
            return Ok(view);
        }

        let owned_key = key.to_string();
        let group = self.clone();
        let (result, shared) = self
            .inner
            .flight
            .run(key, move || {
                let group = group.clone();
                let key = owned_key.clone();
                async move { group.load(&key).await }
            })
            .await;

        if shared {
            trace!(group = %self.inner.name, key, "joined in-flight load");
        }
        result
    }

    /// Entries currently in the local cache.
    pub fn cache_len(&self) -> usize {
        self.inner.cache.len()
    }

    /// Bytes currently held by the local cache.
    pub fn cache_bytes(&self) -> u64 {
        self.inner.cache.bytes()
    }

    /// The single uncached load for a key, routed to its owner.
    async fn load(&self, key: &str) -> Result<ByteView, CacheError> {
        if let Some(picker) = self.inner.peers.get()
            && let Some(peer) = picker.pick_peer(key)
        {
            match self.get_from_peer(peer, key).await {
                // The owner caches; a non-owner intentionally does not,
                // so every value has one home and one TTL.
                Ok(view) => return Ok(view),
                Err(err) if self.inner.peer_fallback => {
                    warn!(
                        group = %self.inner.name,
                        key,
                        error = %err,
                        "peer fetch failed, falling back to local loader"
                    );
                }
                Err(err) => return Err(err),
            }
        }

        self.load_locally(key).await
    }

    async fn get_from_peer(
        &self,
        peer: Arc<dyn PeerGetter>,
        key: &str,
    ) -> Result<ByteView, CacheError> {
        peer.get(&self.inner.name, key)
            .await
            .map_err(CacheError::peer)
    }

    async fn load_locally(&self, key: &str) -> Result<ByteView, CacheError> {
        let view = self
            .inner
            .loader
            .load(key)
            .await
            .map_err(CacheError::loader)?;
        debug!(group = %self.inner.name, key, bytes = view.len(), "loaded value");
        self.inner.cache.add(key, view.clone());
        Ok(view)
    }
}

impl std::fmt::Debug for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Group")
            .field("name", &self.inner.name)
            .field("cache_len", &self.inner.cache.len())
            .finish()
    }
}

/// Process-wide name→[`Group`] registry.
///
/// Insert-only after construction: groups are created once and never
/// removed. The handle is cheap to clone; all clones share the map.
#[derive(Clone, Default)]
pub struct Registry {
    groups: Arc<RwLock<HashMap<String, Group>>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register a new group.
    ///
    /// # Panics
    ///
    /// Panics if a group with the same name already exists — duplicate
    /// names are a programming error.
    pub fn new_group(&self, config: GroupConfig, loader: Arc<dyn Loader>) -> Group {
        let group = Group {
            inner: Arc::new(GroupInner {
                name: config.name.clone(),
                cache: ConcurrentCache::new(config.cache_bytes, config.ttl),
                loader,
                flight: SingleFlight::new(),
                peers: OnceLock::new(),
                peer_fallback: config.peer_fallback,
            }),
        };

        let mut groups = self.groups.write().expect("registry lock poisoned");
        if groups.contains_key(&config.name) {
            panic!("duplicate cache group name: {:?}", config.name);
        }
        groups.insert(config.name.clone(), group.clone());
        info!(
            group = %config.name,
            cache_bytes = config.cache_bytes,
            ttl = ?config.ttl,
            "registered cache group"
        );
        group
    }

    /// Look up a group by name.
    pub fn get_group(&self, name: &str) -> Option<Group> {
        self.groups
            .read()
            .expect("registry lock poisoned")
            .get(name)
            .cloned()
    }
}
