//! Mutex-guarded adapter over the LRU.
//!
//! All operations take a single lock — fine because the critical section
//! is pure in-memory work. The inner LRU is constructed lazily on the
//! first add, so a group that never caches anything allocates nothing.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::byteview::ByteView;
use crate::lru::LruCache;

pub(crate) struct ConcurrentCache {
    max_bytes: u64,
    /// Entry lifetime; `None` = entries never expire.
    ttl: Option<Duration>,
    inner: Mutex<Option<LruCache>>,
}

impl ConcurrentCache {
    pub(crate) fn new(max_bytes: u64, ttl: Option<Duration>) -> Self {
        Self {
            max_bytes,
            ttl,
            inner: Mutex::new(None),
        }
    }

    pub(crate) fn add(&self, key: &str, value: ByteView) {
        let expire = self.ttl.map(|ttl| Instant::now() + ttl);
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        inner
            .get_or_insert_with(|| LruCache::new(self.max_bytes, None))
            .add(key, value, expire);
    }

    pub(crate) fn get(&self, key: &str) -> Option<ByteView> {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        inner.as_mut()?.get(key)
    }

    pub(crate) fn len(&self) -> usize {
        let inner = self.inner.lock().expect("cache lock poisoned");
        inner.as_ref().map_or(0, LruCache::len)
    }

    pub(crate) fn bytes(&self) -> u64 {
        let inner = self.inner.lock().expect("cache lock poisoned");
        inner.as_ref().map_or(0, LruCache::bytes)
    }
}
