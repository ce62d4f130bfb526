//! Byte-budgeted, expiring LRU map.
//!
//! Single-threaded core of the per-group cache. Entries are kept in a
//! [`LinkedHashMap`] whose front is the least recently used entry; a
//! lookup promotes to the back, and eviction pops from the front until
//! the byte budget holds. Expiry is lazy: an entry past its deadline is
//! removed by the `get` that finds it.
//!
//! Thread safety is layered on top by [`ConcurrentCache`](crate::cache).

use std::time::Instant;

use linked_hash_map::LinkedHashMap;
use tracing::debug;

use crate::byteview::ByteView;

/// Callback invoked with the key and value of every removed entry.
///
/// Runs while the cache lock is held — it must not call back into the
/// owning group.
pub type EvictCallback = Box<dyn FnMut(&str, &ByteView) + Send>;

struct Entry {
    value: ByteView,
    /// Deadline after which the entry is no longer served. `None` lives
    /// until evicted.
    expire: Option<Instant>,
    /// Byte contribution: `key.len() + value.len()`.
    size: u64,
}

/// Bounded key→[`ByteView`] map with recency eviction and lazy expiry.
pub struct LruCache {
    /// Byte budget; 0 disables capacity eviction.
    max_bytes: u64,
    used_bytes: u64,
    /// Front = least recently used, back = most recently used.
    map: LinkedHashMap<String, Entry>,
    on_evict: Option<EvictCallback>,
}

impl LruCache {
    /// Create a cache with the given byte budget.
    ///
    /// A `max_bytes` of 0 disables capacity eviction entirely; entries
    /// then leave only by expiry or explicit [`remove`](Self::remove).
    pub fn new(max_bytes: u64, on_evict: Option<EvictCallback>) -> Self {
        Self {
            max_bytes,
            used_bytes: 0,
            map: LinkedHashMap::new(),
            on_evict,
        }
    }

    /// Insert or replace an entry, then evict from the cold end until the
    /// byte budget holds.
    ///
    /// Replacing an existing key updates its value, expiry, and size
    /// contribution, and promotes it to most-recently-used. The freshly
    /// inserted entry itself is evicted if it alone exceeds the budget.
    pub fn add(&mut self, key: &str, value: ByteView, expire: Option<Instant>) {
        let size = (key.len() + value.len()) as u64;

        // Replace-in-place would keep the old ring position; remove first
        // so the entry re-enters at the most-recently-used end.
        if let Some(old) = self.map.remove(key) {
            self.used_bytes -= old.size;
        }

        self.map.insert(
            key.to_string(),
            Entry {
                value,
                expire,
                size,
            },
        );
        self.used_bytes += size;

        while self.max_bytes > 0 && self.used_bytes > self.max_bytes {
            self.evict_oldest();
        }
    }

    /// Look up a live entry and promote it to most-recently-used.
    ///
    /// An entry whose expiry has passed is removed (firing the evict
    /// callback) and reported as a miss.
    pub fn get(&mut self, key: &str) -> Option<ByteView> {
        let now = Instant::now();

        let hit = match self.map.get_refresh(key) {
            None => return None,
            Some(entry) => {
                if entry.expire.is_some_and(|at| at <= now) {
                    None
                } else {
                    Some(entry.value.clone())
                }
            }
        };

        match hit {
            Some(value) => Some(value),
            None => {
                debug!(key, "entry expired");
                self.remove(key);
                None
            }
        }
    }

    /// Remove an entry, firing the evict callback if one is set.
    pub fn remove(&mut self, key: &str) -> Option<ByteView> {
        let entry = self.map.remove(key)?;
        self.used_bytes -= entry.size;
        if let Some(cb) = self.on_evict.as_mut() {
            cb(key, &entry.value);
        }
        Some(entry.value)
    }

    /// Number of entries currently present.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Current byte total over all entries.
    pub fn bytes(&self) -> u64 {
        self.used_bytes
    }

    /// Pop the least-recently-used entry.
    fn evict_oldest(&mut self) {
        if let Some((key, entry)) = self.map.pop_front() {
            self.used_bytes -= entry.size;
            debug!(key, size = entry.size, "evicted least recently used entry");
            if let Some(cb) = self.on_evict.as_mut() {
                cb(&key, &entry.value);
            }
        }
    }
}

impl std::fmt::Debug for LruCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruCache")
            .field("max_bytes", &self.max_bytes)
            .field("used_bytes", &self.used_bytes)
            .field("entries", &self.map.len())
            .finish()
    }
}
