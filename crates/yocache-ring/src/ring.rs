//! Consistent hashing ring implementation.

use tracing::debug;

/// A 32-bit hash function over raw bytes.
///
/// The ring only needs every node to agree on the mapping, not
/// cryptographic strength, so a plain function pointer keeps the
/// configuration surface small.
pub type HashFn = fn(&[u8]) -> u32;

/// Consistent hash ring mapping keys to peer identifiers.
///
/// Each peer contributes `replicas` virtual points, placed at
/// `hash(ascii(i) ++ peer)` for `i` in `0..replicas`. A key is owned by
/// the peer of the first point at or after `hash(key)`, wrapping around
/// to the start of the ring.
///
/// Duplicate hash points are kept: points are inserted replica-index
/// first and the list is stable-sorted, so colliding points resolve by
/// `(replica index, peer insertion order)`.
#[derive(Clone)]
pub struct Ring {
    replicas: usize,
    hash: HashFn,
    /// Virtual points sorted ascending by hash.
    points: Vec<(u32, String)>,
}

impl Ring {
    /// Default number of virtual points per peer.
    pub const DEFAULT_REPLICAS: usize = 50;

    /// Create an empty ring using CRC-32/IEEE as the hash function.
    pub fn new(replicas: usize) -> Self {
        Self::with_hasher(replicas, crc32fast::hash)
    }

    /// Create an empty ring with an explicit hash function.
    pub fn with_hasher(replicas: usize, hash: HashFn) -> Self {
        Self {
            replicas,
            hash,
            points: Vec::new(),
        }
    }

    /// Add peers to the ring.
    ///
    /// Inserts `replicas` virtual points per peer, then re-sorts the
    /// ring. The point set is the same however the peers are batched
    /// across `add` calls.
    pub fn add<S: AsRef<str>>(&mut self, peers: &[S]) {
        // Replica index is the outer loop: the stable sort below then
        // breaks hash ties by (replica index, peer insertion order).
        for i in 0..self.replicas {
            for peer in peers {
                let peer = peer.as_ref();
                let point = (self.hash)(format!("{i}{peer}").as_bytes());
                self.points.push((point, peer.to_string()));
            }
        }
        for peer in peers {
            let peer = peer.as_ref();
            debug!(peer, replicas = self.replicas, "added peer to ring");
        }
        self.points.sort_by_key(|(point, _)| *point);
    }

    /// Look up the peer that owns `key`.
    ///
    /// Returns `None` on an empty ring. Otherwise binary-searches for
    /// the first point with hash >= `hash(key)`, wrapping to index 0
    /// past the end.
    pub fn get(&self, key: &str) -> Option<&str> {
        if self.points.is_empty() {
            return None;
        }

        let h = (self.hash)(key.as_bytes());
        let idx = self.points.partition_point(|(point, _)| *point < h);
        let idx = if idx == self.points.len() { 0 } else { idx };
        Some(&self.points[idx].1)
    }

    /// Whether the ring has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Total number of virtual points on the ring.
    pub fn len(&self) -> usize {
        self.points.len()
    }
}

impl std::fmt::Debug for Ring {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ring")
            .field("replicas", &self.replicas)
            .field("points", &self.points.len())
            .finish()
    }
}
