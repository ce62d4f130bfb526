//! Immutable byte-slice value wrapper.

use bytes::Bytes;

/// An immutable view over a cached value's bytes.
///
/// Backed by [`Bytes`], so clones are reference-counted and O(1), and no
/// holder of a view can mutate the underlying storage. This is what makes
/// it safe to hand the same value to the LRU (which accounts its size),
/// any number of concurrent callers, and the wire codec at once.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ByteView {
    data: Bytes,
}

impl ByteView {
    /// Length of the viewed bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the view is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrow the bytes. The storage is immutable, so no copy is needed.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Copy the bytes into a fresh, caller-owned `Vec`.
    pub fn to_vec(&self) -> Vec<u8> {
        self.data.to_vec()
    }

    /// Unwrap into the backing [`Bytes`] without copying.
    pub fn into_bytes(self) -> Bytes {
        self.data
    }
}

impl From<Bytes> for ByteView {
    fn from(data: Bytes) -> Self {
        Self { data }
    }
}

impl From<Vec<u8>> for ByteView {
    fn from(data: Vec<u8>) -> Self {
        Self { data: data.into() }
    }
}

impl From<String> for ByteView {
    fn from(data: String) -> Self {
        Self {
            data: Bytes::from(data.into_bytes()),
        }
    }
}

impl From<&str> for ByteView {
    fn from(data: &str) -> Self {
        Self {
            data: Bytes::copy_from_slice(data.as_bytes()),
        }
    }
}

impl From<&[u8]> for ByteView {
    fn from(data: &[u8]) -> Self {
        Self {
            data: Bytes::copy_from_slice(data),
        }
    }
}

impl AsRef<[u8]> for ByteView {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

/// Renders the value as lossy UTF-8, mainly for logs and tests.
impl std::fmt::Display for ByteView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.data))
    }
}

impl std::fmt::Debug for ByteView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ByteView({} bytes)", self.data.len())
    }
}
