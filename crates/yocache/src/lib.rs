//! Distributed, in-process read-through cache.
//!
//! Values are looked up by string key against named cache [`Group`]s.
//! Each group owns a byte-budgeted, optionally expiring LRU and collapses
//! concurrent duplicate lookups into a single backing load. With a
//! [`PeerPicker`] installed, a group routes each key to its owning peer
//! by consistent hashing and fetches misses from there; without one (or
//! when the local node owns the key) the application [`Loader`] runs and
//! the result is cached locally.
//!
//! The HTTP realization of the peer protocol lives in the
//! `yocache-http` crate; this crate is transport-agnostic.

pub mod byteview;
mod cache;
pub mod codec;
pub mod error;
pub mod group;
pub mod lru;
pub mod peers;
pub mod singleflight;

pub use byteview::ByteView;
pub use codec::{Codec, GzipCodec, RawCodec};
pub use error::{BoxError, CacheError, CodecError};
pub use group::{Group, GroupConfig, Loader, Registry};
pub use lru::LruCache;
pub use peers::{PeerGetter, PeerPicker};
pub use singleflight::SingleFlight;
