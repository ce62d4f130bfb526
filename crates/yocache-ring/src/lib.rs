//! Consistent hashing ring for deterministic key ownership.
//!
//! This crate implements the consistent hash ring that maps cache keys to
//! peer identifiers (base URLs). Every node in a cluster builds the same
//! ring from the same peer list, so all nodes agree on which peer owns a
//! given key without any coordination.
//!
//! The ring uses virtual points: each peer is hashed onto the ring
//! `replicas` times, at `hash(ascii(i) ++ peer)` for `i` in
//! `0..replicas`. More points per peer = more uniform key distribution.

mod ring;

pub use ring::{HashFn, Ring};
