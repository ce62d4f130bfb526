//! Per-key collapse of concurrent duplicate loads.
//!
//! Any number of callers may ask for the same key at once; exactly one
//! load runs, and every caller receives a clone of its result. The load
//! runs as a detached task, so it completes even if all of its waiters
//! are dropped — a late arriver can still observe the result while the
//! call record lives. Nothing is memoized: once the record is removed,
//! the next call loads again.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;

type CallMap<T> = Arc<Mutex<HashMap<String, watch::Receiver<Option<T>>>>>;

/// Deduplicates concurrent calls sharing a key.
///
/// `T` is the shared result type — typically a `Result` that is `Clone`
/// so failures reach every waiter verbatim.
pub struct SingleFlight<T> {
    calls: CallMap<T>,
}

impl<T> Default for SingleFlight<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SingleFlight<T> {
    /// Create a coordinator with no calls in flight.
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of keys with a load currently in flight.
    pub fn in_flight(&self) -> usize {
        self.calls.lock().expect("singleflight lock poisoned").len()
    }
}

impl<T: Clone + Send + Sync + 'static> SingleFlight<T> {
    /// Run at most one load for `key`, sharing its result.
    ///
    /// The first caller for a key spawns `make_load()` as a detached
    /// task and reports `shared = false`; concurrent callers wait for
    /// that task's result and report `shared = true`.
    ///
    /// `make_load` is a factory rather than a future because a load that
    /// dies without publishing (a panic) wakes its waiters empty-handed,
    /// and one of them must be able to start a fresh flight — the key is
    /// never wedged.
    pub async fn run<F, Fut>(&self, key: &str, make_load: F) -> (T, bool)
    where
        F: Fn() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        loop {
            let (mut rx, guard) = {
                let mut calls = self.calls.lock().expect("singleflight lock poisoned");
                match calls.get(key) {
                    Some(rx) => (rx.clone(), None),
                    None => {
                        let (tx, rx) = watch::channel(None);
                        calls.insert(key.to_string(), rx.clone());
                        let guard = CallGuard {
                            calls: Arc::clone(&self.calls),
                            key: key.to_string(),
                            tx,
                        };
                        (rx, Some(guard))
                    }
                }
            };

            let leader = guard.is_some();
            if let Some(guard) = guard {
                let load = make_load();
                tokio::spawn(async move {
                    let result = load.await;
                    let _ = guard.tx.send(Some(result));
                    // `guard` drops here: the record is removed, then the
                    // channel closes.
                });
            }

            match rx.wait_for(|slot| slot.is_some()).await {
                Ok(slot) => {
                    let result = slot.as_ref().expect("slot checked non-empty").clone();
                    return (result, !leader);
                }
                // The load task died without publishing; its guard has
                // removed the record. Compete for a fresh flight.
                Err(_) => continue,
            }
        }
    }
}

/// Removes the call record when the load ends, by any path.
///
/// Field order matters: `Drop::drop` removes the map entry first, then
/// the sender field drops and closes the channel, so a waiter woken by
/// the close always finds the record already gone.
struct CallGuard<T> {
    calls: CallMap<T>,
    key: String,
    tx: watch::Sender<Option<T>>,
}

impl<T> Drop for CallGuard<T> {
    fn drop(&mut self) {
        self.calls
            .lock()
            .expect("singleflight lock poisoned")
            .remove(&self.key);
    }
}
