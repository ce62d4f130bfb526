//! Shared test harness for yocache integration tests.
//!
//! Provides [`TestCluster`] — N real cache nodes on ephemeral loopback
//! ports, each with its own registry, counting loader, and HTTP pool,
//! all agreeing on the same peer set. Tests exercise the full path:
//! group lookup → ring routing → HTTP fetch → owner-side load.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use yocache::{
    BoxError, ByteView, Codec, Group, GroupConfig, Loader, PeerPicker, RawCodec, Registry,
};
use yocache_http::{HttpPool, HttpPoolConfig};

/// The group every test node serves.
pub const GROUP: &str = "pages";

/// Loader that answers `{key}@{tag}` and counts invocations, so tests
/// can tell which node actually loaded a value.
pub struct CountingLoader {
    tag: String,
    loads: AtomicUsize,
}

impl CountingLoader {
    fn new(tag: String) -> Arc<Self> {
        Arc::new(Self {
            tag,
            loads: AtomicUsize::new(0),
        })
    }

    /// Number of loads this node has performed.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// The value this loader produces for `key`.
    pub fn value_for(&self, key: &str) -> ByteView {
        ByteView::from(format!("{key}@{}", self.tag))
    }
}

#[async_trait::async_trait]
impl Loader for CountingLoader {
    async fn load(&self, key: &str) -> Result<ByteView, BoxError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.value_for(key))
    }
}

/// One running cache node.
pub struct TestNode {
    /// The node's advertised base URL.
    pub url: String,
    /// The node's HTTP pool.
    pub pool: HttpPool,
    /// The node's group registry.
    pub registry: Registry,
    /// The node's loader.
    pub loader: Arc<CountingLoader>,
    server: tokio::task::JoinHandle<()>,
}

impl TestNode {
    /// The node's test group.
    pub fn group(&self) -> Group {
        self.registry.get_group(GROUP).expect("test group registered")
    }
}

/// An N-node cluster on ephemeral loopback ports.
pub struct TestCluster {
    nodes: Vec<TestNode>,
}

impl TestCluster {
    /// Start a cluster with the raw codec.
    pub async fn start(n: usize) -> Self {
        Self::start_with_codec(n, Arc::new(RawCodec)).await
    }

    /// Start a cluster with the given wire codec on every node.
    pub async fn start_with_codec(n: usize, codec: Arc<dyn Codec>) -> Self {
        let mut nodes = Vec::with_capacity(n);

        for i in 0..n {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("bind ephemeral port");
            let url = format!("http://{}", listener.local_addr().unwrap());

            let registry = Registry::new();
            let loader = CountingLoader::new(format!("node{i}"));
            registry.new_group(GroupConfig::new(GROUP, 1 << 20), loader.clone());

            let pool = HttpPool::new(
                url.clone(),
                registry.clone(),
                HttpPoolConfig {
                    codec: codec.clone(),
                    ..HttpPoolConfig::default()
                },
            );

            let server = {
                let router = pool.router();
                tokio::spawn(async move {
                    axum::serve(listener, router).await.expect("serve test node");
                })
            };

            nodes.push(TestNode {
                url,
                pool,
                registry,
                loader,
                server,
            });
        }

        // Every node learns the full peer set and routes through it.
        let urls: Vec<String> = nodes.iter().map(|n| n.url.clone()).collect();
        for node in &nodes {
            node.pool.set_peers(&urls);
            let picker: Arc<dyn PeerPicker> = Arc::new(node.pool.clone());
            node.group().register_peer_picker(picker);
        }

        Self { nodes }
    }

    /// Access node `i`.
    pub fn node(&self, i: usize) -> &TestNode {
        &self.nodes[i]
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the cluster is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Index of the node that owns `key` on the ring.
    ///
    /// Exactly one node must consider itself the owner.
    pub fn owner_of(&self, key: &str) -> usize {
        let owners: Vec<usize> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.pool.pick_peer(key).is_none())
            .map(|(i, _)| i)
            .collect();
        assert_eq!(owners.len(), 1, "key {key:?} has owners {owners:?}");
        owners[0]
    }

    /// Total loads performed across all nodes.
    pub fn total_loads(&self) -> usize {
        self.nodes.iter().map(|n| n.loader.loads()).sum()
    }
}

impl Drop for TestCluster {
    fn drop(&mut self) {
        for node in &self.nodes {
            node.server.abort();
        }
    }
}
