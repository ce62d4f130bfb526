//! Integration tests: key ownership and peer fetches across real nodes.

use yocache_integration_tests::TestCluster;

/// Every key has exactly one owner, and all nodes agree on it.
#[tokio::test(flavor = "multi_thread")]
async fn test_every_key_has_one_owner() {
    let cluster = TestCluster::start(3).await;

    for i in 0..50 {
        // owner_of asserts exactly one node claims the key.
        cluster.owner_of(&format!("key-{i}"));
    }
}

/// A lookup at a non-owner fetches from the owner: the owner's loader
/// runs once, the owner caches, and the non-owner does not.
#[tokio::test(flavor = "multi_thread")]
async fn test_non_owner_fetches_from_owner() {
    let cluster = TestCluster::start(2).await;

    let key = "profile-42";
    let owner = cluster.owner_of(key);
    let other = 1 - owner;

    let got = cluster.node(other).group().get(key).await.unwrap();
    assert_eq!(got, cluster.node(owner).loader.value_for(key));

    assert_eq!(cluster.node(owner).loader.loads(), 1);
    assert_eq!(cluster.node(other).loader.loads(), 0);

    assert_eq!(
        cluster.node(owner).group().cache_len(),
        1,
        "the owner caches the value"
    );
    assert_eq!(
        cluster.node(other).group().cache_len(),
        0,
        "a non-owner must not cache"
    );
}

/// The same key read from every node yields the same value, loaded once.
#[tokio::test(flavor = "multi_thread")]
async fn test_all_nodes_serve_the_same_value() {
    let cluster = TestCluster::start(3).await;

    let key = "shared-key";
    let owner = cluster.owner_of(key);
    let expected = cluster.node(owner).loader.value_for(key);

    for i in 0..cluster.len() {
        let got = cluster.node(i).group().get(key).await.unwrap();
        assert_eq!(got, expected, "node {i} disagrees");
    }

    assert_eq!(cluster.total_loads(), 1, "only the owner loads");
}

/// Repeated non-owner lookups keep going back to the owner, which now
/// serves from its cache.
#[tokio::test(flavor = "multi_thread")]
async fn test_owner_serves_repeats_from_cache() {
    let cluster = TestCluster::start(2).await;

    let key = "hot-key";
    let owner = cluster.owner_of(key);
    let other = 1 - owner;

    for _ in 0..5 {
        cluster.node(other).group().get(key).await.unwrap();
    }

    assert_eq!(cluster.node(owner).loader.loads(), 1);
    assert_eq!(cluster.node(other).group().cache_len(), 0);
}

/// A gzip-configured cluster round-trips values through the wire codec.
#[tokio::test(flavor = "multi_thread")]
async fn test_gzip_cluster_roundtrip() {
    let cluster =
        TestCluster::start_with_codec(2, std::sync::Arc::new(yocache::GzipCodec)).await;

    let key = "compressed";
    let owner = cluster.owner_of(key);
    let other = 1 - owner;

    let got = cluster.node(other).group().get(key).await.unwrap();
    assert_eq!(got, cluster.node(owner).loader.value_for(key));
}
