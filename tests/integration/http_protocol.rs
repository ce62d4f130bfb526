//! Integration tests: the peer HTTP protocol as seen by a real client.

use yocache_integration_tests::{GROUP, TestCluster};

/// `GET {base_path}{group}/{key}` serves the encoded value.
#[tokio::test(flavor = "multi_thread")]
async fn test_value_served_over_http() {
    let cluster = TestCluster::start(1).await;
    let node = cluster.node(0);

    let url = format!("{}/_yocache/{GROUP}/k1", node.url);
    let response = reqwest::get(&url).await.unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()["content-type"],
        "application/octet-stream"
    );
    let body = response.bytes().await.unwrap();
    assert_eq!(&body[..], node.loader.value_for("k1").as_bytes());
}

/// Unknown groups are a 404 with a readable message.
#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_group_is_404() {
    let cluster = TestCluster::start(1).await;

    let url = format!("{}/_yocache/missing/k1", cluster.node(0).url);
    let response = reqwest::get(&url).await.unwrap();

    assert_eq!(response.status(), 404);
    assert_eq!(response.text().await.unwrap(), "no such group: missing");
}

/// Paths without a group and key segment are a 400.
#[tokio::test(flavor = "multi_thread")]
async fn test_malformed_path_is_400() {
    let cluster = TestCluster::start(1).await;

    let url = format!("{}/_yocache/{GROUP}", cluster.node(0).url);
    let response = reqwest::get(&url).await.unwrap();

    assert_eq!(response.status(), 400);
}

/// Keys with characters that need escaping survive the round trip.
#[tokio::test(flavor = "multi_thread")]
async fn test_escaped_key_roundtrip() {
    let cluster = TestCluster::start(2).await;

    let key = "user profile #7";
    let owner = cluster.owner_of(key);
    let other = 1 - owner;

    let got = cluster.node(other).group().get(key).await.unwrap();
    assert_eq!(got, cluster.node(owner).loader.value_for(key));
    assert_eq!(cluster.node(owner).loader.loads(), 1);
}
