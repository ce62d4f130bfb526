//! HTTP client side of the peer protocol.

use std::sync::Arc;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use tracing::debug;
use yocache::{BoxError, ByteView, Codec, CodecError, PeerGetter};

/// Characters escaped when a group or key becomes a URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'%')
    .add(b'/');

/// Errors from fetching a value off a peer.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request could not be sent or its body not read.
    #[error("request error: {0}")]
    Http(#[from] reqwest::Error),

    /// The peer answered with a non-success status.
    #[error("peer returned {status}: {message}")]
    Status {
        /// HTTP status the peer responded with.
        status: reqwest::StatusCode,
        /// The peer's error message body.
        message: String,
    },

    /// The response body failed to decode.
    #[error("decoding response body: {0}")]
    Decode(#[from] CodecError),
}

/// Fetches values from one remote peer over HTTP.
///
/// Built by [`HttpPool::set_peers`](crate::HttpPool::set_peers), one per
/// peer, all sharing the pool's `reqwest` client and codec.
pub struct HttpGetter {
    /// The peer's base URL plus the pool's base path, ending in `/`.
    base_url: String,
    client: reqwest::Client,
    codec: Arc<dyn Codec>,
}

impl HttpGetter {
    pub(crate) fn new(base_url: String, client: reqwest::Client, codec: Arc<dyn Codec>) -> Self {
        Self {
            base_url,
            client,
            codec,
        }
    }

    async fn fetch(&self, group: &str, key: &str) -> Result<ByteView, FetchError> {
        let url = format!(
            "{}{}/{}",
            self.base_url,
            utf8_percent_encode(group, PATH_SEGMENT),
            utf8_percent_encode(key, PATH_SEGMENT),
        );
        debug!(%url, "fetching from peer");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status,
                message: message.trim().to_string(),
            });
        }

        let body = response.bytes().await?;
        Ok(self.codec.decode(&body)?)
    }
}

#[async_trait::async_trait]
impl PeerGetter for HttpGetter {
    async fn get(&self, group: &str, key: &str) -> Result<ByteView, BoxError> {
        Ok(self.fetch(group, key).await?)
    }
}
