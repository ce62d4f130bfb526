//! Wire encoding for peer-to-peer value transfer.
//!
//! Both ends of a peer connection must use the same codec; the transport
//! picks one at construction time and never changes it.

use std::io::{Read, Write};

use bytes::Bytes;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use crate::byteview::ByteView;
use crate::error::CodecError;

/// Encodes a view into wire bytes and decodes wire bytes back into a
/// view, with `decode(encode(v)) == v` for every view.
///
/// Implementations are stateless and safe to share across tasks.
pub trait Codec: Send + Sync {
    /// Encode a view into its wire representation.
    fn encode(&self, view: &ByteView) -> Result<Bytes, CodecError>;

    /// Decode a wire body back into a view.
    fn decode(&self, body: &[u8]) -> Result<ByteView, CodecError>;
}

/// Identity codec: the wire bytes are the value bytes.
///
/// Encoding is an O(1) handle clone of the view's storage; no copy is
/// made in either direction beyond the one required to own the decoded
/// body.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawCodec;

impl Codec for RawCodec {
    fn encode(&self, view: &ByteView) -> Result<Bytes, CodecError> {
        Ok(view.clone().into_bytes())
    }

    fn decode(&self, body: &[u8]) -> Result<ByteView, CodecError> {
        Ok(ByteView::from(body))
    }
}

/// Gzip codec for payloads where compression pays.
#[derive(Debug, Default, Clone, Copy)]
pub struct GzipCodec;

impl Codec for GzipCodec {
    fn encode(&self, view: &ByteView) -> Result<Bytes, CodecError> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(view.as_bytes())?;
        // finish flushes and closes the stream; anything less leaves a
        // truncated body the peer cannot decode.
        Ok(Bytes::from(encoder.finish()?))
    }

    fn decode(&self, body: &[u8]) -> Result<ByteView, CodecError> {
        let mut decoder = GzDecoder::new(body);
        let mut out = Vec::new();
        decoder.read_to_end(&mut out)?;
        Ok(ByteView::from(out))
    }
}
