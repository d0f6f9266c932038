//! Snappy-framed protobuf bodies as exchanged with a remote-read endpoint.
//!
//! Remote read uses snappy's raw block format (not the framed stream format)
//! in both directions.

use prost::Message;

use super::{ReadRequest, ReadResponse};

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid snappy block")]
    Snappy(#[from] snap::Error),
    #[error("invalid protobuf message")]
    Protobuf(#[from] prost::DecodeError),
}

/// Serialize and snappy-compress a read request body.
pub fn encode_read_request(req: &ReadRequest) -> Result<Vec<u8>, snap::Error> {
    snap::raw::Encoder::new().compress_vec(&req.encode_to_vec())
}

/// Inverse of [`encode_read_request`].
pub fn decode_read_request(body: &[u8]) -> Result<ReadRequest, DecodeError> {
    let raw = snap::raw::Decoder::new().decompress_vec(body)?;
    Ok(ReadRequest::decode(raw.as_slice())?)
}

/// Serialize and snappy-compress a read response body.
pub fn encode_read_response(resp: &ReadResponse) -> Result<Vec<u8>, snap::Error> {
    snap::raw::Encoder::new().compress_vec(&resp.encode_to_vec())
}

/// Decompress and decode a read response body.
///
/// Returns the response and its size after decompression.
pub fn decode_read_response(body: &[u8]) -> Result<(ReadResponse, usize), DecodeError> {
    let raw = snap::raw::Decoder::new().decompress_vec(body)?;
    let resp = ReadResponse::decode(raw.as_slice())?;
    Ok((resp, raw.len()))
}
