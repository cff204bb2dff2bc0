use std::convert::Infallible;

use thiserror::Error;

use crate::MAX_DATAGRAM_SIZE;

/// An encoded datagram known to fit in [`MAX_DATAGRAM_SIZE`] bytes.
#[derive(Clone, Debug)]
pub struct Frame {
    bytes: Vec<u8>,
}

impl Frame {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("encoded frame is {len} bytes, over the {MAX_DATAGRAM_SIZE} byte limit")]
    TooLarge { len: usize },
}

/// Encodes `value` and wraps it in a [`Frame`], rejecting the result
/// instead of truncating it if it doesn't fit in one datagram.
pub fn write_framed<T>(value: &T) -> Result<Frame, FrameError>
where
    T: pitch_wire_codec::StreamCodec<WriteError = Infallible>,
{
    let mut bytes = Vec::new();
    let Ok(()) = value.write_to(&mut bytes);
    if bytes.len() > MAX_DATAGRAM_SIZE {
        return Err(FrameError::TooLarge { len: bytes.len() });
    }
    Ok(Frame { bytes })
}
