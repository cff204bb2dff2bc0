use std::convert::Infallible;
use std::io::{Read, Write};

use byteorder::{ReadBytesExt, WriteBytesExt};
use paste::paste;
use thiserror::Error;

use crate::{eof, ExternalStreamCodec, ReadError, StreamCodec, O};

impl StreamCodec for () {
    type ReadError = Infallible;
    type WriteError = Infallible;

    fn read_from(_r: &mut &[u8]) -> Result<Self, Infallible> {
        Ok(())
    }

    fn write_to(&self, _w: &mut Vec<u8>) -> Result<(), Infallible> {
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum ReadBoolError {
    #[error("{0}")]
    ReadError(#[from] ReadError),

    #[error("invalid bool encoding 0x{0:02x}")]
    InvalidEncoding(u8),
}

impl StreamCodec for bool {
    type ReadError = ReadBoolError;
    type WriteError = Infallible;

    fn read_from(r: &mut &[u8]) -> Result<Self, ReadBoolError> {
        match u8::read_from(r)? {
            0 => Ok(false),
            1 => Ok(true),
            x => Err(ReadBoolError::InvalidEncoding(x)),
        }
    }

    fn write_to(&self, w: &mut Vec<u8>) -> Result<(), Infallible> {
        w.write_u8(if *self { 1 } else { 0 }).unwrap();
        Ok(())
    }
}

impl StreamCodec for u8 {
    type ReadError = ReadError;
    type WriteError = Infallible;

    fn read_from(r: &mut &[u8]) -> Result<Self, ReadError> {
        eof(r.read_u8())
    }

    fn write_to(&self, w: &mut Vec<u8>) -> Result<(), Infallible> {
        Ok(w.write_u8(*self).unwrap())
    }
}

impl StreamCodec for i8 {
    type ReadError = ReadError;
    type WriteError = Infallible;

    fn read_from(r: &mut &[u8]) -> Result<Self, ReadError> {
        eof(r.read_i8())
    }

    fn write_to(&self, w: &mut Vec<u8>) -> Result<(), Infallible> {
        Ok(w.write_i8(*self).unwrap())
    }
}

impl<const N: usize> StreamCodec for [u8; N] {
    type ReadError = ReadError;
    type WriteError = Infallible;

    fn read_from(r: &mut &[u8]) -> Result<Self, ReadError> {
        let mut value = [0; N];
        eof(r.read_exact(&mut value))?;
        Ok(value)
    }

    fn write_to(&self, w: &mut Vec<u8>) -> Result<(), Infallible> {
        Ok(w.write_all(self).unwrap())
    }
}

macro_rules! impl_stream_codec_for_int {
    ($t:ty) => {
        paste! {
            impl StreamCodec for $t {
                type ReadError = ReadError;
                type WriteError = Infallible;

                fn read_from(r: &mut &[u8]) -> Result<Self, ReadError> {
                    eof(r.[<read_ $t>]::<O>())
                }

                fn write_to(&self, w: &mut Vec<u8>) -> Result<(), Infallible> {
                    Ok(w.[<write_ $t>]::<O>(*self).unwrap())
                }
            }
        }
    };
}

impl_stream_codec_for_int!(u16);
impl_stream_codec_for_int!(u32);
impl_stream_codec_for_int!(u64);
impl_stream_codec_for_int!(i16);
impl_stream_codec_for_int!(i32);
impl_stream_codec_for_int!(i64);

impl StreamCodec for f32 {
    type ReadError = ReadError;
    type WriteError = Infallible;

    fn read_from(r: &mut &[u8]) -> Result<Self, ReadError> {
        eof(r.read_f32::<O>())
    }

    fn write_to(&self, w: &mut Vec<u8>) -> Result<(), Infallible> {
        Ok(w.write_f32::<O>(*self).unwrap())
    }
}

pub enum UnframedByteVec {}

impl ExternalStreamCodec for UnframedByteVec {
    type Item = Vec<u8>;
    type ReadError = Infallible;
    type WriteError = Infallible;

    fn read_from_ext(r: &mut &[u8]) -> Result<Vec<u8>, Infallible> {
        let mut value = Vec::new();
        r.read_to_end(&mut value).unwrap();
        Ok(value)
    }

    fn write_to_ext(w: &mut Vec<u8>, value: &Vec<u8>) -> Result<(), Infallible> {
        Ok(w.write_all(value).unwrap())
    }
}

#[derive(Error, Debug)]
pub enum ReadStringError {
    #[error("{0}")]
    ReadError(#[from] ReadError),

    #[error("name is not NUL-terminated within its field")]
    NotTerminated,

    #[error("name is not valid ASCII")]
    NotAscii,
}

/// A fixed-width, NUL-padded ASCII string, e.g. the `name[30]` fields of
/// `metaserver_hello`/`metaserver_response`. Always exactly `N` bytes on the
/// wire; guaranteed NUL-terminated within those `N` bytes after a successful
/// read, and truncated (with its own NUL still in bounds) on write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FixedAsciiString<const N: usize> {
    bytes: [u8; N],
}

impl<const N: usize> FixedAsciiString<N> {
    pub fn new(s: &str) -> Result<Self, ReadStringError> {
        if !s.is_ascii() {
            return Err(ReadStringError::NotAscii);
        }
        let raw = s.as_bytes();
        let len = raw.len().min(N - 1);
        let mut bytes = [0u8; N];
        bytes[..len].copy_from_slice(&raw[..len]);
        Ok(Self { bytes })
    }

    pub fn as_str(&self) -> &str {
        let nul = self.bytes.iter().position(|&b| b == 0).unwrap_or(N - 1);
        std::str::from_utf8(&self.bytes[..nul]).unwrap_or("")
    }
}

impl<const N: usize> StreamCodec for FixedAsciiString<N> {
    type ReadError = ReadStringError;
    type WriteError = Infallible;

    fn read_from(r: &mut &[u8]) -> Result<Self, ReadStringError> {
        let bytes: [u8; N] = StreamCodec::read_from(r)?;
        if !bytes.iter().any(|&b| b == 0) {
            return Err(ReadStringError::NotTerminated);
        }
        if !bytes.is_ascii() {
            return Err(ReadStringError::NotAscii);
        }
        Ok(Self { bytes })
    }

    fn write_to(&self, w: &mut Vec<u8>) -> Result<(), Infallible> {
        self.bytes.write_to(w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_ascii_string_roundtrips() {
        let name = FixedAsciiString::<30>::new("Red Dragons").unwrap();
        let mut buf = Vec::new();
        name.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), 30);
        let mut r = &buf[..];
        let decoded = FixedAsciiString::<30>::read_from(&mut r).unwrap();
        assert_eq!(decoded.as_str(), "Red Dragons");
    }

    #[test]
    fn fixed_ascii_string_truncates_overlong_input() {
        let name = FixedAsciiString::<4>::new("abcdef").unwrap();
        assert_eq!(name.as_str(), "abc");
    }

    #[test]
    fn fixed_ascii_string_rejects_missing_nul() {
        let mut buf = [b'a'; 30];
        buf[29] = b'a';
        let mut r = &buf[..];
        assert!(matches!(
            FixedAsciiString::<30>::read_from(&mut r),
            Err(ReadStringError::NotTerminated)
        ));
    }
}
