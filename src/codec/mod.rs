//! The codec plug-board: one `CompressionMethod` tag per on-disk value, one
//! `Codec` implementation per tag, dispatched through a single polymorphic
//! call rather than a `match` at every call site.

mod deflate;
mod lz77;
mod lzhuf;
mod lzss;
mod lzw;
mod store;

pub use deflate::DeflateCodec;
pub use lz77::Lz77Codec;
pub use lzhuf::LzhufCodec;
pub use lzss::LzssCodec;
pub use lzw::LzwCodec;
pub use store::StoreCodec;

use crate::error::CompressionError;

/// On-disk compression method tag (`Entry::CompressionMethod`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CompressionMethod {
    Store = 0,
    Lzss = 1,
    Lzhuf = 2,
    Deflate = 3,
    Lzw = 4,
    Lz77 = 5,
}

impl CompressionMethod {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Store),
            1 => Some(Self::Lzss),
            2 => Some(Self::Lzhuf),
            3 => Some(Self::Deflate),
            4 => Some(Self::Lzw),
            5 => Some(Self::Lz77),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Look up the codec implementation for this method. Codecs are
    /// stateless across invocations, so a fresh instance is created per call.
    pub fn codec(self) -> Box<dyn Codec> {
        match self {
            CompressionMethod::Store => Box::new(store::StoreCodec),
            CompressionMethod::Lzss => Box::new(lzss::LzssCodec),
            CompressionMethod::Lzhuf => Box::new(lzhuf::LzhufCodec),
            CompressionMethod::Deflate => Box::new(deflate::DeflateCodec),
            CompressionMethod::Lzw => Box::new(lzw::LzwCodec),
            CompressionMethod::Lz77 => Box::new(lz77::Lz77Codec),
        }
    }
}

/// Every codec implements this contract. `decompress` is the exact inverse
/// of `compress` for the same codec: round-trip equality is a hard
/// correctness requirement, enforced by the tests in each codec's own
/// module plus the end-to-end suite in `tests/`.
pub trait Codec {
    fn compress(&self, input: &[u8], level: u8, output: &mut Vec<u8>) -> Result<(), CompressionError>;

    /// `max_output_bytes` is the expansion-guard bound (`original_size *
    /// K`); implementations must stop and fail rather than write past it
    /// even if the stream claims more.
    fn decompress(
        &self,
        input: &[u8],
        max_output_bytes: u64,
        output: &mut Vec<u8>,
    ) -> Result<(), CompressionError>;
}

/// A `Vec<u8>`-backed sink that fails fast once more than `limit` bytes have
/// been appended, giving every codec's decompress path the same
/// expansion-guard behaviour.
pub(crate) struct BoundedBuf<'a> {
    buf: &'a mut Vec<u8>,
    limit: u64,
}

impl<'a> BoundedBuf<'a> {
    pub(crate) fn new(buf: &'a mut Vec<u8>, limit: u64) -> Self {
        Self { buf, limit }
    }

    pub(crate) fn push(&mut self, byte: u8) -> Result<(), CompressionError> {
        if self.buf.len() as u64 >= self.limit {
            return Err(CompressionError::BoundExceeded {
                limit: self.limit,
                attempted: self.buf.len() as u64 + 1,
            });
        }
        self.buf.push(byte);
        Ok(())
    }

    pub(crate) fn extend(&mut self, bytes: &[u8]) -> Result<(), CompressionError> {
        if self.buf.len() as u64 + bytes.len() as u64 > self.limit {
            return Err(CompressionError::BoundExceeded {
                limit: self.limit,
                attempted: self.buf.len() as u64 + bytes.len() as u64,
            });
        }
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    pub(crate) fn len(&self) -> usize {
        self.buf.len()
    }

    pub(crate) fn byte_at(&self, index: usize) -> u8 {
        self.buf[index]
    }
}

#[cfg(test)]
pub(crate) fn round_trip(method: CompressionMethod, level: u8, data: &[u8]) -> Vec<u8> {
    let codec = method.codec();
    let mut compressed = Vec::new();
    codec.compress(data, level, &mut compressed).unwrap();
    let mut decompressed = Vec::new();
    let cap = (data.len() as u64).max(64) * 1000;
    codec
        .decompress(&compressed, cap, &mut decompressed)
        .unwrap();
    decompressed
}
