//! DEFLATE: a thin binding over `flate2`'s zlib-format encoder/decoder.
//!
//! Wraps raw DEFLATE in the zlib (RFC 1950) envelope so both ends agree on
//! stream framing without a separate length prefix.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use super::{BoundedBuf, Codec};
use crate::error::CompressionError;

/// Maps the entry's 0..9 level onto flate2's `Compression`.
fn map_level(level: u8) -> Compression {
    match level {
        0 => Compression::none(),
        1 => Compression::fast(),
        2..=6 => Compression::default(),
        _ => Compression::best(),
    }
}

pub struct DeflateCodec;

impl Codec for DeflateCodec {
    fn compress(&self, input: &[u8], level: u8, output: &mut Vec<u8>) -> Result<(), CompressionError> {
        let mut encoder = ZlibEncoder::new(output, map_level(level));
        encoder.write_all(input)?;
        encoder.finish()?;
        Ok(())
    }

    fn decompress(
        &self,
        input: &[u8],
        max_output_bytes: u64,
        output: &mut Vec<u8>,
    ) -> Result<(), CompressionError> {
        let mut decoder = ZlibDecoder::new(input);
        let mut bounded = BoundedBuf::new(output, max_output_bytes);
        let mut chunk = [0u8; 8192];
        loop {
            let n = decoder.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            bounded.extend(&chunk[..n])?;
        }
        Ok(())
    }
}
