//! Store: identity copy, recorded at compression level 0.

use super::{BoundedBuf, Codec};
use crate::error::CompressionError;

/// Working-buffer size is advisory only; `compress`/`decompress` here copy
/// the whole slice in one call, so it exists purely to document the
/// streaming-buffer contract a file-backed caller would chunk through.
const WORKING_BUFFER: usize = 64 * 1024;

pub struct StoreCodec;

impl Codec for StoreCodec {
    fn compress(&self, input: &[u8], _level: u8, output: &mut Vec<u8>) -> Result<(), CompressionError> {
        output.reserve(input.len().min(WORKING_BUFFER));
        output.extend_from_slice(input);
        Ok(())
    }

    fn decompress(
        &self,
        input: &[u8],
        max_output_bytes: u64,
        output: &mut Vec<u8>,
    ) -> Result<(), CompressionError> {
        let mut bounded = BoundedBuf::new(output, max_output_bytes);
        bounded.extend(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{CompressionMethod, round_trip};

    #[test]
    fn store_round_trips_byte_ramp() {
        let data: Vec<u8> = (0u16..=255).map(|b| b as u8).collect();
        let out = round_trip(CompressionMethod::Store, 0, &data);
        assert_eq!(out, data);
        let mut compressed = Vec::new();
        StoreCodec.compress(&data, 0, &mut compressed).unwrap();
        assert_eq!(compressed.len(), 256);
    }

    #[test]
    fn store_rejects_overshoot_of_guard() {
        let data = vec![1u8; 100];
        let mut compressed = Vec::new();
        StoreCodec.compress(&data, 0, &mut compressed).unwrap();
        let mut output = Vec::new();
        let err = StoreCodec
            .decompress(&compressed, 10, &mut output)
            .unwrap_err();
        assert!(matches!(err, CompressionError::BoundExceeded { .. }));
    }
}
