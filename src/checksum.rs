//! CRC-32 and Adler-32 helpers.
//!
//! CRC-32 is the on-disk integrity check for entry payloads (reflected,
//! polynomial 0xEDB88320, delegated to `crc32fast`). Adler-32 is a utility
//! only; it never appears in the container format.

/// Streaming CRC-32 accumulator over uncompressed bytes.
#[derive(Default)]
pub struct Crc32 {
    hasher: crc32fast::Hasher,
}

impl Crc32 {
    pub fn new() -> Self {
        Self {
            hasher: crc32fast::Hasher::new(),
        }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    pub fn finalize(self) -> u32 {
        self.hasher.finalize()
    }
}

/// One-shot CRC-32 over a byte slice.
pub fn crc32(bytes: &[u8]) -> u32 {
    crc32fast::hash(bytes)
}

/// One-shot Adler-32 over a byte slice. Not part of the on-disk format.
pub fn adler32(bytes: &[u8]) -> u32 {
    adler32::adler32(bytes).expect("adler32 over an in-memory slice cannot fail")
}
