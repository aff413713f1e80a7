//! Fixed 60-byte archive header: signature, version, and the handful of
//! advisory fields carried at the front of every container.

use crate::error::FormatError;
use crate::filetime;

pub const HEADER_SIZE: usize = 60;

/// `0x4B52414C` little-endian, spells "LARK" in the stored bytes.
pub const SIGNATURE_PRIMARY: u32 = 0x4B52_414C;
/// Accepted on read for archives written by the format's predecessor.
pub const SIGNATURE_LEGACY: u32 = 0x4352_414C;

pub const FORMAT_VERSION: u16 = 0x0200;
pub const DEFAULT_BLOCK_SIZE: u32 = 262_144;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureFlavor {
    Primary,
    Legacy,
}

/// In-memory form of the 60-byte archive header.
#[derive(Debug, Clone)]
pub struct Header {
    pub signature: SignatureFlavor,
    pub format_version: u16,
    pub min_unpack_version: u16,
    pub block_size: u32,
    pub default_compression_level: u32,
    pub creation_time: i64,
    pub last_update_time: i64,
    pub file_count: u32,
}

impl Header {
    pub fn new() -> Self {
        let now = filetime::now();
        Self {
            signature: SignatureFlavor::Primary,
            format_version: FORMAT_VERSION,
            min_unpack_version: FORMAT_VERSION,
            block_size: DEFAULT_BLOCK_SIZE,
            default_compression_level: 6,
            creation_time: now,
            last_update_time: now,
            file_count: 0,
        }
    }

    pub fn parse(bytes: &[u8; HEADER_SIZE]) -> Result<Self, FormatError> {
        let signature_raw = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        let signature = match signature_raw {
            SIGNATURE_PRIMARY => SignatureFlavor::Primary,
            SIGNATURE_LEGACY => SignatureFlavor::Legacy,
            _ => return Err(FormatError::InvalidSignature),
        };

        let format_version = u16::from_le_bytes(bytes[4..6].try_into().unwrap());
        if format_version != FORMAT_VERSION {
            return Err(FormatError::UnsupportedVersion);
        }
        let min_unpack_version = u16::from_le_bytes(bytes[6..8].try_into().unwrap());
        // bytes[8..12] Flags: read and ignored, never round-tripped.
        let block_size = u32::from_le_bytes(bytes[12..16].try_into().unwrap());
        let default_compression_level = u32::from_le_bytes(bytes[16..20].try_into().unwrap());
        // bytes[20..24] Reserved1: zero, not validated.
        let creation_time = i64::from_le_bytes(bytes[24..32].try_into().unwrap());
        let last_update_time = i64::from_le_bytes(bytes[32..40].try_into().unwrap());
        // bytes[40..56] ReservedData: zero-filled, not validated.
        let file_count = u32::from_le_bytes(bytes[56..60].try_into().unwrap());

        Ok(Self {
            signature,
            format_version,
            min_unpack_version,
            block_size,
            default_compression_level,
            creation_time,
            last_update_time,
            file_count,
        })
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        let sig = match self.signature {
            SignatureFlavor::Primary => SIGNATURE_PRIMARY,
            SignatureFlavor::Legacy => SIGNATURE_LEGACY,
        };
        out[0..4].copy_from_slice(&sig.to_le_bytes());
        out[4..6].copy_from_slice(&self.format_version.to_le_bytes());
        out[6..8].copy_from_slice(&self.min_unpack_version.to_le_bytes());
        out[8..12].copy_from_slice(&0u32.to_le_bytes()); // Flags written as 0
        out[12..16].copy_from_slice(&self.block_size.to_le_bytes());
        out[16..20].copy_from_slice(&self.default_compression_level.to_le_bytes());
        out[20..24].copy_from_slice(&0u32.to_le_bytes()); // Reserved1
        out[24..32].copy_from_slice(&self.creation_time.to_le_bytes());
        out[32..40].copy_from_slice(&self.last_update_time.to_le_bytes());
        // out[40..56] ReservedData stays zero.
        out[56..60].copy_from_slice(&self.file_count.to_le_bytes());
        out
    }
}

impl Default for Header {
    fn default() -> Self {
        Self::new()
    }
}
