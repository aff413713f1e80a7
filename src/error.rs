//! Error types for the archive engine.
//!
//! Every variant carries the numeric code from the error taxonomy so callers
//! can handle failures programmatically without matching on string content.

use std::fmt;
use std::io;

/// Result type for archive operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Malformed or out-of-spec container structure, detected on `Open`, before
/// `Save`, or while validating an entry at `Extract`/`Test` time.
#[derive(Debug)]
pub enum FormatError {
    InvalidSignature,
    UnsupportedVersion,
    ArchiveTooSmall,
    DirectoryNotFound,
    InvalidFileCount,
    InvalidFileName,
    InvalidFileOffset,
    Crc32Mismatch {
        name: String,
        expected: u32,
        actual: u32,
    },
    NoCompressedData {
        name: String,
    },
    InvalidCompressionMethod(u8),
    InvalidSizes,
}

impl FormatError {
    pub fn code(&self) -> u32 {
        match self {
            FormatError::InvalidSignature => 1001,
            FormatError::UnsupportedVersion => 1002,
            FormatError::ArchiveTooSmall => 1003,
            FormatError::DirectoryNotFound => 1004,
            FormatError::InvalidFileCount => 1005,
            FormatError::InvalidFileName => 1006,
            FormatError::InvalidFileOffset => 1007,
            FormatError::Crc32Mismatch { .. } => 3001,
            FormatError::NoCompressedData { .. } => 3002,
            FormatError::InvalidCompressionMethod(_) => 3003,
            FormatError::InvalidSizes => 3004,
        }
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::InvalidSignature => write!(f, "invalid archive signature"),
            FormatError::UnsupportedVersion => write!(f, "unsupported format version"),
            FormatError::ArchiveTooSmall => write!(f, "archive smaller than the fixed header"),
            FormatError::DirectoryNotFound => write!(f, "central directory signature not found"),
            FormatError::InvalidFileCount => {
                write!(f, "header file count disagrees with directory")
            }
            FormatError::InvalidFileName => write!(f, "entry name length out of bounds"),
            FormatError::InvalidFileOffset => {
                write!(f, "entry payload range invalid or overlapping")
            }
            FormatError::Crc32Mismatch {
                name,
                expected,
                actual,
            } => write!(
                f,
                "CRC-32 mismatch for '{name}': expected {expected:#010x}, got {actual:#010x}"
            ),
            FormatError::NoCompressedData { name } => {
                write!(f, "entry '{name}' has no compressed data to write")
            }
            FormatError::InvalidCompressionMethod(m) => {
                write!(f, "invalid compression method byte {m}")
            }
            FormatError::InvalidSizes => write!(f, "declared sizes violate the expansion guard"),
        }
    }
}

/// Failures reaching the filesystem.
#[derive(Debug)]
pub enum IoError {
    FileNotFound(String),
    ArchiveNotFound(String),
    SourceNotFound(String),
    EnumerationFailed(String),
}

impl IoError {
    pub fn code(&self) -> u32 {
        match self {
            IoError::FileNotFound(_) => 2001,
            IoError::ArchiveNotFound(_) => 2002,
            IoError::SourceNotFound(_) => 2003,
            IoError::EnumerationFailed(_) => 2004,
        }
    }
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoError::FileNotFound(p) => write!(f, "file not found: {p}"),
            IoError::ArchiveNotFound(p) => write!(f, "archive not found or locked: {p}"),
            IoError::SourceNotFound(p) => write!(f, "source not found: {p}"),
            IoError::EnumerationFailed(msg) => write!(f, "enumeration failed: {msg}"),
        }
    }
}

/// Codec-specific failure during compress or decompress.
#[derive(Debug)]
pub enum CompressionError {
    Io(io::Error),
    BoundExceeded { limit: u64, attempted: u64 },
    CorruptStream(String),
}

impl fmt::Display for CompressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressionError::Io(e) => write!(f, "codec I/O error: {e}"),
            CompressionError::BoundExceeded { limit, attempted } => write!(
                f,
                "decompression exceeded the expansion guard ({attempted} > {limit} bytes)"
            ),
            CompressionError::CorruptStream(msg) => write!(f, "corrupt codec stream: {msg}"),
        }
    }
}

impl From<io::Error> for CompressionError {
    fn from(e: io::Error) -> Self {
        CompressionError::Io(e)
    }
}

/// Application-level / non-fatal errors.
#[derive(Debug)]
pub enum ApplicationError {
    ArchiveNameNotSet,
    Other(String),
}

impl ApplicationError {
    pub fn code(&self) -> u32 {
        match self {
            ApplicationError::ArchiveNameNotSet => 4001,
            ApplicationError::Other(_) => 4000,
        }
    }
}

impl fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplicationError::ArchiveNameNotSet => write!(f, "archive has no associated path"),
            ApplicationError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

/// The top-level error type returned by every public operation.
#[derive(Debug)]
pub enum ArchiveError {
    Format(FormatError),
    Io(IoError),
    Compression(CompressionError),
    Application(ApplicationError),
}

impl ArchiveError {
    /// The numeric code preserved across the core for programmatic handling.
    pub fn code(&self) -> u32 {
        match self {
            ArchiveError::Format(e) => e.code(),
            ArchiveError::Io(e) => e.code(),
            ArchiveError::Compression(_) => 5000,
            ArchiveError::Application(e) => e.code(),
        }
    }
}

impl fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveError::Format(e) => write!(f, "format error ({}): {e}", e.code()),
            ArchiveError::Io(e) => write!(f, "I/O error ({}): {e}", e.code()),
            ArchiveError::Compression(e) => write!(f, "compression error: {e}"),
            ArchiveError::Application(e) => write!(f, "archive error ({}): {e}", e.code()),
        }
    }
}

impl std::error::Error for ArchiveError {}

impl From<FormatError> for ArchiveError {
    fn from(e: FormatError) -> Self {
        ArchiveError::Format(e)
    }
}

impl From<IoError> for ArchiveError {
    fn from(e: IoError) -> Self {
        ArchiveError::Io(e)
    }
}

impl From<CompressionError> for ArchiveError {
    fn from(e: CompressionError) -> Self {
        ArchiveError::Compression(e)
    }
}

impl From<ApplicationError> for ArchiveError {
    fn from(e: ApplicationError) -> Self {
        ArchiveError::Application(e)
    }
}

impl From<io::Error> for ArchiveError {
    fn from(e: io::Error) -> Self {
        ArchiveError::Compression(CompressionError::Io(e))
    }
}
