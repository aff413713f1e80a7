//! # lark: a single-file archive container engine
//!
//! `lark` stores a set of named byte streams inside one container file, each
//! independently compressed with one of six codecs (Store, LZSS, LZHUF,
//! DEFLATE, LZW, LZ77) and individually verifiable by CRC-32. Entries are
//! catalogued in a central directory at the tail of the file so they can be
//! located, extracted, listed, deleted, or replaced without touching other
//! entries.
//!
//! ## Quick Start
//!
//! ### Writing an archive
//!
//! ```no_run
//! use lark::{Archive, CompressionMethod};
//!
//! let mut archive = Archive::create("output.ark");
//! archive.add("file1.txt", b"Hello, World!", CompressionMethod::Deflate, 6, 0, None)?;
//! archive.save()?;
//! # Ok::<(), lark::ArchiveError>(())
//! ```
//!
//! ### Reading an archive
//!
//! ```no_run
//! use lark::Archive;
//!
//! let mut archive = Archive::open("output.ark")?;
//! for entry in archive.list() {
//!     println!("{}: {} bytes", entry.name, entry.original_size);
//! }
//!
//! let mut out = Vec::new();
//! archive.extract("file1.txt", &mut out)?;
//! # Ok::<(), lark::ArchiveError>(())
//! ```

pub mod archive;
pub mod bitio;
pub mod checksum;
pub mod codec;
pub mod directory;
pub mod entry;
pub mod error;
pub mod filetime;
pub mod header;

pub use archive::{Archive, ArchiveBuilder, IntegrityReport};
pub use codec::CompressionMethod;
pub use entry::{EntryView, MethodAggregate};
pub use error::{ApplicationError, ArchiveError, CompressionError, FormatError, IoError, Result};
