//! `Entry`: one stored file, both while sitting in the in-memory directory
//! and while being carried through Save. `EntryView` is the read-only
//! snapshot handed back by `Archive::list`, keeping `CompressedData` out of
//! any public signature.

use crate::codec::CompressionMethod;

pub const MAX_NAME_BYTES: usize = 260;

/// One archive entry. Lives in `Archive::entries` for the lifetime of the
/// in-memory directory.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Canonical in-memory name. UTF-8 is canonical; non-UTF-8 legacy
    /// names round-trip through `name_bytes`.
    pub name: String,
    /// Opaque on-disk bytes for this name, preserved byte-for-byte even
    /// when they are not valid UTF-8. `None` when `name` losslessly
    /// round-trips (the common case: every name added through this crate).
    pub name_bytes_override: Option<Vec<u8>>,
    pub original_size: i64,
    pub compressed_size: u32,
    pub crc32: u32,
    pub modification_time: i64,
    pub file_offset: i64,
    pub compression_method: CompressionMethod,
    pub compression_level: u8,
    /// In-memory only; never persisted to the Central Directory (see
    /// DESIGN.md). `None` for every entry read back from `Open`.
    pub file_attributes: Option<u32>,
    /// Present only for entries added/updated since the last Save;
    /// released once Save has consumed it.
    pub compressed_data: Option<Vec<u8>>,
}

impl Entry {
    /// The bytes this entry's name would be written as on disk.
    pub fn name_bytes(&self) -> Vec<u8> {
        self.name_bytes_override
            .clone()
            .unwrap_or_else(|| self.name.as_bytes().to_vec())
    }
}

/// Read-only snapshot of an entry, returned by `Archive::list`. Carries the
/// derived compression ratio so collaborators (the CLI layer, out of
/// scope here) don't need to recompute it.
#[derive(Debug, Clone)]
pub struct EntryView {
    pub name: String,
    pub original_size: i64,
    pub compressed_size: u32,
    pub compression_method: CompressionMethod,
    pub compression_level: u8,
    pub crc32: u32,
    pub modification_time: i64,
    pub file_attributes: Option<u32>,
}

impl EntryView {
    /// `compressed / original`, or `1.0` when original size is zero.
    pub fn ratio(&self) -> f64 {
        if self.original_size == 0 {
            1.0
        } else {
            self.compressed_size as f64 / self.original_size as f64
        }
    }
}

impl From<&Entry> for EntryView {
    fn from(e: &Entry) -> Self {
        Self {
            name: e.name.clone(),
            original_size: e.original_size,
            compressed_size: e.compressed_size,
            compression_method: e.compression_method,
            compression_level: e.compression_level,
            crc32: e.crc32,
            modification_time: e.modification_time,
            file_attributes: e.file_attributes,
        }
    }
}

/// Per-`CompressionMethod` roll-up over a `List` snapshot: entry count and
/// total original/compressed bytes, with the same derived-ratio convention
/// as `EntryView::ratio`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MethodAggregate {
    pub method: CompressionMethod,
    pub entry_count: usize,
    pub total_original_size: i64,
    pub total_compressed_size: u64,
}

impl MethodAggregate {
    pub fn ratio(&self) -> f64 {
        if self.total_original_size == 0 {
            1.0
        } else {
            self.total_compressed_size as f64 / self.total_original_size as f64
        }
    }
}

/// Folds a snapshot of entries into one `MethodAggregate` per method that
/// appears at least once, in first-seen order.
pub fn method_aggregates(entries: &[EntryView]) -> Vec<MethodAggregate> {
    let mut aggregates: Vec<MethodAggregate> = Vec::new();
    for entry in entries {
        match aggregates.iter_mut().find(|a| a.method == entry.compression_method) {
            Some(agg) => {
                agg.entry_count += 1;
                agg.total_original_size += entry.original_size;
                agg.total_compressed_size += entry.compressed_size as u64;
            }
            None => aggregates.push(MethodAggregate {
                method: entry.compression_method,
                entry_count: 1,
                total_original_size: entry.original_size,
                total_compressed_size: entry.compressed_size as u64,
            }),
        }
    }
    aggregates
}
