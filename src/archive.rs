//! The archive engine: the public Open/Create/Add/Update/Delete/Extract/
//! TestIntegrity/List/Save/Close surface, and the atomic-replace Save
//! algorithm.
//!
//! Entries live in memory between Add/Update/Delete and only touch disk on
//! Save; see DESIGN.md for the grounding behind this structure.

use std::fs::File;
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::checksum;
use crate::codec::CompressionMethod;
use crate::directory;
use crate::entry::{self, Entry, EntryView, MethodAggregate, MAX_NAME_BYTES};
use crate::error::{ApplicationError, ArchiveError, FormatError, IoError, Result};
use crate::header::{Header, SignatureFlavor, HEADER_SIZE};

/// Default expansion-guard ratio: original size may not exceed compressed
/// size by more than this factor.
pub const DEFAULT_EXPANSION_GUARD: u64 = 1000;

/// Per-entry outcome of `Archive::test_integrity`.
pub struct IntegrityReport {
    pub results: Vec<(String, Result<()>)>,
}

impl IntegrityReport {
    pub fn all_ok(&self) -> bool {
        self.results.iter().all(|(_, r)| r.is_ok())
    }
}

/// Constructor-parameter builder: set defaults once instead of repeating
/// them on every `add` call.
pub struct ArchiveBuilder {
    default_method: CompressionMethod,
    default_level: u8,
    expansion_guard: u64,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self {
            default_method: CompressionMethod::Deflate,
            default_level: 6,
            expansion_guard: DEFAULT_EXPANSION_GUARD,
        }
    }

    pub fn default_method(mut self, method: CompressionMethod) -> Self {
        self.default_method = method;
        self
    }

    pub fn default_level(mut self, level: u8) -> Self {
        self.default_level = level.min(9);
        self
    }

    pub fn expansion_guard(mut self, k: u64) -> Self {
        self.expansion_guard = k.max(1);
        self
    }

    pub fn create(self) -> Archive {
        Archive {
            header: Header::new(),
            entries: Vec::new(),
            path: None,
            legacy_signature: false,
            modified: true,
            expansion_guard: self.expansion_guard,
            default_method: self.default_method,
            default_level: self.default_level,
        }
    }

    pub fn open<P: AsRef<Path>>(self, path: P) -> Result<Archive> {
        Archive::open_with(path, self.expansion_guard, self.default_method, self.default_level)
    }
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// An open archive: the in-memory directory plus enough state to persist
/// it back to disk.
pub struct Archive {
    header: Header,
    entries: Vec<Entry>,
    path: Option<PathBuf>,
    legacy_signature: bool,
    modified: bool,
    expansion_guard: u64,
    default_method: CompressionMethod,
    default_level: u8,
}

impl Archive {
    /// Resets to an empty, unsaved archive. No file is written until Save.
    pub fn create<P: AsRef<Path>>(path: P) -> Self {
        let mut archive = ArchiveBuilder::new().create();
        archive.path = Some(path.as_ref().to_path_buf());
        archive
    }

    /// Reads header, locates and parses the directory, validates every
    /// structural invariant, and populates the entry list.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, DEFAULT_EXPANSION_GUARD, CompressionMethod::Deflate, 6)
    }

    fn open_with<P: AsRef<Path>>(
        path: P,
        expansion_guard: u64,
        default_method: CompressionMethod,
        default_level: u8,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::open(&path)
            .map_err(|_| IoError::ArchiveNotFound(path.display().to_string()))?;

        let file_len = file.seek(SeekFrom::End(0))?;
        if file_len < HEADER_SIZE as u64 {
            return Err(FormatError::ArchiveTooSmall.into());
        }

        file.seek(SeekFrom::Start(0))?;
        let mut header_bytes = [0u8; HEADER_SIZE];
        file.read_exact(&mut header_bytes)?;
        let header = Header::parse(&header_bytes)?;

        let dir_offset = directory::find_directory_offset(&mut file)?;
        let entries = directory::parse_directory(&mut file, dir_offset, dir_offset)?;

        if header.file_count as usize != entries.len() {
            return Err(FormatError::InvalidFileCount.into());
        }

        Ok(Self {
            legacy_signature: header.signature == SignatureFlavor::Legacy,
            header,
            entries,
            path: Some(path),
            modified: false,
            expansion_guard,
            default_method,
            default_level,
        })
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Overrides which directory/header signature pair the next Save emits.
    /// Save otherwise preserves whatever signature the archive was opened
    /// with; this is the caller's escape hatch to force a migration to the
    /// primary signature.
    pub fn set_legacy_signature(&mut self, legacy: bool) {
        self.legacy_signature = legacy;
        self.modified = true;
    }

    /// Snapshot view of every entry, insertion order, pure function of
    /// current state (no I/O).
    pub fn list(&self) -> Vec<EntryView> {
        self.entries.iter().map(EntryView::from).collect()
    }

    /// Per-`CompressionMethod` roll-up over the current entry list (count,
    /// total original/compressed bytes, derived ratio), in first-seen
    /// method order. Pure function of current state, like `list`.
    pub fn method_aggregates(&self) -> Vec<MethodAggregate> {
        entry::method_aggregates(&self.list())
    }

    /// Compresses `bytes` with `method`/`level`, computes its CRC-32 over
    /// the *uncompressed* bytes, enforces the expansion guard, and appends
    /// a new entry. No effect on the on-disk file until Save.
    pub fn add(
        &mut self,
        name: &str,
        bytes: &[u8],
        method: CompressionMethod,
        level: u8,
        modification_time: i64,
        file_attributes: Option<u32>,
    ) -> Result<()> {
        validate_name(name)?;

        let crc32 = checksum::crc32(bytes);
        let codec = method.codec();
        let mut compressed = Vec::new();
        codec.compress(bytes, level, &mut compressed)?;

        if compressed.len() as u64 >= u32::MAX as u64 {
            return Err(FormatError::InvalidSizes.into());
        }
        let original_size = bytes.len() as i64;
        let compressed_size = compressed.len() as u32;
        check_expansion_guard(original_size, compressed_size, self.expansion_guard)?;

        self.entries.push(Entry {
            name: name.to_string(),
            name_bytes_override: None,
            original_size,
            compressed_size,
            crc32,
            modification_time,
            file_offset: 0, // assigned on Save
            compression_method: method,
            compression_level: level.min(9),
            file_attributes,
            compressed_data: Some(compressed),
        });
        self.modified = true;
        Ok(())
    }

    /// Convenience wrapper using this archive's configured defaults.
    pub fn add_default(
        &mut self,
        name: &str,
        bytes: &[u8],
        modification_time: i64,
        file_attributes: Option<u32>,
    ) -> Result<()> {
        self.add(name, bytes, self.default_method, self.default_level, modification_time, file_attributes)
    }

    /// Delete-by-name (case-insensitive) followed by Add, so the entry
    /// reappears at the end of iteration order.
    pub fn update(
        &mut self,
        name: &str,
        bytes: &[u8],
        method: CompressionMethod,
        level: u8,
        modification_time: i64,
        file_attributes: Option<u32>,
    ) -> Result<()> {
        self.delete(name);
        self.add(name, bytes, method, level, modification_time, file_attributes)
    }

    /// Case-insensitive name match. Removes the first matching entry and
    /// marks the archive modified. Silent (returns `false`) if absent.
    pub fn delete(&mut self, name: &str) -> bool {
        if let Some(idx) = self.entries.iter().position(|e| e.name.eq_ignore_ascii_case(name)) {
            self.entries.remove(idx);
            self.modified = true;
            true
        } else {
            false
        }
    }

    /// Seeks to the entry's payload, decompresses it, writes it to `sink`,
    /// then verifies CRC-32 — writing happens *before* the CRC check so a
    /// mismatch can be diffed against the corrupted output.
    pub fn extract(&mut self, name: &str, sink: &mut dyn Write) -> Result<()> {
        let idx = self.find_index(name)?;
        let decompressed = self.decompress_entry(idx)?;
        sink.write_all(&decompressed)?;

        let entry = &self.entries[idx];
        let actual = checksum::crc32(&decompressed);
        if actual != entry.crc32 {
            return Err(FormatError::Crc32Mismatch {
                name: entry.name.clone(),
                expected: entry.crc32,
                actual,
            }
            .into());
        }
        Ok(())
    }

    /// Runs the Extract pipeline against a null sink for every entry,
    /// reporting per-entry outcome without stopping at the first failure.
    pub fn test_integrity(&mut self) -> IntegrityReport {
        let names: Vec<String> = self.entries.iter().map(|e| e.name.clone()).collect();
        let mut results = Vec::with_capacity(names.len());
        for name in names {
            let outcome = self.extract(&name, &mut std::io::sink());
            results.push((name, outcome));
        }
        IntegrityReport { results }
    }

    fn find_index(&self, name: &str) -> Result<usize> {
        self.entries
            .iter()
            .position(|e| e.name == name)
            .ok_or_else(|| ApplicationError::Other(format!("no such entry: {name}")).into())
    }

    fn decompress_entry(&mut self, idx: usize) -> Result<Vec<u8>> {
        let (compressed, original_size, compressed_size, method, file_offset) = {
            let e = &self.entries[idx];
            (
                e.compressed_data.clone(),
                e.original_size,
                e.compressed_size,
                e.compression_method,
                e.file_offset,
            )
        };

        let compressed = match compressed {
            Some(buf) => buf,
            None => self.read_payload_from_disk(file_offset, compressed_size)?,
        };

        let codec = method.codec();
        // Bound is exactly OriginalSize * K, including the OriginalSize == 0
        // case: a forged zero-size entry must not buy a hostile decompress
        // stream any slack past the first byte.
        let max_output_bytes = (original_size.max(0) as u64) * self.expansion_guard;
        let mut out = Vec::new();
        codec.decompress(&compressed, max_output_bytes, &mut out)?;
        Ok(out)
    }

    fn read_payload_from_disk(&self, file_offset: i64, compressed_size: u32) -> Result<Vec<u8>> {
        let path = self
            .path
            .as_ref()
            .ok_or(ApplicationError::ArchiveNameNotSet)?;
        let mut file = File::open(path).map_err(|_| IoError::ArchiveNotFound(path.display().to_string()))?;
        file.seek(SeekFrom::Start(file_offset as u64))?;
        let mut buf = vec![0u8; compressed_size as usize];
        file.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Persists modifications: writes header, entry payloads (from memory
    /// or range-copied from the previous file), and the central directory
    /// to a sibling temp file, then atomically renames it over the target.
    pub fn save(&mut self) -> Result<()> {
        let target = self
            .path
            .clone()
            .ok_or(ApplicationError::ArchiveNameNotSet)?;

        let prior_exists = target.exists();
        let mut source_handle = if prior_exists {
            Some(File::open(&target).map_err(|_| IoError::ArchiveNotFound(target.display().to_string()))?)
        } else {
            None
        };

        let output_path = if prior_exists {
            let mut tmp = target.clone();
            let mut file_name = tmp.file_name().unwrap_or_default().to_os_string();
            file_name.push(".tmp");
            tmp.set_file_name(file_name);
            tmp
        } else {
            target.clone()
        };

        let result = self.write_to(&output_path, source_handle.as_mut());
        drop(source_handle);

        match result {
            Ok(()) => {
                if prior_exists {
                    std::fs::remove_file(&target)
                        .map_err(|_| IoError::ArchiveNotFound(target.display().to_string()))?;
                    std::fs::rename(&output_path, &target)?;
                }
                self.modified = false;
                for entry in &mut self.entries {
                    entry.compressed_data = None;
                }
                Ok(())
            }
            Err(e) => {
                if prior_exists {
                    let _ = std::fs::remove_file(&output_path);
                }
                Err(e)
            }
        }
    }

    fn write_to(&mut self, output_path: &Path, mut source: Option<&mut File>) -> Result<()> {
        let file = File::create(output_path)?;
        let mut out = BufWriter::new(file);

        self.header.file_count = self.entries.len() as u32;
        self.header.last_update_time = crate::filetime::now();
        self.header.signature = if self.legacy_signature {
            SignatureFlavor::Legacy
        } else {
            SignatureFlavor::Primary
        };
        out.write_all(&self.header.to_bytes())?;

        let mut position = HEADER_SIZE as u64;
        for entry in &mut self.entries {
            let new_offset = position;
            match entry.compressed_data.take() {
                Some(buf) => {
                    out.write_all(&buf)?;
                    position += buf.len() as u64;
                    entry.compressed_data = Some(buf);
                }
                None => {
                    let src = source
                        .as_deref_mut()
                        .ok_or_else(|| FormatError::NoCompressedData { name: entry.name.clone() })?;
                    src.seek(SeekFrom::Start(entry.file_offset as u64))?;
                    let mut remaining = entry.compressed_size as u64;
                    let mut chunk = [0u8; 64 * 1024];
                    while remaining > 0 {
                        let want = remaining.min(chunk.len() as u64) as usize;
                        src.read_exact(&mut chunk[..want])?;
                        out.write_all(&chunk[..want])?;
                        remaining -= want as u64;
                    }
                    position += entry.compressed_size as u64;
                }
            }
            entry.file_offset = new_offset as i64;
        }

        directory::write_directory(&mut out, &self.entries, self.legacy_signature)?;
        out.flush()?;
        Ok(())
    }

    /// Saves if modified, then releases resources (there is nothing else
    /// to release: no handle is held across public calls).
    pub fn close(mut self) -> Result<()> {
        if self.modified {
            self.save()?;
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > MAX_NAME_BYTES {
        return Err(FormatError::InvalidFileName.into());
    }
    Ok(())
}

fn check_expansion_guard(original_size: i64, compressed_size: u32, k: u64) -> Result<()> {
    let effective = compressed_size.max(1) as i64;
    if original_size / effective > k as i64 {
        return Err(FormatError::InvalidSizes.into());
    }
    Ok(())
}
