//! Central directory: location-on-read scan, parsing, and serialization.
//!
//! Tail-scan for the signature, then a fixed-width record per entry; see
//! DESIGN.md for where this layout is grounded.

use std::io::{Read, Seek, SeekFrom, Write};

use crate::codec::CompressionMethod;
use crate::entry::{Entry, MAX_NAME_BYTES};
use crate::error::{ArchiveError, FormatError};
use crate::header::HEADER_SIZE;

/// `0x444B524C`.
pub const SIGNATURE_PRIMARY: u32 = 0x444B_524C;
/// Accepted on read for archives written by the format's predecessor.
pub const SIGNATURE_LEGACY: u32 = 0x4C41_5244;

const TAIL_SCAN_WINDOW: u64 = 4096;
const FALLBACK_SCAN_WINDOW: u64 = 64 * 1024;

/// Fixed portion of one directory record, before the variable-length name.
const RECORD_FIXED_SIZE: usize = 8 + 8 + 4 + 4 + 8 + 1 + 1 + 2;

/// Scans backward from EOF for a directory signature (primary or legacy).
/// Tries the last 4 KiB byte-aligned first; on failure, scans backward one
/// byte at a time for up to 64 KiB. Never looks before the fixed header.
pub fn find_directory_offset<F: Read + Seek>(file: &mut F) -> Result<u64, ArchiveError> {
    let file_len = file.seek(SeekFrom::End(0))?;
    if file_len < HEADER_SIZE as u64 {
        return Err(ArchiveError::Format(FormatError::ArchiveTooSmall));
    }

    if let Some(off) = scan_window(file, file_len, TAIL_SCAN_WINDOW)? {
        return Ok(off);
    }
    if let Some(off) = scan_window(file, file_len, FALLBACK_SCAN_WINDOW)? {
        return Ok(off);
    }
    Err(ArchiveError::Format(FormatError::DirectoryNotFound))
}

fn scan_window<F: Read + Seek>(
    file: &mut F,
    file_len: u64,
    window: u64,
) -> Result<Option<u64>, ArchiveError> {
    let lower_bound = HEADER_SIZE as u64;
    let scan_start = file_len.saturating_sub(window).max(lower_bound);
    file.seek(SeekFrom::Start(scan_start))?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;

    for i in (0..buf.len().saturating_sub(3)).rev() {
        let word = u32::from_le_bytes(buf[i..i + 4].try_into().unwrap());
        if word == SIGNATURE_PRIMARY || word == SIGNATURE_LEGACY {
            let offset = scan_start + i as u64;
            if offset >= lower_bound {
                return Ok(Some(offset));
            }
        }
    }
    Ok(None)
}

/// Parses the directory at `offset`, validating §3 invariants 3-5 per entry
/// as it goes so a violation is localised to the offending entry index.
pub fn parse_directory<F: Read + Seek>(
    file: &mut F,
    offset: u64,
    directory_offset_for_bounds: u64,
) -> Result<Vec<Entry>, ArchiveError> {
    file.seek(SeekFrom::Start(offset))?;

    let mut sig_buf = [0u8; 4];
    file.read_exact(&mut sig_buf)?;
    let signature = u32::from_le_bytes(sig_buf);
    if signature != SIGNATURE_PRIMARY && signature != SIGNATURE_LEGACY {
        return Err(ArchiveError::Format(FormatError::DirectoryNotFound));
    }

    let mut count_buf = [0u8; 4];
    file.read_exact(&mut count_buf)?;
    let count = u32::from_le_bytes(count_buf);

    // `count` is an untrusted on-disk field; a hostile archive can declare
    // an enormous value in a tiny file. Bound it against what the
    // remaining bytes can possibly hold (each record is at least
    // RECORD_FIXED_SIZE bytes) before trusting it for `with_capacity`, so a
    // forged count surfaces as InvalidFileCount rather than an allocator
    // abort.
    let records_start = offset + 8;
    let file_len = file.seek(SeekFrom::End(0))?;
    file.seek(SeekFrom::Start(records_start))?;
    let remaining = file_len.saturating_sub(records_start);
    let max_possible_entries = remaining / RECORD_FIXED_SIZE as u64;
    if count as u64 > max_possible_entries {
        return Err(ArchiveError::Format(FormatError::InvalidFileCount));
    }

    let mut entries = Vec::with_capacity(count as usize);
    let mut seen_ranges: Vec<(i64, i64)> = Vec::with_capacity(count as usize);

    for _ in 0..count {
        let mut fixed = [0u8; RECORD_FIXED_SIZE];
        file.read_exact(&mut fixed)?;

        let file_offset = i64::from_le_bytes(fixed[0..8].try_into().unwrap());
        let original_size = i64::from_le_bytes(fixed[8..16].try_into().unwrap());
        let compressed_size = u32::from_le_bytes(fixed[16..20].try_into().unwrap());
        let crc32 = u32::from_le_bytes(fixed[20..24].try_into().unwrap());
        let modification_time = i64::from_le_bytes(fixed[24..32].try_into().unwrap());
        let method_byte = fixed[32];
        let compression_level = fixed[33];
        let name_length = u16::from_le_bytes(fixed[34..36].try_into().unwrap()) as usize;

        if !(1..=MAX_NAME_BYTES).contains(&name_length) {
            return Err(ArchiveError::Format(FormatError::InvalidFileName));
        }
        if original_size < 0 {
            return Err(ArchiveError::Format(FormatError::InvalidSizes));
        }
        // Expansion guard (invariant 6): declared ratio may not exceed the
        // configured cap. Validated again, against the real decompressed
        // byte count, at Extract time.
        let effective_compressed = compressed_size.max(1) as i64;
        if original_size / effective_compressed > 1000 {
            return Err(ArchiveError::Format(FormatError::InvalidSizes));
        }

        let method = CompressionMethod::from_byte(method_byte)
            .ok_or(ArchiveError::Format(FormatError::InvalidCompressionMethod(method_byte)))?;

        if file_offset < HEADER_SIZE as i64
            || file_offset + compressed_size as i64 > directory_offset_for_bounds as i64
        {
            return Err(ArchiveError::Format(FormatError::InvalidFileOffset));
        }
        let new_range = (file_offset, file_offset + compressed_size as i64);
        for &(start, end) in &seen_ranges {
            if new_range.0 < end && start < new_range.1 {
                return Err(ArchiveError::Format(FormatError::InvalidFileOffset));
            }
        }
        seen_ranges.push(new_range);

        let mut name_buf = vec![0u8; name_length];
        file.read_exact(&mut name_buf)?;
        let name = String::from_utf8(name_buf.clone());
        let (name, name_bytes_override) = match name {
            Ok(s) => (s, None),
            Err(_) => (String::from_utf8_lossy(&name_buf).into_owned(), Some(name_buf)),
        };

        entries.push(Entry {
            name,
            name_bytes_override,
            original_size,
            compressed_size,
            crc32,
            modification_time,
            file_offset,
            compression_method: method,
            compression_level,
            file_attributes: None,
            compressed_data: None,
        });
    }

    Ok(entries)
}

/// Serializes the directory signature + every entry's fixed record + name
/// bytes, in iteration order, starting at the writer's current position.
pub fn write_directory<W: Write>(
    writer: &mut W,
    entries: &[Entry],
    legacy: bool,
) -> std::io::Result<()> {
    let signature = if legacy { SIGNATURE_LEGACY } else { SIGNATURE_PRIMARY };
    writer.write_all(&signature.to_le_bytes())?;
    writer.write_all(&(entries.len() as u32).to_le_bytes())?;

    for entry in entries {
        let name_bytes = entry.name_bytes();
        writer.write_all(&entry.file_offset.to_le_bytes())?;
        writer.write_all(&entry.original_size.to_le_bytes())?;
        writer.write_all(&entry.compressed_size.to_le_bytes())?;
        writer.write_all(&entry.crc32.to_le_bytes())?;
        writer.write_all(&entry.modification_time.to_le_bytes())?;
        writer.write_all(&[entry.compression_method.to_byte()])?;
        writer.write_all(&[entry.compression_level])?;
        writer.write_all(&(name_bytes.len() as u16).to_le_bytes())?;
        writer.write_all(&name_bytes)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_entry(name: &str, offset: i64) -> Entry {
        Entry {
            name: name.to_string(),
            name_bytes_override: None,
            original_size: 4,
            compressed_size: 4,
            crc32: 0x1234_5678,
            modification_time: 0,
            file_offset: offset,
            compression_method: CompressionMethod::Store,
            compression_level: 0,
            file_attributes: None,
            compressed_data: None,
        }
    }

    #[test]
    fn writes_and_parses_round_trip() {
        let entries = vec![sample_entry("a", 60), sample_entry("b", 64)];
        let mut buf = Vec::new();
        write_directory(&mut buf, &entries, false).unwrap();

        let mut cursor = Cursor::new(buf.clone());
        let parsed = parse_directory(&mut cursor, 0, 1_000_000).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].name, "a");
        assert_eq!(parsed[1].file_offset, 64);
    }

    #[test]
    fn finds_signature_within_tail_window() {
        let entries = vec![sample_entry("a", 60)];
        let mut file_bytes = vec![0u8; HEADER_SIZE];
        let dir_offset = file_bytes.len() as u64;
        write_directory(&mut file_bytes, &entries, false).unwrap();

        let mut cursor = Cursor::new(file_bytes);
        let found = find_directory_offset(&mut cursor).unwrap();
        assert_eq!(found, dir_offset);
    }

    #[test]
    fn rejects_overlapping_entries() {
        let mut entries = vec![sample_entry("a", 60)];
        entries.push(sample_entry("b", 62)); // overlaps [60,64) by 2 bytes
        let mut buf = Vec::new();
        write_directory(&mut buf, &entries, false).unwrap();
        let mut cursor = Cursor::new(buf);
        let err = parse_directory(&mut cursor, 0, 1_000_000).unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::Format(FormatError::InvalidFileOffset)
        ));
    }
}
