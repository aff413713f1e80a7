use lark::{Archive, CompressionMethod};
use tempfile::tempdir;

const METHODS: [CompressionMethod; 6] = [
    CompressionMethod::Store,
    CompressionMethod::Lzss,
    CompressionMethod::Lzhuf,
    CompressionMethod::Deflate,
    CompressionMethod::Lzw,
    CompressionMethod::Lz77,
];

fn corpora() -> Vec<(&'static str, Vec<u8>)> {
    vec![
        ("empty", Vec::new()),
        ("one_byte", vec![0x5A]),
        ("one_kib_random", {
            let mut v = Vec::with_capacity(1024);
            let mut state = 0x9E3779B9u32;
            for _ in 0..1024 {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                v.push((state & 0xFF) as u8);
            }
            v
        }),
        ("one_mib_zeros", vec![0u8; 1024 * 1024]),
        ("one_mib_ababab", b"AB".repeat(512 * 1024)),
        ("one_mib_random", {
            let mut v = Vec::with_capacity(1024 * 1024);
            let mut state = 0x1234_5678u32;
            for _ in 0..1024 * 1024 {
                state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                v.push((state >> 16) as u8);
            }
            v
        }),
    ]
}

/// Every codec, through the full Archive API, round-trips every corpus.
#[test]
fn every_codec_round_trips_every_corpus_through_archive() {
    let dir = tempdir().unwrap();
    for method in METHODS {
        for (label, data) in corpora() {
            let path = dir.path().join(format!("{label}_{method:?}.ark"));
            let mut archive = Archive::create(&path);
            archive.add("payload", &data, method, 6, 0, None).unwrap();
            archive.save().unwrap();

            let mut reopened = Archive::open(&path).unwrap();
            let mut out = Vec::new();
            reopened.extract("payload", &mut out).unwrap();
            assert_eq!(out, data, "round trip mismatch for {method:?} / {label}");
        }
    }
}

/// Save;Save with no intervening mutation produces a byte-identical file,
/// modulo the header's LastUpdateTime field.
#[test]
fn save_is_idempotent_modulo_last_update_time() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("idempotent.ark");

    let mut archive = Archive::create(&path);
    archive.add("a.txt", b"hello", CompressionMethod::Deflate, 6, 0, None).unwrap();
    archive.save().unwrap();
    let first = std::fs::read(&path).unwrap();

    let mut reopened = Archive::open(&path).unwrap();
    reopened.save().unwrap();
    let second = std::fs::read(&path).unwrap();

    assert_eq!(first.len(), second.len());
    // LastUpdateTime lives at header bytes [32..40] (see header.rs); every
    // other byte (signature, version, CreationTime, file count, and the
    // whole directory/payload region) must match exactly.
    const LAST_UPDATE_TIME_OFFSET: usize = 32;
    const LAST_UPDATE_TIME_LEN: usize = 8;
    assert_eq!(&first[..LAST_UPDATE_TIME_OFFSET], &second[..LAST_UPDATE_TIME_OFFSET]);
    assert_eq!(
        &first[LAST_UPDATE_TIME_OFFSET + LAST_UPDATE_TIME_LEN..],
        &second[LAST_UPDATE_TIME_OFFSET + LAST_UPDATE_TIME_LEN..]
    );
}

/// Name-length boundary: 1 and 260 bytes are accepted, 0 and 261 rejected.
#[test]
fn name_length_boundaries_through_add() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("names.ark");
    let mut archive = Archive::create(&path);

    assert!(archive.add("a", b"x", CompressionMethod::Store, 0, 0, None).is_ok());
    let name_260 = "a".repeat(260);
    assert!(archive.add(&name_260, b"x", CompressionMethod::Store, 0, 0, None).is_ok());

    assert!(archive.add("", b"x", CompressionMethod::Store, 0, 0, None).is_err());
    let name_261 = "a".repeat(261);
    assert!(archive.add(&name_261, b"x", CompressionMethod::Store, 0, 0, None).is_err());
}

/// spec.md §8 scenario 2: Store codec round-trip of the 256-byte ramp,
/// validated end-to-end through Add/Save/Open/Extract rather than just at
/// the codec layer.
#[test]
fn scenario_store_byte_ramp_round_trips_with_known_crc() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ramp.ark");
    let data: Vec<u8> = (0u16..=255).map(|b| b as u8).collect();

    let mut archive = Archive::create(&path);
    archive.add("ramp.bin", &data, CompressionMethod::Store, 0, 0, None).unwrap();
    archive.save().unwrap();

    let mut reopened = Archive::open(&path).unwrap();
    let view = &reopened.list()[0];
    assert_eq!(view.crc32, 0x2905_8C73);

    let mut out = Vec::new();
    reopened.extract("ramp.bin", &mut out).unwrap();
    assert_eq!(out, data);
}

/// spec.md §8 scenario 5: a directory record declaring an expansion ratio
/// past the guard (OriginalSize 10^9 over CompressedSize 100) is rejected
/// at Open with InvalidSizes, constructed directly as raw bytes rather than
/// through Add (which would itself refuse to create such a record).
#[test]
fn scenario_directory_rejects_excessive_expansion_ratio_on_open() {
    use lark::{ArchiveError, FormatError};

    let dir = tempdir().unwrap();
    let path = dir.path().join("bomb.ark");

    let header = lark::header::Header::new();
    let mut bytes = header.to_bytes().to_vec();
    let payload = vec![0u8; 100];
    bytes.extend_from_slice(&payload);

    let directory_offset = bytes.len() as i64;
    bytes.extend_from_slice(&lark::directory::SIGNATURE_PRIMARY.to_le_bytes());
    bytes.extend_from_slice(&1u32.to_le_bytes()); // entry count

    let name = b"bomb.bin";
    bytes.extend_from_slice(&60i64.to_le_bytes()); // file_offset
    bytes.extend_from_slice(&1_000_000_000i64.to_le_bytes()); // original_size
    bytes.extend_from_slice(&100u32.to_le_bytes()); // compressed_size
    bytes.extend_from_slice(&0u32.to_le_bytes()); // crc32
    bytes.extend_from_slice(&0i64.to_le_bytes()); // modification_time
    bytes.push(CompressionMethod::Store.to_byte());
    bytes.push(0); // compression_level
    bytes.extend_from_slice(&(name.len() as u16).to_le_bytes());
    bytes.extend_from_slice(name);

    let _ = directory_offset;
    std::fs::write(&path, &bytes).unwrap();

    let err = Archive::open(&path).unwrap_err();
    assert!(matches!(err, ArchiveError::Format(FormatError::InvalidSizes)));
}

/// A forged directory entry count far larger than the file could possibly
/// hold must surface as InvalidFileCount, not crash the process trying to
/// pre-allocate a `Vec` of that size.
#[test]
fn scenario_directory_rejects_forged_entry_count_without_aborting() {
    use lark::{ArchiveError, FormatError};

    let dir = tempdir().unwrap();
    let path = dir.path().join("huge_count.ark");

    let header = lark::header::Header::new();
    let mut bytes = header.to_bytes().to_vec();
    bytes.extend_from_slice(&lark::directory::SIGNATURE_PRIMARY.to_le_bytes());
    bytes.extend_from_slice(&u32::MAX.to_le_bytes()); // forged entry count
    // No entry records follow: the file is far too small to hold u32::MAX
    // fixed-size records.
    std::fs::write(&path, &bytes).unwrap();

    let err = Archive::open(&path).unwrap_err();
    assert!(matches!(err, ArchiveError::Format(FormatError::InvalidFileCount)));
}

/// An entry declaring `OriginalSize = 0` (which trivially satisfies the
/// expansion-guard ratio check, `0 / n <= 1000`) must not let a forged
/// compressed payload decompress to anything beyond zero bytes: the
/// expansion-guard bound at Extract time is exactly `OriginalSize * K`,
/// with no implicit floor.
#[test]
fn scenario_zero_original_size_entry_rejects_nonempty_forged_payload() {
    use lark::{ArchiveError, CompressionMethod};

    let dir = tempdir().unwrap();
    let path = dir.path().join("zero_size_bomb.ark");

    let header = lark::header::Header::new();
    let mut bytes = header.to_bytes().to_vec();
    let payload = vec![0x41u8; 16]; // forged non-empty Store payload
    bytes.extend_from_slice(&payload);

    bytes.extend_from_slice(&lark::directory::SIGNATURE_PRIMARY.to_le_bytes());
    bytes.extend_from_slice(&1u32.to_le_bytes());

    let name = b"zero.bin";
    bytes.extend_from_slice(&60i64.to_le_bytes()); // file_offset
    bytes.extend_from_slice(&0i64.to_le_bytes()); // original_size: 0
    bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes()); // compressed_size
    bytes.extend_from_slice(&0u32.to_le_bytes()); // crc32
    bytes.extend_from_slice(&0i64.to_le_bytes()); // modification_time
    bytes.push(CompressionMethod::Store.to_byte());
    bytes.push(0); // compression_level
    bytes.extend_from_slice(&(name.len() as u16).to_le_bytes());
    bytes.extend_from_slice(name);

    std::fs::write(&path, &bytes).unwrap();

    let mut archive = Archive::open(&path).unwrap();
    let mut out = Vec::new();
    let err = archive.extract("zero.bin", &mut out).unwrap_err();
    assert!(matches!(err, ArchiveError::Compression(_)));
}

/// spec.md §8 scenario 6: two entries whose payload ranges overlap by a
/// single byte are rejected at Open with InvalidFileOffset.
#[test]
fn scenario_directory_rejects_overlapping_payload_ranges_on_open() {
    use lark::{ArchiveError, FormatError};

    let dir = tempdir().unwrap();
    let path = dir.path().join("overlap.ark");

    let header = lark::header::Header::new();
    let mut bytes = header.to_bytes().to_vec();
    bytes.extend_from_slice(&[0u8; 8]); // 8 bytes of payload shared by both "entries"

    bytes.extend_from_slice(&lark::directory::SIGNATURE_PRIMARY.to_le_bytes());
    bytes.extend_from_slice(&2u32.to_le_bytes());

    for (offset, name) in [(60i64, b"a".as_slice()), (62i64, b"b".as_slice())] {
        bytes.extend_from_slice(&offset.to_le_bytes());
        bytes.extend_from_slice(&4i64.to_le_bytes()); // original_size
        bytes.extend_from_slice(&4u32.to_le_bytes()); // compressed_size
        bytes.extend_from_slice(&0u32.to_le_bytes()); // crc32
        bytes.extend_from_slice(&0i64.to_le_bytes()); // modification_time
        bytes.push(CompressionMethod::Store.to_byte());
        bytes.push(0);
        bytes.extend_from_slice(&(name.len() as u16).to_le_bytes());
        bytes.extend_from_slice(name);
    }

    std::fs::write(&path, &bytes).unwrap();

    let err = Archive::open(&path).unwrap_err();
    assert!(matches!(err, ArchiveError::Format(FormatError::InvalidFileOffset)));
}

/// Rebuild-equivalence: an archive saved once, then saved again after
/// deleting and re-adding an entry with identical bytes, extracts to the
/// same content as the original.
#[test]
fn rebuild_equivalence_after_delete_and_readd() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("rebuild.ark");
    let data = b"rebuild target payload".repeat(100);

    let mut archive = Archive::create(&path);
    archive.add("keep.txt", b"unchanged", CompressionMethod::Deflate, 6, 0, None).unwrap();
    archive.add("target.bin", &data, CompressionMethod::Lzss, 0, 0, None).unwrap();
    archive.save().unwrap();

    let mut reopened = Archive::open(&path).unwrap();
    reopened.delete("target.bin");
    reopened.add("target.bin", &data, CompressionMethod::Lzss, 0, 0, None).unwrap();
    reopened.save().unwrap();

    let mut final_open = Archive::open(&path).unwrap();
    let mut out = Vec::new();
    final_open.extract("target.bin", &mut out).unwrap();
    assert_eq!(out, data);
    let mut keep_out = Vec::new();
    final_open.extract("keep.txt", &mut keep_out).unwrap();
    assert_eq!(keep_out, b"unchanged");
}
