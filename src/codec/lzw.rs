//! LZW: classic variable-width (9..16 bit) dictionary coding.
//!
//! The code space is seeded with the 256 single-byte strings plus two
//! control codes, `CLEAR` (256) and `END` (257), so the dictionary proper
//! starts filling at code 258. Width grows from 9 to 16 bits as the
//! dictionary fills and is kept in sync between encoder and decoder purely
//! by both sides applying the identical growth rule after each new entry;
//! no width value is ever written to the stream. `CLEAR` resets the
//! dictionary and width once code space is exhausted at 65536 entries.

use std::collections::HashMap;

use crate::bitio::{BitReader, BitWriter};
use crate::error::CompressionError;

use super::{BoundedBuf, Codec};

const MIN_WIDTH: u8 = 9;
const MAX_WIDTH: u8 = 16;
const CLEAR: u32 = 256;
const END: u32 = 257;
const FIRST_CODE: u32 = 258;
const MAX_CODE_SPACE: u32 = 1 << 16;

/// Grows `width` to keep `next_code` representable, per the shared
/// encoder/decoder synchronization rule.
fn grow_width(next_code: u32, width: &mut u8) {
    if next_code > (1u32 << *width) - 1 && *width < MAX_WIDTH {
        *width += 1;
    }
}

pub struct LzwCodec;

impl Codec for LzwCodec {
    fn compress(&self, input: &[u8], _level: u8, output: &mut Vec<u8>) -> Result<(), CompressionError> {
        let mut bw = BitWriter::new(output);

        let mut dict: HashMap<Vec<u8>, u32> = HashMap::new();
        let mut next_code = FIRST_CODE;
        let mut width = MIN_WIDTH;
        bw.write_bits(CLEAR, width)?;

        let mut w: Vec<u8> = Vec::new();
        for &c in input {
            if w.is_empty() {
                w = vec![c];
                continue;
            }
            let mut wc = w.clone();
            wc.push(c);
            if dict.contains_key(&wc) {
                w = wc;
                continue;
            }
            // w is not extendable by c in the dictionary: emit code(w),
            // insert wc as a new entry, restart w at [c].
            let code = code_for(&dict, &w);
            bw.write_bits(code, width)?;
            if next_code < MAX_CODE_SPACE {
                dict.insert(wc, next_code);
                next_code += 1;
                grow_width(next_code - 1, &mut width);
            } else {
                bw.write_bits(CLEAR, width)?;
                dict.clear();
                next_code = FIRST_CODE;
                width = MIN_WIDTH;
            }
            w = vec![c];
        }
        if !w.is_empty() {
            let code = code_for(&dict, &w);
            bw.write_bits(code, width)?;
        }
        bw.write_bits(END, width)?;
        bw.flush_bits()?;
        Ok(())
    }

    fn decompress(
        &self,
        input: &[u8],
        max_output_bytes: u64,
        output: &mut Vec<u8>,
    ) -> Result<(), CompressionError> {
        let mut br = BitReader::new(input);
        let mut bounded = BoundedBuf::new(output, max_output_bytes);

        // Indices 0..255 are the byte-seeded literals; 256 and 257 are
        // unused placeholders so that a dictionary index always equals its
        // code (CLEAR/END are intercepted above before this vec is
        // touched, but `Vec::push` must still land new entries at 258).
        let mut dict: Vec<Vec<u8>> = (0u16..=255)
            .map(|b| vec![b as u8])
            .chain([Vec::new(), Vec::new()])
            .collect();
        let mut next_code = FIRST_CODE;
        let mut width = MIN_WIDTH;
        let mut prev: Option<Vec<u8>> = None;

        loop {
            let code = br.read_bits(width);
            if code == CLEAR {
                dict.truncate(FIRST_CODE as usize);
                next_code = FIRST_CODE;
                width = MIN_WIDTH;
                prev = None;
                continue;
            }
            if code == END {
                break;
            }
            let entry = if (code as usize) < dict.len() {
                dict[code as usize].clone()
            } else if code == next_code {
                match &prev {
                    Some(p) => {
                        let mut e = p.clone();
                        e.push(p[0]);
                        e
                    }
                    None => {
                        return Err(CompressionError::CorruptStream(
                            "LZW code references empty prefix".into(),
                        ))
                    }
                }
            } else {
                return Err(CompressionError::CorruptStream(
                    "LZW code out of range".into(),
                ));
            };

            bounded.extend(&entry)?;

            if let Some(p) = &prev {
                if next_code < MAX_CODE_SPACE {
                    let mut new_entry = p.clone();
                    new_entry.push(entry[0]);
                    dict.push(new_entry);
                    next_code += 1;
                    grow_width(next_code - 1, &mut width);
                }
            }
            prev = Some(entry);
        }
        Ok(())
    }
}

fn code_for(dict: &HashMap<Vec<u8>, u32>, w: &[u8]) -> u32 {
    if w.len() == 1 {
        w[0] as u32
    } else {
        dict[w]
    }
}
