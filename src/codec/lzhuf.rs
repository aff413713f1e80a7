//! LZHUF: an LZSS front end (4 KiB window, 3..18 match, 512-position
//! brute-force search) whose literal bytes and match tokens are entropy
//! coded by a single adaptive Huffman coder per entry.
//!
//! Tree construction uses a linear scan over the small active-node list
//! (≤511 nodes) with a deterministic tie-break: the lowest-weight node,
//! and on a weight tie the one that appears earliest in the active list,
//! is picked first. See DESIGN.md for why this was chosen over a bubble
//! sort or a priority queue.
//!
//! Symbol alphabet is 256 wide: 0..=253 are literal byte values, 254 is
//! the end-of-stream marker, 255 introduces either a match token (12-bit
//! distance + 4-bit length-minus-3) or, when the 12-bit distance field is
//! the otherwise-unused value 0, an escaped literal for the two byte
//! values (254, 255) the 0..=253 literal range cannot reach directly —
//! see DESIGN.md for why 256 symbols are not enough to cover literal
//! bytes *and* the two markers without this escape.

use crate::bitio::{BitReader, BitWriter};
use crate::error::CompressionError;

use super::{BoundedBuf, Codec};

const WINDOW: usize = 4096;
const MIN_MATCH: usize = 3;
const MAX_MATCH: usize = 18;
const SEARCH_LIMIT: usize = 512;
const EOS: usize = 254;
const MARKER: usize = 255;
const REBUILD_INTERVAL: u32 = 4096;
const ALPHABET: usize = 256;

struct Node {
    weight: u32,
    left: Option<usize>,
    right: Option<usize>,
}

/// Per-entry adaptive Huffman model shared between the literal/match
/// symbol stream's encoder and decoder.
struct AdaptiveModel {
    freq: [u32; ALPHABET],
    count: u32,
    nodes: Vec<Node>,
    root: usize,
    codes: [(u32, u8); ALPHABET],
}

impl AdaptiveModel {
    fn new() -> Self {
        let mut model = Self {
            freq: [1; ALPHABET],
            count: 0,
            nodes: Vec::new(),
            root: 0,
            codes: [(0, 0); ALPHABET],
        };
        model.rebuild();
        model
    }

    fn rebuild(&mut self) {
        let mut nodes = Vec::with_capacity(ALPHABET * 2 - 1);
        let mut active: Vec<usize> = Vec::with_capacity(ALPHABET);
        for sym in 0..ALPHABET {
            nodes.push(Node {
                weight: self.freq[sym],
                left: None,
                right: None,
            });
            active.push(sym);
        }
        while active.len() > 1 {
            let i1 = Self::pop_min(&mut active, &nodes);
            let i2 = Self::pop_min(&mut active, &nodes);
            let weight = nodes[i1].weight + nodes[i2].weight;
            let new_idx = nodes.len();
            nodes.push(Node {
                weight,
                left: Some(i1),
                right: Some(i2),
            });
            active.push(new_idx);
        }
        self.root = active[0];
        self.nodes = nodes;
        self.codes = [(0, 0); ALPHABET];
        Self::assign_codes(&self.nodes, self.root, 0, 0, &mut self.codes);
    }

    /// Removes and returns the index (into `active`) of the lowest-weight
    /// node, breaking ties by earliest position in `active`.
    fn pop_min(active: &mut Vec<usize>, nodes: &[Node]) -> usize {
        let mut best_pos = 0;
        let mut best_weight = nodes[active[0]].weight;
        for (pos, &idx) in active.iter().enumerate().skip(1) {
            if nodes[idx].weight < best_weight {
                best_weight = nodes[idx].weight;
                best_pos = pos;
            }
        }
        active.remove(best_pos)
    }

    fn assign_codes(
        nodes: &[Node],
        idx: usize,
        code: u32,
        len: u8,
        out: &mut [(u32, u8); ALPHABET],
    ) {
        match (nodes[idx].left, nodes[idx].right) {
            (None, None) => {
                if idx < ALPHABET {
                    out[idx] = (code, len.max(1));
                }
            }
            (Some(l), Some(r)) => {
                Self::assign_codes(nodes, l, code << 1, len + 1, out);
                Self::assign_codes(nodes, r, (code << 1) | 1, len + 1, out);
            }
            _ => unreachable!("huffman tree nodes are always 0 or 2 children"),
        }
    }

    fn encode<W: std::io::Write>(
        &self,
        symbol: usize,
        bw: &mut BitWriter<W>,
    ) -> Result<(), CompressionError> {
        let (code, len) = self.codes[symbol];
        bw.write_bits(code, len)?;
        Ok(())
    }

    fn decode<R: std::io::Read>(&self, br: &mut BitReader<R>) -> usize {
        let mut idx = self.root;
        loop {
            match (self.nodes[idx].left, self.nodes[idx].right) {
                (None, None) => return idx,
                (Some(l), Some(r)) => {
                    idx = if br.read_bit() { r } else { l };
                }
                _ => unreachable!(),
            }
        }
    }

    /// Symbols other than EOS/MARKER bump their frequency and the running
    /// count, rebuilding the tree every
    /// `REBUILD_INTERVAL` literal symbols. Rebuild happens *after* the
    /// symbol that crosses the threshold has already been coded with the
    /// pre-update tree, on both the encode and decode side.
    fn update(&mut self, symbol: usize) {
        if symbol == EOS || symbol == MARKER {
            return;
        }
        self.freq[symbol] += 1;
        self.count += 1;
        if self.count % REBUILD_INTERVAL == 0 {
            self.rebuild();
        }
    }
}

/// Longest match (distance, length) within the last `min(pos, SEARCH_LIMIT)`
/// positions, brute force, nearest-candidate-wins on a length tie.
fn find_match(input: &[u8], pos: usize) -> Option<(usize, usize)> {
    let max_len = (input.len() - pos).min(MAX_MATCH);
    if max_len < MIN_MATCH {
        return None;
    }
    let window_start = pos.saturating_sub(WINDOW.min(SEARCH_LIMIT));
    let scan_start = pos.saturating_sub(SEARCH_LIMIT).max(window_start);

    let mut best_len = 0;
    let mut best_dist = 0;
    for cand in (scan_start..pos).rev() {
        let mut len = 0;
        while len < max_len && input[cand + len] == input[pos + len] {
            len += 1;
        }
        if len > best_len {
            best_len = len;
            best_dist = pos - cand;
        }
    }
    if best_len >= MIN_MATCH {
        Some((best_dist, best_len))
    } else {
        None
    }
}

pub struct LzhufCodec;

impl Codec for LzhufCodec {
    fn compress(&self, input: &[u8], _level: u8, output: &mut Vec<u8>) -> Result<(), CompressionError> {
        let mut model = AdaptiveModel::new();
        let mut bw = BitWriter::new(output);
        let mut pos = 0;
        while pos < input.len() {
            if let Some((dist, len)) = find_match(input, pos) {
                model.encode(MARKER, &mut bw)?;
                bw.write_bits(dist as u32, 12)?;
                bw.write_bits((len - MIN_MATCH) as u32, 4)?;
                model.update(MARKER);
                pos += len;
            } else {
                let byte = input[pos];
                if (byte as usize) < EOS {
                    model.encode(byte as usize, &mut bw)?;
                    model.update(byte as usize);
                } else {
                    // byte is 254 or 255: escape through the marker symbol
                    // with the otherwise-impossible distance field 0.
                    model.encode(MARKER, &mut bw)?;
                    bw.write_bits(0, 12)?;
                    bw.write_bits((byte as u32) - (EOS as u32), 4)?;
                    model.update(MARKER);
                }
                pos += 1;
            }
        }
        model.encode(EOS, &mut bw)?;
        model.update(EOS);
        bw.flush_bits()?;
        Ok(())
    }

    fn decompress(
        &self,
        input: &[u8],
        max_output_bytes: u64,
        output: &mut Vec<u8>,
    ) -> Result<(), CompressionError> {
        let mut model = AdaptiveModel::new();
        let mut br = BitReader::new(input);
        let mut bounded = BoundedBuf::new(output, max_output_bytes);
        loop {
            let symbol = model.decode(&mut br);
            if symbol == EOS {
                model.update(EOS);
                break;
            }
            if symbol == MARKER {
                let dist = br.read_bits(12) as usize;
                let len_field = br.read_bits(4) as usize;
                if dist == 0 {
                    bounded.push((EOS + len_field) as u8)?;
                } else {
                    if dist > bounded.len() {
                        return Err(CompressionError::CorruptStream(
                            "LZHUF match distance out of range".into(),
                        ));
                    }
                    let length = len_field + MIN_MATCH;
                    let mut src = bounded.len() - dist;
                    for _ in 0..length {
                        let b = bounded.byte_at(src);
                        bounded.push(b)?;
                        src += 1;
                    }
                }
                model.update(MARKER);
            } else {
                bounded.push(symbol as u8)?;
                model.update(symbol);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{round_trip, CompressionMethod};

    #[test]
    fn round_trips_text_with_repeats() {
        let data = b"she sells sea shells by the sea shore".repeat(100);
        let out = round_trip(CompressionMethod::Lzhuf, 0, &data);
        assert_eq!(out, data);
    }

    #[test]
    fn round_trips_bytes_254_and_255() {
        let data = vec![253u8, 254, 255, 254, 254, 255, 0, 1];
        let out = round_trip(CompressionMethod::Lzhuf, 0, &data);
        assert_eq!(out, data);
    }

    #[test]
    fn round_trips_past_one_rebuild_cycle() {
        let mut data = Vec::new();
        for i in 0..9000u32 {
            data.push((i % 250) as u8);
        }
        let out = round_trip(CompressionMethod::Lzhuf, 0, &data);
        assert_eq!(out, data);
    }

    #[test]
    fn empty_input_round_trips() {
        let out = round_trip(CompressionMethod::Lzhuf, 0, &[]);
        assert!(out.is_empty());
    }
}
