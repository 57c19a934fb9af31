//! LZW codec (compression code 5)
//!
//! TIFF-flavoured LZW: codes are packed MSB-first, every stream starts with
//! a CLEAR code and ends with END_OF_STREAM, and code width grows from 9 to
//! 12 bits. The decoder widens one code early, when the table reaches
//! `code_size - 1` entries, which is what the encoder's growth rule expects.

use std::collections::HashMap;

use crate::tiff::constants::compression;
use crate::tiff::errors::{TiffError, TiffResult};
use super::handler::CompressionHandler;

const CLEAR_CODE: u16 = 256;
const END_OF_STREAM: u16 = 257;
const MAX_TABLE: usize = 4096;
const MIN_CODE_LEN: u32 = 9;
const MAX_CODE_LEN: u32 = 12;

/// Accumulates variable-width codes, most significant bit first
struct BitWriter {
    output: Vec<u8>,
    buffer: u32,
    bits: u32,
}

impl BitWriter {
    fn with_capacity(capacity: usize) -> Self {
        BitWriter {
            output: Vec::with_capacity(capacity),
            buffer: 0,
            bits: 0,
        }
    }

    fn write(&mut self, code: u16, len: u32) {
        self.buffer = (self.buffer << len) | code as u32;
        self.bits += len;
        while self.bits >= 8 {
            self.bits -= 8;
            self.output.push((self.buffer >> self.bits) as u8);
        }
        self.buffer &= (1 << self.bits) - 1;
    }

    /// Flushes the partial byte, zero-padded on the right
    fn finish(mut self) -> Vec<u8> {
        if self.bits > 0 {
            self.output.push((self.buffer << (8 - self.bits)) as u8);
        }
        self.output
    }
}

struct BitReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BitReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        BitReader { data, position: 0 }
    }

    fn read(&mut self, len: u32) -> Option<u16> {
        let len = len as usize;
        if self.position + len > self.data.len() * 8 {
            return None;
        }

        let mut code: u32 = 0;
        for _ in 0..len {
            let byte = self.data[self.position / 8];
            let bit = (byte >> (7 - self.position % 8)) & 1;
            code = (code << 1) | bit as u32;
            self.position += 1;
        }
        Some(code as u16)
    }
}

/// Encoder state for one call; the table is never shared
struct LzwEncoder {
    dictionary: HashMap<Vec<u8>, u16>,
    code_len: u32,
    code_size: usize,
}

impl LzwEncoder {
    fn new() -> Self {
        let mut encoder = LzwEncoder {
            dictionary: HashMap::with_capacity(MAX_TABLE),
            code_len: MIN_CODE_LEN,
            code_size: 1 << MIN_CODE_LEN,
        };
        encoder.reset();
        encoder
    }

    fn reset(&mut self) {
        self.dictionary.clear();
        for i in 0..256u16 {
            self.dictionary.insert(vec![i as u8], i);
        }
        self.code_len = MIN_CODE_LEN;
        self.code_size = 1 << MIN_CODE_LEN;
    }

    /// Table size including the two control codes
    fn table_len(&self) -> usize {
        self.dictionary.len() + 2
    }

    fn encode(mut self, input: &[u8]) -> Vec<u8> {
        let mut bits = BitWriter::with_capacity(input.len() / 2 + 4);
        bits.write(CLEAR_CODE, self.code_len);

        if input.is_empty() {
            bits.write(END_OF_STREAM, self.code_len);
            return bits.finish();
        }

        let mut current: Vec<u8> = vec![input[0]];
        for &byte in &input[1..] {
            current.push(byte);
            if self.dictionary.contains_key(&current) {
                continue;
            }

            let extended = current.clone();
            current.pop();
            bits.write(self.dictionary[&current], self.code_len);

            let next_code = self.table_len() as u16;
            self.dictionary.insert(extended, next_code);
            current.clear();
            current.push(byte);

            let size = self.table_len();
            if size == self.code_size - 1 && self.code_size == MAX_TABLE {
                bits.write(CLEAR_CODE, self.code_len);
                self.reset();
            } else if size == self.code_size {
                self.code_len += 1;
                self.code_size *= 2;
            }
        }

        bits.write(self.dictionary[&current], self.code_len);
        // The decoder's table matches ours once it has read the final code,
        // and it widens at `code_size - 1` entries
        if self.table_len() == self.code_size - 1 && self.code_len < MAX_CODE_LEN {
            self.code_len += 1;
        }
        bits.write(END_OF_STREAM, self.code_len);
        bits.finish()
    }
}

/// Decoder state for one call
struct LzwDecoder {
    table: Vec<Vec<u8>>,
    code_len: u32,
    code_size: usize,
}

impl LzwDecoder {
    fn new() -> Self {
        let mut decoder = LzwDecoder {
            table: Vec::with_capacity(MAX_TABLE),
            code_len: MIN_CODE_LEN,
            code_size: 1 << MIN_CODE_LEN,
        };
        decoder.reset();
        decoder
    }

    fn reset(&mut self) {
        self.table.clear();
        for i in 0..256u16 {
            self.table.push(vec![i as u8]);
        }
        // CLEAR and END_OF_STREAM occupy 256 and 257
        self.table.push(Vec::new());
        self.table.push(Vec::new());
        self.code_len = MIN_CODE_LEN;
        self.code_size = 1 << MIN_CODE_LEN;
    }

    fn add_entry(&mut self, entry: Vec<u8>) {
        if self.table.len() < MAX_TABLE {
            self.table.push(entry);
        }
        if self.table.len() == self.code_size - 1 && self.code_len < MAX_CODE_LEN {
            self.code_len += 1;
            self.code_size *= 2;
        }
    }

    fn decode(mut self, data: &[u8], expected_len: usize) -> TiffResult<Vec<u8>> {
        let mut output = Vec::with_capacity(expected_len);
        let mut bits = BitReader::new(data);
        let mut previous: Option<u16> = None;

        while let Some(code) = bits.read(self.code_len) {
            if code == CLEAR_CODE {
                self.reset();
                previous = None;
                continue;
            }
            if code == END_OF_STREAM {
                break;
            }

            let Some(prev) = previous else {
                let entry = self.table.get(code as usize).filter(|e| !e.is_empty()).ok_or_else(|| {
                    TiffError::CompressionError(format!("LZW: invalid first code {}", code))
                })?;
                output.extend_from_slice(entry);
                previous = Some(code);
                continue;
            };

            let code_index = code as usize;
            let entry = if code_index < self.table.len() {
                let entry = self.table[code_index].clone();
                let mut added = self.table[prev as usize].clone();
                added.push(entry[0]);
                self.add_entry(added);
                entry
            } else if code_index == self.table.len() {
                let mut entry = self.table[prev as usize].clone();
                let first = *entry.first().ok_or_else(|| {
                    TiffError::CompressionError("LZW: empty previous entry".to_string())
                })?;
                entry.push(first);
                self.add_entry(entry.clone());
                entry
            } else {
                return Err(TiffError::CompressionError(format!(
                    "LZW: code {} out of range (table has {} entries)",
                    code,
                    self.table.len()
                )));
            };

            output.extend_from_slice(&entry);
            previous = Some(code);

            if output.len() >= expected_len {
                break;
            }
        }

        output.resize(expected_len, 0);
        Ok(output)
    }
}

/// Compress a buffer into a complete LZW stream
pub fn compress_lzw(data: &[u8]) -> Vec<u8> {
    LzwEncoder::new().encode(data)
}

/// Decompress an LZW stream into exactly `expected_len` bytes
pub fn decompress_lzw(data: &[u8], expected_len: usize) -> TiffResult<Vec<u8>> {
    LzwDecoder::new().decode(data, expected_len)
}

/// LZW compression handler (compression code 5)
pub struct LzwHandler;

impl CompressionHandler for LzwHandler {
    fn decompress(&self, data: &[u8], expected_len: usize) -> TiffResult<Vec<u8>> {
        decompress_lzw(data, expected_len)
    }

    fn compress(&self, data: &[u8]) -> TiffResult<Vec<u8>> {
        Ok(compress_lzw(data))
    }

    fn name(&self) -> &'static str {
        "LZW"
    }

    fn code(&self) -> u16 {
        compression::LZW
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(data: &[u8]) {
        let encoded = compress_lzw(data);
        let decoded = decompress_lzw(&encoded, data.len()).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_empty_buffer() {
        let encoded = compress_lzw(&[]);
        // CLEAR and END_OF_STREAM at 9 bits each
        assert_eq!(encoded.len(), 3);
        assert!(decompress_lzw(&encoded, 0).unwrap().is_empty());
    }

    #[test]
    fn test_stream_starts_with_clear_code() {
        let encoded = compress_lzw(b"abc");
        // 256 in 9 bits MSB-first is 1000_0000 0...
        assert_eq!(encoded[0], 0x80);
    }

    #[test]
    fn test_all_zero_buffer() {
        round_trip(&vec![0u8; 10_000]);
    }

    #[test]
    fn test_single_byte() {
        round_trip(&[42]);
    }

    #[test]
    fn test_table_growth_past_4096_entries() {
        // Every pair of distinct bytes forces a new table entry
        let mut data = Vec::new();
        for a in 0..=255u8 {
            for b in (0..=255u8).step_by(7) {
                data.push(a);
                data.push(b);
            }
        }
        assert!(data.len() > 2 * 4096);
        round_trip(&data);
    }

    #[test]
    fn test_pseudo_random_buffer() {
        let mut state: u32 = 0x1234_5678;
        let data: Vec<u8> = (0..50_000)
            .map(|_| {
                state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                (state >> 16) as u8
            })
            .collect();
        round_trip(&data);
    }

    #[test]
    fn test_repetitive_data_compresses() {
        let data: Vec<u8> = b"ABCABCABCABC".iter().cycle().take(4000).copied().collect();
        let encoded = compress_lzw(&data);
        assert!(encoded.len() < data.len() / 4);
        round_trip(&data);
    }

    #[test]
    fn test_output_is_clamped_to_expected_length() {
        let encoded = compress_lzw(&[1, 2, 3, 4, 5, 6]);
        assert_eq!(decompress_lzw(&encoded, 4).unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(decompress_lzw(&encoded, 8).unwrap(), vec![1, 2, 3, 4, 5, 6, 0, 0]);
    }

    #[test]
    fn test_end_of_stream_width_at_every_length() {
        let mut state: u32 = 0x9e37_79b9;
        let data: Vec<u8> = (0..1200)
            .map(|_| {
                state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                (state >> 16) as u8
            })
            .collect();

        // A longer expected length makes the decoder run into END_OF_STREAM
        for len in 1..=data.len() {
            let encoded = compress_lzw(&data[..len]);
            let decoded = decompress_lzw(&encoded, len + 4).unwrap();
            assert_eq!(&decoded[..len], &data[..len], "length {}", len);
            assert_eq!(&decoded[len..], &[0, 0, 0, 0], "length {}", len);
        }
    }

    #[test]
    fn test_out_of_range_code_is_rejected() {
        let mut bits = BitWriter::with_capacity(8);
        bits.write(CLEAR_CODE, 9);
        bits.write(65, 9);
        bits.write(400, 9);
        let stream = bits.finish();
        assert!(decompress_lzw(&stream, 4).is_err());
    }
}
