//! PackBits run-length codec (compression code 32773)

use crate::tiff::constants::compression;
use crate::tiff::errors::{TiffError, TiffResult};
use super::handler::CompressionHandler;

const MAX_RUN: usize = 128;

/// Expands a PackBits stream, stopping once `expected_len` bytes exist
///
/// Literal and replicate runs that would overshoot are cut short. A header
/// of -128 is a no-op.
pub fn decompress_packbits(data: &[u8], expected_len: usize) -> TiffResult<Vec<u8>> {
    let mut output = Vec::with_capacity(expected_len);
    let mut pos = 0;

    while output.len() < expected_len {
        let header = *data.get(pos).ok_or_else(|| {
            TiffError::CompressionError(format!(
                "PackBits: stream ended after {} of {} bytes",
                output.len(),
                expected_len
            ))
        })? as i8;
        pos += 1;

        let remaining = expected_len - output.len();
        if header >= 0 {
            let count = header as usize + 1;
            let literal = data.get(pos..pos + count).ok_or_else(|| {
                TiffError::CompressionError("PackBits: truncated literal run".to_string())
            })?;
            output.extend_from_slice(&literal[..count.min(remaining)]);
            pos += count;
        } else if header != -128 {
            let count = 1 + (-(header as i16)) as usize;
            let value = *data.get(pos).ok_or_else(|| {
                TiffError::CompressionError("PackBits: truncated replicate run".to_string())
            })?;
            pos += 1;
            output.resize(output.len() + count.min(remaining), value);
        }
    }

    Ok(output)
}

/// Encodes a buffer as PackBits runs of at most 128 bytes
pub fn compress_packbits(data: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(data.len() + data.len() / MAX_RUN + 1);
    let mut pos = 0;

    while pos < data.len() {
        let mut run = 1;
        while pos + run < data.len() && run < MAX_RUN && data[pos + run] == data[pos] {
            run += 1;
        }

        if run > 1 {
            // 1 - run fits in -127..=-1
            output.push((1 - run as i16) as i8 as u8);
            output.push(data[pos]);
            pos += run;
            continue;
        }

        let start = pos;
        pos += 1;
        while pos < data.len() && pos - start < MAX_RUN {
            if pos + 1 < data.len() && data[pos] == data[pos + 1] {
                break;
            }
            pos += 1;
        }
        output.push((pos - start - 1) as u8);
        output.extend_from_slice(&data[start..pos]);
    }

    output
}

/// PackBits compression handler (compression code 32773)
pub struct PackBitsHandler;

impl CompressionHandler for PackBitsHandler {
    fn decompress(&self, data: &[u8], expected_len: usize) -> TiffResult<Vec<u8>> {
        decompress_packbits(data, expected_len)
    }

    fn compress(&self, data: &[u8]) -> TiffResult<Vec<u8>> {
        Ok(compress_packbits(data))
    }

    fn name(&self) -> &'static str {
        "PackBits"
    }

    fn code(&self) -> u16 {
        compression::PACKBITS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_reference_stream() {
        // Sample stream from the TIFF 6.0 specification
        let packed = [
            0xFE, 0xAA, 0x02, 0x80, 0x00, 0x2A, 0xFD, 0xAA, 0x03, 0x80, 0x00, 0x2A, 0x22, 0xF7, 0xAA,
        ];
        let expected = [
            0xAA, 0xAA, 0xAA, 0x80, 0x00, 0x2A, 0xAA, 0xAA, 0xAA, 0xAA, 0x80, 0x00, 0x2A, 0x22, 0xAA,
            0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA,
        ];
        assert_eq!(decompress_packbits(&packed, expected.len()).unwrap(), expected);
    }

    #[test]
    fn test_mixed_runs() {
        let data = vec![1, 1, 1, 1, 2, 3, 4, 5, 5, 5, 5, 5, 5];
        let packed = compress_packbits(&data);
        assert_eq!(decompress_packbits(&packed, data.len()).unwrap(), data);
    }

    #[test]
    fn test_long_run_splits_at_128() {
        let data = vec![42u8; 300];
        let packed = compress_packbits(&data);
        // 128 + 128 + 44
        assert_eq!(packed.len(), 6);
        assert_eq!(packed[0], 0x81);
        assert_eq!(decompress_packbits(&packed, data.len()).unwrap(), data);
    }

    #[test]
    fn test_long_literal_splits_at_128() {
        let data: Vec<u8> = (0..200u32).map(|i| (i % 251) as u8).collect();
        let packed = compress_packbits(&data);
        assert_eq!(packed[0], 127);
        assert_eq!(decompress_packbits(&packed, data.len()).unwrap(), data);
    }

    #[test]
    fn test_output_clamped_to_expected_length() {
        // Replicate 10, then a literal of 3
        let packed = [0xF7, 7, 0x02, 1, 2, 3];
        assert_eq!(decompress_packbits(&packed, 4).unwrap(), vec![7, 7, 7, 7]);
        assert_eq!(decompress_packbits(&packed, 12).unwrap().len(), 12);
    }

    #[test]
    fn test_noop_header_is_skipped() {
        let packed = [0x80, 0x00, 9];
        assert_eq!(decompress_packbits(&packed, 1).unwrap(), vec![9]);
    }

    #[test]
    fn test_truncated_stream_is_an_error() {
        assert!(decompress_packbits(&[0x05, 1, 2], 6).is_err());
        assert!(decompress_packbits(&[], 1).is_err());
    }
}
