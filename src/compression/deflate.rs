//! Deflate handler (compression codes 8 and 32946)
//!
//! Strips are framed like a zlib stream: a two-byte header chosen by the
//! compression level, the raw deflate body, then the Adler32 of the
//! uncompressed input in big-endian order. Decoding skips the header and
//! inflates exactly the expected number of bytes; the trailer is not checked.

use std::io::{Read, Write};

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use log::trace;

use crate::tiff::constants::compression;
use crate::tiff::errors::{TiffError, TiffResult};
use super::checksum::adler32;
use super::handler::CompressionHandler;
use super::CompressionLevel;

const HEADER_LEN: usize = 2;

/// Header word written before the deflate body, little-endian
pub fn deflate_header(level: CompressionLevel) -> u16 {
    match level {
        CompressionLevel::Fastest => 0x1C78,
        CompressionLevel::Optimal => 0x9C78,
        CompressionLevel::NoCompression => 0x0178,
    }
}

fn flate_level(level: CompressionLevel) -> Compression {
    match level {
        CompressionLevel::Optimal => Compression::best(),
        CompressionLevel::Fastest => Compression::fast(),
        CompressionLevel::NoCompression => Compression::none(),
    }
}

/// Deflate compression handler
pub struct DeflateHandler {
    level: CompressionLevel,
    code: u16,
}

impl DeflateHandler {
    pub fn new(level: CompressionLevel) -> Self {
        DeflateHandler {
            level,
            code: compression::DEFLATE,
        }
    }

    /// Handler reporting the obsolete code 32946 (same stream format)
    pub fn legacy(level: CompressionLevel) -> Self {
        DeflateHandler {
            level,
            code: compression::DEFLATE_OLD,
        }
    }

    pub fn level(&self) -> CompressionLevel {
        self.level
    }
}

impl Default for DeflateHandler {
    fn default() -> Self {
        DeflateHandler::new(CompressionLevel::Optimal)
    }
}

impl CompressionHandler for DeflateHandler {
    fn decompress(&self, data: &[u8], expected_len: usize) -> TiffResult<Vec<u8>> {
        let body = data.get(HEADER_LEN..).ok_or_else(|| {
            TiffError::CompressionError("Deflate: strip shorter than its header".to_string())
        })?;

        let mut output = Vec::with_capacity(expected_len);
        DeflateDecoder::new(body)
            .take(expected_len as u64)
            .read_to_end(&mut output)
            .map_err(|e| TiffError::CompressionError(format!("Deflate: {}", e)))?;

        trace!("Inflated {} bytes into {} (expected {})", data.len(), output.len(), expected_len);
        output.resize(expected_len, 0);
        Ok(output)
    }

    fn compress(&self, data: &[u8]) -> TiffResult<Vec<u8>> {
        let mut framed = Vec::with_capacity(data.len() / 2 + 16);
        framed.write_u16::<LittleEndian>(deflate_header(self.level))?;

        let mut encoder = DeflateEncoder::new(framed, flate_level(self.level));
        encoder.write_all(data)?;
        let mut framed = encoder.finish()?;

        framed.write_u32::<BigEndian>(adler32(data))?;
        Ok(framed)
    }

    fn name(&self) -> &'static str {
        "Deflate"
    }

    fn code(&self) -> u16 {
        self.code
    }
}
