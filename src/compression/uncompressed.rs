//! Handler for uncompressed data

use crate::tiff::constants::compression;
use crate::tiff::errors::TiffResult;
use super::handler::CompressionHandler;

/// Uncompressed data handler (compression code 1)
///
/// Strips pass through unchanged apart from being cut or zero-filled to the
/// expected length.
pub struct UncompressedHandler;

impl CompressionHandler for UncompressedHandler {
    fn decompress(&self, data: &[u8], expected_len: usize) -> TiffResult<Vec<u8>> {
        let mut output = data.to_vec();
        output.resize(expected_len, 0);
        Ok(output)
    }

    fn compress(&self, data: &[u8]) -> TiffResult<Vec<u8>> {
        Ok(data.to_vec())
    }

    fn name(&self) -> &'static str {
        "Uncompressed"
    }

    fn code(&self) -> u16 {
        compression::NONE
    }
}
