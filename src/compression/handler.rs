//! Compression handler trait definition

use crate::tiff::errors::TiffResult;

/// Strategy trait for handling different compression methods
pub trait CompressionHandler: Send + Sync {
    /// Decompress one strip into exactly `expected_len` bytes
    fn decompress(&self, data: &[u8], expected_len: usize) -> TiffResult<Vec<u8>>;

    /// Compress one strip
    fn compress(&self, data: &[u8]) -> TiffResult<Vec<u8>>;

    /// Get the name of this compression method
    fn name(&self) -> &'static str;

    /// Get the compression code written to the Compression tag
    fn code(&self) -> u16;
}
