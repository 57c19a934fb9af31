//! Custom error types for TIFF and STK processing

use std::fmt;
use std::io;

/// TIFF-specific error types
#[derive(Debug)]
pub enum TiffError {
    /// I/O error
    IoError(io::Error),
    /// Bad signature, bad magic number or unusable first IFD offset
    NotATiffFile(String),
    /// Invalid byte order marker
    InvalidByteOrder(u16),
    /// Unknown field type id
    UnsupportedType(u16),
    /// Unsupported compression method
    UnsupportedCompression(u16),
    /// Bits per sample other than 8, 16 or 32
    UnsupportedBitDepth(u16),
    /// Image description is unusable for reading pixels
    InvalidImageInfo(String),
    /// STK-required tags absent or undecodable
    CorruptedStackFile(String),
    /// Tag not found
    TagNotFound(u16),
    /// Tags required for the image kind are missing
    MissingRequiredTags(Vec<u16>),
    /// Dimensions, plane count or data type rejected by a writer
    InvalidImageParameters(String),
    /// Two-pass IFD layout did not match the stream position
    OffsetCalculationFailed { expected: u64, actual: u64 },
    /// STK per-plane metadata is malformed
    InvalidMetadata(String),
    /// Codec failed on strip data
    CompressionError(String),
    /// Image or plane index out of range
    ImageIndexOutOfRange { index: usize, count: usize },
    /// Julian day or milliseconds could not be converted to a date
    DateConversion(String),
    /// Generic error with message
    GenericError(String),
}

impl fmt::Display for TiffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TiffError::IoError(e) => write!(f, "I/O error: {}", e),
            TiffError::NotATiffFile(msg) => write!(f, "Not a TIFF file: {}", msg),
            TiffError::InvalidByteOrder(v) => write!(f, "Invalid byte order marker: {:#06x}", v),
            TiffError::UnsupportedType(t) => write!(f, "Unsupported field type: {}", t),
            TiffError::UnsupportedCompression(c) => write!(f, "Unsupported compression method: {}", c),
            TiffError::UnsupportedBitDepth(b) => write!(f, "Unsupported bit depth: {}", b),
            TiffError::InvalidImageInfo(msg) => write!(f, "Invalid image info: {}", msg),
            TiffError::CorruptedStackFile(msg) => write!(f, "Corrupted stack file: {}", msg),
            TiffError::TagNotFound(tag) => write!(f, "Tag not found: {}", tag),
            TiffError::MissingRequiredTags(tags) => write!(f, "Missing required tags: {:?}", tags),
            TiffError::InvalidImageParameters(msg) => write!(f, "Invalid image parameters: {}", msg),
            TiffError::OffsetCalculationFailed { expected, actual } => write!(
                f,
                "Offset calculation failed: expected position {}, stream at {}",
                expected, actual
            ),
            TiffError::InvalidMetadata(msg) => write!(f, "Invalid metadata: {}", msg),
            TiffError::CompressionError(msg) => write!(f, "Compression error: {}", msg),
            TiffError::ImageIndexOutOfRange { index, count } => {
                write!(f, "Image index {} out of range ({} available)", index, count)
            }
            TiffError::DateConversion(msg) => write!(f, "Date conversion failed: {}", msg),
            TiffError::GenericError(msg) => write!(f, "TIFF error: {}", msg),
        }
    }
}

impl std::error::Error for TiffError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TiffError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for TiffError {
    fn from(error: io::Error) -> Self {
        TiffError::IoError(error)
    }
}

/// Result type for TIFF operations
pub type TiffResult<T> = Result<T, TiffError>;

impl From<String> for TiffError {
    fn from(msg: String) -> Self {
        TiffError::GenericError(msg)
    }
}
