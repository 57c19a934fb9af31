//! Tag schemas and extension codecs
//!
//! A schema decides which tags the generic directory reader leaves
//! undecoded so that a format extension can parse them itself. The write
//! side mirrors this: an `ExtensionEncoder` supplies the records and
//! out-of-line blocks for the tags it owns once their file offset is known.

use crate::tiff::errors::TiffResult;
use crate::tiff::types::TiffType;

/// Set of tags a file format reads through its own codec
pub trait TagSchema: Send + Sync {
    /// Short name shown in logs
    fn name(&self) -> &'static str;

    /// Whether the tag's raw record should be kept instead of decoded
    fn is_extension_tag(&self, tag: u16) -> bool;
}

/// Plain TIFF: every tag is decoded generically
#[derive(Debug, Default, Clone, Copy)]
pub struct BaseSchema;

impl TagSchema for BaseSchema {
    fn name(&self) -> &'static str {
        "TIFF"
    }

    fn is_extension_tag(&self, _tag: u16) -> bool {
        false
    }
}

/// Directory record plus the block an extension tag points at
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedExtension {
    pub field_type: TiffType,
    pub count: u32,
    /// Value stored in the 4-byte slot of the directory record
    pub slot: u32,
    /// Bytes written at the base offset handed to the encoder
    pub data: Vec<u8>,
}

/// Writes the tags a schema claims, in little-endian order
pub trait ExtensionEncoder {
    /// Tags to emit for the current image, in block order
    fn extension_tags(&self) -> Vec<u16>;

    /// Encodes one tag whose block will start at `base`
    fn encode(&self, tag: u16, base: u64) -> TiffResult<EncodedExtension>;
}

/// Encoder with nothing to add, used for plain TIFF images
#[derive(Debug, Default, Clone, Copy)]
pub struct NoExtensions;

impl ExtensionEncoder for NoExtensions {
    fn extension_tags(&self) -> Vec<u16> {
        Vec::new()
    }

    fn encode(&self, tag: u16, _base: u64) -> TiffResult<EncodedExtension> {
        Err(crate::tiff::errors::TiffError::TagNotFound(tag))
    }
}
