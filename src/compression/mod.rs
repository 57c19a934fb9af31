//! Compression handling for TIFF strips
//!
//! Each supported scheme is a `CompressionHandler`; `CompressionFactory`
//! maps Compression tag values and user-facing names onto handlers.

mod handler;
mod uncompressed;
mod lzw;
mod packbits;
mod deflate;
mod factory;
pub mod checksum;
pub mod predictor;

use std::fmt;

use crate::tiff::constants::compression;

pub use handler::CompressionHandler;
pub use uncompressed::UncompressedHandler;
pub use lzw::{compress_lzw, decompress_lzw, LzwHandler};
pub use packbits::{compress_packbits, decompress_packbits, PackBitsHandler};
pub use deflate::{deflate_header, DeflateHandler};
pub use factory::CompressionFactory;

/// Compression schemes the writers can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Uncompressed,
    Lzw,
    PackBits,
    Deflate,
}

impl CompressionMethod {
    /// Value stored in the Compression tag
    pub fn code(&self) -> u16 {
        match self {
            CompressionMethod::Uncompressed => compression::NONE,
            CompressionMethod::Lzw => compression::LZW,
            CompressionMethod::PackBits => compression::PACKBITS,
            CompressionMethod::Deflate => compression::DEFLATE,
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            compression::NONE => Some(CompressionMethod::Uncompressed),
            compression::LZW => Some(CompressionMethod::Lzw),
            compression::PACKBITS => Some(CompressionMethod::PackBits),
            compression::DEFLATE | compression::DEFLATE_OLD => Some(CompressionMethod::Deflate),
            _ => None,
        }
    }

    /// Parses a name such as "lzw" or "deflate", or a numeric tag value
    pub fn from_name(name: &str) -> Option<Self> {
        if let Ok(code) = name.parse::<u16>() {
            return Self::from_code(code);
        }
        match name.to_lowercase().as_str() {
            "none" | "uncompressed" => Some(CompressionMethod::Uncompressed),
            "lzw" => Some(CompressionMethod::Lzw),
            "packbits" => Some(CompressionMethod::PackBits),
            "deflate" | "zip" | "adobe deflate" => Some(CompressionMethod::Deflate),
            _ => None,
        }
    }

    pub fn is_compressed(&self) -> bool {
        *self != CompressionMethod::Uncompressed
    }
}

impl fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            CompressionMethod::Uncompressed => "Uncompressed",
            CompressionMethod::Lzw => "LZW",
            CompressionMethod::PackBits => "PackBits",
            CompressionMethod::Deflate => "Deflate",
        };
        write!(f, "{}", name)
    }
}

/// Effort level; only Deflate distinguishes between them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionLevel {
    #[default]
    Optimal,
    Fastest,
    NoCompression,
}
