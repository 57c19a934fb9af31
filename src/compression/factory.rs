//! Factory for creating compression handlers

use crate::tiff::constants::compression;
use crate::tiff::errors::{TiffError, TiffResult};
use super::handler::CompressionHandler;
use super::uncompressed::UncompressedHandler;
use super::lzw::LzwHandler;
use super::packbits::PackBitsHandler;
use super::deflate::DeflateHandler;
use super::{CompressionLevel, CompressionMethod};

/// Factory for creating compression handlers
pub struct CompressionFactory;

impl CompressionFactory {
    /// Create a decoding handler for a Compression tag value
    pub fn create_handler(code: u16) -> TiffResult<Box<dyn CompressionHandler>> {
        match code {
            compression::NONE => Ok(Box::new(UncompressedHandler)),
            compression::LZW => Ok(Box::new(LzwHandler)),
            compression::DEFLATE => Ok(Box::new(DeflateHandler::default())),
            compression::DEFLATE_OLD => Ok(Box::new(DeflateHandler::legacy(CompressionLevel::Optimal))),
            compression::PACKBITS => Ok(Box::new(PackBitsHandler)),
            _ => Err(TiffError::UnsupportedCompression(code)),
        }
    }

    /// Create an encoding handler for a writer configuration
    pub fn create_with_level(method: CompressionMethod, level: CompressionLevel) -> Box<dyn CompressionHandler> {
        match method {
            CompressionMethod::Uncompressed => Box::new(UncompressedHandler),
            CompressionMethod::Lzw => Box::new(LzwHandler),
            CompressionMethod::PackBits => Box::new(PackBitsHandler),
            CompressionMethod::Deflate => Box::new(DeflateHandler::new(level)),
        }
    }

    /// Get a handler by name or numeric code
    pub fn get_handler_by_name(name: &str) -> TiffResult<Box<dyn CompressionHandler>> {
        CompressionMethod::from_name(name)
            .map(|method| Self::create_with_level(method, CompressionLevel::Optimal))
            .ok_or_else(|| TiffError::GenericError(format!("Unknown compression type: {}", name)))
    }

    /// Get all available compression handlers
    pub fn get_available_handlers() -> Vec<Box<dyn CompressionHandler>> {
        vec![
            Box::new(UncompressedHandler),
            Box::new(LzwHandler),
            Box::new(PackBitsHandler),
            Box::new(DeflateHandler::default()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_by_code() {
        for code in [1u16, 5, 8, 32773, 32946] {
            let handler = CompressionFactory::create_handler(code).unwrap();
            assert_eq!(handler.code(), code);
        }
    }

    #[test]
    fn test_unknown_code_is_unsupported() {
        match CompressionFactory::create_handler(7) {
            Err(TiffError::UnsupportedCompression(7)) => {}
            _ => panic!("JPEG should be rejected"),
        }
    }

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(CompressionFactory::get_handler_by_name("PackBits").unwrap().code(), 32773);
        assert_eq!(CompressionFactory::get_handler_by_name("zip").unwrap().code(), 8);
        assert_eq!(CompressionFactory::get_handler_by_name("5").unwrap().name(), "LZW");
        assert!(CompressionFactory::get_handler_by_name("zstd").is_err());
    }

    #[test]
    fn test_every_handler_round_trips() {
        let data: Vec<u8> = (0..5000u32).map(|i| (i % 13 * 19) as u8).collect();
        for handler in CompressionFactory::get_available_handlers() {
            let packed = handler.compress(&data).unwrap();
            assert_eq!(handler.decompress(&packed, data.len()).unwrap(), data, "{}", handler.name());
        }
    }
}
