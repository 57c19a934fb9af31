//! TIFF file format parsing module
//!
//! This module provides structures and functions for reading and writing
//! classic TIFF files, plus the schema hooks the STK layer plugs into.

pub mod errors;
pub mod ifd;
pub mod types;
pub mod reader;
pub mod writer;
pub mod info;
pub mod schema;
#[cfg(test)]
mod tests;
pub mod constants;
pub(crate) mod validation;

pub use crate::io::byte_order::{BigEndianHandler, ByteOrder, ByteOrderHandler, LittleEndianHandler};
pub use errors::{TiffError, TiffResult};
pub use ifd::{IFD, IFDEntry, RawEntry};
pub use info::ImageKind;
pub use reader::TiffReader;
pub use schema::{BaseSchema, TagSchema};
pub use types::{Rational, TiffType, TiffValue, TIFF};
pub use writer::{PlaneLayout, TiffWriter};
