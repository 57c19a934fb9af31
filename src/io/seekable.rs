//! Seekable stream traits
//!
//! Unified traits for streams that support both reading (or writing)
//! and seeking, used by the readers and writers in this crate.

use std::io::{Read, Seek, Write};

/// Trait for readers that can both read and seek
pub trait SeekableReader: Read + Seek + Send + Sync {}

// Blanket implementation for any type that implements the required traits
impl<T: Read + Seek + Send + Sync> SeekableReader for T {}

/// Trait for writers that can both write and seek
///
/// Writers need to seek back to patch IFD offsets once the position of the
/// following directory is known.
pub trait SeekableWriter: Write + Seek {}

impl<T: Write + Seek> SeekableWriter for T {}
