//! TIFF validation utilities
//!
//! Bounds checks applied while reading possibly malformed files.

use log::warn;
use std::io::SeekFrom;

use crate::io::seekable::SeekableReader;
use crate::tiff::constants::header;
use crate::tiff::errors::{TiffError, TiffResult};

/// Checks that the first IFD offset points inside the file, past the header
pub fn validate_first_ifd_offset(offset: u64, file_size: u64) -> TiffResult<()> {
    if offset == 0 {
        return Err(TiffError::NotATiffFile("first IFD offset is zero".to_string()));
    }
    if offset < header::HEADER_SIZE || offset >= file_size {
        return Err(TiffError::NotATiffFile(format!(
            "first IFD offset {} outside file of {} bytes",
            offset, file_size
        )));
    }
    Ok(())
}

/// Checks that `len` bytes starting at `offset` lie inside the file
pub fn validate_extent(offset: u64, len: u64, file_size: u64) -> TiffResult<()> {
    match offset.checked_add(len) {
        Some(end) if end <= file_size => Ok(()),
        _ => Err(TiffError::GenericError(format!(
            "{} bytes at offset {} run past end of file ({} bytes)",
            len, offset, file_size
        ))),
    }
}

/// Gets the stream length, restoring the current position
///
/// Falls back to `u64::MAX` when the end cannot be located.
pub fn get_file_size(reader: &mut dyn SeekableReader) -> TiffResult<u64> {
    let current_position = reader.stream_position()?;
    let file_size = match reader.seek(SeekFrom::End(0)) {
        Ok(size) => size,
        Err(e) => {
            warn!("Could not determine file size: {}", e);
            u64::MAX
        }
    };
    reader.seek(SeekFrom::Start(current_position))?;
    Ok(file_size)
}
