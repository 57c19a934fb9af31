//! TIFF writing utilities
//!
//! Helpers for placing data on word boundaries and checking the two-pass
//! directory layout against the real stream position.

use std::io::{Seek, SeekFrom, Write};

use crate::tiff::errors::{TiffError, TiffResult};

/// Alignment unit for image data and directories (one TIFF word)
pub const WORD: u64 = 2;

/// Next word-aligned position at or after `offset`
pub fn align_to_word(offset: u64) -> u64 {
    offset + calculate_padding(offset)
}

/// Padding bytes needed to bring `offset` to a word boundary
pub fn calculate_padding(offset: u64) -> u64 {
    (WORD - offset % WORD) % WORD
}

/// Pads the stream with zero bytes up to the next word boundary
///
/// Returns the aligned position.
pub fn write_padding<W: Write + Seek>(writer: &mut W) -> TiffResult<u64> {
    let position = writer.stream_position()?;
    let padding = calculate_padding(position);
    if padding > 0 {
        writer.write_all(&vec![0u8; padding as usize])?;
    }
    Ok(position + padding)
}

/// Fails with `OffsetCalculationFailed` unless the stream sits at `expected`
pub fn check_position<W: Seek>(writer: &mut W, expected: u64) -> TiffResult<()> {
    let actual = writer.stream_position()?;
    if actual != expected {
        return Err(TiffError::OffsetCalculationFailed { expected, actual });
    }
    Ok(())
}

/// Writes a little-endian u32 at `position` and returns to the end of the stream
pub fn patch_u32<W: Write + Seek>(writer: &mut W, position: u64, value: u32) -> TiffResult<()> {
    let resume = writer.stream_position()?;
    writer.seek(SeekFrom::Start(position))?;
    writer.write_all(&value.to_le_bytes())?;
    writer.seek(SeekFrom::Start(resume))?;
    Ok(())
}
