//! Strip-based pixel data writing
//!
//! Uncompressed planes are copied to the stream in buffer-sized chunks and
//! described by a single strip starting at the first plane. Compressed
//! planes are optionally differenced, cut into strips of whole rows and
//! compressed strip by strip; every strip of every plane is recorded.

use log::{debug, trace};
use std::io::{Seek, Write};

use crate::compression::{CompressionFactory, CompressionHandler, CompressionLevel, CompressionMethod};
use crate::tiff::constants::{compression, predictor};
use crate::tiff::errors::{TiffError, TiffResult};

use super::samples::{RgbPlanes, Samples};
use super::strips::{define_strips, StripTable};

/// Smallest write buffer
pub const MIN_WRITE_BUFFER: usize = 4096;

/// Rows-per-strip multipliers applied to the buffer size
const GRAY_STRIP_MULTIPLIER: usize = 2;
const RGB_STRIP_MULTIPLIER: usize = 3;

/// Writer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    pub compression: CompressionMethod,
    pub level: CompressionLevel,
    /// Horizontal differencing before compression
    pub differencing: bool,
    pub buffer_size: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            compression: CompressionMethod::Deflate,
            level: CompressionLevel::Optimal,
            differencing: false,
            buffer_size: 8192,
        }
    }
}

impl WriteOptions {
    pub fn uncompressed() -> Self {
        WriteOptions {
            compression: CompressionMethod::Uncompressed,
            ..WriteOptions::default()
        }
    }

    /// Selects a method; differencing is switched on for LZW only
    pub fn with_compression(mut self, method: CompressionMethod) -> Self {
        self.compression = method;
        self.differencing = method == CompressionMethod::Lzw;
        self
    }

    pub fn with_level(mut self, level: CompressionLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_differencing(mut self, differencing: bool) -> Self {
        self.differencing = differencing;
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Buffer size raised to the minimum and rounded down to a multiple of 4
    pub fn effective_buffer_size(&self) -> usize {
        self.buffer_size.max(MIN_WRITE_BUFFER) / 4 * 4
    }

    /// Whether strips actually go through a codec
    pub fn is_compressed(&self) -> bool {
        self.compression.is_compressed() && self.level != CompressionLevel::NoCompression
    }

    /// Compression tag value
    pub fn compression_code(&self) -> u16 {
        if self.is_compressed() {
            self.compression.code()
        } else {
            compression::NONE
        }
    }

    /// Predictor tag value
    pub fn predictor(&self) -> u16 {
        if self.differencing && self.is_compressed() {
            predictor::HORIZONTAL_DIFFERENCING
        } else {
            predictor::NONE
        }
    }
}

/// Writes planes and records the resulting strip table
pub struct StripWriter {
    options: WriteOptions,
    handler: Box<dyn CompressionHandler>,
    table: StripTable,
    planes_written: usize,
}

impl StripWriter {
    pub fn new(options: WriteOptions) -> Self {
        let handler = CompressionFactory::create_with_level(options.compression, options.level);
        StripWriter {
            options,
            handler,
            table: StripTable::default(),
            planes_written: 0,
        }
    }

    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    pub fn planes_written(&self) -> usize {
        self.planes_written
    }

    /// Strip table covering every plane written so far
    pub fn table(&self) -> &StripTable {
        &self.table
    }

    /// Writes one grayscale or palette-index plane
    pub fn write_gray_plane<W: Write + Seek>(
        &mut self,
        writer: &mut W,
        samples: &Samples,
        width: u32,
        height: u32,
    ) -> TiffResult<()> {
        check_plane_len(samples.len(), width, height)?;

        let bytes = if self.options.is_compressed() && self.options.differencing {
            let mut differenced = samples.clone();
            differenced.apply_differencing(width as usize);
            differenced.to_le_bytes()
        } else {
            samples.to_le_bytes()
        };
        self.write_plane_bytes(writer, &bytes, height, GRAY_STRIP_MULTIPLIER)
    }

    /// Writes one RGB plane, interleaved
    pub fn write_rgb_plane<W: Write + Seek>(
        &mut self,
        writer: &mut W,
        planes: &RgbPlanes,
        width: u32,
        height: u32,
    ) -> TiffResult<()> {
        check_plane_len(planes.len(), width, height)?;

        let bytes = if self.options.is_compressed() && self.options.differencing {
            let mut differenced = planes.clone();
            differenced.apply_differencing(width as usize);
            differenced.interleave()
        } else {
            planes.interleave()
        };
        self.write_plane_bytes(writer, &bytes, height, RGB_STRIP_MULTIPLIER)
    }

    fn write_plane_bytes<W: Write + Seek>(
        &mut self,
        writer: &mut W,
        bytes: &[u8],
        height: u32,
        multiplier: usize,
    ) -> TiffResult<()> {
        let buffer_size = self.options.effective_buffer_size();
        let start = writer.stream_position()?;

        if self.options.is_compressed() {
            let layout = define_strips(bytes.len(), height, multiplier, buffer_size);
            let strip_len = bytes.len() / height.max(1) as usize * layout.rows_per_strip as usize;
            self.table.rows_per_strip = layout.rows_per_strip;

            for (i, strip) in bytes.chunks(strip_len.max(1)).enumerate() {
                let offset = writer.stream_position()?;
                let packed = self.handler.compress(strip)?;
                writer.write_all(&packed)?;
                trace!("Strip {} at {}: {} -> {} bytes", i, offset, strip.len(), packed.len());
                self.table.offsets.push(to_u32(offset)?);
                self.table.byte_counts.push(to_u32(packed.len() as u64)?);
            }
        } else {
            if self.planes_written == 0 {
                self.table.offsets.push(to_u32(start)?);
                self.table.byte_counts.push(to_u32(bytes.len() as u64)?);
                self.table.rows_per_strip = height;
            }
            for chunk in bytes.chunks(buffer_size) {
                writer.write_all(chunk)?;
            }
        }

        self.planes_written += 1;
        debug!(
            "Plane {} written at {} ({} bytes, {})",
            self.planes_written - 1,
            start,
            bytes.len(),
            self.handler.name()
        );
        Ok(())
    }
}

fn check_plane_len(len: usize, width: u32, height: u32) -> TiffResult<()> {
    let expected = width as usize * height as usize;
    if len != expected || expected == 0 {
        return Err(TiffError::InvalidImageParameters(format!(
            "plane holds {} pixels, {}x{} image needs {}",
            len, width, height, expected
        )));
    }
    Ok(())
}

fn to_u32(value: u64) -> TiffResult<u32> {
    u32::try_from(value)
        .map_err(|_| TiffError::InvalidImageParameters(format!("offset {} exceeds 4 GiB", value)))
}
