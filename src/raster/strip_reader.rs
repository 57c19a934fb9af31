//! Strip-based pixel data reading
//!
//! A `StripReader` assembles one plane of a stripped image: it reads every
//! strip belonging to the plane, decompresses it, swaps samples from
//! big-endian files and finally undoes the differencing predictor. Plain
//! TIFF images are plane 0 of 1; STK stacks address their other planes
//! either by shifting the first plane's offsets (uncompressed) or by picking
//! the plane's run of strips (compressed).

use log::{debug, trace};
use std::io::SeekFrom;

use crate::compression::{CompressionFactory, CompressionHandler};
use crate::io::byte_order::ByteOrder;
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::{compression, photometric, planar_config, predictor, tags};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::IFD;
use crate::tiff::validation;

use super::samples::{RgbPlanes, SampleType, Samples};
use super::strips::StripTable;

/// Smallest chunk used when copying uncompressed strips
pub const MIN_READ_BUFFER: usize = 2048;

/// Reader configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    pub buffer_size: usize,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions { buffer_size: 8192 }
    }
}

impl ReadOptions {
    pub fn with_buffer_size(buffer_size: usize) -> Self {
        ReadOptions { buffer_size }
    }

    /// Chunk size for grayscale planes: a multiple of 4
    pub fn gray_chunk(&self) -> usize {
        self.buffer_size.max(MIN_READ_BUFFER) / 4 * 4
    }

    /// Chunk size for RGB planes: a multiple of 3
    pub fn rgb_chunk(&self) -> usize {
        self.buffer_size.max(MIN_READ_BUFFER) / 3 * 3
    }
}

/// Everything needed to decode the pixels of one IFD
#[derive(Debug, Clone, PartialEq)]
pub struct RasterInfo {
    pub width: u32,
    pub height: u32,
    pub bits_per_sample: u32,
    pub sample_type: SampleType,
    pub samples_per_pixel: u32,
    pub photometric: u16,
    pub planar_configuration: u16,
    pub compression: u16,
    pub differencing: bool,
    pub strips: StripTable,
}

impl RasterInfo {
    /// Collects and validates the image description of `ifd`
    pub fn from_ifd(ifd: &IFD) -> TiffResult<Self> {
        let (width, height) = ifd.get_dimensions().unwrap_or((0, 0));
        if width == 0 || height == 0 {
            return Err(TiffError::InvalidImageInfo(format!(
                "IFD #{}: image size {}x{}",
                ifd.number, width, height
            )));
        }
        let strips = StripTable::from_ifd(ifd)?;

        let bits_per_sample = ifd.get_tag_value(tags::BITS_PER_SAMPLE).unwrap_or(1);
        let sample_type = SampleType::from_tags(bits_per_sample, ifd.get_tag_value(tags::SAMPLE_FORMAT))?;

        let info = RasterInfo {
            width,
            height,
            bits_per_sample,
            sample_type,
            samples_per_pixel: ifd.get_samples_per_pixel(),
            photometric: ifd
                .get_tag_value(tags::PHOTOMETRIC_INTERPRETATION)
                .unwrap_or(photometric::BLACK_IS_ZERO as u32) as u16,
            planar_configuration: ifd
                .get_tag_value(tags::PLANAR_CONFIGURATION)
                .unwrap_or(planar_config::CHUNKY as u32) as u16,
            compression: ifd.get_tag_value(tags::COMPRESSION).unwrap_or(compression::NONE as u32) as u16,
            differencing: ifd.get_tag_value(tags::PREDICTOR) == Some(predictor::HORIZONTAL_DIFFERENCING as u32),
            strips,
        };
        debug!(
            "IFD #{}: {}x{} {} spp={} compression={} strips={}",
            ifd.number,
            info.width,
            info.height,
            info.sample_type,
            info.samples_per_pixel,
            info.compression,
            info.strips.len()
        );
        Ok(info)
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_compressed(&self) -> bool {
        self.compression != compression::NONE
    }

    /// Fails unless the image is 8-bit chunky or planar RGB
    pub fn check_rgb(&self) -> TiffResult<()> {
        if self.bits_per_sample != 8 || self.samples_per_pixel != 3 {
            return Err(TiffError::InvalidImageInfo(format!(
                "can only read 8-bit RGB images, found {} bits and {} samples per pixel",
                self.bits_per_sample, self.samples_per_pixel
            )));
        }
        if self.photometric != photometric::RGB {
            return Err(TiffError::InvalidImageInfo(format!(
                "photometric interpretation {} is not RGB",
                self.photometric
            )));
        }
        if self.planar_configuration != planar_config::CHUNKY && self.planar_configuration != planar_config::PLANAR {
            return Err(TiffError::InvalidImageInfo(format!(
                "planar configuration {} undefined",
                self.planar_configuration
            )));
        }
        Ok(())
    }
}

/// Reads the planes of one image from a seekable stream
pub struct StripReader<'a> {
    reader: &'a mut dyn SeekableReader,
    info: &'a RasterInfo,
    handler: Box<dyn CompressionHandler>,
    big_endian: bool,
    options: ReadOptions,
    file_size: u64,
    /// Reused between strips
    buffer: Vec<u8>,
}

impl<'a> StripReader<'a> {
    pub fn new(
        reader: &'a mut dyn SeekableReader,
        info: &'a RasterInfo,
        byte_order: ByteOrder,
        options: ReadOptions,
    ) -> TiffResult<Self> {
        let handler = CompressionFactory::create_handler(info.compression)?;
        let file_size = validation::get_file_size(&mut *reader)?;
        Ok(StripReader {
            reader,
            info,
            handler,
            big_endian: byte_order.needs_swap(),
            options,
            file_size,
            buffer: Vec::new(),
        })
    }

    /// Strip indices and file offsets making up `plane` of `plane_count`
    fn plane_strips(&self, plane: usize, plane_count: usize) -> TiffResult<Vec<(u64, usize)>> {
        let table = &self.info.strips;
        if plane >= plane_count.max(1) {
            return Err(TiffError::ImageIndexOutOfRange {
                index: plane,
                count: plane_count,
            });
        }

        if !self.info.is_compressed() {
            let shift = plane as u64 * table.plane_span();
            return Ok(table
                .offsets
                .iter()
                .zip(&table.byte_counts)
                .map(|(offset, count)| (*offset as u64 + shift, *count as usize))
                .collect());
        }

        let per_plane = table.len() / plane_count.max(1);
        if per_plane == 0 {
            return Err(TiffError::InvalidImageInfo(format!(
                "{} strips cannot hold {} planes",
                table.len(),
                plane_count
            )));
        }
        let first = plane * per_plane;
        Ok((first..first + per_plane)
            .map(|i| (table.offsets[i] as u64, table.byte_counts[i] as usize))
            .collect())
    }

    fn read_raw(&mut self, offset: u64, len: usize) -> TiffResult<&[u8]> {
        validation::validate_extent(offset, len as u64, self.file_size)
            .map_err(|e| TiffError::InvalidImageInfo(format!("strip out of bounds: {}", e)))?;
        self.reader.seek(SeekFrom::Start(offset))?;
        self.buffer.resize(len, 0);
        self.reader.read_exact(&mut self.buffer)?;
        Ok(&self.buffer)
    }

    /// Copies uncompressed strips through a chunk of at most `chunk` bytes
    fn read_uncompressed(&mut self, strips: &[(u64, usize)], chunk: usize, total: usize) -> TiffResult<Vec<u8>> {
        let mut plane = Vec::with_capacity(total.min(usize::try_from(self.file_size).unwrap_or(usize::MAX)));
        for (offset, count) in strips {
            let mut position = *offset;
            let mut left = *count;
            while left > 0 && plane.len() < total {
                let size = left.min(chunk);
                let data = self.read_raw(position, size)?;
                plane.extend_from_slice(data);
                position += size as u64;
                left -= size;
            }
        }

        if plane.len() < total {
            return Err(TiffError::InvalidImageInfo(format!(
                "strips hold {} bytes, plane needs {}",
                plane.len(),
                total
            )));
        }
        plane.truncate(total);
        Ok(plane)
    }

    /// Decodes compressed strips; `rows_of(j)` gives the rows in strip j and
    /// `row_bytes` the decoded size of one row
    fn read_compressed<F>(&mut self, strips: &[(u64, usize)], row_bytes: usize, rows_of: F) -> TiffResult<Vec<u8>>
    where
        F: Fn(usize) -> usize,
    {
        let mut plane = Vec::new();
        for (j, (offset, count)) in strips.iter().enumerate() {
            let expected = rows_of(j) * row_bytes;
            self.read_raw(*offset, *count)?;
            let decoded = self.handler.decompress(&self.buffer, expected)?;
            trace!("Strip {} at {}: {} -> {} bytes", j, offset, count, decoded.len());
            plane.extend_from_slice(&decoded);
        }
        Ok(plane)
    }

    /// Rows held by consecutive strips of one plane, counting down from the height
    fn sequential_rows(&self) -> impl Fn(usize) -> usize {
        let rows = self.info.strips.rows_per_strip.max(1) as usize;
        let height = self.info.height as usize;
        move |j| rows.min(height.saturating_sub(j * rows))
    }

    /// Reads a grayscale or palette-index plane
    pub fn read_gray_plane(&mut self, plane: usize, plane_count: usize) -> TiffResult<Samples> {
        let info = self.info;
        let bytes = info.sample_type.bytes();
        let total = info.pixel_count() * bytes;
        let strips = self.plane_strips(plane, plane_count)?;

        let mut raw = if info.is_compressed() {
            let rows_of = self.sequential_rows();
            self.read_compressed(&strips, info.width as usize * bytes, rows_of)?
        } else {
            let chunk = self.options.gray_chunk();
            self.read_uncompressed(&strips, chunk, total)?
        };
        raw.resize(total, 0);

        let mut samples = Samples::from_bytes(info.sample_type, &raw, self.big_endian);
        if info.differencing {
            samples.reverse_differencing(info.width as usize);
        }
        Ok(samples)
    }

    /// Reads an 8-bit RGB plane in either planar configuration
    pub fn read_rgb_plane(&mut self, plane: usize, plane_count: usize) -> TiffResult<RgbPlanes> {
        let info = self.info;
        info.check_rgb()?;

        let pixels = info.pixel_count();
        let width = info.width as usize;
        let strips = self.plane_strips(plane, plane_count)?;
        let chunky = info.planar_configuration == planar_config::CHUNKY;

        let mut raw = if !info.is_compressed() {
            let chunk = self.options.rgb_chunk();
            self.read_uncompressed(&strips, chunk, pixels * 3)?
        } else if chunky {
            let rows_of = self.sequential_rows();
            self.read_compressed(&strips, width * 3, rows_of)?
        } else {
            // Each channel restarts at the top of the image
            let per_channel = strips.len().div_ceil(3).max(1);
            let rows = info.strips.rows_per_strip.max(1) as usize;
            let height = info.height as usize;
            self.read_compressed(&strips, width, move |j| {
                rows.min(height.saturating_sub((j % per_channel) * rows))
            })?
        };
        raw.resize(pixels * 3, 0);

        let mut planes = if chunky {
            RgbPlanes::deinterleave(&raw)
        } else {
            RgbPlanes {
                red: raw[..pixels].to_vec(),
                green: raw[pixels..2 * pixels].to_vec(),
                blue: raw[2 * pixels..].to_vec(),
            }
        };
        if info.differencing {
            planes.reverse_differencing(width);
        }
        Ok(planes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::compress_lzw;
    use crate::tiff::types::TiffValue;
    use std::io::Cursor;

    fn gray_ifd(width: u32, height: u32, bits: u16) -> IFD {
        let mut ifd = IFD::new(0, 0);
        ifd.insert(tags::IMAGE_WIDTH, TiffValue::long(width));
        ifd.insert(tags::IMAGE_LENGTH, TiffValue::long(height));
        ifd.insert(tags::BITS_PER_SAMPLE, TiffValue::short(bits));
        ifd
    }

    #[test]
    fn test_chunk_sizes() {
        assert_eq!(ReadOptions::with_buffer_size(10).gray_chunk(), 2048);
        assert_eq!(ReadOptions::with_buffer_size(4099).gray_chunk(), 4096);
        assert_eq!(ReadOptions::with_buffer_size(4099).rgb_chunk(), 4098);
    }

    #[test]
    fn test_invalid_descriptions() {
        let mut ifd = gray_ifd(0, 4, 8);
        ifd.insert(tags::STRIP_OFFSETS, TiffValue::long(8));
        ifd.insert(tags::STRIP_BYTE_COUNTS, TiffValue::long(0));
        assert!(matches!(RasterInfo::from_ifd(&ifd), Err(TiffError::InvalidImageInfo(_))));

        let mut ifd = gray_ifd(4, 4, 12);
        ifd.insert(tags::STRIP_OFFSETS, TiffValue::long(8));
        ifd.insert(tags::STRIP_BYTE_COUNTS, TiffValue::long(24));
        assert!(matches!(RasterInfo::from_ifd(&ifd), Err(TiffError::UnsupportedBitDepth(12))));
    }

    #[test]
    fn test_uncompressed_planes_are_shifted() {
        // Two 2x2 planes of u16 stored back to back after 8 bytes of header
        let mut file = vec![0u8; 8];
        for v in [1u16, 2, 3, 4, 5, 6, 7, 8] {
            file.extend_from_slice(&v.to_le_bytes());
        }
        let mut ifd = gray_ifd(2, 2, 16);
        ifd.insert(tags::STRIP_OFFSETS, TiffValue::long(8));
        ifd.insert(tags::STRIP_BYTE_COUNTS, TiffValue::long(8));
        let info = RasterInfo::from_ifd(&ifd).unwrap();

        let mut cursor = Cursor::new(file);
        let mut reader = StripReader::new(&mut cursor, &info, ByteOrder::LittleEndian, ReadOptions::default()).unwrap();
        assert_eq!(reader.read_gray_plane(0, 2).unwrap(), Samples::U16(vec![1, 2, 3, 4]));
        assert_eq!(reader.read_gray_plane(1, 2).unwrap(), Samples::U16(vec![5, 6, 7, 8]));
        assert!(matches!(
            reader.read_gray_plane(2, 2),
            Err(TiffError::ImageIndexOutOfRange { index: 2, count: 2 })
        ));
    }

    #[test]
    fn test_compressed_strips_with_predictor() {
        // 3x3 image in strips of two rows, differenced then LZW coded
        let rows: [[u8; 3]; 3] = [[10, 11, 12], [20, 22, 24], [5, 4, 3]];
        let mut file = vec![0u8; 8];
        let mut offsets = Vec::new();
        let mut counts = Vec::new();
        for chunk in rows.chunks(2) {
            let mut bytes = Vec::new();
            for row in chunk {
                bytes.push(row[0]);
                bytes.push(row[1].wrapping_sub(row[0]));
                bytes.push(row[2].wrapping_sub(row[1]));
            }
            let packed = compress_lzw(&bytes);
            offsets.push(file.len() as u32);
            counts.push(packed.len() as u32);
            file.extend_from_slice(&packed);
        }

        let mut ifd = gray_ifd(3, 3, 8);
        ifd.insert(tags::COMPRESSION, TiffValue::short(compression::LZW));
        ifd.insert(tags::PREDICTOR, TiffValue::short(predictor::HORIZONTAL_DIFFERENCING));
        ifd.insert(tags::ROWS_PER_STRIP, TiffValue::long(2));
        ifd.insert(tags::STRIP_OFFSETS, TiffValue::longs(&offsets));
        ifd.insert(tags::STRIP_BYTE_COUNTS, TiffValue::longs(&counts));
        let info = RasterInfo::from_ifd(&ifd).unwrap();

        let mut cursor = Cursor::new(file);
        let mut reader = StripReader::new(&mut cursor, &info, ByteOrder::LittleEndian, ReadOptions::default()).unwrap();
        assert_eq!(
            reader.read_gray_plane(0, 1).unwrap(),
            Samples::U8(vec![10, 11, 12, 20, 22, 24, 5, 4, 3])
        );
    }

    #[test]
    fn test_strip_past_end_of_file_is_rejected() {
        let mut ifd = gray_ifd(4, 4, 8);
        ifd.insert(tags::COMPRESSION, TiffValue::short(compression::LZW));
        ifd.insert(tags::STRIP_OFFSETS, TiffValue::long(8));
        ifd.insert(tags::STRIP_BYTE_COUNTS, TiffValue::long(0x8000_0000));
        let info = RasterInfo::from_ifd(&ifd).unwrap();

        let mut cursor = Cursor::new(vec![0u8; 64]);
        let mut reader = StripReader::new(&mut cursor, &info, ByteOrder::LittleEndian, ReadOptions::default()).unwrap();
        assert!(matches!(reader.read_gray_plane(0, 1), Err(TiffError::InvalidImageInfo(_))));
    }

    #[test]
    fn test_planar_rgb() {
        let mut file = vec![0u8; 8];
        file.extend_from_slice(&[1, 2, 3, 4, 5, 6]);
        let mut ifd = gray_ifd(2, 1, 8);
        ifd.force_insert(tags::BITS_PER_SAMPLE, TiffValue::Short(vec![8, 8, 8]));
        ifd.insert(tags::SAMPLES_PER_PIXEL, TiffValue::short(3));
        ifd.insert(tags::PHOTOMETRIC_INTERPRETATION, TiffValue::short(photometric::RGB));
        ifd.insert(tags::PLANAR_CONFIGURATION, TiffValue::short(planar_config::PLANAR));
        ifd.insert(tags::STRIP_OFFSETS, TiffValue::long(8));
        ifd.insert(tags::STRIP_BYTE_COUNTS, TiffValue::long(6));
        let info = RasterInfo::from_ifd(&ifd).unwrap();

        let mut cursor = Cursor::new(file);
        let mut reader = StripReader::new(&mut cursor, &info, ByteOrder::LittleEndian, ReadOptions::default()).unwrap();
        let planes = reader.read_rgb_plane(0, 1).unwrap();
        assert_eq!(planes.red, vec![1, 2]);
        assert_eq!(planes.green, vec![3, 4]);
        assert_eq!(planes.blue, vec![5, 6]);
    }

    #[test]
    fn test_rgb_requires_photometric_rgb() {
        let mut ifd = gray_ifd(2, 1, 8);
        ifd.insert(tags::SAMPLES_PER_PIXEL, TiffValue::short(3));
        ifd.insert(tags::STRIP_OFFSETS, TiffValue::long(8));
        ifd.insert(tags::STRIP_BYTE_COUNTS, TiffValue::long(6));
        let info = RasterInfo::from_ifd(&ifd).unwrap();
        assert!(matches!(info.check_rgb(), Err(TiffError::InvalidImageInfo(_))));
    }
}
