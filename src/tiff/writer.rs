//! TIFF file writer
//!
//! Images are appended one at a time: pixel data first, starting on a word
//! boundary, then the image's IFD. Each IFD is laid out in two passes: the
//! first computes the table size and the offset of every out-of-line value
//! and extension block, the second writes them and checks that the stream
//! ended up exactly where the layout said. The previous IFD's next-offset
//! slot (the header slot for the first image) is patched to point at the
//! new directory. Output is always little-endian.

use log::{debug, info, trace};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::io::byte_order::LittleEndianHandler;
use crate::io::seekable::SeekableWriter;
use crate::raster::{Colormap, RgbPlanes, SampleType, Samples, StripWriter, WriteOptions};
use crate::tiff::constants::{header, photometric, planar_config, resolution_unit, tags};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::IFD;
use crate::tiff::info::ImageKind;
use crate::tiff::schema::{ExtensionEncoder, NoExtensions};
use crate::tiff::types::TiffValue;
use crate::utils::progress::{percent, ProgressCallback};
use crate::utils::write_utils;

/// Pixel layout of the planes of one image
#[derive(Debug, Clone, PartialEq)]
pub enum PlaneLayout {
    Grayscale(SampleType),
    /// Index samples plus their palette
    Palette(SampleType, Colormap),
    /// 8-bit chunky RGB
    Rgb,
}

impl PlaneLayout {
    pub fn sample_type(&self) -> SampleType {
        match self {
            PlaneLayout::Grayscale(sample_type) | PlaneLayout::Palette(sample_type, _) => *sample_type,
            PlaneLayout::Rgb => SampleType::U8,
        }
    }

    /// Uncompressed size of one plane
    pub fn plane_bytes(&self, width: u32, height: u32) -> usize {
        let pixels = width as usize * height as usize;
        match self {
            PlaneLayout::Rgb => pixels * 3,
            _ => pixels * self.sample_type().bytes(),
        }
    }
}

/// One finished directory record
struct Record {
    tag: u16,
    field_type: u16,
    count: u32,
    slot: [u8; 4],
}

/// Writer for multi-image little-endian TIFF files
pub struct TiffWriter<W: SeekableWriter> {
    writer: W,
    options: WriteOptions,
    /// Position of the slot that must receive the next IFD offset
    next_ifd_slot: u64,
    images_written: usize,
    progress: Option<ProgressCallback>,
}

impl TiffWriter<BufWriter<File>> {
    /// Creates a file and writes the header
    pub fn create<P: AsRef<Path>>(path: P) -> TiffResult<Self> {
        Self::create_with_options(path, WriteOptions::default())
    }

    /// Creates a file with explicit strip and compression options
    ///
    /// # Arguments
    /// * `path` - Output file, truncated if it exists
    /// * `options` - Compression, level, differencing and buffer size
    ///
    /// # Returns
    /// A writer positioned after the header
    pub fn create_with_options<P: AsRef<Path>>(path: P, options: WriteOptions) -> TiffResult<Self> {
        info!("Writing TIFF to {}", path.as_ref().display());
        let file = File::create(path)?;
        Self::with_options(BufWriter::with_capacity(1024 * 1024, file), options)
    }
}

impl<W: SeekableWriter> TiffWriter<W> {
    pub fn new(writer: W) -> TiffResult<Self> {
        Self::with_options(writer, WriteOptions::default())
    }

    /// Writes the header to `writer` and prepares for the first image
    ///
    /// # Arguments
    /// * `writer` - Any stream implementing `SeekableWriter`, positioned at 0
    /// * `options` - Compression, level, differencing and buffer size
    ///
    /// # Returns
    /// The writer, or an I/O error from the header write
    pub fn with_options(mut writer: W, options: WriteOptions) -> TiffResult<Self> {
        Self::write_header(&mut writer)?;
        Ok(TiffWriter {
            writer,
            options,
            next_ifd_slot: header::FIRST_IFD_SLOT,
            images_written: 0,
            progress: None,
        })
    }

    /// "II", 42 and a zero first-IFD offset to be patched later
    fn write_header(writer: &mut W) -> TiffResult<()> {
        writer.write_all(&header::LITTLE_ENDIAN_MARKER)?;
        writer.write_all(&header::TIFF_MAGIC.to_le_bytes())?;
        writer.write_all(&[0u8; 4])?;
        Ok(())
    }

    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: WriteOptions) {
        self.options = options;
    }

    /// Registers a callback receiving the percentage of planes written
    pub fn on_progress(&mut self, callback: ProgressCallback) {
        self.progress = Some(callback);
    }

    pub(crate) fn report_progress(&mut self, done: usize, total: usize) {
        if let Some(callback) = self.progress.as_mut() {
            callback(percent(done, total));
        }
    }

    pub fn images_written(&self) -> usize {
        self.images_written
    }

    pub(crate) fn stream(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Appends a grayscale image described by `ifd`
    ///
    /// `ifd` must carry ImageWidth and ImageLength; the writer fills in the
    /// structural tags and keeps any other tag it finds.
    ///
    /// # Arguments
    /// * `ifd` - Tags of the new image
    /// * `samples` - Row-major pixels, `width * height` of them
    ///
    /// # Returns
    /// `MissingRequiredTags` or `InvalidImageParameters` when the image
    /// cannot be described, otherwise nothing
    pub fn add_grayscale_image(&mut self, ifd: IFD, samples: &Samples) -> TiffResult<()> {
        let layout = PlaneLayout::Grayscale(samples.sample_type());
        self.add_image(ifd, &layout, |strips, writer, width, height| {
            strips.write_gray_plane(writer, samples, width, height)
        })
    }

    /// Appends a palette-color image; the photometric tag is forced to palette
    ///
    /// # Arguments
    /// * `ifd` - Tags of the new image
    /// * `samples` - Row-major palette indices
    /// * `colormap` - Palette written as the ColorMap tag
    pub fn add_palette_image(&mut self, ifd: IFD, samples: &Samples, colormap: &Colormap) -> TiffResult<()> {
        let layout = PlaneLayout::Palette(samples.sample_type(), colormap.clone());
        self.add_image(ifd, &layout, |strips, writer, width, height| {
            strips.write_gray_plane(writer, samples, width, height)
        })
    }

    /// Appends an 8-bit RGB image, stored chunky
    pub fn add_rgb_image(&mut self, ifd: IFD, planes: &RgbPlanes) -> TiffResult<()> {
        self.add_image(ifd, &PlaneLayout::Rgb, |strips, writer, width, height| {
            strips.write_rgb_plane(writer, planes, width, height)
        })
    }

    fn add_image<F>(&mut self, mut ifd: IFD, layout: &PlaneLayout, write_plane: F) -> TiffResult<()>
    where
        F: FnOnce(&mut StripWriter, &mut W, u32, u32) -> TiffResult<()>,
    {
        let (width, height) = image_size(&ifd)?;
        let kind = prepare_image_tags(&mut ifd, layout, &self.options);

        let start = self.begin_image_data(&mut ifd, layout.plane_bytes(width, height), height)?;
        ifd.check_required_tags(kind)?;

        let mut strips = StripWriter::new(self.options);
        write_plane(&mut strips, &mut self.writer, width, height)?;
        strips.table().apply(&mut ifd);
        self.report_progress(1, 1);

        debug!("{:?} image {}x{} data at {}", kind, width, height, start);
        self.write_directory(&ifd, &NoExtensions)?;
        Ok(())
    }

    /// Aligns the stream and records a provisional single-strip table
    pub(crate) fn begin_image_data(&mut self, ifd: &mut IFD, plane_bytes: usize, height: u32) -> TiffResult<u64> {
        let start = write_utils::write_padding(&mut self.writer)?;
        ifd.force_insert(tags::STRIP_OFFSETS, TiffValue::long(offset_u32(start)?));
        ifd.force_insert(tags::STRIP_BYTE_COUNTS, TiffValue::long(offset_u32(plane_bytes as u64)?));
        ifd.force_insert(tags::ROWS_PER_STRIP, TiffValue::long(height));
        Ok(start)
    }

    /// Writes an IFD and links it into the chain
    ///
    /// Returns the directory's file offset.
    pub(crate) fn write_directory(&mut self, ifd: &IFD, extensions: &dyn ExtensionEncoder) -> TiffResult<u64> {
        let handler = LittleEndianHandler;
        let ifd_pos = write_utils::write_padding(&mut self.writer)?;
        write_utils::patch_u32(&mut self.writer, self.next_ifd_slot, offset_u32(ifd_pos)?)?;

        let extension_tags = extensions.extension_tags();
        let entries: Vec<_> = ifd
            .entries()
            .iter()
            .filter(|entry| !extension_tags.contains(&entry.tag))
            .collect();
        let entry_count = entries.len() + extension_tags.len();
        let count = u16::try_from(entry_count)
            .map_err(|_| TiffError::InvalidMetadata(format!("{} entries do not fit one IFD", entry_count)))?;

        // First pass: layout
        let table_len = 2 + 12 * entry_count as u64 + 4;
        let mut cursor = ifd_pos + table_len;
        let mut records = Vec::with_capacity(entry_count);
        let mut blocks: Vec<Vec<u8>> = Vec::new();

        for entry in entries {
            let bytes = entry.value.to_bytes(&handler)?;
            let mut slot = [0u8; 4];
            if bytes.len() <= 4 {
                slot[..bytes.len()].copy_from_slice(&bytes);
            } else {
                slot = offset_u32(cursor)?.to_le_bytes();
                cursor += bytes.len() as u64;
                blocks.push(bytes);
            }
            records.push(Record {
                tag: entry.tag,
                field_type: entry.field_type().code(),
                count: entry.count() as u32,
                slot,
            });
        }

        for tag in extension_tags {
            let encoded = extensions.encode(tag, cursor)?;
            trace!("Extension tag {}: {} bytes at {}", tag, encoded.data.len(), cursor);
            cursor += encoded.data.len() as u64;
            records.push(Record {
                tag,
                field_type: encoded.field_type.code(),
                count: encoded.count,
                slot: encoded.slot.to_le_bytes(),
            });
            blocks.push(encoded.data);
        }
        records.sort_by_key(|record| record.tag);

        // Second pass: table, then values in layout order
        self.writer.write_all(&count.to_le_bytes())?;
        for record in &records {
            self.writer.write_all(&record.tag.to_le_bytes())?;
            self.writer.write_all(&record.field_type.to_le_bytes())?;
            self.writer.write_all(&record.count.to_le_bytes())?;
            self.writer.write_all(&record.slot)?;
        }
        let next_slot = ifd_pos + table_len - 4;
        self.writer.write_all(&[0u8; 4])?;
        write_utils::check_position(&mut self.writer, ifd_pos + table_len)?;

        for block in &blocks {
            self.writer.write_all(block)?;
        }
        write_utils::check_position(&mut self.writer, cursor)?;

        self.next_ifd_slot = next_slot;
        self.images_written += 1;
        debug!("IFD #{} at {}: {} entries, {} bytes", self.images_written - 1, ifd_pos, entry_count, cursor - ifd_pos);
        Ok(ifd_pos)
    }

    /// Flushes and returns the underlying stream
    ///
    /// # Returns
    /// The inner stream, positioned at the end of the last IFD
    pub fn finish(mut self) -> TiffResult<W> {
        self.writer.flush()?;
        info!("Finished TIFF with {} images", self.images_written);
        Ok(self.writer)
    }
}

pub(crate) fn image_size(ifd: &IFD) -> TiffResult<(u32, u32)> {
    match ifd.get_dimensions() {
        Some((width, height)) if width > 0 && height > 0 => Ok((width, height)),
        Some((width, height)) => Err(TiffError::InvalidImageParameters(format!(
            "image size {}x{}",
            width, height
        ))),
        None => Err(TiffError::MissingRequiredTags(
            [tags::IMAGE_WIDTH, tags::IMAGE_LENGTH]
                .into_iter()
                .filter(|tag| !ifd.has_tag(*tag))
                .collect(),
        )),
    }
}

pub(crate) fn offset_u32(value: u64) -> TiffResult<u32> {
    u32::try_from(value)
        .map_err(|_| TiffError::InvalidImageParameters(format!("offset {} exceeds the 4 GiB TIFF limit", value)))
}

/// Sets the structural tags of `layout` and returns the image kind
///
/// Photometric is inserted for grayscale and RGB and forced for palette
/// images. Resolution tags default to 1/1 without unit when absent.
pub(crate) fn prepare_image_tags(ifd: &mut IFD, layout: &PlaneLayout, options: &WriteOptions) -> ImageKind {
    let (kind, samples_per_pixel) = match layout {
        PlaneLayout::Grayscale(sample_type) => {
            ifd.insert(tags::PHOTOMETRIC_INTERPRETATION, TiffValue::short(photometric::BLACK_IS_ZERO));
            set_sample_tags(ifd, *sample_type);
            (ImageKind::Grayscale, 1)
        }
        PlaneLayout::Palette(sample_type, colormap) => {
            ifd.force_insert(tags::PHOTOMETRIC_INTERPRETATION, TiffValue::short(photometric::PALETTE));
            ifd.set_colormap(colormap);
            set_sample_tags(ifd, *sample_type);
            (ImageKind::Palette, 1)
        }
        PlaneLayout::Rgb => {
            ifd.insert(tags::PHOTOMETRIC_INTERPRETATION, TiffValue::short(photometric::RGB));
            ifd.force_insert(tags::PLANAR_CONFIGURATION, TiffValue::short(planar_config::CHUNKY));
            ifd.force_insert(tags::BITS_PER_SAMPLE, TiffValue::Short(vec![8, 8, 8]));
            ifd.set_sample_format(SampleType::U8);
            (ImageKind::Rgb, 3)
        }
    };

    ifd.insert(tags::X_RESOLUTION, TiffValue::rational(1, 1));
    ifd.insert(tags::Y_RESOLUTION, TiffValue::rational(1, 1));
    ifd.insert(tags::RESOLUTION_UNIT, TiffValue::short(resolution_unit::NONE));
    ifd.force_insert(tags::SAMPLES_PER_PIXEL, TiffValue::short(samples_per_pixel));
    ifd.force_insert(tags::COMPRESSION, TiffValue::short(options.compression_code()));
    ifd.force_insert(tags::PREDICTOR, TiffValue::short(options.predictor()));
    kind
}

fn set_sample_tags(ifd: &mut IFD, sample_type: SampleType) {
    ifd.force_insert(tags::BITS_PER_SAMPLE, TiffValue::short(sample_type.bits()));
    ifd.set_sample_format(sample_type);
}
