//! TIFF file reader implementation
//!
//! Parses the header and the IFD chain up front, then decodes pixel data
//! on request. Byte order is handled by a `ByteOrderHandler` strategy; tags
//! claimed by the active `TagSchema` are kept as raw records for an
//! extension codec instead of being decoded.

use log::{debug, info, trace, warn};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Cursor, SeekFrom};
use std::path::Path;

use crate::io::byte_order::{ByteOrder, ByteOrderHandler};
use crate::io::seekable::SeekableReader;
use crate::raster::{Colormap, RasterInfo, ReadOptions, RgbPlanes, Samples, StripReader};
use crate::tiff::constants::{header, tags};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::{RawEntry, IFD};
use crate::tiff::schema::{BaseSchema, TagSchema};
use crate::tiff::types::{TiffType, TiffValue, TIFF};
use crate::tiff::validation;
use crate::utils::tag_utils;

/// Size of one directory record
const ENTRY_SIZE: u64 = 12;

/// One undecoded 12-byte directory record
struct EntryRecord {
    tag: u16,
    field_type: u16,
    count: u32,
    slot: [u8; 4],
}

/// Reader for TIFF files and the formats layered on them
pub struct TiffReader<R: SeekableReader> {
    reader: R,
    byte_order: ByteOrder,
    handler: Box<dyn ByteOrderHandler>,
    schema: Box<dyn TagSchema>,
    ifds: Vec<IFD>,
    /// Raw extension records per IFD, parallel to `ifds`
    extensions: Vec<Vec<RawEntry>>,
    options: ReadOptions,
    file_size: u64,
}

impl TiffReader<BufReader<File>> {
    /// Opens and parses a TIFF file
    ///
    /// # Arguments
    /// * `path` - Path to the TIFF file
    ///
    /// # Returns
    /// A reader holding the parsed IFD chain
    pub fn open<P: AsRef<Path>>(path: P) -> TiffResult<Self> {
        Self::open_with_schema(path, Box::new(BaseSchema))
    }

    /// Opens a file, leaving the extension tags of `schema` undecoded
    ///
    /// # Arguments
    /// * `path` - Path to the file
    /// * `schema` - Decides which tags are kept as raw records
    ///
    /// # Returns
    /// A reader whose extension records are available through `extension_entries`
    pub fn open_with_schema<P: AsRef<Path>>(path: P, schema: Box<dyn TagSchema>) -> TiffResult<Self> {
        info!("Loading {} file: {}", schema.name(), path.as_ref().display());
        let file = File::open(path)?;
        let reader = BufReader::with_capacity(1024 * 1024, file); // 1MB buffer
        Self::with_schema(reader, schema)
    }
}

impl<R: SeekableReader> TiffReader<R> {
    /// Parses a TIFF stream with the plain schema
    pub fn new(reader: R) -> TiffResult<Self> {
        Self::with_schema(reader, Box::new(BaseSchema))
    }

    /// Parses a TIFF stream, deferring the schema's extension tags
    ///
    /// The header is validated and the whole IFD chain is read before this
    /// returns; pixel data is decoded later, on request.
    ///
    /// # Arguments
    /// * `reader` - Any stream implementing `SeekableReader`
    /// * `schema` - Decides which tags are kept as raw records
    ///
    /// # Returns
    /// The reader, or `NotATiffFile` when the header or first IFD is unusable
    pub fn with_schema(mut reader: R, schema: Box<dyn TagSchema>) -> TiffResult<Self> {
        let file_size = validation::get_file_size(&mut reader)?;
        let (byte_order, first_offset) = Self::read_header(&mut reader, file_size)?;

        let mut tiff_reader = TiffReader {
            reader,
            byte_order,
            handler: byte_order.create_handler(),
            schema,
            ifds: Vec::new(),
            extensions: Vec::new(),
            options: ReadOptions::default(),
            file_size,
        };
        tiff_reader.read_ifd_chain(first_offset)?;

        info!(
            "Read {} IFDs ({}, {})",
            tiff_reader.ifds.len(),
            tiff_reader.byte_order.name(),
            tiff_reader.schema.name()
        );
        Ok(tiff_reader)
    }

    /// Validates the 8-byte header and returns the first IFD offset
    fn read_header(reader: &mut R, file_size: u64) -> TiffResult<(ByteOrder, u64)> {
        if file_size < header::HEADER_SIZE {
            return Err(TiffError::NotATiffFile(format!("{} bytes is too short for a header", file_size)));
        }
        reader.seek(SeekFrom::Start(0))?;

        let byte_order = match ByteOrder::detect(reader) {
            Ok(order) => order,
            Err(TiffError::InvalidByteOrder(marker)) => {
                return Err(TiffError::NotATiffFile(format!("bad byte order marker {:#06x}", marker)));
            }
            Err(e) => return Err(e),
        };
        let handler = byte_order.create_handler();

        let magic = handler.read_u16(reader)?;
        if magic != header::TIFF_MAGIC {
            return Err(TiffError::NotATiffFile(format!("bad magic number {}", magic)));
        }

        let first_offset = handler.read_u32(reader)? as u64;
        validation::validate_first_ifd_offset(first_offset, file_size)?;
        debug!("{} header, first IFD at {}", byte_order.name(), first_offset);
        Ok((byte_order, first_offset))
    }

    /// Follows the chain until a zero offset, a revisited offset or an error
    ///
    /// A failure on the first IFD is returned; later failures end the chain
    /// and keep what was read.
    fn read_ifd_chain(&mut self, first_offset: u64) -> TiffResult<()> {
        let mut visited = HashSet::new();
        let mut offset = first_offset;

        while offset != 0 {
            if !visited.insert(offset) {
                warn!("IFD offset {} already visited, stopping IFD chain", offset);
                break;
            }
            if offset >= self.file_size {
                warn!("IFD offset {} exceeds file size {}, stopping IFD chain", offset, self.file_size);
                break;
            }

            let number = self.ifds.len();
            match self.read_ifd(offset, number) {
                Ok((ifd, raw, next)) => {
                    debug!("IFD #{} at {}: {} entries, next {}", number, offset, ifd.entry_count(), next);
                    self.ifds.push(ifd);
                    self.extensions.push(raw);
                    offset = next;
                }
                Err(e) if number == 0 => return Err(e),
                Err(e) => {
                    warn!("Error reading IFD {}: {}", number, e);
                    break;
                }
            }
        }
        Ok(())
    }

    /// Reads one IFD, returning it with its raw extension records and the next offset
    fn read_ifd(&mut self, offset: u64, number: usize) -> TiffResult<(IFD, Vec<RawEntry>, u64)> {
        self.reader.seek(SeekFrom::Start(offset))?;
        let entry_count = self.handler.read_u16(&mut self.reader)?;
        if entry_count == 0 {
            return Err(TiffError::NotATiffFile(format!("IFD at {} has no entries", offset)));
        }
        validation::validate_extent(offset, 2 + ENTRY_SIZE * entry_count as u64 + 4, self.file_size)?;

        let mut records = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            records.push(self.read_entry_record()?);
        }
        let next = self.handler.read_u32(&mut self.reader)? as u64;

        let mut ifd = IFD::new(number, offset);
        let mut raw = Vec::new();
        for record in records {
            if self.schema.is_extension_tag(record.tag) {
                let entry = RawEntry {
                    tag: record.tag,
                    field_type: record.field_type,
                    count: record.count,
                    offset: self.handler.read_u32(&mut Cursor::new(record.slot))?,
                };
                trace!("Deferred extension tag {} ({})", record.tag, tag_utils::get_tag_name(record.tag));
                raw.push(entry);
                continue;
            }

            match self.read_entry_value(&record) {
                Ok(value) => {
                    ifd.force_insert(record.tag, value);
                }
                Err(e) => warn!(
                    "Dropping tag {} ({}) in IFD #{}: {}",
                    record.tag,
                    tag_utils::get_tag_name(record.tag),
                    number,
                    e
                ),
            }
        }

        Ok((ifd, raw, next))
    }

    fn read_entry_record(&mut self) -> TiffResult<EntryRecord> {
        let tag = self.handler.read_u16(&mut self.reader)?;
        let field_type = self.handler.read_u16(&mut self.reader)?;
        let count = self.handler.read_u32(&mut self.reader)?;
        let mut slot = [0u8; 4];
        self.reader.read_exact(&mut slot)?;
        Ok(EntryRecord {
            tag,
            field_type,
            count,
            slot,
        })
    }

    /// Decodes a record's value, inline or from its offset
    fn read_entry_value(&mut self, record: &EntryRecord) -> TiffResult<TiffValue> {
        let ty = TiffType::from_code(record.field_type)?;
        let count = record.count as usize;
        let byte_len = (record.count as u64) * ty.width() as u64;

        if byte_len <= 4 {
            return TiffValue::read(ty, count, &mut Cursor::new(record.slot), self.handler.as_ref());
        }

        let offset = self.handler.read_u32(&mut Cursor::new(record.slot))? as u64;
        validation::validate_extent(offset, byte_len, self.file_size)?;
        self.reader.seek(SeekFrom::Start(offset))?;
        TiffValue::read(ty, count, &mut self.reader, self.handler.as_ref())
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn schema_name(&self) -> &'static str {
        self.schema.name()
    }

    pub fn image_count(&self) -> usize {
        self.ifds.len()
    }

    pub fn ifds(&self) -> &[IFD] {
        &self.ifds
    }

    /// Gets an IFD of the chain
    ///
    /// # Arguments
    /// * `index` - Position in the chain, starting at 0
    ///
    /// # Returns
    /// The IFD, or `ImageIndexOutOfRange`
    pub fn ifd(&self, index: usize) -> TiffResult<&IFD> {
        self.ifds.get(index).ok_or(TiffError::ImageIndexOutOfRange {
            index,
            count: self.ifds.len(),
        })
    }

    /// Raw records of the extension tags found in IFD `index`
    pub fn extension_entries(&self, index: usize) -> &[RawEntry] {
        self.extensions.get(index).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Snapshot of the parsed directory chain
    pub fn to_tiff(&self) -> TIFF {
        TIFF {
            ifds: self.ifds.clone(),
            byte_order: self.byte_order,
        }
    }

    pub fn options(&self) -> &ReadOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: ReadOptions) {
        self.options = options;
    }

    /// Stream and byte order handler, for extension codecs
    pub(crate) fn stream_parts(&mut self) -> (&mut dyn SeekableReader, &dyn ByteOrderHandler) {
        (&mut self.reader, self.handler.as_ref())
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    pub fn dimensions(&self, index: usize) -> TiffResult<(u32, u32)> {
        self.ifd(index)?
            .get_dimensions()
            .ok_or_else(|| TiffError::InvalidImageInfo(format!("IFD #{} has no image size", index)))
    }

    pub fn raster_info(&self, index: usize) -> TiffResult<RasterInfo> {
        RasterInfo::from_ifd(self.ifd(index)?)
    }

    pub(crate) fn read_gray_plane(&mut self, info: &RasterInfo, plane: usize, plane_count: usize) -> TiffResult<Samples> {
        let mut strips = StripReader::new(&mut self.reader, info, self.byte_order, self.options)?;
        strips.read_gray_plane(plane, plane_count)
    }

    pub(crate) fn read_rgb_plane(&mut self, info: &RasterInfo, plane: usize, plane_count: usize) -> TiffResult<RgbPlanes> {
        let mut strips = StripReader::new(&mut self.reader, info, self.byte_order, self.options)?;
        strips.read_rgb_plane(plane, plane_count)
    }

    /// Pixel data of a grayscale image in row-major order
    ///
    /// # Arguments
    /// * `index` - Image index in the chain
    ///
    /// # Returns
    /// Samples typed after BitsPerSample and SampleFormat, predictor undone
    pub fn read_grayscale(&mut self, index: usize) -> TiffResult<Samples> {
        let info = self.raster_info(index)?;
        self.read_gray_plane(&info, 0, 1)
    }

    /// Channels of an 8-bit RGB image
    pub fn read_rgb(&mut self, index: usize) -> TiffResult<RgbPlanes> {
        let info = self.raster_info(index)?;
        self.read_rgb_plane(&info, 0, 1)
    }

    /// Palette of an indexed-color image
    pub fn colormap(&self, index: usize) -> TiffResult<Colormap> {
        let ifd = self.ifd(index)?;
        let bits = ifd
            .get_tag_value(tags::BITS_PER_SAMPLE)
            .ok_or(TiffError::TagNotFound(tags::BITS_PER_SAMPLE))?;
        let table = ifd.get(tags::COLOR_MAP).ok_or(TiffError::TagNotFound(tags::COLOR_MAP))?;
        Colormap::from_tiff_value(table, bits)
    }

    /// Index plane and palette; an unreadable palette becomes a gray ramp
    ///
    /// # Arguments
    /// * `index` - Image index in the chain
    ///
    /// # Returns
    /// A tuple of the index samples and the colormap
    pub fn read_palette(&mut self, index: usize) -> TiffResult<(Samples, Colormap)> {
        let colormap = self.colormap(index).unwrap_or_else(|e| {
            warn!("Using identity colormap for IFD #{}: {}", index, e);
            Colormap::identity()
        });
        Ok((self.read_grayscale(index)?, colormap))
    }
}
