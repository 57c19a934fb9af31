//! STK stack reader
//!
//! Opens the file through the TIFF reader with the STK schema, decodes the
//! UIC blocks of the first IFD and serves planes by index.

use log::{info, warn};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::io::byte_order::ByteOrder;
use crate::io::seekable::SeekableReader;
use crate::raster::{Colormap, RasterInfo, ReadOptions, RgbPlanes, Samples};
use crate::stk::codec::{self, StkSchema};
use crate::stk::directory::StkDirectory;
use crate::tiff::errors::TiffResult;
use crate::tiff::constants::tags;
use crate::tiff::reader::TiffReader;

/// Whether the first IFD carries the UIC2 and UIC3 tags of a stack
///
/// Only meaningful for readers opened with `StkSchema`, which keeps those
/// tags as extension records.
pub fn is_stack<R: SeekableReader>(tiff: &TiffReader<R>) -> bool {
    let entries = tiff.extension_entries(0);
    [tags::UIC2, tags::UIC3]
        .iter()
        .all(|tag| entries.iter().any(|entry| entry.tag == *tag))
}

/// Reader for MetaMorph STK stacks
pub struct StkReader<R: SeekableReader> {
    tiff: TiffReader<R>,
    directory: StkDirectory,
    info: RasterInfo,
}

impl StkReader<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> TiffResult<Self> {
        let tiff = TiffReader::open_with_schema(path.as_ref(), Box::new(StkSchema))?;
        let reader = Self::from_tiff(tiff)?;
        info!(
            "Opened STK {} with {} planes",
            path.as_ref().display(),
            reader.num_planes()
        );
        Ok(reader)
    }
}

impl<R: SeekableReader> StkReader<R> {
    pub fn new(reader: R) -> TiffResult<Self> {
        Self::from_tiff(TiffReader::with_schema(reader, Box::new(StkSchema))?)
    }

    /// Decodes the stack metadata of a reader opened with `StkSchema`
    pub fn from_tiff(mut tiff: TiffReader<R>) -> TiffResult<Self> {
        let ifd = tiff.ifd(0)?.clone();
        let entries = tiff.extension_entries(0).to_vec();
        let (stream, handler) = tiff.stream_parts();
        let directory = codec::read_directory(stream, handler, ifd, &entries)?;
        let info = RasterInfo::from_ifd(directory.ifd())?;

        Ok(StkReader { tiff, directory, info })
    }

    pub fn directory(&self) -> &StkDirectory {
        &self.directory
    }

    pub fn into_directory(self) -> StkDirectory {
        self.directory
    }

    pub fn num_planes(&self) -> usize {
        self.directory.num_planes()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.info.width, self.info.height)
    }

    pub fn raster_info(&self) -> &RasterInfo {
        &self.info
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.tiff.byte_order()
    }

    pub fn options(&self) -> &ReadOptions {
        self.tiff.options()
    }

    pub fn set_options(&mut self, options: ReadOptions) {
        self.tiff.set_options(options);
    }

    /// Samples of grayscale plane `plane`
    pub fn read_gray_plane(&mut self, plane: usize) -> TiffResult<Samples> {
        let planes = self.num_planes();
        self.tiff.read_gray_plane(&self.info, plane, planes)
    }

    /// Channels of RGB plane `plane`
    pub fn read_rgb_plane(&mut self, plane: usize) -> TiffResult<RgbPlanes> {
        let planes = self.num_planes();
        self.tiff.read_rgb_plane(&self.info, plane, planes)
    }

    pub fn colormap(&self) -> TiffResult<Colormap> {
        self.tiff.colormap(0)
    }

    /// Index plane and palette; an unreadable palette becomes a gray ramp
    pub fn read_palette_plane(&mut self, plane: usize) -> TiffResult<(Samples, Colormap)> {
        let colormap = self.colormap().unwrap_or_else(|e| {
            warn!("Using identity colormap: {}", e);
            Colormap::identity()
        });
        Ok((self.read_gray_plane(plane)?, colormap))
    }
}
