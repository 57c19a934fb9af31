//! STK stack writer
//!
//! A stack is written plane by plane: `prepare` stages the directory and
//! fixes the pixel layout, `write_plane` appends pixel data, and `finalize`
//! records the strip table and writes the IFD with the UIC blocks. The
//! whole-stack helpers run the three steps in one call.

use log::{debug, info};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::compression::CompressionMethod;
use crate::io::seekable::SeekableWriter;
use crate::raster::{Colormap, RgbPlanes, Samples, StripWriter, WriteOptions};
use crate::stk::codec::StkEncoder;
use crate::stk::directory::StkDirectory;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::writer::{image_size, prepare_image_tags, PlaneLayout, TiffWriter};
use crate::utils::progress::ProgressCallback;

/// Stack staged by `prepare`
struct PendingStack {
    directory: StkDirectory,
    layout: PlaneLayout,
    width: u32,
    height: u32,
    strips: StripWriter,
}

fn no_stack() -> TiffError {
    TiffError::GenericError("no stack prepared".to_string())
}

/// Writer for MetaMorph STK stacks
pub struct StkWriter<W: SeekableWriter> {
    tiff: TiffWriter<W>,
    pending: Option<PendingStack>,
}

impl StkWriter<BufWriter<File>> {
    /// Creates an uncompressed STK file
    pub fn create<P: AsRef<Path>>(path: P) -> TiffResult<Self> {
        Ok(StkWriter {
            tiff: TiffWriter::create_with_options(path, WriteOptions::uncompressed())?,
            pending: None,
        })
    }
}

impl<W: SeekableWriter> StkWriter<W> {
    pub fn new(writer: W) -> TiffResult<Self> {
        Self::with_options(writer, WriteOptions::uncompressed())
    }

    pub fn with_options(writer: W, options: WriteOptions) -> TiffResult<Self> {
        Ok(StkWriter {
            tiff: TiffWriter::with_options(writer, options)?,
            pending: None,
        })
    }

    pub fn options(&self) -> &WriteOptions {
        self.tiff.options()
    }

    /// Applies to the next stack; a stack already prepared keeps its options
    pub fn set_options(&mut self, options: WriteOptions) {
        self.tiff.set_options(options);
    }

    /// Switches compression, with differencing on for LZW only
    pub fn set_compression(&mut self, method: CompressionMethod) {
        let options = self.tiff.options().with_compression(method);
        self.tiff.set_options(options);
    }

    pub fn on_progress(&mut self, callback: ProgressCallback) {
        self.tiff.on_progress(callback);
    }

    /// Stages a stack of `directory.num_planes()` planes
    ///
    /// Sets the structural tags, aligns the stream and checks that the
    /// directory can be written before any pixel data goes out.
    ///
    /// # Arguments
    /// * `directory` - Image tags and per-plane metadata of the stack
    /// * `layout` - Sample layout every plane must follow
    ///
    /// # Returns
    /// `InvalidMetadata` for an inconsistent UIC2 block, an error if another
    /// stack is still pending, otherwise nothing
    pub fn prepare(&mut self, mut directory: StkDirectory, layout: PlaneLayout) -> TiffResult<()> {
        if self.pending.is_some() {
            return Err(TiffError::GenericError(
                "a stack is already prepared; finalize it first".to_string(),
            ));
        }
        let (width, height) = image_size(directory.ifd())?;
        if directory.num_planes() == 0 {
            return Err(TiffError::InvalidImageParameters("stack has no planes".to_string()));
        }

        let options = *self.tiff.options();
        let ifd = directory.ifd_mut();
        let kind = prepare_image_tags(ifd, &layout, &options);
        self.tiff
            .begin_image_data(ifd, layout.plane_bytes(width, height), height)?;
        ifd.check_required_tags(kind)?;
        if !directory.valid_uic2() {
            return Err(TiffError::InvalidMetadata(
                "UIC2 arrays do not match the plane count".to_string(),
            ));
        }

        debug!(
            "Prepared {:?} stack {}x{} with {} planes",
            kind,
            width,
            height,
            directory.num_planes()
        );
        self.pending = Some(PendingStack {
            directory,
            layout,
            width,
            height,
            strips: StripWriter::new(options),
        });
        Ok(())
    }

    /// Appends a grayscale or palette-index plane
    ///
    /// # Arguments
    /// * `samples` - Row-major pixels; the sample type must match the prepared layout
    pub fn write_plane(&mut self, samples: &Samples) -> TiffResult<()> {
        let stack = self.pending.as_mut().ok_or_else(no_stack)?;
        if matches!(stack.layout, PlaneLayout::Rgb) || stack.layout.sample_type() != samples.sample_type() {
            return Err(TiffError::InvalidImageParameters(format!(
                "{} samples do not match the prepared {:?} layout",
                samples.sample_type(),
                stack.layout
            )));
        }
        stack
            .strips
            .write_gray_plane(self.tiff.stream(), samples, stack.width, stack.height)?;
        self.plane_done()
    }

    /// Appends an RGB plane
    pub fn write_rgb_plane(&mut self, planes: &RgbPlanes) -> TiffResult<()> {
        let stack = self.pending.as_mut().ok_or_else(no_stack)?;
        if !matches!(stack.layout, PlaneLayout::Rgb) {
            return Err(TiffError::InvalidImageParameters(format!(
                "RGB plane does not match the prepared {:?} layout",
                stack.layout
            )));
        }
        stack
            .strips
            .write_rgb_plane(self.tiff.stream(), planes, stack.width, stack.height)?;
        self.plane_done()
    }

    fn plane_done(&mut self) -> TiffResult<()> {
        let stack = self.pending.as_ref().ok_or_else(no_stack)?;
        let (done, total) = (stack.strips.planes_written(), stack.directory.num_planes());
        self.tiff.report_progress(done, total);
        Ok(())
    }

    /// Writes the IFD of the prepared stack
    ///
    /// The directory's plane count follows the number of planes actually
    /// written: missing planes are dropped from the end, extra planes get
    /// default metadata.
    ///
    /// # Returns
    /// An error when no stack is pending or no plane was written
    pub fn finalize(&mut self) -> TiffResult<()> {
        let stack = self.pending.take().ok_or_else(no_stack)?;
        let PendingStack {
            mut directory, strips, ..
        } = stack;

        let written = strips.planes_written();
        if written == 0 {
            return Err(TiffError::InvalidImageParameters("no planes were written".to_string()));
        }
        while directory.num_planes() < written {
            directory.add_plane();
        }
        while directory.num_planes() > written {
            let last = directory.num_planes() - 1;
            directory.remove_plane(last);
        }

        strips.table().apply(directory.ifd_mut());
        let offset = self
            .tiff
            .write_directory(directory.ifd(), &StkEncoder::new(&directory))?;
        info!("Wrote STK directory for {} planes at {}", written, offset);
        Ok(())
    }

    fn check_stack_len(directory: &StkDirectory, len: usize) -> TiffResult<()> {
        if len == 0 || len != directory.num_planes() {
            return Err(TiffError::InvalidImageParameters(format!(
                "{} planes given for a directory of {}",
                len,
                directory.num_planes()
            )));
        }
        Ok(())
    }

    /// Writes a whole grayscale stack; all planes share one sample type
    ///
    /// # Arguments
    /// * `directory` - Stack metadata; its plane count must equal `planes.len()`
    /// * `planes` - One sample buffer per plane
    pub fn write_grayscale_stack(&mut self, directory: StkDirectory, planes: &[Samples]) -> TiffResult<()> {
        Self::check_stack_len(&directory, planes.len())?;
        let sample_type = planes.first().map(Samples::sample_type).ok_or_else(no_stack)?;
        self.prepare(directory, PlaneLayout::Grayscale(sample_type))?;
        for plane in planes {
            self.write_plane(plane)?;
        }
        self.finalize()
    }

    pub fn write_rgb_stack(&mut self, directory: StkDirectory, planes: &[RgbPlanes]) -> TiffResult<()> {
        Self::check_stack_len(&directory, planes.len())?;
        self.prepare(directory, PlaneLayout::Rgb)?;
        for plane in planes {
            self.write_rgb_plane(plane)?;
        }
        self.finalize()
    }

    /// Writes a stack of palette indices sharing one colormap
    ///
    /// # Arguments
    /// * `directory` - Stack metadata; its plane count must equal `planes.len()`
    /// * `planes` - One index buffer per plane
    /// * `colormap` - Palette stored in the ColorMap tag
    pub fn write_palette_stack(
        &mut self,
        directory: StkDirectory,
        planes: &[Samples],
        colormap: &Colormap,
    ) -> TiffResult<()> {
        Self::check_stack_len(&directory, planes.len())?;
        let sample_type = planes.first().map(Samples::sample_type).ok_or_else(no_stack)?;
        self.prepare(directory, PlaneLayout::Palette(sample_type, colormap.clone()))?;
        for plane in planes {
            self.write_plane(plane)?;
        }
        self.finalize()
    }

    /// Finalizes a pending stack, flushes and returns the stream
    pub fn finish(mut self) -> TiffResult<W> {
        if self.pending.is_some() {
            self.finalize()?;
        }
        self.tiff.finish()
    }
}
