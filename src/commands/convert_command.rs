//! Compression conversion command
//!
//! Rewrites a TIFF or STK file with another compression scheme. Plain TIFF
//! files keep every image of their IFD chain; stacks keep their metadata.

use clap::ArgMatches;
use log::{debug, info};
use std::fs::File;
use std::io::BufWriter;

use crate::commands::command_traits::Command;
use crate::commands::required_arg;
use crate::compression::CompressionMethod;
use crate::io::seekable::SeekableReader;
use crate::raster::{Colormap, WriteOptions};
use crate::stk::{is_stack, StkReader, StkSchema, StkWriter};
use crate::tiff::constants::photometric;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::writer::PlaneLayout;
use crate::tiff::{TiffReader, TiffWriter};
use crate::utils::progress::{ProgressCallback, ProgressTracker};

/// Command for converting TIFF compression format
pub struct ConvertCommand {
    /// Path to the input file
    input_file: String,
    /// Path to the output file
    output_file: String,
    /// Target compression
    method: CompressionMethod,
}

impl ConvertCommand {
    /// Create a new convert command
    pub fn new(args: &ArgMatches) -> TiffResult<Self> {
        let input_file = required_arg(args, "input", "input file")?;
        let output_file = required_arg(args, "output", "output file path for conversion")?;
        let name = required_arg(args, "compression", "compression, use --compression")?;
        let method = CompressionMethod::from_name(&name)
            .ok_or_else(|| TiffError::GenericError(format!("Unknown compression: {}", name)))?;

        Ok(ConvertCommand {
            input_file,
            output_file,
            method,
        })
    }
}

impl Command for ConvertCommand {
    fn execute(&self) -> TiffResult<()> {
        info!(
            "Converting file {} to {} with {} compression",
            self.input_file, self.output_file, self.method
        );

        let tracker = ProgressTracker::new("Converting");
        convert_file(&self.input_file, &self.output_file, self.method, Some(tracker.callback()))?;
        tracker.finish();

        info!("Compression conversion successful");
        Ok(())
    }
}

/// Rewrites `input` to `output` with `method`
pub fn convert_file(
    input: &str,
    output: &str,
    method: CompressionMethod,
    progress: Option<ProgressCallback>,
) -> TiffResult<()> {
    let reader = TiffReader::open_with_schema(input, Box::new(StkSchema))?;
    let sink = BufWriter::new(File::create(output)?);

    if is_stack(&reader) {
        convert_stack(StkReader::from_tiff(reader)?, sink, method, progress)
    } else {
        convert_images(reader, sink, method, progress)
    }
}

fn convert_images<R: SeekableReader>(
    mut reader: TiffReader<R>,
    sink: BufWriter<File>,
    method: CompressionMethod,
    progress: Option<ProgressCallback>,
) -> TiffResult<()> {
    let options = WriteOptions::default().with_compression(method);
    let mut writer = TiffWriter::with_options(sink, options)?;
    if let Some(callback) = progress {
        writer.on_progress(callback);
    }

    for index in 0..reader.image_count() {
        let info = reader.raster_info(index)?;
        let ifd = reader.ifd(index)?.clone();
        debug!("Converting image #{} ({})", index, info.sample_type);

        match info.photometric {
            photometric::RGB => {
                let planes = reader.read_rgb(index)?;
                writer.add_rgb_image(ifd, &planes)?;
            }
            photometric::PALETTE => {
                let (samples, colormap) = reader.read_palette(index)?;
                writer.add_palette_image(ifd, &samples, &colormap)?;
            }
            _ => {
                let samples = reader.read_grayscale(index)?;
                writer.add_grayscale_image(ifd, &samples)?;
            }
        }
    }

    writer.finish()?;
    Ok(())
}

fn convert_stack<R: SeekableReader>(
    mut reader: StkReader<R>,
    sink: BufWriter<File>,
    method: CompressionMethod,
    progress: Option<ProgressCallback>,
) -> TiffResult<()> {
    let mut writer = StkWriter::new(sink)?;
    writer.set_compression(method);
    if let Some(callback) = progress {
        writer.on_progress(callback);
    }

    let info = reader.raster_info().clone();
    let layout = match info.photometric {
        photometric::RGB => PlaneLayout::Rgb,
        photometric::PALETTE => {
            let colormap = reader.colormap().unwrap_or_else(|_| Colormap::identity());
            PlaneLayout::Palette(info.sample_type, colormap)
        }
        _ => PlaneLayout::Grayscale(info.sample_type),
    };
    let rgb = matches!(layout, PlaneLayout::Rgb);

    writer.prepare(reader.directory().clone(), layout)?;
    for plane in 0..reader.num_planes() {
        if rgb {
            writer.write_rgb_plane(&reader.read_rgb_plane(plane)?)?;
        } else {
            writer.write_plane(&reader.read_gray_plane(plane)?)?;
        }
    }
    writer.finalize()?;
    writer.finish()?;
    Ok(())
}
