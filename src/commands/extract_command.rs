//! Plane extraction command
//!
//! Exports one plane of a stack, or one image of a TIFF chain, to any
//! format the `image` crate can write (PNG by default).

use clap::ArgMatches;
use image::{DynamicImage, ImageBuffer, Luma, Rgb};
use log::{debug, info};

use crate::commands::command_traits::Command;
use crate::commands::required_arg;
use crate::raster::{Colormap, RgbPlanes, Samples};
use crate::stk::{is_stack, StkReader, StkSchema};
use crate::tiff::constants::photometric;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::TiffReader;

/// Command for extracting one plane as an image file
pub struct ExtractCommand {
    /// Path to the input file
    input_file: String,
    /// Path to the output file
    output_file: String,
    /// Stack plane, or image index for plain TIFF files
    plane: usize,
}

impl ExtractCommand {
    /// Create a new extract command
    pub fn new(args: &ArgMatches) -> TiffResult<Self> {
        let input_file = required_arg(args, "input", "input file")?;
        let output_file = required_arg(args, "output", "output file path for extraction")?;
        let plane = match args.get_one::<String>("plane") {
            Some(text) => text
                .parse::<usize>()
                .map_err(|_| TiffError::GenericError(format!("Invalid plane index: {}", text)))?,
            None => 0,
        };

        Ok(ExtractCommand {
            input_file,
            output_file,
            plane,
        })
    }
}

impl Command for ExtractCommand {
    fn execute(&self) -> TiffResult<()> {
        info!("Extracting plane {} of {} to {}", self.plane, self.input_file, self.output_file);

        let image = extract_plane(&self.input_file, self.plane)?;
        image
            .save(&self.output_file)
            .map_err(|e| TiffError::GenericError(format!("Failed to save {}: {}", self.output_file, e)))?;

        info!("Saved {}x{} image to {}", image.width(), image.height(), self.output_file);
        Ok(())
    }
}

/// Decoded pixels of one plane
enum PlanePixels {
    Gray(Samples),
    Rgb(RgbPlanes),
    Palette(Samples, Colormap),
}

/// Reads plane `plane` of `path` as an image
pub fn extract_plane(path: &str, plane: usize) -> TiffResult<DynamicImage> {
    let reader = TiffReader::open_with_schema(path, Box::new(StkSchema))?;

    let (width, height, pixels) = if is_stack(&reader) {
        let mut stk = StkReader::from_tiff(reader)?;
        let (width, height) = stk.dimensions();
        let pixels = match stk.raster_info().photometric {
            photometric::RGB => PlanePixels::Rgb(stk.read_rgb_plane(plane)?),
            photometric::PALETTE => {
                let (samples, colormap) = stk.read_palette_plane(plane)?;
                PlanePixels::Palette(samples, colormap)
            }
            _ => PlanePixels::Gray(stk.read_gray_plane(plane)?),
        };
        (width, height, pixels)
    } else {
        let mut tiff = reader;
        let info = tiff.raster_info(plane)?;
        let pixels = match info.photometric {
            photometric::RGB => PlanePixels::Rgb(tiff.read_rgb(plane)?),
            photometric::PALETTE => {
                let (samples, colormap) = tiff.read_palette(plane)?;
                PlanePixels::Palette(samples, colormap)
            }
            _ => PlanePixels::Gray(tiff.read_grayscale(plane)?),
        };
        (info.width, info.height, pixels)
    };

    to_image(width, height, pixels)
}

fn to_image(width: u32, height: u32, pixels: PlanePixels) -> TiffResult<DynamicImage> {
    let size_error = || TiffError::InvalidImageInfo(format!("pixel count does not match {}x{}", width, height));

    match pixels {
        PlanePixels::Gray(Samples::U8(data)) => ImageBuffer::<Luma<u8>, _>::from_raw(width, height, data)
            .map(DynamicImage::ImageLuma8)
            .ok_or_else(size_error),
        PlanePixels::Gray(Samples::U16(data)) => ImageBuffer::<Luma<u16>, _>::from_raw(width, height, data)
            .map(DynamicImage::ImageLuma16)
            .ok_or_else(size_error),
        PlanePixels::Gray(samples) => {
            let data = stretch_to_u16(&samples);
            ImageBuffer::<Luma<u16>, _>::from_raw(width, height, data)
                .map(DynamicImage::ImageLuma16)
                .ok_or_else(size_error)
        }
        PlanePixels::Rgb(planes) => ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, planes.interleave())
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(size_error),
        PlanePixels::Palette(samples, colormap) => {
            let entries = colormap.entries();
            let indices: Vec<usize> = match &samples {
                Samples::U8(v) => v.iter().map(|x| *x as usize).collect(),
                Samples::U16(v) => v.iter().map(|x| *x as usize).collect(),
                Samples::U32(v) => v.iter().map(|x| *x as usize).collect(),
                Samples::F32(v) => v.iter().map(|x| x.max(0.0) as usize).collect(),
            };
            let mut rgb = Vec::with_capacity(indices.len() * 3);
            for index in indices {
                let entry = entries.get(index).copied().unwrap_or([0, 0, 0]);
                rgb.extend_from_slice(&entry);
            }
            ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, rgb)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(size_error)
        }
    }
}

/// Linearly maps 32-bit samples onto the full 16-bit range
fn stretch_to_u16(samples: &Samples) -> Vec<u16> {
    let values: Vec<f64> = match samples {
        Samples::U8(v) => v.iter().map(|x| *x as f64).collect(),
        Samples::U16(v) => v.iter().map(|x| *x as f64).collect(),
        Samples::U32(v) => v.iter().map(|x| *x as f64).collect(),
        Samples::F32(v) => v.iter().map(|x| *x as f64).collect(),
    };
    let finite = values.iter().copied().filter(|v| v.is_finite());
    let min = finite.clone().fold(f64::INFINITY, f64::min);
    let max = finite.fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    debug!("Stretching samples from [{}, {}]", min, max);

    values
        .iter()
        .map(|v| {
            if !v.is_finite() || !(range > 0.0) {
                0
            } else {
                (((v - min) / range) * u16::MAX as f64).round() as u16
            }
        })
        .collect()
}
