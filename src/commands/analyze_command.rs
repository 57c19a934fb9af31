//! TIFF/STK structure analysis command
//!
//! This module implements the command for analyzing and displaying
//! the IFD chain of a TIFF file and, for stacks, the decoded STK metadata.

use clap::ArgMatches;
use log::{debug, info};
use std::fmt::Write as _;

use crate::commands::command_traits::Command;
use crate::commands::required_arg;
use crate::compression::CompressionFactory;
use crate::stk::uic::uic_name;
use crate::stk::{is_stack, StkReader, StkSchema};
use crate::tiff::constants::tags;
use crate::tiff::errors::TiffResult;
use crate::tiff::ifd::IFD;
use crate::tiff::TiffReader;
use crate::utils::tag_utils;

/// Command for analyzing TIFF file structure
pub struct AnalyzeCommand {
    /// Path to the input file
    input_file: String,
    /// List every tag, not just the summary
    verbose: bool,
}

impl AnalyzeCommand {
    /// Create a new analyze command
    pub fn new(args: &ArgMatches) -> TiffResult<Self> {
        Ok(AnalyzeCommand {
            input_file: required_arg(args, "input", "input file")?,
            verbose: args.get_count("verbose") > 0,
        })
    }
}

impl Command for AnalyzeCommand {
    fn execute(&self) -> TiffResult<()> {
        info!("Analyzing {}", self.input_file);
        let report = describe_file(&self.input_file, self.verbose)?;
        println!("{}", report);
        Ok(())
    }
}

/// Builds the text report for `path`
pub fn describe_file(path: &str, verbose: bool) -> TiffResult<String> {
    let reader = TiffReader::open_with_schema(path, Box::new(StkSchema))?;
    let mut report = String::new();

    let stack = is_stack(&reader);
    let _ = writeln!(report, "File: {}", path);
    let _ = writeln!(report, "  Format: {}", if stack { "MetaMorph STK" } else { "TIFF" });
    let _ = writeln!(report, "  Byte order: {}", reader.byte_order().name());
    let _ = writeln!(report, "  Tag schema: {}", reader.schema_name());
    let _ = writeln!(report, "  Number of IFDs: {}", reader.image_count());

    for ifd in reader.ifds() {
        report.push('\n');
        describe_ifd(&mut report, ifd, verbose);
    }

    if stack {
        debug!("Decoding STK metadata of {}", path);
        let stk = StkReader::from_tiff(reader)?;
        let directory = stk.directory();
        let _ = writeln!(report, "\nSTK stack: {} planes", directory.num_planes());
        for plane in 0..directory.num_planes() {
            let _ = write!(report, "  Plane #{}:", plane);
            if let Some(z) = directory.z_distance(plane) {
                let _ = write!(report, " z {}", z);
            }
            if let Some(wavelength) = directory.wavelength(plane) {
                let _ = write!(report, ", wavelength {}", wavelength);
            }
            if let Ok(created) = directory.creation_time(plane) {
                let _ = write!(report, ", created {}", created.format("%Y-%m-%d %H:%M:%S%.3f"));
            }
            report.push('\n');
        }
        if verbose {
            for id in directory.uic1_ids() {
                let values = directory.uic1(id).unwrap_or_default();
                let text: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                let _ = writeln!(report, "  UIC1 {} ({}): {}", id, uic_name(id), text.join(", "));
            }
            for id in directory.uic4_ids() {
                let values = directory.uic4(id).unwrap_or_default();
                let text: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                let _ = writeln!(report, "  UIC4 {} ({}): {}", id, uic_name(id as u32), text.join(", "));
            }
        }
    }

    Ok(report)
}

fn describe_ifd(report: &mut String, ifd: &IFD, verbose: bool) {
    if verbose {
        let _ = write!(report, "{}", ifd);
        return;
    }

    let _ = writeln!(report, "IFD #{} (offset: {})", ifd.number, ifd.offset);
    let _ = writeln!(report, "  Number of entries: {}", ifd.entry_count());
    match ifd.get_dimensions() {
        Some((width, height)) => {
            let _ = writeln!(report, "  Dimensions: {}x{}", width, height);
        }
        None => {
            let _ = writeln!(report, "  Dimensions: Not available");
        }
    }
    let _ = writeln!(report, "  Samples per pixel: {}", ifd.get_samples_per_pixel());

    if let Some(code) = ifd.get_tag_value(tags::COMPRESSION) {
        let code = code as u16;
        let support = match CompressionFactory::create_handler(code) {
            Ok(_) => "supported",
            Err(_) => "not supported",
        };
        let _ = writeln!(
            report,
            "  Compression: {} ({}, {})",
            code,
            tag_utils::get_compression_name(code),
            support
        );
    }
    if let Some(code) = ifd.get_tag_value(tags::PHOTOMETRIC_INTERPRETATION) {
        let _ = writeln!(
            report,
            "  Photometric: {} ({})",
            code,
            tag_utils::get_photometric_name(code as u16)
        );
    }
    if let Some(code) = ifd.get_tag_value(tags::PLANAR_CONFIGURATION) {
        let _ = writeln!(
            report,
            "  Planar configuration: {} ({})",
            code,
            tag_utils::get_planar_config_name(code as u16)
        );
    }
}
