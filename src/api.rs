//! Library facade
//!
//! The same operations the command line tool offers, callable without
//! going through argument parsing.

use image::DynamicImage;
use log::info;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::commands::analyze_command::describe_file;
use crate::commands::convert_command::convert_file;
use crate::commands::extract_command::extract_plane;
use crate::compression::CompressionMethod;
use crate::stk::StkReader;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::utils::logger::Logger;

/// Main interface to the StackKit library
#[derive(Debug, Default)]
pub struct StackKit;

impl StackKit {
    pub fn new() -> Self {
        StackKit
    }

    /// Creates the facade and routes `log` records at `level` to `log_file`
    ///
    /// # Arguments
    /// * `log_file` - File receiving the log lines
    /// * `level` - Most verbose level that is recorded
    ///
    /// # Returns
    /// The facade, or an error if the file or the global logger cannot be set up
    pub fn with_log_file<P: AsRef<Path>>(log_file: P, level: log::Level) -> TiffResult<Self> {
        Logger::init_global_logger(log_file, level)?;
        Ok(StackKit)
    }

    /// Text report of the IFD chain and, for stacks, the STK metadata
    ///
    /// # Arguments
    /// * `input_path` - TIFF or STK file
    /// * `verbose` - List every tag and the UIC1/UIC4 records
    ///
    /// # Returns
    /// The report as a string
    pub fn analyze(&self, input_path: &str, verbose: bool) -> TiffResult<String> {
        describe_file(input_path, verbose)
    }

    /// Opens a stack for plane access
    pub fn open_stack(&self, input_path: &str) -> TiffResult<StkReader<BufReader<File>>> {
        StkReader::open(input_path)
    }

    /// Rewrites a TIFF or STK file with the compression named by `compression`
    ///
    /// `compression` is a name such as "lzw" or a Compression tag value.
    ///
    /// # Arguments
    /// * `input_path` - TIFF or STK file to read
    /// * `output_path` - File to write
    /// * `compression` - Target compression name or code
    pub fn convert(&self, input_path: &str, output_path: &str, compression: &str) -> TiffResult<()> {
        let method = CompressionMethod::from_name(compression)
            .ok_or_else(|| TiffError::GenericError(format!("Unknown compression: {}", compression)))?;
        info!("Converting {} to {} ({})", input_path, output_path, method);
        convert_file(input_path, output_path, method, None)
    }

    /// Plane `plane` of a stack, or image `plane` of a TIFF chain
    pub fn extract(&self, input_path: &str, plane: usize) -> TiffResult<DynamicImage> {
        extract_plane(input_path, plane)
    }

    /// Exports plane `plane` to `output_path`; the format follows the extension
    ///
    /// # Arguments
    /// * `input_path` - TIFF or STK file
    /// * `output_path` - Image file to write, e.g. a `.png`
    /// * `plane` - Stack plane, or image index for plain TIFF files
    pub fn extract_to_file(&self, input_path: &str, output_path: &str, plane: usize) -> TiffResult<()> {
        let image = self.extract(input_path, plane)?;
        image
            .save(output_path)
            .map_err(|e| TiffError::GenericError(format!("Failed to save {}: {}", output_path, e)))
    }
}
