//! CLI command implementations
//!
//! This module contains implementations of the commands supported by the
//! `stackkit` binary using the Command pattern.

pub mod command_traits;
pub mod analyze_command;
pub mod extract_command;
pub mod convert_command;

pub use command_traits::{Command, CommandFactory};
pub use analyze_command::AnalyzeCommand;
pub use extract_command::ExtractCommand;
pub use convert_command::ConvertCommand;

use clap::ArgMatches;
use crate::tiff::errors::{TiffError, TiffResult};

/// Factory for creating command instances based on CLI arguments
#[derive(Debug, Default)]
pub struct StackkitCommandFactory;

impl StackkitCommandFactory {
    /// Create a new factory instance
    pub fn new() -> Self {
        StackkitCommandFactory
    }
}

impl CommandFactory for StackkitCommandFactory {
    fn create_command(&self, args: &ArgMatches) -> TiffResult<Box<dyn Command>> {
        if args.get_flag("extract") {
            Ok(Box::new(ExtractCommand::new(args)?))
        } else if args.get_flag("convert") {
            Ok(Box::new(ConvertCommand::new(args)?))
        } else {
            // Default to analyze command
            Ok(Box::new(AnalyzeCommand::new(args)?))
        }
    }
}

/// Fetches a required string argument
pub(crate) fn required_arg(args: &ArgMatches, name: &str, what: &str) -> TiffResult<String> {
    args.get_one::<String>(name)
        .cloned()
        .ok_or_else(|| TiffError::GenericError(format!("Missing {}", what)))
}
