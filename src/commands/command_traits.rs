//! Command pattern interfaces
//!
//! Each CLI operation is a `Command`; a `CommandFactory` picks one from the
//! parsed arguments.

use crate::tiff::errors::TiffResult;

/// Represents an executable command in the application
pub trait Command {
    /// Execute the command
    fn execute(&self) -> TiffResult<()>;
}

/// Factory for creating commands from CLI arguments
pub trait CommandFactory {
    /// Create the command selected by `args`
    ///
    /// # Arguments
    /// * `args` - CLI argument matches from clap
    ///
    /// # Returns
    /// A command that implements the Command trait, or an error
    fn create_command(&self, args: &clap::ArgMatches) -> TiffResult<Box<dyn Command>>;
}
