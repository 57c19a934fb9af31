//! Utility modules for common functionality
//!
//! Logging, progress reporting, write helpers, tag names and date
//! conversions shared by the TIFF and STK layers.

pub mod logger;
pub mod progress;
pub(crate) mod write_utils;
pub mod tag_utils;
pub mod julian;
