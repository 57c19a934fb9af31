//! Strip-based raster I/O
//!
//! Typed plane buffers plus the reader and writer that move them in and
//! out of strips.

pub mod samples;
pub mod strips;
pub mod strip_reader;
pub mod strip_writer;

pub use samples::{Colormap, RgbPlanes, SampleType, Samples};
pub use strip_reader::{RasterInfo, ReadOptions, StripReader};
pub use strip_writer::{StripWriter, WriteOptions};
pub use strips::{define_strips, StripLayout, StripTable};
