pub mod io;
pub mod tiff;
pub mod raster;
pub mod stk;
pub mod utils;
pub mod compression;
pub mod commands;
pub mod api;

pub use crate::api::StackKit;

pub use tiff::{TiffReader, TiffWriter};
pub use stk::{StkDirectory, StkReader, StkWriter};
pub use raster::{Colormap, RgbPlanes, SampleType, Samples, WriteOptions};
