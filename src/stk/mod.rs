//! MetaMorph STK stacks
//!
//! An STK file is a single-IFD TIFF whose strips hold every plane of the
//! stack back to back. Per-plane and stack-wide metadata live in the
//! private UIC1 to UIC4 tags, decoded here into a `StkDirectory`.

pub mod uic;
pub mod directory;
pub(crate) mod codec;
pub mod reader;
pub mod writer;

pub use codec::StkSchema;
pub use directory::StkDirectory;
pub use reader::{is_stack, StkReader};
pub use writer::StkWriter;
