//! TIFF tag utilities
//!
//! Human-readable names for tag numbers and enumerated tag values, used by
//! log output and the inspector command.

use crate::tiff::constants::{compression, photometric, planar_config, tags};

/// Get the name of a TIFF tag
///
/// Returns "Unknown" for tags this crate has no name for.
pub fn get_tag_name(tag: u16) -> &'static str {
    match tag {
        tags::NEW_SUBFILE_TYPE => "NewSubfileType",
        tags::SUBFILE_TYPE => "SubfileType",
        tags::IMAGE_WIDTH => "ImageWidth",
        tags::IMAGE_LENGTH => "ImageLength",
        tags::BITS_PER_SAMPLE => "BitsPerSample",
        tags::COMPRESSION => "Compression",
        tags::PHOTOMETRIC_INTERPRETATION => "PhotometricInterpretation",
        tags::FILL_ORDER => "FillOrder",
        tags::DOCUMENT_NAME => "DocumentName",
        tags::IMAGE_DESCRIPTION => "ImageDescription",
        tags::MAKE => "Make",
        tags::MODEL => "Model",
        tags::STRIP_OFFSETS => "StripOffsets",
        tags::ORIENTATION => "Orientation",
        tags::SAMPLES_PER_PIXEL => "SamplesPerPixel",
        tags::ROWS_PER_STRIP => "RowsPerStrip",
        tags::STRIP_BYTE_COUNTS => "StripByteCounts",
        tags::MIN_SAMPLE_VALUE => "MinSampleValue",
        tags::MAX_SAMPLE_VALUE => "MaxSampleValue",
        tags::X_RESOLUTION => "XResolution",
        tags::Y_RESOLUTION => "YResolution",
        tags::PLANAR_CONFIGURATION => "PlanarConfiguration",
        tags::PAGE_NAME => "PageName",
        tags::RESOLUTION_UNIT => "ResolutionUnit",
        tags::PAGE_NUMBER => "PageNumber",
        tags::SOFTWARE => "Software",
        tags::DATE_TIME => "DateTime",
        tags::ARTIST => "Artist",
        tags::HOST_COMPUTER => "HostComputer",
        tags::PREDICTOR => "Predictor",
        tags::COLOR_MAP => "ColorMap",
        tags::SAMPLE_FORMAT => "SampleFormat",
        tags::COPYRIGHT => "Copyright",

        tags::UIC1 => "UIC1",
        tags::UIC2 => "UIC2",
        tags::UIC3 => "UIC3",
        tags::UIC4 => "UIC4",

        tags::LINE_CLOCK_FREQUENCY => "LineClockFrequency",
        tags::PIXEL_CLOCK_FREQUENCY => "PixelClockFrequency",
        tags::OPTICAL_RESOLUTION_XY => "OpticalResolutionXY",
        tags::SCAN_MODE => "ScanMode",

        _ => "Unknown",
    }
}

/// Get the name of a compression method
pub fn get_compression_name(code: u16) -> &'static str {
    match code {
        compression::NONE => "None",
        compression::LZW => "LZW",
        compression::DEFLATE => "Adobe Deflate",
        compression::DEFLATE_OLD => "Deflate",
        compression::PACKBITS => "PackBits",
        _ => "Unknown",
    }
}

/// Get the name of a photometric interpretation
pub fn get_photometric_name(code: u16) -> &'static str {
    match code {
        photometric::WHITE_IS_ZERO => "WhiteIsZero",
        photometric::BLACK_IS_ZERO => "BlackIsZero",
        photometric::RGB => "RGB",
        photometric::PALETTE => "Palette",
        _ => "Unknown",
    }
}

pub fn get_planar_config_name(code: u16) -> &'static str {
    match code {
        planar_config::CHUNKY => "Chunky",
        planar_config::PLANAR => "Planar",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stk_tags_are_named() {
        assert_eq!(get_tag_name(33628), "UIC1");
        assert_eq!(get_tag_name(33631), "UIC4");
        assert_eq!(get_tag_name(1), "Unknown");
    }

    #[test]
    fn test_both_deflate_codes_are_named() {
        assert_eq!(get_compression_name(8), "Adobe Deflate");
        assert_eq!(get_compression_name(32946), "Deflate");
        assert_eq!(get_compression_name(7), "Unknown");
    }
}
