//! TIFF and STK format constants
//!
//! Tag numbers, field type codes and enumerated tag values used by the
//! reader, writer and STK codec.

/// File header constants
pub mod header {
    /// Standard TIFF magic number (42)
    pub const TIFF_MAGIC: u16 = 42;

    /// "II" byte order marker for little-endian
    pub const LITTLE_ENDIAN_MARKER: [u8; 2] = [0x49, 0x49];

    /// "MM" byte order marker for big-endian
    pub const BIG_ENDIAN_MARKER: [u8; 2] = [0x4D, 0x4D];

    /// Size of the classic header in bytes
    pub const HEADER_SIZE: u64 = 8;

    /// Position of the first-IFD offset inside the header
    pub const FIRST_IFD_SLOT: u64 = 4;
}

/// Field types as defined in the TIFF spec
pub mod field_types {
    pub const BYTE: u16 = 1;       // 8-bit unsigned integer
    pub const ASCII: u16 = 2;      // 8-bit byte containing ASCII character
    pub const SHORT: u16 = 3;      // 16-bit unsigned integer
    pub const LONG: u16 = 4;       // 32-bit unsigned integer
    pub const RATIONAL: u16 = 5;   // Two LONGs: numerator and denominator
    pub const SBYTE: u16 = 6;      // 8-bit signed integer
    pub const UNDEFINED: u16 = 7;  // 8-bit byte with unspecified format
    pub const SSHORT: u16 = 8;     // 16-bit signed integer
    pub const SLONG: u16 = 9;      // 32-bit signed integer
    pub const SRATIONAL: u16 = 10; // Two SLONGs: numerator and denominator
    pub const FLOAT: u16 = 11;     // Single precision IEEE floating point
    pub const DOUBLE: u16 = 12;    // Double precision IEEE floating point
}

/// Standard TIFF tags
pub mod tags {
    pub const NEW_SUBFILE_TYPE: u16 = 254;         // Subfile data descriptor
    pub const SUBFILE_TYPE: u16 = 255;             // Old-style subfile data descriptor
    pub const IMAGE_WIDTH: u16 = 256;              // Width of the image in pixels
    pub const IMAGE_LENGTH: u16 = 257;             // Height of the image in pixels
    pub const BITS_PER_SAMPLE: u16 = 258;          // Bits per component
    pub const COMPRESSION: u16 = 259;              // Compression scheme
    pub const PHOTOMETRIC_INTERPRETATION: u16 = 262; // Color space of image data
    pub const FILL_ORDER: u16 = 266;               // Logical order of bits within a byte
    pub const DOCUMENT_NAME: u16 = 269;            // Name of the scanned document
    pub const IMAGE_DESCRIPTION: u16 = 270;        // Free-form annotation
    pub const MAKE: u16 = 271;                     // Scanner or camera manufacturer
    pub const MODEL: u16 = 272;                    // Scanner or camera model
    pub const STRIP_OFFSETS: u16 = 273;            // Offsets to the data strips
    pub const ORIENTATION: u16 = 274;              // Image orientation
    pub const SAMPLES_PER_PIXEL: u16 = 277;        // Number of components per pixel
    pub const ROWS_PER_STRIP: u16 = 278;           // Rows per strip of data
    pub const STRIP_BYTE_COUNTS: u16 = 279;        // Bytes counts for strips
    pub const MIN_SAMPLE_VALUE: u16 = 280;         // Minimum component value
    pub const MAX_SAMPLE_VALUE: u16 = 281;         // Maximum component value
    pub const X_RESOLUTION: u16 = 282;             // Horizontal resolution
    pub const Y_RESOLUTION: u16 = 283;             // Vertical resolution
    pub const PLANAR_CONFIGURATION: u16 = 284;     // How components are stored
    pub const PAGE_NAME: u16 = 285;                // Name of the page
    pub const RESOLUTION_UNIT: u16 = 296;          // Unit of measurement for resolution
    pub const PAGE_NUMBER: u16 = 297;              // Page number of a multipage document
    pub const SOFTWARE: u16 = 305;                 // Software used to create the image
    pub const DATE_TIME: u16 = 306;                // Date and time of image creation
    pub const ARTIST: u16 = 315;                   // Person who created the image
    pub const HOST_COMPUTER: u16 = 316;            // Computer where the image was created
    pub const PREDICTOR: u16 = 317;                // Prediction scheme used on image data
    pub const COLOR_MAP: u16 = 320;                // Colormap for palette color images
    pub const SAMPLE_FORMAT: u16 = 339;            // Interpretation of sample data
    pub const COPYRIGHT: u16 = 33432;              // Copyright notice

    // MetaMorph stack tags
    pub const UIC1: u16 = 33628;                   // Per-file id/value records
    pub const UIC2: u16 = 33629;                   // Z distance and timestamps per plane
    pub const UIC3: u16 = 33630;                   // Wavelength per plane
    pub const UIC4: u16 = 33631;                   // Per-plane id blocks

    // Private scanner tags
    pub const LINE_CLOCK_FREQUENCY: u16 = 65531;   // Line clock in kHz
    pub const PIXEL_CLOCK_FREQUENCY: u16 = 65532;  // Pixel clock in MHz
    pub const OPTICAL_RESOLUTION_XY: u16 = 65533;  // Optical resolution in XY
    pub const SCAN_MODE: u16 = 65534;              // Scan mode
}

/// Compression types
pub mod compression {
    pub const NONE: u16 = 1;              // No compression
    pub const LZW: u16 = 5;               // LZW compression
    pub const DEFLATE: u16 = 8;           // Adobe Deflate (zlib)
    pub const DEFLATE_OLD: u16 = 32946;   // Legacy Deflate code
    pub const PACKBITS: u16 = 32773;      // PackBits compression
}

/// Photometric interpretation values
pub mod photometric {
    pub const WHITE_IS_ZERO: u16 = 0;     // Minimum value is white
    pub const BLACK_IS_ZERO: u16 = 1;     // Minimum value is black
    pub const RGB: u16 = 2;               // RGB color model
    pub const PALETTE: u16 = 3;           // Palette color (color map indexed)
}

/// Planar configuration values
pub mod planar_config {
    pub const CHUNKY: u16 = 1;            // Components stored interleaved (RGBRGBRGB)
    pub const PLANAR: u16 = 2;            // Components stored separately (RRR...GGG...BBB)
}

/// Sample format values
pub mod sample_format {
    pub const UNSIGNED: u16 = 1;          // Unsigned integer data
    pub const IEEEFP: u16 = 3;            // IEEE floating point data
    pub const VOID: u16 = 4;              // Undefined data format
}

/// Resolution unit values
pub mod resolution_unit {
    pub const NONE: u16 = 1;              // No meaningful units (default for written files)
    pub const INCH: u16 = 2;              // Inches
    pub const CENTIMETER: u16 = 3;        // Centimeters
    pub const MICROMETER: u16 = 6;        // Micrometers
    pub const NANOMETER: u16 = 9;         // Nanometers
}

/// Predictor values
pub mod predictor {
    pub const NONE: u16 = 1;                    // No prediction scheme
    pub const HORIZONTAL_DIFFERENCING: u16 = 2; // Horizontal differencing
}
