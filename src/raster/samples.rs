//! Typed plane buffers
//!
//! Grayscale and palette planes are held as one of four sample types; RGB
//! planes as three 8-bit channels. Conversions to and from raw strip bytes
//! live here so the strip reader and writer stay type-agnostic.

use std::fmt;

use crate::compression::predictor::{apply_horizontal_differencing, reverse_horizontal_differencing};
use crate::tiff::constants::sample_format;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::types::TiffValue;

/// Pixel sample type of a grayscale or palette plane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleType {
    U8,
    U16,
    U32,
    F32,
}

impl SampleType {
    /// Picks the type from BitsPerSample and SampleFormat
    ///
    /// 32-bit data is float unless SampleFormat says unsigned.
    pub fn from_tags(bits: u32, format: Option<u32>) -> TiffResult<Self> {
        match bits {
            8 => Ok(SampleType::U8),
            16 => Ok(SampleType::U16),
            32 if format == Some(sample_format::UNSIGNED as u32) => Ok(SampleType::U32),
            32 => Ok(SampleType::F32),
            other => Err(TiffError::UnsupportedBitDepth(other.min(u16::MAX as u32) as u16)),
        }
    }

    pub fn bits(&self) -> u16 {
        self.bytes() as u16 * 8
    }

    pub fn bytes(&self) -> usize {
        match self {
            SampleType::U8 => 1,
            SampleType::U16 => 2,
            SampleType::U32 | SampleType::F32 => 4,
        }
    }

    /// SampleFormat tag value written for this type
    pub fn sample_format(&self) -> u16 {
        match self {
            SampleType::F32 => sample_format::IEEEFP,
            _ => sample_format::UNSIGNED,
        }
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SampleType::U8 => "u8",
            SampleType::U16 => "u16",
            SampleType::U32 => "u32",
            SampleType::F32 => "f32",
        };
        write!(f, "{}", name)
    }
}

/// One grayscale or palette-index plane in row-major order
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    F32(Vec<f32>),
}

impl Samples {
    pub fn zeroed(sample_type: SampleType, len: usize) -> Self {
        match sample_type {
            SampleType::U8 => Samples::U8(vec![0; len]),
            SampleType::U16 => Samples::U16(vec![0; len]),
            SampleType::U32 => Samples::U32(vec![0; len]),
            SampleType::F32 => Samples::F32(vec![0.0; len]),
        }
    }

    pub fn sample_type(&self) -> SampleType {
        match self {
            Samples::U8(_) => SampleType::U8,
            Samples::U16(_) => SampleType::U16,
            Samples::U32(_) => SampleType::U32,
            Samples::F32(_) => SampleType::F32,
        }
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        match self {
            Samples::U8(v) => v.len(),
            Samples::U16(v) => v.len(),
            Samples::U32(v) => v.len(),
            Samples::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn byte_len(&self) -> usize {
        self.len() * self.sample_type().bytes()
    }

    /// Decodes raw plane bytes, swapping multi-byte samples from big-endian files
    pub fn from_bytes(sample_type: SampleType, bytes: &[u8], big_endian: bool) -> Self {
        match sample_type {
            SampleType::U8 => Samples::U8(bytes.to_vec()),
            SampleType::U16 => Samples::U16(
                bytes
                    .chunks_exact(2)
                    .map(|c| {
                        let raw = [c[0], c[1]];
                        if big_endian { u16::from_be_bytes(raw) } else { u16::from_le_bytes(raw) }
                    })
                    .collect(),
            ),
            SampleType::U32 => Samples::U32(
                bytes
                    .chunks_exact(4)
                    .map(|c| {
                        let raw = [c[0], c[1], c[2], c[3]];
                        if big_endian { u32::from_be_bytes(raw) } else { u32::from_le_bytes(raw) }
                    })
                    .collect(),
            ),
            SampleType::F32 => Samples::F32(
                bytes
                    .chunks_exact(4)
                    .map(|c| {
                        let raw = [c[0], c[1], c[2], c[3]];
                        if big_endian { f32::from_be_bytes(raw) } else { f32::from_le_bytes(raw) }
                    })
                    .collect(),
            ),
        }
    }

    /// Little-endian bytes of every sample, as written to strips
    pub fn to_le_bytes(&self) -> Vec<u8> {
        match self {
            Samples::U8(v) => v.clone(),
            Samples::U16(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            Samples::U32(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            Samples::F32(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
        }
    }

    /// Horizontal differencing over rows of `width` samples
    pub fn apply_differencing(&mut self, width: usize) {
        match self {
            Samples::U8(v) => apply_horizontal_differencing(v, width),
            Samples::U16(v) => apply_horizontal_differencing(v, width),
            Samples::U32(v) => apply_horizontal_differencing(v, width),
            Samples::F32(v) => apply_horizontal_differencing(v, width),
        }
    }

    pub fn reverse_differencing(&mut self, width: usize) {
        match self {
            Samples::U8(v) => reverse_horizontal_differencing(v, width),
            Samples::U16(v) => reverse_horizontal_differencing(v, width),
            Samples::U32(v) => reverse_horizontal_differencing(v, width),
            Samples::F32(v) => reverse_horizontal_differencing(v, width),
        }
    }

    pub fn as_u8(&self) -> Option<&[u8]> {
        match self {
            Samples::U8(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_u16(&self) -> Option<&[u16]> {
        match self {
            Samples::U16(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<&[u32]> {
        match self {
            Samples::U32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<&[f32]> {
        match self {
            Samples::F32(v) => Some(v),
            _ => None,
        }
    }
}

impl From<Vec<u8>> for Samples {
    fn from(v: Vec<u8>) -> Self {
        Samples::U8(v)
    }
}

impl From<Vec<u16>> for Samples {
    fn from(v: Vec<u16>) -> Self {
        Samples::U16(v)
    }
}

impl From<Vec<u32>> for Samples {
    fn from(v: Vec<u32>) -> Self {
        Samples::U32(v)
    }
}

impl From<Vec<f32>> for Samples {
    fn from(v: Vec<f32>) -> Self {
        Samples::F32(v)
    }
}

/// An 8-bit RGB plane split into its three channels
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RgbPlanes {
    pub red: Vec<u8>,
    pub green: Vec<u8>,
    pub blue: Vec<u8>,
}

impl RgbPlanes {
    pub fn new(red: Vec<u8>, green: Vec<u8>, blue: Vec<u8>) -> TiffResult<Self> {
        if red.len() != green.len() || red.len() != blue.len() {
            return Err(TiffError::InvalidImageParameters(format!(
                "RGB channels differ in length ({}, {}, {})",
                red.len(),
                green.len(),
                blue.len()
            )));
        }
        Ok(RgbPlanes { red, green, blue })
    }

    pub fn zeroed(len: usize) -> Self {
        RgbPlanes {
            red: vec![0; len],
            green: vec![0; len],
            blue: vec![0; len],
        }
    }

    /// Pixels per channel
    pub fn len(&self) -> usize {
        self.red.len()
    }

    pub fn is_empty(&self) -> bool {
        self.red.is_empty()
    }

    pub fn channels(&self) -> [&Vec<u8>; 3] {
        [&self.red, &self.green, &self.blue]
    }

    pub fn channels_mut(&mut self) -> [&mut Vec<u8>; 3] {
        [&mut self.red, &mut self.green, &mut self.blue]
    }

    /// Chunky RGBRGB... bytes
    pub fn interleave(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len() * 3);
        for i in 0..self.len() {
            out.push(self.red[i]);
            out.push(self.green[i]);
            out.push(self.blue[i]);
        }
        out
    }

    /// Splits chunky bytes; a trailing partial pixel is ignored
    pub fn deinterleave(bytes: &[u8]) -> Self {
        let mut planes = RgbPlanes::zeroed(bytes.len() / 3);
        for (i, px) in bytes.chunks_exact(3).enumerate() {
            planes.red[i] = px[0];
            planes.green[i] = px[1];
            planes.blue[i] = px[2];
        }
        planes
    }

    pub fn apply_differencing(&mut self, width: usize) {
        for channel in self.channels_mut() {
            apply_horizontal_differencing(channel, width);
        }
    }

    pub fn reverse_differencing(&mut self, width: usize) {
        for channel in self.channels_mut() {
            reverse_horizontal_differencing(channel, width);
        }
    }
}

/// Palette of an indexed-color image
#[derive(Debug, Clone, PartialEq)]
pub struct Colormap {
    entries: Vec<[u8; 3]>,
}

impl Colormap {
    pub fn new(entries: Vec<[u8; 3]>) -> Self {
        Colormap { entries }
    }

    /// Builds a palette from separate channel tables of equal length
    pub fn from_channels(red: &[u8], green: &[u8], blue: &[u8]) -> TiffResult<Self> {
        if red.len() != green.len() || red.len() != blue.len() {
            return Err(TiffError::InvalidImageParameters(format!(
                "colormap channels differ in length ({}, {}, {})",
                red.len(),
                green.len(),
                blue.len()
            )));
        }
        let entries = (0..red.len()).map(|i| [red[i], green[i], blue[i]]).collect();
        Ok(Colormap { entries })
    }

    /// Gray ramp `i -> (i, i, i)` over 256 entries
    pub fn identity() -> Self {
        Colormap {
            entries: (0..=255u8).map(|i| [i, i, i]).collect(),
        }
    }

    pub fn entries(&self) -> &[[u8; 3]] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn channel(&self, index: usize) -> Vec<u8> {
        self.entries.iter().map(|e| e[index.min(2)]).collect()
    }

    /// ColorMap tag value: each component scaled by 256, reds then greens then blues
    pub fn to_tiff_value(&self) -> TiffValue {
        let mut values = Vec::with_capacity(self.entries.len() * 3);
        for component in 0..3 {
            values.extend(self.entries.iter().map(|e| e[component] as u16 * 256));
        }
        TiffValue::Short(values)
    }

    /// Decodes a ColorMap tag of an image with `bits` bits per sample
    ///
    /// Tables not sized `3 * 2^bits` are accepted only with 256 entries per
    /// channel. Whether the high or low byte carries the color is decided
    /// from the last three red entries.
    pub fn from_tiff_value(value: &TiffValue, bits: u32) -> TiffResult<Self> {
        let table = value
            .as_shorts()
            .ok_or_else(|| TiffError::InvalidImageInfo("ColorMap is not a SHORT array".to_string()))?;

        let expected = 1usize.checked_shl(bits).unwrap_or(0);
        let n = if expected > 0 && table.len() == 3 * expected {
            expected
        } else if table.len() / 3 == 256 {
            256
        } else {
            return Err(TiffError::InvalidImageInfo(format!(
                "ColorMap has {} values for {}-bit samples",
                table.len(),
                bits
            )));
        };

        let mut high = 0u32;
        let mut low = 0u32;
        for k in 1..=n.min(3) {
            let v = table[n - k] as u32;
            high += v >> 8;
            low += v & 0xFF;
        }
        let use_high = high > low;

        let pick = |v: u16| if use_high { (v >> 8) as u8 } else { (v & 0xFF) as u8 };
        let entries = (0..n)
            .map(|i| [pick(table[i]), pick(table[n + i]), pick(table[2 * n + i])])
            .collect();
        Ok(Colormap { entries })
    }
}
