//! Core TIFF data structures
//!
//! The tag/value model: the twelve TIFF field types, a typed value container
//! for each of them, and the top-level container holding a file's IFD chain.

use std::fmt;
use std::io::Write;

use crate::io::byte_order::{ByteOrder, ByteOrderHandler};
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::field_types;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::IFD;

/// The twelve primitive field types of a TIFF directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TiffType {
    Byte,
    Ascii,
    Short,
    Long,
    Rational,
    SByte,
    Undefined,
    SShort,
    SLong,
    SRational,
    Float,
    Double,
}

impl TiffType {
    /// Maps a field type code to its type, rejecting unknown codes
    pub fn from_code(code: u16) -> TiffResult<Self> {
        match code {
            field_types::BYTE => Ok(TiffType::Byte),
            field_types::ASCII => Ok(TiffType::Ascii),
            field_types::SHORT => Ok(TiffType::Short),
            field_types::LONG => Ok(TiffType::Long),
            field_types::RATIONAL => Ok(TiffType::Rational),
            field_types::SBYTE => Ok(TiffType::SByte),
            field_types::UNDEFINED => Ok(TiffType::Undefined),
            field_types::SSHORT => Ok(TiffType::SShort),
            field_types::SLONG => Ok(TiffType::SLong),
            field_types::SRATIONAL => Ok(TiffType::SRational),
            field_types::FLOAT => Ok(TiffType::Float),
            field_types::DOUBLE => Ok(TiffType::Double),
            _ => Err(TiffError::UnsupportedType(code)),
        }
    }

    /// Field type code as stored in a directory entry
    pub fn code(&self) -> u16 {
        match self {
            TiffType::Byte => field_types::BYTE,
            TiffType::Ascii => field_types::ASCII,
            TiffType::Short => field_types::SHORT,
            TiffType::Long => field_types::LONG,
            TiffType::Rational => field_types::RATIONAL,
            TiffType::SByte => field_types::SBYTE,
            TiffType::Undefined => field_types::UNDEFINED,
            TiffType::SShort => field_types::SSHORT,
            TiffType::SLong => field_types::SLONG,
            TiffType::SRational => field_types::SRATIONAL,
            TiffType::Float => field_types::FLOAT,
            TiffType::Double => field_types::DOUBLE,
        }
    }

    /// Size in bytes of one value of this type
    pub fn width(&self) -> usize {
        match self {
            TiffType::Byte | TiffType::Ascii | TiffType::SByte | TiffType::Undefined => 1,
            TiffType::Short | TiffType::SShort => 2,
            TiffType::Long | TiffType::SLong | TiffType::Float => 4,
            TiffType::Rational | TiffType::SRational | TiffType::Double => 8,
        }
    }

    /// Whether each value is a numerator/denominator pair
    pub fn is_rational(&self) -> bool {
        matches!(self, TiffType::Rational | TiffType::SRational)
    }

    pub fn name(&self) -> &'static str {
        match self {
            TiffType::Byte => "BYTE",
            TiffType::Ascii => "ASCII",
            TiffType::Short => "SHORT",
            TiffType::Long => "LONG",
            TiffType::Rational => "RATIONAL",
            TiffType::SByte => "SBYTE",
            TiffType::Undefined => "UNDEFINED",
            TiffType::SShort => "SSHORT",
            TiffType::SLong => "SLONG",
            TiffType::SRational => "SRATIONAL",
            TiffType::Float => "FLOAT",
            TiffType::Double => "DOUBLE",
        }
    }
}

/// Unsigned rational number, the unit of STK per-plane metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    pub numerator: u32,
    pub denominator: u32,
}

impl Rational {
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Rational { numerator, denominator }
    }

    /// The `0/1` value used for unset per-plane entries
    pub const fn zero() -> Self {
        Rational::new(0, 1)
    }

    /// Approximates a non-negative real with about three significant decimals
    ///
    /// Values below one are scaled by powers of ten until they reach one;
    /// the result is either an integer over that scale or, when the
    /// fractional part is at least 0.01, a hundredth-precision fraction.
    ///
    /// # Arguments
    /// * `value` - Non-negative finite number to approximate
    ///
    /// # Returns
    /// The approximation, or an error when the numerator or the scale does
    /// not fit in 32 bits
    pub fn from_f64(value: f64) -> TiffResult<Self> {
        if value == 0.0 {
            return Ok(Rational::new(0, 0));
        }
        if !value.is_finite() || value < 0.0 {
            return Err(TiffError::GenericError(format!(
                "Rational values must be positive and finite, got {}",
                value
            )));
        }

        let unrepresentable = || {
            TiffError::GenericError(format!("{} cannot be stored as a 32-bit rational", value))
        };

        let mut r = value;
        let mut multiple: u32 = 1;
        while r < 1.0 {
            multiple = multiple.checked_mul(10).ok_or_else(unrepresentable)?;
            r *= 10.0;
        }

        let integer = r.trunc();
        let (numerator, denominator) = if r - integer < 0.01 {
            (integer, multiple)
        } else {
            let denominator = multiple.checked_mul(100).ok_or_else(unrepresentable)?;
            ((r * 100.0).trunc(), denominator)
        };
        if numerator > u32::MAX as f64 {
            return Err(unrepresentable());
        }
        Ok(Rational::new(numerator as u32, denominator))
    }

    /// Floating-point value, NaN for a zero denominator
    pub fn to_f64(&self) -> f64 {
        if self.denominator == 0 {
            f64::NAN
        } else {
            self.numerator as f64 / self.denominator as f64
        }
    }
}

impl Default for Rational {
    fn default() -> Self {
        Rational::zero()
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// A typed, length-tagged TIFF value
///
/// Rational variants hold interleaved numerator/denominator elements, so
/// their element count is twice the TIFF count.
#[derive(Debug, Clone, PartialEq)]
pub enum TiffValue {
    Byte(Vec<u8>),
    Ascii(Vec<u8>),
    Short(Vec<u16>),
    Long(Vec<u32>),
    Rational(Vec<u32>),
    SByte(Vec<i8>),
    Undefined(Vec<u8>),
    SShort(Vec<i16>),
    SLong(Vec<i32>),
    SRational(Vec<i32>),
    Float(Vec<f32>),
    Double(Vec<f64>),
}

impl TiffValue {
    pub fn short(value: u16) -> Self {
        TiffValue::Short(vec![value])
    }

    pub fn long(value: u32) -> Self {
        TiffValue::Long(vec![value])
    }

    pub fn longs(values: &[u32]) -> Self {
        TiffValue::Long(values.to_vec())
    }

    pub fn rational(numerator: u32, denominator: u32) -> Self {
        TiffValue::Rational(vec![numerator, denominator])
    }

    pub fn rationals(values: &[Rational]) -> Self {
        TiffValue::Rational(values.iter().flat_map(|r| [r.numerator, r.denominator]).collect())
    }

    /// NUL-terminated ASCII value
    pub fn ascii(text: &str) -> Self {
        let mut bytes = text.as_bytes().to_vec();
        bytes.push(0);
        TiffValue::Ascii(bytes)
    }

    /// ASCII value without a terminator, as stored in STK records
    pub fn ascii_raw(text: &str) -> Self {
        TiffValue::Ascii(text.as_bytes().to_vec())
    }

    pub fn bytes(values: &[u8]) -> Self {
        TiffValue::Byte(values.to_vec())
    }

    pub fn field_type(&self) -> TiffType {
        match self {
            TiffValue::Byte(_) => TiffType::Byte,
            TiffValue::Ascii(_) => TiffType::Ascii,
            TiffValue::Short(_) => TiffType::Short,
            TiffValue::Long(_) => TiffType::Long,
            TiffValue::Rational(_) => TiffType::Rational,
            TiffValue::SByte(_) => TiffType::SByte,
            TiffValue::Undefined(_) => TiffType::Undefined,
            TiffValue::SShort(_) => TiffType::SShort,
            TiffValue::SLong(_) => TiffType::SLong,
            TiffValue::SRational(_) => TiffType::SRational,
            TiffValue::Float(_) => TiffType::Float,
            TiffValue::Double(_) => TiffType::Double,
        }
    }

    /// Number of stored elements (twice the count for rationals)
    pub fn element_count(&self) -> usize {
        match self {
            TiffValue::Byte(v) | TiffValue::Ascii(v) | TiffValue::Undefined(v) => v.len(),
            TiffValue::Short(v) => v.len(),
            TiffValue::Long(v) | TiffValue::Rational(v) => v.len(),
            TiffValue::SByte(v) => v.len(),
            TiffValue::SShort(v) => v.len(),
            TiffValue::SLong(v) | TiffValue::SRational(v) => v.len(),
            TiffValue::Float(v) => v.len(),
            TiffValue::Double(v) => v.len(),
        }
    }

    /// TIFF count of this value
    pub fn count(&self) -> usize {
        if self.field_type().is_rational() {
            self.element_count() / 2
        } else {
            self.element_count()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.element_count() == 0
    }

    /// Encoded size in bytes
    pub fn byte_len(&self) -> usize {
        self.count() * self.field_type().width()
    }

    /// Decodes `count` values of type `ty` from the current stream position
    pub fn read(
        ty: TiffType,
        count: usize,
        reader: &mut dyn SeekableReader,
        handler: &dyn ByteOrderHandler,
    ) -> TiffResult<Self> {
        let value = match ty {
            TiffType::Byte => TiffValue::Byte(read_raw(reader, count)?),
            TiffType::Ascii => TiffValue::Ascii(read_raw(reader, count)?),
            TiffType::Undefined => TiffValue::Undefined(read_raw(reader, count)?),
            TiffType::SByte => {
                TiffValue::SByte(read_raw(reader, count)?.into_iter().map(|b| b as i8).collect())
            }
            TiffType::Short => {
                let mut v = Vec::with_capacity(count);
                for _ in 0..count {
                    v.push(handler.read_u16(reader)?);
                }
                TiffValue::Short(v)
            }
            TiffType::SShort => {
                let mut v = Vec::with_capacity(count);
                for _ in 0..count {
                    v.push(handler.read_i16(reader)?);
                }
                TiffValue::SShort(v)
            }
            TiffType::Long => {
                let mut v = Vec::with_capacity(count);
                for _ in 0..count {
                    v.push(handler.read_u32(reader)?);
                }
                TiffValue::Long(v)
            }
            TiffType::SLong => {
                let mut v = Vec::with_capacity(count);
                for _ in 0..count {
                    v.push(handler.read_i32(reader)?);
                }
                TiffValue::SLong(v)
            }
            TiffType::Rational => {
                let mut v = Vec::with_capacity(count * 2);
                for _ in 0..count {
                    let (n, d) = handler.read_rational(reader)?;
                    v.push(n);
                    v.push(d);
                }
                TiffValue::Rational(v)
            }
            TiffType::SRational => {
                let mut v = Vec::with_capacity(count * 2);
                for _ in 0..count {
                    let (n, d) = handler.read_srational(reader)?;
                    v.push(n);
                    v.push(d);
                }
                TiffValue::SRational(v)
            }
            TiffType::Float => {
                let mut v = Vec::with_capacity(count);
                for _ in 0..count {
                    v.push(handler.read_f32(reader)?);
                }
                TiffValue::Float(v)
            }
            TiffType::Double => {
                let mut v = Vec::with_capacity(count);
                for _ in 0..count {
                    v.push(handler.read_f64(reader)?);
                }
                TiffValue::Double(v)
            }
        };
        Ok(value)
    }

    /// Encodes every element in the handler's byte order
    pub fn write(&self, writer: &mut dyn Write, handler: &dyn ByteOrderHandler) -> TiffResult<()> {
        match self {
            TiffValue::Byte(v) | TiffValue::Ascii(v) | TiffValue::Undefined(v) => writer.write_all(v)?,
            TiffValue::SByte(v) => {
                let raw: Vec<u8> = v.iter().map(|b| *b as u8).collect();
                writer.write_all(&raw)?;
            }
            TiffValue::Short(v) => {
                for x in v {
                    handler.write_u16(writer, *x)?;
                }
            }
            TiffValue::SShort(v) => {
                for x in v {
                    handler.write_i16(writer, *x)?;
                }
            }
            TiffValue::Long(v) | TiffValue::Rational(v) => {
                for x in v {
                    handler.write_u32(writer, *x)?;
                }
            }
            TiffValue::SLong(v) | TiffValue::SRational(v) => {
                for x in v {
                    handler.write_i32(writer, *x)?;
                }
            }
            TiffValue::Float(v) => {
                for x in v {
                    handler.write_f32(writer, *x)?;
                }
            }
            TiffValue::Double(v) => {
                for x in v {
                    handler.write_f64(writer, *x)?;
                }
            }
        }
        Ok(())
    }

    /// Encodes the value into a new buffer
    pub fn to_bytes(&self, handler: &dyn ByteOrderHandler) -> TiffResult<Vec<u8>> {
        let mut buffer = Vec::with_capacity(self.byte_len());
        self.write(&mut buffer, handler)?;
        Ok(buffer)
    }

    /// Unsigned integer view of BYTE, SHORT and LONG values
    pub fn as_u32_vec(&self) -> Option<Vec<u32>> {
        match self {
            TiffValue::Byte(v) | TiffValue::Undefined(v) => Some(v.iter().map(|x| *x as u32).collect()),
            TiffValue::Short(v) => Some(v.iter().map(|x| *x as u32).collect()),
            TiffValue::Long(v) => Some(v.clone()),
            TiffValue::SShort(v) => v.iter().map(|x| u32::try_from(*x).ok()).collect(),
            TiffValue::SLong(v) => v.iter().map(|x| u32::try_from(*x).ok()).collect(),
            _ => None,
        }
    }

    pub fn first_u32(&self) -> Option<u32> {
        self.as_u32_vec().and_then(|v| v.first().copied())
    }

    /// Numerator/denominator pairs of a RATIONAL value
    pub fn as_rationals(&self) -> Option<Vec<Rational>> {
        match self {
            TiffValue::Rational(v) => Some(
                v.chunks_exact(2)
                    .map(|pair| Rational::new(pair[0], pair[1]))
                    .collect(),
            ),
            _ => None,
        }
    }

    pub fn first_rational(&self) -> Option<Rational> {
        self.as_rationals().and_then(|v| v.first().copied())
    }

    /// Text of an ASCII value with trailing NULs removed
    pub fn as_string(&self) -> Option<String> {
        match self {
            TiffValue::Ascii(v) => {
                let text = String::from_utf8_lossy(v);
                Some(text.trim_end_matches('\0').to_string())
            }
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            TiffValue::Byte(v) | TiffValue::Ascii(v) | TiffValue::Undefined(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_shorts(&self) -> Option<&[u16]> {
        match self {
            TiffValue::Short(v) => Some(v),
            _ => None,
        }
    }
}

fn read_raw(reader: &mut dyn SeekableReader, count: usize) -> TiffResult<Vec<u8>> {
    let mut buffer = vec![0u8; count];
    reader.read_exact(&mut buffer)?;
    Ok(buffer)
}

impl fmt::Display for TiffValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const PREVIEW: usize = 8;

        if let Some(text) = self.as_string() {
            return write!(f, "\"{}\"", text);
        }

        let items: Vec<String> = match self {
            TiffValue::Rational(_) => self
                .as_rationals()
                .unwrap_or_default()
                .iter()
                .take(PREVIEW)
                .map(|r| r.to_string())
                .collect(),
            TiffValue::SRational(v) => v
                .chunks_exact(2)
                .take(PREVIEW)
                .map(|p| format!("{}/{}", p[0], p[1]))
                .collect(),
            TiffValue::Float(v) => v.iter().take(PREVIEW).map(|x| x.to_string()).collect(),
            TiffValue::Double(v) => v.iter().take(PREVIEW).map(|x| x.to_string()).collect(),
            TiffValue::SByte(v) => v.iter().take(PREVIEW).map(|x| x.to_string()).collect(),
            _ => self
                .as_u32_vec()
                .unwrap_or_default()
                .iter()
                .take(PREVIEW)
                .map(|x| x.to_string())
                .collect(),
        };

        write!(f, "[{}", items.join(", "))?;
        if self.count() > PREVIEW {
            write!(f, ", ... ({} values)", self.count())?;
        }
        write!(f, "]")
    }
}

/// Represents a TIFF file with its Image File Directories (IFDs)
#[derive(Debug, Clone)]
pub struct TIFF {
    /// Image File Directories in the TIFF file
    pub ifds: Vec<IFD>,
    /// Byte order the file was read with
    pub byte_order: ByteOrder,
}

impl TIFF {
    /// Creates a new empty TIFF structure
    pub fn new(byte_order: ByteOrder) -> Self {
        TIFF {
            ifds: Vec::new(),
            byte_order,
        }
    }

    /// Returns the main (first) IFD if available
    pub fn main_ifd(&self) -> Option<&IFD> {
        self.ifds.first()
    }

    /// Returns the number of IFDs in the TIFF file
    pub fn ifd_count(&self) -> usize {
        self.ifds.len()
    }
}

impl fmt::Display for TIFF {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TIFF File:")?;
        writeln!(f, "  Byte order: {}", self.byte_order.name())?;
        writeln!(f, "  Number of IFDs: {}", self.ifds.len())?;

        for ifd in &self.ifds {
            write!(f, "{}", ifd)?;
        }

        Ok(())
    }
}
