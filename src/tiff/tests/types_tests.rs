//! Tests for the TIFF types module

extern crate std;

use std::io::Cursor;

use super::test_utils::{create_test_big_endian_buffer, create_test_tiff_buffer, write_ifd_le, TestEntry};
use crate::io::byte_order::{BigEndianHandler, ByteOrder, LittleEndianHandler};
use crate::tiff::errors::TiffError;
use crate::tiff::reader::TiffReader;
use crate::tiff::types::{Rational, TiffType, TiffValue, TIFF};

#[test]
fn test_tiff_creation() {
    let tiff = TIFF::new(ByteOrder::LittleEndian);
    std::assert_eq!(tiff.ifd_count(), 0);
    std::assert!(tiff.main_ifd().is_none());
}

#[test]
fn test_tiff_from_reader() {
    let reader = TiffReader::new(create_test_tiff_buffer()).unwrap();
    let tiff = reader.to_tiff();

    std::assert_eq!(tiff.byte_order, ByteOrder::LittleEndian);
    std::assert_eq!(tiff.ifd_count(), 1);
    std::assert_eq!(tiff.main_ifd().unwrap().get_dimensions(), Some((800, 600)));
}

#[test]
fn test_big_endian_short_slot() {
    let reader = TiffReader::new(create_test_big_endian_buffer()).unwrap();
    std::assert_eq!(reader.byte_order(), ByteOrder::BigEndian);
    std::assert_eq!(reader.dimensions(0).unwrap(), (1024, 768));
}

#[test]
fn test_unknown_type_drops_entry() {
    let mut buffer = Vec::new();
    buffer.extend_from_slice(b"II");
    buffer.extend_from_slice(&[42, 0, 8, 0, 0, 0]);
    let bogus = TestEntry { tag: 305, field_type: 99, count: 1, slot: [0; 4] };
    write_ifd_le(
        &mut buffer,
        &[TestEntry::long_le(256, 4), TestEntry::long_le(257, 2), bogus],
        0,
    );

    let reader = TiffReader::new(Cursor::new(buffer)).unwrap();
    let ifd = reader.ifd(0).unwrap();
    std::assert_eq!(ifd.entry_count(), 2);
    std::assert!(!ifd.has_tag(305));
}

#[test]
fn test_type_codes() {
    std::assert_eq!(TiffType::from_code(5).unwrap(), TiffType::Rational);
    std::assert_eq!(TiffType::Rational.width(), 8);
    std::assert_eq!(TiffType::Double.code(), 12);
    std::assert!(TiffType::from_code(0).is_err());
    std::assert!(TiffType::from_code(13).is_err());
}

#[test]
fn test_rational_approximation() {
    std::assert_eq!(Rational::from_f64(1.0).unwrap(), Rational::new(1, 1));
    std::assert_eq!(Rational::from_f64(0.5).unwrap(), Rational::new(5, 10));
    std::assert_eq!(Rational::from_f64(2.25).unwrap(), Rational::new(225, 100));
    std::assert_eq!(Rational::from_f64(0.0).unwrap(), Rational::new(0, 0));
    std::assert!(matches!(Rational::from_f64(-1.0), Err(TiffError::GenericError(_))));
    std::assert!(Rational::new(1, 0).to_f64().is_nan());
}

#[test]
fn test_rational_out_of_range() {
    std::assert_eq!(Rational::from_f64(4.0e9).unwrap(), Rational::new(4_000_000_000, 1));
    std::assert!(matches!(Rational::from_f64(5.0e7 + 0.5), Err(TiffError::GenericError(_))));
    std::assert!(matches!(Rational::from_f64(5.0e9), Err(TiffError::GenericError(_))));
    std::assert!(matches!(Rational::from_f64(1.0e-12), Err(TiffError::GenericError(_))));
}

#[test]
fn test_value_counts() {
    let value = TiffValue::rationals(&[Rational::new(1, 2), Rational::new(3, 4)]);
    std::assert_eq!(value.count(), 2);
    std::assert_eq!(value.element_count(), 4);
    std::assert_eq!(value.byte_len(), 16);

    let text = TiffValue::ascii("abc");
    std::assert_eq!(text.count(), 4);
    std::assert_eq!(text.as_string().as_deref(), Some("abc"));
    std::assert_eq!(TiffValue::ascii_raw("abc").count(), 3);
}

#[test]
fn test_value_encoding_per_order() {
    let value = TiffValue::Short(vec![0x0102, 0x0304]);
    std::assert_eq!(value.to_bytes(&LittleEndianHandler).unwrap(), vec![2, 1, 4, 3]);
    std::assert_eq!(value.to_bytes(&BigEndianHandler).unwrap(), vec![1, 2, 3, 4]);

    let bytes = TiffValue::rational(7, 9).to_bytes(&BigEndianHandler).unwrap();
    let decoded = TiffValue::read(TiffType::Rational, 1, &mut Cursor::new(bytes), &BigEndianHandler).unwrap();
    std::assert_eq!(decoded.first_rational(), Some(Rational::new(7, 9)));
}
