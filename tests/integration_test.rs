//! Integration tests for the TIFF and STK layers

extern crate std;

use byteorder::{BigEndian, WriteBytesExt};
use chrono::{TimeZone, Utc};
use std::io::Cursor;

use stackkit::compression::CompressionMethod;
use stackkit::raster::{Colormap, RgbPlanes, Samples, WriteOptions};
use stackkit::stk::uic::ids;
use stackkit::stk::{StkDirectory, StkReader, StkWriter};
use stackkit::tiff::constants::{photometric, tags};
use stackkit::tiff::{ByteOrder, ImageKind, Rational, TiffError, TiffReader, TiffType, TiffValue, TiffWriter, IFD};
use stackkit::utils::julian;
use stackkit::StackKit;

const METHODS: [CompressionMethod; 4] = [
    CompressionMethod::Uncompressed,
    CompressionMethod::Lzw,
    CompressionMethod::PackBits,
    CompressionMethod::Deflate,
];

fn gray_u16(width: u32, height: u32, seed: u16) -> Samples {
    Samples::U16(
        (0..width * height)
            .map(|i| (i as u16).wrapping_mul(37).wrapping_add(seed))
            .collect(),
    )
}

fn rgb(width: u32, height: u32) -> RgbPlanes {
    let len = (width * height) as usize;
    RgbPlanes::new(
        (0..len).map(|i| i as u8).collect(),
        (0..len).map(|i| (i / 3) as u8).collect(),
        (0..len).map(|i| 255 - (i % 7) as u8).collect(),
    )
    .unwrap()
}

fn palette() -> Colormap {
    Colormap::new((0..256u32).map(|i| [i as u8, 255 - i as u8, (i / 2) as u8]).collect())
}

#[test]
fn test_rejects_non_tiff_input() {
    let short = TiffReader::new(Cursor::new(vec![0x49, 0x49, 42, 0]));
    std::assert!(matches!(short, Err(TiffError::NotATiffFile(_))));

    let bad_marker = TiffReader::new(Cursor::new(b"XX*\0\x08\0\0\0\0\0".to_vec()));
    std::assert!(matches!(bad_marker, Err(TiffError::NotATiffFile(_))));

    let bad_magic = TiffReader::new(Cursor::new(b"II+\0\x08\0\0\0\0\0".to_vec()));
    std::assert!(matches!(bad_magic, Err(TiffError::NotATiffFile(_))));

    let zero_offset = TiffReader::new(Cursor::new(b"II*\0\0\0\0\0\0\0".to_vec()));
    std::assert!(matches!(zero_offset, Err(TiffError::NotATiffFile(_))));

    let empty_ifd = TiffReader::new(Cursor::new(b"II*\0\x08\0\0\0\0\0\0\0\0\0".to_vec()));
    std::assert!(matches!(empty_ifd, Err(TiffError::NotATiffFile(_))));
}

#[test]
fn test_gray_round_trip_per_compression() {
    let samples = gray_u16(37, 23, 11);
    for method in METHODS {
        let options = WriteOptions::default().with_compression(method);
        let mut writer = TiffWriter::with_options(Cursor::new(Vec::new()), options).unwrap();
        writer.add_grayscale_image(IFD::with_size(37, 23), &samples).unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let mut reader = TiffReader::new(Cursor::new(bytes)).unwrap();
        let ifd = reader.ifd(0).unwrap();
        std::assert_eq!(ifd.get_tag_value(tags::COMPRESSION), Some(method.code() as u32));
        let expected_predictor = if method == CompressionMethod::Lzw { 2 } else { 1 };
        std::assert_eq!(ifd.get_tag_value(tags::PREDICTOR), Some(expected_predictor));
        std::assert_eq!(ifd.get_tag_value(tags::BITS_PER_SAMPLE), Some(16));
        std::assert_eq!(reader.read_grayscale(0).unwrap(), samples, "{}", method);
    }
}

#[test]
fn test_small_gray_image_has_required_tags() {
    let pixels = Samples::U8((0..16).collect());
    let mut writer = TiffWriter::with_options(Cursor::new(Vec::new()), WriteOptions::uncompressed()).unwrap();
    writer.add_grayscale_image(IFD::with_size(4, 4), &pixels).unwrap();
    let bytes = writer.finish().unwrap().into_inner();

    let mut reader = TiffReader::new(Cursor::new(bytes)).unwrap();
    let ifd = reader.ifd(0).unwrap();
    std::assert!(ifd.missing_required_tags(ImageKind::Grayscale).is_empty());
    std::assert_eq!(ifd.get_tag_value(tags::COMPRESSION), Some(1));
    std::assert_eq!(ifd.get_tag_value(tags::BITS_PER_SAMPLE), Some(8));
    std::assert_eq!(reader.read_grayscale(0).unwrap(), pixels);
}

#[test]
fn test_ifd_values_survive_a_write() {
    let values = [
        (tags::IMAGE_DESCRIPTION, TiffValue::ascii("plane annotation")),
        (tags::X_RESOLUTION, TiffValue::rational(72, 1)),
        (tags::Y_RESOLUTION, TiffValue::rational(144, 2)),
        (65000, TiffValue::Short(vec![1, 2])),
        (65001, TiffValue::Short(vec![10, 20, 30, 40, 50])),
        (65002, TiffValue::Double(vec![1.5, -2.25e10])),
        (65003, TiffValue::Byte(vec![7, 8, 9])),
        (65004, TiffValue::SLong(vec![-5])),
        (65005, TiffValue::SRational(vec![-1, 3, 2, -7])),
        (65006, TiffValue::Float(vec![0.1, 3.5])),
        (65007, TiffValue::Long(vec![100_000; 3])),
    ];
    let mut ifd = IFD::with_size(3, 2);
    for (tag, value) in &values {
        ifd.force_insert(*tag, value.clone());
    }

    let mut writer = TiffWriter::with_options(Cursor::new(Vec::new()), WriteOptions::uncompressed()).unwrap();
    writer.add_grayscale_image(ifd, &Samples::U8(vec![0; 6])).unwrap();
    let bytes = writer.finish().unwrap().into_inner();

    let reader = TiffReader::new(Cursor::new(bytes)).unwrap();
    let read = reader.ifd(0).unwrap();
    for (tag, value) in &values {
        let stored = read.get(*tag).unwrap_or_else(|| panic!("tag {} missing", tag));
        std::assert_eq!(stored.field_type(), value.field_type(), "tag {}", tag);
        std::assert_eq!(stored, value, "tag {}", tag);
    }
    std::assert_eq!(read.get(65002).map(TiffValue::field_type), Some(TiffType::Double));

    let entries: Vec<u16> = read.entries().iter().map(|e| e.tag).collect();
    let mut sorted = entries.clone();
    sorted.sort_unstable();
    sorted.dedup();
    std::assert_eq!(entries, sorted);
}

#[test]
fn test_multi_strip_layout() {
    let (width, height) = (1024u32, 20u32);
    let samples = gray_u16(width, height, 3);
    for method in [CompressionMethod::Lzw, CompressionMethod::Uncompressed] {
        let options = WriteOptions::default().with_compression(method).with_buffer_size(4096);
        let mut writer = TiffWriter::with_options(Cursor::new(Vec::new()), options).unwrap();
        writer.add_grayscale_image(IFD::with_size(width, height), &samples).unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let mut reader = TiffReader::new(Cursor::new(bytes)).unwrap();
        let ifd = reader.ifd(0).unwrap();
        let offsets = ifd.get(tags::STRIP_OFFSETS).and_then(TiffValue::as_u32_vec).unwrap();
        let counts = ifd.get(tags::STRIP_BYTE_COUNTS).and_then(TiffValue::as_u32_vec).unwrap();
        std::assert_eq!(offsets.len(), counts.len(), "{}", method);
        std::assert!(offsets.windows(2).all(|w| w[0] < w[1]), "{}", method);

        if method.is_compressed() {
            let rows = ifd.get_tag_value(tags::ROWS_PER_STRIP).unwrap();
            std::assert!(offsets.len() > 1);
            std::assert_eq!(offsets.len() as u32, height.div_ceil(rows));
        } else {
            let total: u64 = counts.iter().map(|c| *c as u64).sum();
            std::assert_eq!(total, width as u64 * height as u64 * 2);
        }
        std::assert_eq!(reader.read_grayscale(0).unwrap(), samples, "{}", method);
    }
}

#[test]
fn test_multi_image_chain() {
    let gray = Samples::U8((0..64).collect());
    let color = rgb(5, 3);
    let indices = Samples::U8((0..=255).collect());
    let colormap = palette();

    let mut writer = TiffWriter::new(Cursor::new(Vec::new())).unwrap();
    writer.add_grayscale_image(IFD::with_size(8, 8), &gray).unwrap();
    writer.add_rgb_image(IFD::with_size(5, 3), &color).unwrap();
    writer.add_palette_image(IFD::with_size(16, 16), &indices, &colormap).unwrap();
    std::assert_eq!(writer.images_written(), 3);
    let bytes = writer.finish().unwrap().into_inner();

    let mut reader = TiffReader::new(Cursor::new(bytes)).unwrap();
    std::assert_eq!(reader.image_count(), 3);
    std::assert_eq!(reader.byte_order(), ByteOrder::LittleEndian);
    std::assert_eq!(reader.read_grayscale(0).unwrap(), gray);
    std::assert_eq!(reader.read_rgb(1).unwrap(), color);

    let ifd = reader.ifd(2).unwrap();
    std::assert_eq!(ifd.get_tag_value(tags::PHOTOMETRIC_INTERPRETATION), Some(photometric::PALETTE as u32));
    let (read_indices, read_map) = reader.read_palette(2).unwrap();
    std::assert_eq!(read_indices, indices);
    std::assert_eq!(read_map, colormap);
}

#[test]
fn test_default_tags_and_required_size() {
    let mut ifd = IFD::with_size(4, 4);
    ifd.insert(tags::X_RESOLUTION, TiffValue::rational(300, 1));
    let mut writer = TiffWriter::new(Cursor::new(Vec::new())).unwrap();
    writer.add_grayscale_image(ifd, &Samples::F32(vec![0.5; 16])).unwrap();

    let missing = writer.add_grayscale_image(IFD::new(0, 0), &Samples::U8(vec![0; 4]));
    std::assert!(matches!(missing, Err(TiffError::MissingRequiredTags(_))));

    let bytes = writer.finish().unwrap().into_inner();
    let mut reader = TiffReader::new(Cursor::new(bytes)).unwrap();
    std::assert_eq!(reader.image_count(), 1);

    let ifd = reader.ifd(0).unwrap();
    std::assert_eq!(ifd.x_resolution(), Some(300.0));
    std::assert_eq!(ifd.y_resolution(), Some(1.0));
    std::assert_eq!(ifd.resolution_unit(), 1);
    std::assert_eq!(ifd.sample_format(), Some(3));
    std::assert_eq!(reader.read_grayscale(0).unwrap(), Samples::F32(vec![0.5; 16]));
}

#[test]
fn test_big_endian_pixels_are_swapped() {
    // 2x1 16-bit image, uncompressed, strip at offset 8
    let mut buffer = Vec::new();
    buffer.extend_from_slice(b"MM");
    buffer.write_u16::<BigEndian>(42).unwrap();
    buffer.write_u32::<BigEndian>(12).unwrap();
    buffer.write_u16::<BigEndian>(0x0102).unwrap();
    buffer.write_u16::<BigEndian>(0xA0B0).unwrap();

    let entries: [(u16, u16, u32); 6] = [
        (tags::IMAGE_WIDTH, 4, 2),
        (tags::IMAGE_LENGTH, 4, 1),
        (tags::BITS_PER_SAMPLE, 3, 16),
        (tags::STRIP_OFFSETS, 4, 8),
        (tags::ROWS_PER_STRIP, 4, 1),
        (tags::STRIP_BYTE_COUNTS, 4, 4),
    ];
    buffer.write_u16::<BigEndian>(entries.len() as u16).unwrap();
    for (tag, ty, value) in entries {
        buffer.write_u16::<BigEndian>(tag).unwrap();
        buffer.write_u16::<BigEndian>(ty).unwrap();
        buffer.write_u32::<BigEndian>(1).unwrap();
        if ty == 3 {
            buffer.write_u16::<BigEndian>(value as u16).unwrap();
            buffer.write_u16::<BigEndian>(0).unwrap();
        } else {
            buffer.write_u32::<BigEndian>(value).unwrap();
        }
    }
    buffer.write_u32::<BigEndian>(0).unwrap();

    let mut reader = TiffReader::new(Cursor::new(buffer)).unwrap();
    std::assert_eq!(reader.byte_order(), ByteOrder::BigEndian);
    std::assert_eq!(reader.read_grayscale(0).unwrap(), Samples::U16(vec![0x0102, 0xA0B0]));
}

#[test]
fn test_ifd_chain_stops_on_cycle() {
    let mut writer = TiffWriter::new(Cursor::new(Vec::new())).unwrap();
    writer.add_grayscale_image(IFD::with_size(2, 2), &Samples::U8(vec![1, 2, 3, 4])).unwrap();
    let mut bytes = writer.finish().unwrap().into_inner();

    // Point the last next-IFD slot back at the first IFD
    let first = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
    let count = u16::from_le_bytes([bytes[first], bytes[first + 1]]) as usize;
    let next_slot = first + 2 + 12 * count;
    bytes[next_slot..next_slot + 4].copy_from_slice(&(first as u32).to_le_bytes());

    let reader = TiffReader::new(Cursor::new(bytes)).unwrap();
    std::assert_eq!(reader.image_count(), 1);
}

fn sample_directory(width: u32, height: u32, planes: usize) -> StkDirectory {
    let mut dir = StkDirectory::with_ifd(IFD::with_size(width, height), planes);
    dir.set_wavelength(1, Rational::new(500, 1));
    dir.set_z_distance(2, Rational::new(3, 2));
    dir.set_creation_time(0, &Utc.with_ymd_and_hms(2019, 7, 23, 14, 5, 9).unwrap());
    dir.set_modified_time_raw(1, 2451545, 1234);
    dir.set_x_calibration(Rational::new(65, 100));
    dir.set_calibration_unit("um");
    dir.add_uic1(ids::NAME, vec![TiffValue::ascii_raw("stack")]);
    dir.add_uic1(
        ids::STAGE_LABEL,
        (0..planes).map(|i| TiffValue::ascii_raw(&format!("Stage{}", i))).collect(),
    );
    dir
}

#[test]
fn test_stk_gray_round_trip_per_compression() {
    let planes: Vec<Samples> = (0..3).map(|i| gray_u16(20, 9, i * 1000)).collect();

    for method in METHODS {
        let mut writer = StkWriter::new(Cursor::new(Vec::new())).unwrap();
        writer.set_compression(method);
        writer.write_grayscale_stack(sample_directory(20, 9, 3), &planes).unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let mut reader = StkReader::new(Cursor::new(bytes)).unwrap();
        std::assert_eq!(reader.num_planes(), 3);
        std::assert_eq!(reader.dimensions(), (20, 9));
        for (i, plane) in planes.iter().enumerate() {
            std::assert_eq!(&reader.read_gray_plane(i).unwrap(), plane, "{} plane {}", method, i);
        }
        std::assert!(matches!(
            reader.read_gray_plane(3),
            Err(TiffError::ImageIndexOutOfRange { index: 3, count: 3 })
        ));
    }
}

#[test]
fn test_stk_metadata_round_trip() {
    let planes: Vec<Samples> = (0..3).map(|i| Samples::U8(vec![i as u8; 12])).collect();
    let written = sample_directory(4, 3, 3);

    let mut writer = StkWriter::new(Cursor::new(Vec::new())).unwrap();
    writer.write_grayscale_stack(written.clone(), &planes).unwrap();
    let bytes = writer.finish().unwrap().into_inner();

    let reader = StkReader::new(Cursor::new(bytes)).unwrap();
    let dir = reader.directory();
    std::assert_eq!(dir.wavelength(1), Some(Rational::new(500, 1)));
    std::assert_eq!(dir.wavelength(0), Some(Rational::zero()));
    std::assert_eq!(dir.z_distance(2), Some(Rational::new(3, 2)));
    std::assert_eq!(dir.creation_time_raw(0), written.creation_time_raw(0));
    std::assert_eq!(
        dir.creation_time(0).unwrap(),
        Utc.with_ymd_and_hms(2019, 7, 23, 14, 5, 9).unwrap()
    );
    std::assert_eq!(dir.modified_time_raw(1), Some((2451545, 1234)));
    std::assert_eq!(dir.x_calibration(), Some(Rational::new(65, 100)));
    std::assert_eq!(dir.y_calibration(), None);
    std::assert_eq!(dir.calibration_unit().as_deref(), Some("um"));
    std::assert_eq!(dir.uic1(ids::NAME).unwrap()[0].as_string().as_deref(), Some("stack"));

    let labels: Vec<String> = dir
        .uic1(ids::STAGE_LABEL)
        .unwrap()
        .iter()
        .filter_map(|v| v.as_string())
        .collect();
    std::assert_eq!(labels, vec!["Stage0", "Stage1", "Stage2"]);

    std::assert_eq!(dir.absolute_z_uic1().unwrap(), vec![Rational::zero(); 3]);
    std::assert_eq!(dir.absolute_z_uic4().unwrap(), vec![Rational::zero(); 3]);

    let owned = reader.into_directory();
    std::assert_eq!(owned.num_planes(), 3);
    std::assert_eq!(owned.into_ifd().get_dimensions(), Some((4, 3)));
}

#[test]
fn test_stk_rgb_and_palette_stacks() {
    let color: Vec<RgbPlanes> = (0..2).map(|_| rgb(6, 4)).collect();
    let mut writer = StkWriter::new(Cursor::new(Vec::new())).unwrap();
    writer.set_compression(CompressionMethod::Lzw);
    writer.write_rgb_stack(StkDirectory::with_ifd(IFD::with_size(6, 4), 2), &color).unwrap();
    let bytes = writer.finish().unwrap().into_inner();

    let mut reader = StkReader::new(Cursor::new(bytes)).unwrap();
    std::assert_eq!(reader.read_rgb_plane(1).unwrap(), color[1]);

    let indices: Vec<Samples> = (0..2).map(|i| Samples::U8(vec![i * 100; 16])).collect();
    let mut writer = StkWriter::new(Cursor::new(Vec::new())).unwrap();
    writer
        .write_palette_stack(StkDirectory::with_ifd(IFD::with_size(4, 4), 2), &indices, &palette())
        .unwrap();
    let bytes = writer.finish().unwrap().into_inner();

    let mut reader = StkReader::new(Cursor::new(bytes)).unwrap();
    let (plane, colormap) = reader.read_palette_plane(1).unwrap();
    std::assert_eq!(plane, indices[1]);
    std::assert_eq!(colormap, palette());
}

#[test]
fn test_stk_plane_by_plane_adjusts_plane_count() {
    let mut writer = StkWriter::new(Cursor::new(Vec::new())).unwrap();
    let mut dir = StkDirectory::with_ifd(IFD::with_size(3, 2), 4);
    dir.set_wavelength(0, Rational::new(405, 1));
    writer
        .prepare(dir, stackkit::tiff::PlaneLayout::Grayscale(stackkit::SampleType::U8))
        .unwrap();

    let wrong = writer.write_plane(&Samples::U16(vec![0; 6]));
    std::assert!(matches!(wrong, Err(TiffError::InvalidImageParameters(_))));

    writer.write_plane(&Samples::U8(vec![1; 6])).unwrap();
    writer.write_plane(&Samples::U8(vec![2; 6])).unwrap();
    writer.finalize().unwrap();
    let bytes = writer.finish().unwrap().into_inner();

    let mut reader = StkReader::new(Cursor::new(bytes)).unwrap();
    std::assert_eq!(reader.num_planes(), 2);
    std::assert_eq!(reader.directory().wavelength(0), Some(Rational::new(405, 1)));
    std::assert_eq!(reader.read_gray_plane(1).unwrap(), Samples::U8(vec![2; 6]));
}

#[test]
fn test_stk_writer_rejects_mismatched_stacks() {
    let mut writer = StkWriter::new(Cursor::new(Vec::new())).unwrap();
    let planes = vec![Samples::U8(vec![0; 4]); 2];
    let result = writer.write_grayscale_stack(StkDirectory::with_ifd(IFD::with_size(2, 2), 3), &planes);
    std::assert!(matches!(result, Err(TiffError::InvalidImageParameters(_))));

    std::assert!(writer.finalize().is_err());
}

#[test]
fn test_plain_tiff_is_not_a_stack() {
    let mut writer = TiffWriter::new(Cursor::new(Vec::new())).unwrap();
    writer.add_grayscale_image(IFD::with_size(2, 2), &Samples::U8(vec![0; 4])).unwrap();
    let bytes = writer.finish().unwrap().into_inner();

    let result = StkReader::new(Cursor::new(bytes));
    std::assert!(matches!(result, Err(TiffError::CorruptedStackFile(_))));
}

#[test]
fn test_julian_reference_dates() {
    let epoch = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
    std::assert_eq!(julian::to_julian(&epoch), (2451544, 0));
    std::assert_eq!(julian::from_julian(2451544, 3_600_000).unwrap(), epoch + chrono::Duration::hours(1));
    std::assert!(matches!(julian::from_julian(2451544, 86_400_000), Err(TiffError::DateConversion(_))));
}

#[test]
fn test_facade_on_files() {
    let dir = std::env::temp_dir().join(format!("stackkit-facade-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let stack_path = dir.join("input.stk");
    let lzw_path = dir.join("lzw.stk");
    let png_path = dir.join("plane1.png");

    let planes: Vec<Samples> = (0..3).map(|i| Samples::U16(vec![i * 1000; 20])).collect();
    let mut writer = StkWriter::create(&stack_path).unwrap();
    writer.write_grayscale_stack(sample_directory(5, 4, 3), &planes).unwrap();
    writer.finish().unwrap();

    let kit = StackKit::new();
    let input = stack_path.to_str().unwrap();
    let report = kit.analyze(input, false).unwrap();
    std::assert!(report.contains("MetaMorph STK"));
    std::assert!(report.contains("STK stack: 3 planes"));

    kit.convert(input, lzw_path.to_str().unwrap(), "lzw").unwrap();
    let mut converted = kit.open_stack(lzw_path.to_str().unwrap()).unwrap();
    std::assert_eq!(converted.num_planes(), 3);
    std::assert_eq!(converted.read_gray_plane(2).unwrap(), planes[2]);
    std::assert!(kit.convert(input, lzw_path.to_str().unwrap(), "jpeg2000").is_err());

    kit.extract_to_file(input, png_path.to_str().unwrap(), 1).unwrap();
    let image = image::open(&png_path).unwrap();
    std::assert_eq!((image.width(), image.height()), (5, 4));

    std::fs::remove_dir_all(&dir).unwrap();
}
