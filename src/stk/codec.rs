//! UIC tag codec
//!
//! The generic directory reader leaves UIC1–UIC4 undecoded (see
//! `StkSchema`); this module parses their blocks into a `StkDirectory` and
//! encodes them back when an STK image is written.

use log::{debug, trace, warn};
use std::collections::BTreeMap;
use std::io::SeekFrom;

use crate::io::byte_order::{ByteOrderHandler, LittleEndianHandler};
use crate::io::seekable::SeekableReader;
use crate::stk::directory::StkDirectory;
use crate::stk::uic::{uic1_kind, uic4_kind, uic_name, Uic1Kind, Uic4Kind, USER_LUT_LEN};
use crate::tiff::constants::tags;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::{RawEntry, IFD};
use crate::tiff::schema::{EncodedExtension, ExtensionEncoder, TagSchema};
use crate::tiff::types::{Rational, TiffType, TiffValue};
use crate::tiff::validation;
use crate::tiff::writer::offset_u32;

/// STK tag schema: UIC1–UIC4 are decoded by this module
#[derive(Debug, Default, Clone, Copy)]
pub struct StkSchema;

impl TagSchema for StkSchema {
    fn name(&self) -> &'static str {
        "STK"
    }

    fn is_extension_tag(&self, tag: u16) -> bool {
        matches!(tag, tags::UIC1 | tags::UIC2 | tags::UIC3 | tags::UIC4)
    }
}

/// Stream, byte order and plane count shared by the block parsers
struct BlockReader<'a> {
    reader: &'a mut dyn SeekableReader,
    handler: &'a dyn ByteOrderHandler,
    num_plane: usize,
    file_size: u64,
}

impl<'a> BlockReader<'a> {
    fn seek(&mut self, offset: u64) -> TiffResult<()> {
        validation::validate_extent(offset, 0, self.file_size)?;
        self.reader.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    fn read(&mut self, ty: TiffType, count: usize) -> TiffResult<TiffValue> {
        let position = self.reader.stream_position()?;
        validation::validate_extent(position, (count * ty.width()) as u64, self.file_size)?;
        TiffValue::read(ty, count, self.reader, self.handler)
    }

    fn read_u16(&mut self) -> TiffResult<u16> {
        Ok(self.handler.read_u16(self.reader)?)
    }

    fn read_u32(&mut self) -> TiffResult<u32> {
        Ok(self.handler.read_u32(self.reader)?)
    }

    /// u32 length followed by that many ASCII bytes
    fn read_string(&mut self) -> TiffResult<TiffValue> {
        let len = self.read_u32()? as usize;
        self.read(TiffType::Ascii, len)
    }

    fn read_at(&mut self, offset: u32, ty: TiffType, count: usize) -> TiffResult<TiffValue> {
        self.seek(offset as u64)?;
        self.read(ty, count)
    }
}

/// Builds the STK directory of an IFD from its deferred UIC records
///
/// UIC2 and UIC3 must be present; the plane count is the UIC3 count. A
/// UIC2 block that cannot be read makes the file unusable, while broken
/// UIC1, UIC3 or UIC4 blocks are dropped and leave defaults in place.
pub(crate) fn read_directory(
    reader: &mut dyn SeekableReader,
    handler: &dyn ByteOrderHandler,
    ifd: IFD,
    entries: &[RawEntry],
) -> TiffResult<StkDirectory> {
    let find = |tag: u16| entries.iter().find(|entry| entry.tag == tag).copied();

    let uic2 = find(tags::UIC2)
        .ok_or_else(|| TiffError::CorruptedStackFile("UIC2 tag is missing".to_string()))?;
    let uic3 = find(tags::UIC3)
        .ok_or_else(|| TiffError::CorruptedStackFile("UIC3 tag is missing".to_string()))?;
    let num_plane = uic3.count as usize;
    if num_plane == 0 {
        return Err(TiffError::CorruptedStackFile("stack has no planes".to_string()));
    }

    let file_size = validation::get_file_size(&mut *reader)?;
    // UIC2 holds three rationals per plane
    validation::validate_extent(uic2.offset as u64, 24 * uic3.count as u64, file_size)
        .map_err(|e| TiffError::CorruptedStackFile(format!("UIC2 block for {} planes: {}", num_plane, e)))?;

    let mut blocks = BlockReader {
        reader,
        handler,
        num_plane,
        file_size,
    };
    let mut directory = StkDirectory::with_ifd(ifd, num_plane);

    let triples = read_uic2(&mut blocks, uic2)
        .map_err(|e| TiffError::CorruptedStackFile(format!("UIC2 block unreadable: {}", e)))?;
    for (plane, triple) in triples.chunks_exact(3).enumerate() {
        directory.z_distance[plane] = triple[0];
        directory.creation_time[plane] = triple[1];
        directory.modified_time[plane] = triple[2];
    }

    match blocks
        .read_at(uic3.offset, TiffType::Rational, num_plane)
        .map(|v| v.as_rationals().unwrap_or_default())
    {
        Ok(wavelengths) => directory.wavelength = wavelengths,
        Err(e) => warn!("Dropping UIC3 block: {}", e),
    }

    if let Some(uic4) = find(tags::UIC4) {
        match read_uic4(&mut blocks, uic4) {
            Ok(records) => directory.uic4.extend(records),
            Err(e) => warn!("Dropping UIC4 block: {}", e),
        }
    }

    if let Some(uic1) = find(tags::UIC1) {
        match read_uic1(&mut blocks, uic1) {
            Ok(records) => directory.uic1.extend(records),
            Err(e) => warn!("Dropping UIC1 block: {}", e),
        }
    }

    debug!(
        "STK directory: {} planes, {} UIC1 records, {} UIC4 records",
        num_plane,
        directory.uic1.len(),
        directory.uic4.len()
    );
    Ok(directory)
}

fn read_uic2(blocks: &mut BlockReader, entry: RawEntry) -> TiffResult<Vec<Rational>> {
    let value = blocks.read_at(entry.offset, TiffType::Rational, 3 * blocks.num_plane)?;
    value
        .as_rationals()
        .ok_or_else(|| TiffError::CorruptedStackFile("UIC2 is not rational".to_string()))
}

/// Parses the UIC1 record table
///
/// Parsing stops at the first id without a known layout; records read up
/// to that point are kept.
fn read_uic1(blocks: &mut BlockReader, entry: RawEntry) -> TiffResult<BTreeMap<u32, Vec<TiffValue>>> {
    let n = blocks.num_plane;
    let mut records = BTreeMap::new();

    for index in 0..entry.count as u64 {
        blocks.seek(entry.offset as u64 + 8 * index)?;
        let id = blocks.read_u32()?;
        let slot = blocks.read_u32()?;

        let kind = match uic1_kind(id) {
            Some(kind) => kind,
            None => {
                warn!(
                    "Unknown UIC1 id {} in record {} of {}, ignoring the remaining records",
                    id, index, entry.count
                );
                break;
            }
        };

        let values = match kind {
            Uic1Kind::InlineLong => vec![TiffValue::long(slot)],
            Uic1Kind::Rational => vec![blocks.read_at(slot, TiffType::Rational, 1)?],
            Uic1Kind::PlaneRationals => vec![blocks.read_at(slot, TiffType::Rational, n)?],
            Uic1Kind::PlaneLongs => vec![blocks.read_at(slot, TiffType::Long, n)?],
            Uic1Kind::String => {
                blocks.seek(slot as u64)?;
                vec![blocks.read_string()?]
            }
            Uic1Kind::OffsetLong => vec![blocks.read_at(slot, TiffType::Long, 1)?],
            Uic1Kind::ByteTable => vec![blocks.read_at(slot, TiffType::Byte, USER_LUT_LEN)?],
            Uic1Kind::PlaneRationalPairs => vec![blocks.read_at(slot, TiffType::Rational, 2 * n)?],
            Uic1Kind::PlaneStrings => {
                blocks.seek(slot as u64)?;
                let inner = blocks.read_u32()?;
                blocks.seek(inner as u64)?;
                let mut labels = Vec::with_capacity(n);
                for _ in 0..n {
                    labels.push(blocks.read_string()?);
                }
                labels
            }
            Uic1Kind::Ignored => {
                trace!("Skipping UIC1 id {} ({})", id, uic_name(id));
                continue;
            }
        };
        trace!("UIC1 id {} ({}): {} values", id, uic_name(id), values.len());
        records.insert(id, values);
    }
    Ok(records)
}

/// Parses the UIC4 id blocks up to the terminating zero id
fn read_uic4(blocks: &mut BlockReader, entry: RawEntry) -> TiffResult<BTreeMap<u16, Vec<TiffValue>>> {
    let n = blocks.num_plane;
    let mut records = BTreeMap::new();
    blocks.seek(entry.offset as u64)?;

    loop {
        let id = blocks.read_u16()?;
        if id == 0 {
            break;
        }
        let kind = match uic4_kind(id) {
            Some(kind) => kind,
            None => {
                warn!("Unknown UIC4 id {}, ignoring the rest of the block", id);
                break;
            }
        };

        let mut values = Vec::with_capacity(n);
        for _ in 0..n {
            let value = match kind {
                Uic4Kind::RationalPair => blocks.read(TiffType::Rational, 2)?,
                Uic4Kind::String => blocks.read_string()?,
                Uic4Kind::Rational => blocks.read(TiffType::Rational, 1)?,
                Uic4Kind::Long => blocks.read(TiffType::Long, 1)?,
            };
            values.push(value);
        }
        trace!("UIC4 id {} ({}) read for {} planes", id, uic_name(id as u32), n);
        records.insert(id, values);
    }
    Ok(records)
}

/// Encodes the UIC tags of one directory
pub(crate) struct StkEncoder<'a> {
    directory: &'a StkDirectory,
}

impl<'a> StkEncoder<'a> {
    pub(crate) fn new(directory: &'a StkDirectory) -> Self {
        StkEncoder { directory }
    }

    fn plane_count(&self) -> TiffResult<u32> {
        u32::try_from(self.directory.num_planes())
            .map_err(|_| TiffError::InvalidMetadata("too many planes".to_string()))
    }

    /// Data blocks first, then the (id, value-or-offset) table
    fn encode_uic1(&self, base: u64) -> TiffResult<EncodedExtension> {
        let handler = LittleEndianHandler;
        let mut data = Vec::new();
        let mut table: Vec<(u32, u32)> = Vec::new();

        for (&id, values) in &self.directory.uic1 {
            let first = match values.first() {
                Some(first) => first,
                None => continue,
            };
            let kind = match uic1_kind(id) {
                Some(Uic1Kind::Ignored) | None => {
                    debug!("UIC1 id {} ({}) is not written", id, uic_name(id));
                    continue;
                }
                Some(kind) => kind,
            };

            let position = offset_u32(base + data.len() as u64)?;
            match kind {
                Uic1Kind::InlineLong => {
                    table.push((id, first.first_u32().unwrap_or(0)));
                    continue;
                }
                Uic1Kind::String => write_string(&mut data, first, &handler)?,
                Uic1Kind::PlaneStrings => {
                    let inner = offset_u32(base + data.len() as u64 + 4)?;
                    data.extend_from_slice(&inner.to_le_bytes());
                    for label in values {
                        write_string(&mut data, label, &handler)?;
                    }
                }
                _ => first.write(&mut data, &handler)?,
            }
            table.push((id, position));
        }

        let table_position = offset_u32(base + data.len() as u64)?;
        for (id, value) in &table {
            data.extend_from_slice(&id.to_le_bytes());
            data.extend_from_slice(&value.to_le_bytes());
        }

        Ok(EncodedExtension {
            field_type: TiffType::Long,
            count: table.len() as u32,
            slot: table_position,
            data,
        })
    }

    /// `[z, creation, modified]` per plane
    fn encode_uic2(&self, base: u64) -> TiffResult<EncodedExtension> {
        let dir = self.directory;
        if !dir.valid_uic2() {
            return Err(TiffError::InvalidMetadata(
                "UIC2 arrays do not match the plane count".to_string(),
            ));
        }
        let mut triples = Vec::with_capacity(3 * dir.num_planes());
        for plane in 0..dir.num_planes() {
            triples.push(dir.z_distance[plane]);
            triples.push(dir.creation_time[plane]);
            triples.push(dir.modified_time[plane]);
        }
        Ok(EncodedExtension {
            field_type: TiffType::Rational,
            count: self.plane_count()?,
            slot: offset_u32(base)?,
            data: TiffValue::rationals(&triples).to_bytes(&LittleEndianHandler)?,
        })
    }

    fn encode_uic3(&self, base: u64) -> TiffResult<EncodedExtension> {
        Ok(EncodedExtension {
            field_type: TiffType::Rational,
            count: self.plane_count()?,
            slot: offset_u32(base)?,
            data: TiffValue::rationals(&self.directory.wavelength).to_bytes(&LittleEndianHandler)?,
        })
    }

    /// `u16 id` then one value per plane, for each record; zero id ends the block
    fn encode_uic4(&self, base: u64) -> TiffResult<EncodedExtension> {
        let handler = LittleEndianHandler;
        let n = self.directory.num_planes();
        let mut data = Vec::new();

        for (&id, values) in &self.directory.uic4 {
            let kind = match uic4_kind(id) {
                Some(kind) => kind,
                None => {
                    debug!("UIC4 id {} ({}) is not written", id, uic_name(id as u32));
                    continue;
                }
            };
            data.extend_from_slice(&id.to_le_bytes());
            for value in values.iter().take(n) {
                match kind {
                    Uic4Kind::String => write_string(&mut data, value, &handler)?,
                    _ => value.write(&mut data, &handler)?,
                }
            }
        }
        data.extend_from_slice(&0u16.to_le_bytes());

        Ok(EncodedExtension {
            field_type: TiffType::Long,
            count: self.plane_count()?,
            slot: offset_u32(base)?,
            data,
        })
    }
}

/// u32 byte length followed by the bytes
fn write_string(data: &mut Vec<u8>, value: &TiffValue, handler: &dyn ByteOrderHandler) -> TiffResult<()> {
    let len = offset_u32(value.byte_len() as u64)?;
    data.extend_from_slice(&len.to_le_bytes());
    value.write(data, handler)
}

impl ExtensionEncoder for StkEncoder<'_> {
    fn extension_tags(&self) -> Vec<u16> {
        let dir = self.directory;
        let mut tags_out = Vec::with_capacity(4);
        if dir.valid_uic1() {
            tags_out.push(tags::UIC1);
        }
        tags_out.push(tags::UIC2);
        if dir.valid_uic3() {
            tags_out.push(tags::UIC3);
        }
        if dir.valid_uic4() {
            tags_out.push(tags::UIC4);
        }
        tags_out
    }

    fn encode(&self, tag: u16, base: u64) -> TiffResult<EncodedExtension> {
        match tag {
            tags::UIC1 => self.encode_uic1(base),
            tags::UIC2 => self.encode_uic2(base),
            tags::UIC3 => self.encode_uic3(base),
            tags::UIC4 => self.encode_uic4(base),
            _ => Err(TiffError::TagNotFound(tag)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stk::uic::ids;
    use std::io::Cursor;

    /// Lays encoded blocks out at their base offsets in one buffer
    fn encode_all(directory: &StkDirectory, base: u64) -> (Vec<u8>, Vec<RawEntry>) {
        let encoder = StkEncoder::new(directory);
        let mut file = vec![0u8; base as usize];
        let mut entries = Vec::new();
        for tag in encoder.extension_tags() {
            let encoded = encoder.encode(tag, file.len() as u64).unwrap();
            entries.push(RawEntry {
                tag,
                field_type: encoded.field_type.code(),
                count: encoded.count,
                offset: encoded.slot,
            });
            file.extend_from_slice(&encoded.data);
        }
        (file, entries)
    }

    fn decode(file: Vec<u8>, entries: &[RawEntry]) -> TiffResult<StkDirectory> {
        let mut cursor = Cursor::new(file);
        read_directory(&mut cursor, &LittleEndianHandler, IFD::new(0, 0), entries)
    }

    #[test]
    fn test_schema_claims_uic_tags() {
        assert!(StkSchema.is_extension_tag(tags::UIC1));
        assert!(StkSchema.is_extension_tag(tags::UIC4));
        assert!(!StkSchema.is_extension_tag(tags::IMAGE_WIDTH));
    }

    #[test]
    fn test_wavelength_round_trip() {
        let mut dir = StkDirectory::new(3);
        dir.set_wavelength(1, Rational::new(500, 1));

        let (file, entries) = encode_all(&dir, 16);
        let read = decode(file, &entries).unwrap();
        assert_eq!(read.num_planes(), 3);
        assert_eq!(read.wavelength(1), Some(Rational::new(500, 1)));
        assert_eq!(read.wavelength(0), Some(Rational::new(0, 1)));
        assert_eq!(read.wavelength(2), Some(Rational::new(0, 1)));
    }

    #[test]
    fn test_uic1_layouts_round_trip() {
        let mut dir = StkDirectory::new(2);
        dir.set_x_calibration(Rational::new(16, 100));
        dir.set_calibration_unit("um");
        dir.force_add_uic1(ids::NAME, vec![TiffValue::ascii_raw("stack")]);
        dir.force_add_uic1(ids::GAMMA, vec![TiffValue::long(22)]);
        dir.force_add_uic1(ids::ZOOM, vec![TiffValue::long(4)]);
        let lut: Vec<u8> = (0..USER_LUT_LEN).map(|i| (i % 256) as u8).collect();
        dir.force_add_uic1(ids::USER_LUT_TABLE, vec![TiffValue::bytes(&lut)]);
        dir.force_add_uic1(
            ids::STAGE_LABEL,
            vec![TiffValue::ascii_raw("first"), TiffValue::ascii_raw("second")],
        );
        dir.force_add_uic1(ids::STAGE_POSITION, vec![TiffValue::Rational(vec![1, 1, 2, 1, 3, 1, 4, 1])]);
        dir.force_add_uic1(ids::CAMERA_BIN, vec![TiffValue::long(2)]);

        let (file, entries) = encode_all(&dir, 8);
        let uic1 = entries.iter().find(|e| e.tag == tags::UIC1).unwrap();
        // CameraBin is dropped on write
        assert_eq!(uic1.count as usize, dir.uic1_ids().count() - 1);

        let read = decode(file, &entries).unwrap();
        assert_eq!(read.x_calibration(), Some(Rational::new(16, 100)));
        assert_eq!(read.calibration_unit().as_deref(), Some("um"));
        assert_eq!(read.uic1(ids::NAME), Some(&[TiffValue::ascii_raw("stack")][..]));
        assert_eq!(read.uic1(ids::GAMMA), dir.uic1(ids::GAMMA));
        assert_eq!(read.uic1(ids::ZOOM), dir.uic1(ids::ZOOM));
        assert_eq!(read.uic1(ids::USER_LUT_TABLE), dir.uic1(ids::USER_LUT_TABLE));
        assert_eq!(read.uic1(ids::STAGE_LABEL), dir.uic1(ids::STAGE_LABEL));
        assert_eq!(read.uic1(ids::STAGE_POSITION), dir.uic1(ids::STAGE_POSITION));
        assert_eq!(read.uic1(ids::CAMERA_BIN), None);
        assert_eq!(read.absolute_z_uic1().unwrap(), vec![Rational::zero(); 2]);
    }

    #[test]
    fn test_uic4_round_trip() {
        let mut dir = StkDirectory::new(2);
        dir.set_absolute_z_uic4(&[Rational::new(5, 2), Rational::new(7, 2)]).unwrap();
        dir.force_add_uic4(37, vec![TiffValue::ascii_raw("A1"), TiffValue::ascii_raw("B12")]);
        dir.force_add_uic4(28, vec![TiffValue::Rational(vec![1, 2, 3, 4]), TiffValue::Rational(vec![5, 6, 7, 8])]);

        let (file, entries) = encode_all(&dir, 8);
        let read = decode(file, &entries).unwrap();
        assert_eq!(read.absolute_z_uic4().unwrap(), vec![Rational::new(5, 2), Rational::new(7, 2)]);
        assert_eq!(read.uic4(37), dir.uic4(37));
        assert_eq!(read.uic4(28), dir.uic4(28));
    }

    #[test]
    fn test_unknown_uic1_id_stops_parsing() {
        // UIC1 table: Zoom, an unknown id, then AutoScale
        let mut file = Vec::new();
        for (id, value) in [(15u32, 3u32), (30, 0), (0, 1)] {
            file.extend_from_slice(&id.to_le_bytes());
            file.extend_from_slice(&value.to_le_bytes());
        }
        let uic2_pos = file.len() as u32;
        file.extend_from_slice(&[0u8; 24]);
        let uic3_pos = file.len() as u32;
        file.extend_from_slice(&[0u8; 8]);

        let entries = [
            RawEntry { tag: tags::UIC1, field_type: 4, count: 3, offset: 0 },
            RawEntry { tag: tags::UIC2, field_type: 5, count: 1, offset: uic2_pos },
            RawEntry { tag: tags::UIC3, field_type: 5, count: 1, offset: uic3_pos },
        ];
        let read = decode(file, &entries).unwrap();
        assert_eq!(read.uic1(ids::ZOOM), Some(&[TiffValue::long(3)][..]));
        assert_eq!(read.uic1(ids::AUTO_SCALE), None);
    }

    #[test]
    fn test_missing_uic_tags() {
        let dir = StkDirectory::new(1);
        let (file, entries) = encode_all(&dir, 8);
        let without_uic3: Vec<_> = entries.iter().copied().filter(|e| e.tag != tags::UIC3).collect();
        assert!(matches!(
            decode(file.clone(), &without_uic3),
            Err(TiffError::CorruptedStackFile(_))
        ));

        let mut zero_planes = entries.clone();
        for entry in zero_planes.iter_mut().filter(|e| e.tag == tags::UIC3) {
            entry.count = 0;
        }
        assert!(matches!(decode(file.clone(), &zero_planes), Err(TiffError::CorruptedStackFile(_))));

        let mut broken_uic2 = entries.clone();
        for entry in broken_uic2.iter_mut().filter(|e| e.tag == tags::UIC2) {
            entry.offset = file.len() as u32 - 4;
        }
        assert!(matches!(decode(file, &broken_uic2), Err(TiffError::CorruptedStackFile(_))));
    }

    #[test]
    fn test_plane_count_larger_than_file() {
        let dir = StkDirectory::new(1);
        let (file, mut entries) = encode_all(&dir, 8);
        for entry in entries.iter_mut().filter(|e| e.tag == tags::UIC3) {
            entry.count = 1 << 30;
        }
        assert!(matches!(decode(file, &entries), Err(TiffError::CorruptedStackFile(_))));
    }

    #[test]
    fn test_invalid_uic2_rejected() {
        let mut dir = StkDirectory::new(2);
        dir.z_distance.pop();
        let encoder = StkEncoder::new(&dir);
        assert!(matches!(encoder.encode(tags::UIC2, 8), Err(TiffError::InvalidMetadata(_))));
    }
}
