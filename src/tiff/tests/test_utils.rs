use std::io::Cursor;
use byteorder::{BigEndian, ByteOrder as _, LittleEndian, WriteBytesExt};

/// One directory record for the test buffers; `slot` is already encoded
pub struct TestEntry {
    pub tag: u16,
    pub field_type: u16,
    pub count: u32,
    pub slot: [u8; 4],
}

impl TestEntry {
    pub fn long_le(tag: u16, value: u32) -> Self {
        let mut slot = [0u8; 4];
        LittleEndian::write_u32(&mut slot, value);
        TestEntry { tag, field_type: 4, count: 1, slot }
    }
}

/// Creates a little-endian TIFF buffer with one IFD at offset 8
pub fn create_test_tiff_buffer() -> Cursor<Vec<u8>> {
    let mut buffer = Vec::new();

    // TIFF header (little-endian)
    buffer.write_u16::<LittleEndian>(0x4949).unwrap(); // II for little-endian
    buffer.write_u16::<LittleEndian>(42).unwrap();     // TIFF magic number
    buffer.write_u32::<LittleEndian>(8).unwrap();      // IFD offset

    write_ifd_le(
        &mut buffer,
        &[TestEntry::long_le(256, 800), TestEntry::long_le(257, 600)],
        0,
    );

    Cursor::new(buffer)
}

/// Creates a big-endian TIFF buffer with a SHORT width and a LONG height
pub fn create_test_big_endian_buffer() -> Cursor<Vec<u8>> {
    let mut buffer = Vec::new();

    buffer.write_u16::<BigEndian>(0x4D4D).unwrap(); // MM
    buffer.write_u16::<BigEndian>(42).unwrap();
    buffer.write_u32::<BigEndian>(8).unwrap();

    buffer.write_u16::<BigEndian>(2).unwrap();

    // ImageWidth as SHORT, left-justified in the slot
    buffer.write_u16::<BigEndian>(256).unwrap();
    buffer.write_u16::<BigEndian>(3).unwrap();
    buffer.write_u32::<BigEndian>(1).unwrap();
    buffer.write_u16::<BigEndian>(1024).unwrap();
    buffer.write_u16::<BigEndian>(0).unwrap();

    // ImageLength as LONG
    buffer.write_u16::<BigEndian>(257).unwrap();
    buffer.write_u16::<BigEndian>(4).unwrap();
    buffer.write_u32::<BigEndian>(1).unwrap();
    buffer.write_u32::<BigEndian>(768).unwrap();

    buffer.write_u32::<BigEndian>(0).unwrap();

    Cursor::new(buffer)
}

/// Appends a little-endian IFD with the given records and next offset
pub fn write_ifd_le(buffer: &mut Vec<u8>, entries: &[TestEntry], next: u32) {
    buffer.write_u16::<LittleEndian>(entries.len() as u16).unwrap();
    for entry in entries {
        buffer.write_u16::<LittleEndian>(entry.tag).unwrap();
        buffer.write_u16::<LittleEndian>(entry.field_type).unwrap();
        buffer.write_u32::<LittleEndian>(entry.count).unwrap();
        buffer.extend_from_slice(&entry.slot);
    }
    buffer.write_u32::<LittleEndian>(next).unwrap();
}
