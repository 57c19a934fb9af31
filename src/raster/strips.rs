//! Strip layout and strip tables

use log::debug;

use crate::tiff::constants::tags;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::IFD;
use crate::tiff::types::TiffValue;

/// How a compressed plane is cut into strips
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripLayout {
    pub rows_per_strip: u32,
    pub strip_count: usize,
}

/// Chooses rows per strip so that one strip holds about
/// `multiplier * buffer_size` uncompressed bytes
pub fn define_strips(plane_bytes: usize, height: u32, multiplier: usize, buffer_size: usize) -> StripLayout {
    let height = height.max(1);
    let bytes_per_row = (plane_bytes / height as usize).max(1);
    let rows = (multiplier * buffer_size / bytes_per_row).clamp(1, height as usize) as u32;
    let strip_count = height.div_ceil(rows) as usize;

    debug!(
        "Strip layout: {} bytes per row, {} rows per strip, {} strips",
        bytes_per_row, rows, strip_count
    );
    StripLayout {
        rows_per_strip: rows,
        strip_count,
    }
}

/// StripOffsets, StripByteCounts and RowsPerStrip of one image
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StripTable {
    pub offsets: Vec<u32>,
    pub byte_counts: Vec<u32>,
    pub rows_per_strip: u32,
}

impl StripTable {
    /// Reads the strip tags of `ifd`
    ///
    /// RowsPerStrip defaults to the image height divided by the strip count.
    pub fn from_ifd(ifd: &IFD) -> TiffResult<Self> {
        let offsets = ifd.get_tag_values(tags::STRIP_OFFSETS).unwrap_or_default();
        let byte_counts = ifd.get_tag_values(tags::STRIP_BYTE_COUNTS).unwrap_or_default();

        if offsets.is_empty() || offsets.len() != byte_counts.len() {
            return Err(TiffError::InvalidImageInfo(format!(
                "IFD #{}: {} strip offsets for {} byte counts",
                ifd.number,
                offsets.len(),
                byte_counts.len()
            )));
        }

        let rows_per_strip = match ifd.get_tag_value(tags::ROWS_PER_STRIP) {
            Some(rows) => rows,
            None => {
                let height = ifd.get_tag_value(tags::IMAGE_LENGTH).unwrap_or(0);
                (height / offsets.len() as u32).max(1)
            }
        };

        Ok(StripTable {
            offsets,
            byte_counts,
            rows_per_strip,
        })
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Distance between the starts of consecutive uncompressed planes
    pub fn plane_span(&self) -> u64 {
        match (self.offsets.first(), self.offsets.last(), self.byte_counts.last()) {
            (Some(first), Some(last), Some(count)) => (*last as u64 + *count as u64).saturating_sub(*first as u64),
            _ => 0,
        }
    }

    pub fn total_bytes(&self) -> u64 {
        self.byte_counts.iter().map(|c| *c as u64).sum()
    }

    /// Stores the table in `ifd`, replacing existing strip tags
    pub fn apply(&self, ifd: &mut IFD) {
        ifd.force_insert(tags::STRIP_OFFSETS, TiffValue::longs(&self.offsets));
        ifd.force_insert(tags::STRIP_BYTE_COUNTS, TiffValue::longs(&self.byte_counts));
        ifd.force_insert(tags::ROWS_PER_STRIP, TiffValue::long(self.rows_per_strip));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_strips() {
        // 100 bytes per row, 2 * 8192 / 100 = 163 rows
        let layout = define_strips(100 * 500, 500, 2, 8192);
        assert_eq!(layout.rows_per_strip, 163);
        assert_eq!(layout.strip_count, 4);

        // Rows wider than the buffer still get one row per strip
        let layout = define_strips(40_000 * 3, 3, 2, 4096);
        assert_eq!(layout, StripLayout { rows_per_strip: 1, strip_count: 3 });

        // Small images fit in a single strip
        let layout = define_strips(64, 8, 3, 4096);
        assert_eq!(layout, StripLayout { rows_per_strip: 8, strip_count: 1 });
    }

    #[test]
    fn test_table_from_ifd() {
        let mut ifd = IFD::new(0, 0);
        ifd.insert(tags::IMAGE_LENGTH, TiffValue::long(10));
        ifd.insert(tags::STRIP_OFFSETS, TiffValue::longs(&[100, 200]));
        ifd.insert(tags::STRIP_BYTE_COUNTS, TiffValue::Short(vec![50, 60]));

        let table = StripTable::from_ifd(&ifd).unwrap();
        assert_eq!(table.rows_per_strip, 5);
        assert_eq!(table.plane_span(), 160);
        assert_eq!(table.total_bytes(), 110);

        ifd.force_insert(tags::STRIP_BYTE_COUNTS, TiffValue::long(50));
        assert!(matches!(StripTable::from_ifd(&ifd), Err(TiffError::InvalidImageInfo(_))));
    }
}
