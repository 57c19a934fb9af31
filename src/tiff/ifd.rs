//! Image File Directory (IFD) structures and methods
//!
//! An IFD is the tag-keyed metadata dictionary of one image: a set of
//! entries kept unique and sorted by tag so that lookups can use binary
//! search and serialization emits them in the order TIFF requires.

use log::{debug, trace};
use std::fmt;

use crate::tiff::constants::tags;
use crate::tiff::types::{TiffType, TiffValue};
use crate::utils::tag_utils;

/// Represents an entry in an Image File Directory (IFD)
#[derive(Debug, Clone, PartialEq)]
pub struct IFDEntry {
    /// TIFF tag identifier
    pub tag: u16,
    /// Decoded value
    pub value: TiffValue,
}

impl IFDEntry {
    pub fn new(tag: u16, value: TiffValue) -> Self {
        IFDEntry { tag, value }
    }

    pub fn field_type(&self) -> TiffType {
        self.value.field_type()
    }

    pub fn count(&self) -> usize {
        self.value.count()
    }

    /// Whether the value fits the 4-byte slot of the directory record
    pub fn is_value_inline(&self) -> bool {
        self.value.byte_len() <= 4
    }

    /// Returns a human-readable description of this entry
    pub fn description(&self) -> String {
        let tag_name = tag_utils::get_tag_name(self.tag);

        let value_display = match (self.tag, self.value.first_u32()) {
            (tags::COMPRESSION, Some(code)) => {
                format!("{} ({})", code, tag_utils::get_compression_name(code as u16))
            }
            (tags::PHOTOMETRIC_INTERPRETATION, Some(code)) => {
                format!("{} ({})", code, tag_utils::get_photometric_name(code as u16))
            }
            _ => self.value.to_string(),
        };

        format!(
            "Tag: {} ({}), Type: {}, Count: {}, Value: {}",
            self.tag,
            tag_name,
            self.field_type().name(),
            self.count(),
            value_display
        )
    }
}

/// Undecoded directory record, kept for tags an extension codec owns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEntry {
    pub tag: u16,
    pub field_type: u16,
    pub count: u32,
    /// Slot contents interpreted as an absolute offset
    pub offset: u32,
}

/// Represents an Image File Directory (IFD) in a TIFF file
#[derive(Debug, Clone, Default)]
pub struct IFD {
    /// Entries sorted ascending by tag, unique per tag
    entries: Vec<IFDEntry>,
    /// IFD number (0-based)
    pub number: usize,
    /// Offset to this IFD in the file, 0 while staged in memory
    pub offset: u64,
}

impl IFD {
    /// Creates a new, empty IFD
    pub fn new(number: usize, offset: u64) -> Self {
        debug!("Creating new IFD #{} at offset {}", number, offset);

        IFD {
            entries: Vec::new(),
            number,
            offset,
        }
    }

    fn position(&self, tag: u16) -> Result<usize, usize> {
        self.entries.binary_search_by_key(&tag, |entry| entry.tag)
    }

    /// Adds a tag unless it is already present
    ///
    /// Returns true if the value was inserted.
    pub fn insert(&mut self, tag: u16, value: TiffValue) -> bool {
        match self.position(tag) {
            Ok(_) => {
                trace!("Tag {} already present in IFD #{}, keeping existing value", tag, self.number);
                false
            }
            Err(index) => {
                self.entries.insert(index, IFDEntry::new(tag, value));
                true
            }
        }
    }

    /// Adds a tag, replacing any existing value
    pub fn force_insert(&mut self, tag: u16, value: TiffValue) {
        match self.position(tag) {
            Ok(index) => self.entries[index].value = value,
            Err(index) => self.entries.insert(index, IFDEntry::new(tag, value)),
        }
    }

    /// Removes a tag, returning its value if it was present
    pub fn remove(&mut self, tag: u16) -> Option<TiffValue> {
        match self.position(tag) {
            Ok(index) => Some(self.entries.remove(index).value),
            Err(_) => None,
        }
    }

    /// Gets an IFD entry by tag
    pub fn get_entry(&self, tag: u16) -> Option<&IFDEntry> {
        self.position(tag).ok().map(|index| &self.entries[index])
    }

    /// Gets the value stored for a tag
    pub fn get(&self, tag: u16) -> Option<&TiffValue> {
        self.get_entry(tag).map(|entry| &entry.value)
    }

    /// First value of an integer tag
    pub fn get_tag_value(&self, tag: u16) -> Option<u32> {
        let value = self.get(tag).and_then(|v| v.first_u32());
        trace!(
            "Tag {} ({}) in IFD #{}: {:?}",
            tag,
            tag_utils::get_tag_name(tag),
            self.number,
            value
        );
        value
    }

    /// All values of an integer tag
    pub fn get_tag_values(&self, tag: u16) -> Option<Vec<u32>> {
        self.get(tag).and_then(|v| v.as_u32_vec())
    }

    /// Checks if this IFD has a specific tag
    pub fn has_tag(&self, tag: u16) -> bool {
        self.position(tag).is_ok()
    }

    /// Gets the dimensions of the image described by this IFD
    pub fn get_dimensions(&self) -> Option<(u32, u32)> {
        let width = self.get_tag_value(tags::IMAGE_WIDTH)?;
        let height = self.get_tag_value(tags::IMAGE_LENGTH)?;
        Some((width, height))
    }

    /// Returns number of samples per pixel (default 1 if not specified)
    pub fn get_samples_per_pixel(&self) -> u32 {
        self.get_tag_value(tags::SAMPLES_PER_PIXEL).unwrap_or(1)
    }

    /// Entries in ascending tag order
    pub fn entries(&self) -> &[IFDEntry] {
        &self.entries
    }

    pub fn tags(&self) -> impl Iterator<Item = u16> + '_ {
        self.entries.iter().map(|entry| entry.tag)
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PartialEq for IFD {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl fmt::Display for IFD {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "IFD #{} (offset: {})", self.number, self.offset)?;
        writeln!(f, "  Number of entries: {}", self.entries.len())?;

        if let Some((width, height)) = self.get_dimensions() {
            writeln!(f, "  Dimensions: {}x{}", width, height)?;
        }

        writeln!(f, "  Samples per pixel: {}", self.get_samples_per_pixel())?;
        writeln!(f, "  Tags:")?;
        for entry in &self.entries {
            writeln!(f, "    {}", entry.description())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_stay_sorted_and_unique() {
        let mut ifd = IFD::new(0, 0);
        ifd.insert(tags::IMAGE_LENGTH, TiffValue::long(4));
        ifd.insert(tags::IMAGE_WIDTH, TiffValue::long(8));
        ifd.insert(tags::COMPRESSION, TiffValue::short(1));

        let order: Vec<u16> = ifd.tags().collect();
        assert_eq!(order, vec![tags::IMAGE_WIDTH, tags::IMAGE_LENGTH, tags::COMPRESSION]);

        assert!(!ifd.insert(tags::IMAGE_WIDTH, TiffValue::long(99)));
        assert_eq!(ifd.get_tag_value(tags::IMAGE_WIDTH), Some(8));

        ifd.force_insert(tags::IMAGE_WIDTH, TiffValue::long(99));
        assert_eq!(ifd.get_tag_value(tags::IMAGE_WIDTH), Some(99));
        assert_eq!(ifd.entry_count(), 3);
    }

    #[test]
    fn test_remove_and_dimensions() {
        let mut ifd = IFD::new(0, 0);
        ifd.insert(tags::IMAGE_WIDTH, TiffValue::long(640));
        ifd.insert(tags::IMAGE_LENGTH, TiffValue::short(480));
        assert_eq!(ifd.get_dimensions(), Some((640, 480)));

        assert_eq!(ifd.remove(tags::IMAGE_LENGTH), Some(TiffValue::short(480)));
        assert_eq!(ifd.remove(tags::IMAGE_LENGTH), None);
        assert_eq!(ifd.get_dimensions(), None);
    }

    #[test]
    fn test_inline_threshold() {
        assert!(IFDEntry::new(tags::BITS_PER_SAMPLE, TiffValue::Short(vec![8, 8])).is_value_inline());
        assert!(!IFDEntry::new(tags::BITS_PER_SAMPLE, TiffValue::Short(vec![8, 8, 8])).is_value_inline());
        assert!(!IFDEntry::new(tags::X_RESOLUTION, TiffValue::rational(1, 1)).is_value_inline());
    }
}
