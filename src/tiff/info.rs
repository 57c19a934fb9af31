//! Metadata convenience accessors on IFDs
//!
//! Getters and setters for the tags writers and the inspector deal with
//! directly: image size, resolution, annotation, timestamps, sample format
//! and the private scanner tags.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};

use crate::raster::{Colormap, SampleType};
use crate::tiff::constants::{resolution_unit, tags};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::IFD;
use crate::tiff::types::{Rational, TiffValue};

/// Format of the DateTime tag
pub const DATE_TIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Kind of image a writer produces, deciding which tags are mandatory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Grayscale,
    Palette,
    Rgb,
}

impl ImageKind {
    /// Tags that must be present before an image of this kind is written
    pub fn required_tags(&self) -> Vec<u16> {
        let mut required = vec![
            tags::IMAGE_WIDTH,
            tags::IMAGE_LENGTH,
            tags::BITS_PER_SAMPLE,
            tags::COMPRESSION,
            tags::PHOTOMETRIC_INTERPRETATION,
            tags::STRIP_OFFSETS,
            tags::ROWS_PER_STRIP,
            tags::STRIP_BYTE_COUNTS,
            tags::X_RESOLUTION,
            tags::Y_RESOLUTION,
            tags::RESOLUTION_UNIT,
        ];
        match self {
            ImageKind::Grayscale => {}
            ImageKind::Palette => required.push(tags::COLOR_MAP),
            ImageKind::Rgb => required.push(tags::PLANAR_CONFIGURATION),
        }
        required
    }
}

impl IFD {
    /// IFD holding only the image size
    pub fn with_size(width: u32, height: u32) -> Self {
        let mut ifd = IFD::new(0, 0);
        ifd.set_image_size(width, height);
        ifd
    }

    pub fn set_image_size(&mut self, width: u32, height: u32) {
        self.force_insert(tags::IMAGE_WIDTH, TiffValue::long(width));
        self.force_insert(tags::IMAGE_LENGTH, TiffValue::long(height));
    }

    /// Required tags of `kind` absent from this IFD, in ascending order
    pub fn missing_required_tags(&self, kind: ImageKind) -> Vec<u16> {
        kind.required_tags().into_iter().filter(|tag| !self.has_tag(*tag)).collect()
    }

    pub fn check_required_tags(&self, kind: ImageKind) -> TiffResult<()> {
        let missing = self.missing_required_tags(kind);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(TiffError::MissingRequiredTags(missing))
        }
    }

    fn rational_value(&self, tag: u16) -> Option<f64> {
        self.get(tag).and_then(|v| v.first_rational()).map(|r| r.to_f64())
    }

    fn set_rational_value(&mut self, tag: u16, value: f64) -> TiffResult<()> {
        if value.is_nan() {
            return Ok(());
        }
        let r = Rational::from_f64(value)?;
        self.force_insert(tag, TiffValue::rational(r.numerator, r.denominator));
        Ok(())
    }

    pub fn x_resolution(&self) -> Option<f64> {
        self.rational_value(tags::X_RESOLUTION)
    }

    /// Stores an approximated resolution; NaN leaves the tag untouched
    pub fn set_x_resolution(&mut self, value: f64) -> TiffResult<()> {
        self.set_rational_value(tags::X_RESOLUTION, value)
    }

    pub fn y_resolution(&self) -> Option<f64> {
        self.rational_value(tags::Y_RESOLUTION)
    }

    pub fn set_y_resolution(&mut self, value: f64) -> TiffResult<()> {
        self.set_rational_value(tags::Y_RESOLUTION, value)
    }

    /// ResolutionUnit, 1 (no unit) when absent
    pub fn resolution_unit(&self) -> u16 {
        self.get_tag_value(tags::RESOLUTION_UNIT)
            .map(|v| v as u16)
            .unwrap_or(resolution_unit::NONE)
    }

    pub fn set_resolution_unit(&mut self, unit: u16) {
        self.force_insert(tags::RESOLUTION_UNIT, TiffValue::short(unit));
    }

    /// ImageDescription text, empty when absent
    pub fn annotation(&self) -> String {
        self.get(tags::IMAGE_DESCRIPTION)
            .and_then(|v| v.as_string())
            .unwrap_or_default()
    }

    pub fn set_annotation(&mut self, text: &str) {
        self.force_insert(tags::IMAGE_DESCRIPTION, TiffValue::ascii(text));
    }

    pub fn date_time_string(&self) -> Option<String> {
        self.get(tags::DATE_TIME).and_then(|v| v.as_string())
    }

    /// Parses the DateTime tag as local time
    pub fn date_time(&self) -> Option<DateTime<Local>> {
        let text = self.date_time_string()?;
        let naive = NaiveDateTime::parse_from_str(&text, DATE_TIME_FORMAT).ok()?;
        Local.from_local_datetime(&naive).single()
    }

    pub fn set_date_time<Tz: TimeZone>(&mut self, when: &DateTime<Tz>)
    where
        Tz::Offset: std::fmt::Display,
    {
        let text = when.format(DATE_TIME_FORMAT).to_string();
        self.force_insert(tags::DATE_TIME, TiffValue::ascii(&text));
    }

    pub fn set_current_date_time(&mut self) {
        self.set_date_time(&Local::now());
    }

    pub fn sample_format(&self) -> Option<u16> {
        self.get_tag_value(tags::SAMPLE_FORMAT).map(|v| v as u16)
    }

    pub fn set_sample_format(&mut self, sample_type: SampleType) {
        self.force_insert(tags::SAMPLE_FORMAT, TiffValue::short(sample_type.sample_format()));
    }

    pub fn set_colormap(&mut self, colormap: &Colormap) {
        self.force_insert(tags::COLOR_MAP, colormap.to_tiff_value());
    }

    pub fn scan_mode(&self) -> Option<u16> {
        self.get_tag_value(tags::SCAN_MODE).map(|v| v as u16)
    }

    pub fn set_scan_mode(&mut self, mode: u16) {
        self.force_insert(tags::SCAN_MODE, TiffValue::short(mode));
    }

    pub fn optical_resolution_xy(&self) -> Option<f64> {
        self.rational_value(tags::OPTICAL_RESOLUTION_XY)
    }

    pub fn set_optical_resolution_xy(&mut self, value: f64) -> TiffResult<()> {
        self.set_rational_value(tags::OPTICAL_RESOLUTION_XY, value)
    }

    pub fn pixel_clock_mhz(&self) -> TiffResult<f64> {
        self.rational_value(tags::PIXEL_CLOCK_FREQUENCY)
            .ok_or(TiffError::TagNotFound(tags::PIXEL_CLOCK_FREQUENCY))
    }

    /// Stored as Hz over 1e6
    pub fn set_pixel_clock_mhz(&mut self, mhz: f64) {
        let hz = (mhz * 1e6).round().clamp(0.0, u32::MAX as f64) as u32;
        self.force_insert(tags::PIXEL_CLOCK_FREQUENCY, TiffValue::rational(hz, 1_000_000));
    }

    pub fn line_clock_khz(&self) -> TiffResult<f64> {
        self.rational_value(tags::LINE_CLOCK_FREQUENCY)
            .ok_or(TiffError::TagNotFound(tags::LINE_CLOCK_FREQUENCY))
    }

    /// Stored as Hz over 1000
    pub fn set_line_clock_khz(&mut self, khz: f64) {
        let hz = (khz * 1000.0).round().clamp(0.0, u32::MAX as f64) as u32;
        self.force_insert(tags::LINE_CLOCK_FREQUENCY, TiffValue::rational(hz, 1000));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tags_per_kind() {
        let ifd = IFD::with_size(4, 4);
        let missing = ifd.missing_required_tags(ImageKind::Grayscale);
        assert!(!missing.contains(&tags::IMAGE_WIDTH));
        assert!(missing.contains(&tags::STRIP_OFFSETS));
        assert!(ifd.missing_required_tags(ImageKind::Palette).contains(&tags::COLOR_MAP));
        assert!(ifd.missing_required_tags(ImageKind::Rgb).contains(&tags::PLANAR_CONFIGURATION));
        assert!(matches!(
            ifd.check_required_tags(ImageKind::Grayscale),
            Err(TiffError::MissingRequiredTags(_))
        ));
    }

    #[test]
    fn test_resolution_round_trip() {
        let mut ifd = IFD::new(0, 0);
        ifd.set_x_resolution(0.25).unwrap();
        assert_eq!(ifd.get(tags::X_RESOLUTION), Some(&TiffValue::rational(250, 1000)));
        assert_eq!(ifd.x_resolution(), Some(0.25));

        ifd.set_y_resolution(f64::NAN).unwrap();
        assert_eq!(ifd.y_resolution(), None);
        assert_eq!(ifd.resolution_unit(), resolution_unit::NONE);
        ifd.set_resolution_unit(resolution_unit::CENTIMETER);
        assert_eq!(ifd.resolution_unit(), 3);
    }

    #[test]
    fn test_annotation_and_date() {
        let mut ifd = IFD::new(0, 0);
        assert_eq!(ifd.annotation(), "");
        ifd.set_annotation("stage 3");
        assert_eq!(ifd.annotation(), "stage 3");

        let when = Local.with_ymd_and_hms(2021, 3, 4, 17, 5, 6).unwrap();
        ifd.set_date_time(&when);
        assert_eq!(ifd.date_time_string().as_deref(), Some("2021:03:04 17:05:06"));
        assert_eq!(ifd.date_time(), Some(when));

        let before = Local::now() - chrono::Duration::seconds(2);
        ifd.set_current_date_time();
        assert!(ifd.date_time().unwrap() >= before);
    }

    #[test]
    fn test_scanner_tags() {
        let mut ifd = IFD::new(0, 0);
        assert!(matches!(ifd.pixel_clock_mhz(), Err(TiffError::TagNotFound(65532))));
        ifd.set_pixel_clock_mhz(2.5);
        ifd.set_line_clock_khz(1.25);
        ifd.set_scan_mode(3);
        assert_eq!(ifd.pixel_clock_mhz().unwrap(), 2.5);
        assert_eq!(ifd.line_clock_khz().unwrap(), 1.25);
        assert_eq!(ifd.scan_mode(), Some(3));

        assert_eq!(ifd.optical_resolution_xy(), None);
        ifd.set_optical_resolution_xy(0.5).unwrap();
        assert_eq!(ifd.optical_resolution_xy(), Some(0.5));
    }
}
