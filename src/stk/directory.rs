//! In-memory STK metadata
//!
//! A `StkDirectory` is the IFD of an STK file plus the per-plane arrays of
//! UIC2/UIC3 and the keyed records of UIC1 and UIC4. Per-plane arrays and
//! every UIC4 list always hold exactly one entry per plane.

use chrono::{DateTime, TimeZone, Utc};
use log::trace;
use std::collections::BTreeMap;
use std::fmt;

use crate::stk::uic::{ids, uic1_kind, uic_name, Uic1Kind};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::IFD;
use crate::tiff::types::{Rational, TiffValue};
use crate::utils::julian;

/// STK directory of one stack
#[derive(Debug, Clone, PartialEq)]
pub struct StkDirectory {
    ifd: IFD,
    num_plane: usize,
    pub(crate) z_distance: Vec<Rational>,
    pub(crate) creation_time: Vec<Rational>,
    pub(crate) modified_time: Vec<Rational>,
    pub(crate) wavelength: Vec<Rational>,
    pub(crate) uic1: BTreeMap<u32, Vec<TiffValue>>,
    pub(crate) uic4: BTreeMap<u16, Vec<TiffValue>>,
}

impl StkDirectory {
    /// Directory for `num_plane` planes with default metadata
    ///
    /// Every per-plane rational is `0/1`; AbsoluteZ is set to zero and
    /// marked valid in both UIC1 and UIC4.
    ///
    /// # Arguments
    /// * `num_plane` - Number of planes in the stack
    ///
    /// # Returns
    /// A directory around an empty IFD
    pub fn new(num_plane: usize) -> Self {
        Self::with_ifd(IFD::new(0, 0), num_plane)
    }

    /// Default metadata around an existing IFD
    pub fn with_ifd(ifd: IFD, num_plane: usize) -> Self {
        let mut directory = Self::bare(ifd, num_plane);
        directory.reset_absolute_z();
        directory
    }

    /// Per-plane arrays only, no UIC1 or UIC4 records
    pub(crate) fn bare(ifd: IFD, num_plane: usize) -> Self {
        StkDirectory {
            ifd,
            num_plane,
            z_distance: vec![Rational::zero(); num_plane],
            creation_time: vec![Rational::zero(); num_plane],
            modified_time: vec![Rational::zero(); num_plane],
            wavelength: vec![Rational::zero(); num_plane],
            uic1: BTreeMap::new(),
            uic4: BTreeMap::new(),
        }
    }

    pub(crate) fn reset_absolute_z(&mut self) {
        let zeros = vec![Rational::zero(); self.num_plane];
        // Lengths match num_plane by construction
        let _ = self.set_absolute_z_uic4(&zeros);
        let _ = self.set_absolute_z_uic1(&zeros);
    }

    pub fn ifd(&self) -> &IFD {
        &self.ifd
    }

    pub fn ifd_mut(&mut self) -> &mut IFD {
        &mut self.ifd
    }

    pub fn into_ifd(self) -> IFD {
        self.ifd
    }

    pub fn num_planes(&self) -> usize {
        self.num_plane
    }

    /// Appends a plane
    ///
    /// UIC2/UIC3 values start at `0/1`; UIC4 lists and the per-plane UIC1
    /// blocks repeat the values of the previous last plane.
    pub fn add_plane(&mut self) {
        self.num_plane += 1;
        self.z_distance.push(Rational::zero());
        self.creation_time.push(Rational::zero());
        self.modified_time.push(Rational::zero());
        self.wavelength.push(Rational::zero());

        for values in self.uic4.values_mut() {
            if let Some(last) = values.last().cloned() {
                values.push(last);
            }
        }
        for (id, values) in self.uic1.iter_mut() {
            match uic1_kind(*id) {
                Some(Uic1Kind::PlaneStrings) => {
                    if let Some(last) = values.last().cloned() {
                        values.push(last);
                    }
                }
                Some(kind) => {
                    if let (Some(unit), Some(block)) = (plane_unit(kind), values.first_mut()) {
                        repeat_last_unit(block, unit);
                    }
                }
                None => {}
            }
        }
        trace!("STK directory now has {} planes", self.num_plane);
    }

    /// Removes plane `index`; out-of-range indices are ignored
    ///
    /// # Arguments
    /// * `index` - Plane to drop from every per-plane array, UIC4 list and
    ///   per-plane UIC1 block
    pub fn remove_plane(&mut self, index: usize) {
        if index >= self.num_plane {
            return;
        }
        self.num_plane -= 1;
        self.z_distance.remove(index);
        self.creation_time.remove(index);
        self.modified_time.remove(index);
        self.wavelength.remove(index);

        for values in self.uic4.values_mut() {
            if index < values.len() {
                values.remove(index);
            }
        }
        for (id, values) in self.uic1.iter_mut() {
            match uic1_kind(*id) {
                Some(Uic1Kind::PlaneStrings) => {
                    if index < values.len() {
                        values.remove(index);
                    }
                }
                Some(kind) => {
                    if let (Some(unit), Some(block)) = (plane_unit(kind), values.first_mut()) {
                        remove_unit(block, unit, index);
                    }
                }
                None => {}
            }
        }
    }

    fn plane_value(values: &[Rational], plane: usize) -> Option<Rational> {
        values.get(plane).copied()
    }

    fn set_plane_value(values: &mut [Rational], plane: usize, value: Rational) {
        if let Some(slot) = values.get_mut(plane) {
            *slot = value;
        }
    }

    pub fn wavelength(&self, plane: usize) -> Option<Rational> {
        Self::plane_value(&self.wavelength, plane)
    }

    /// Out-of-range planes are ignored, as for every per-plane setter
    pub fn set_wavelength(&mut self, plane: usize, value: Rational) {
        Self::set_plane_value(&mut self.wavelength, plane, value);
    }

    pub fn z_distance(&self, plane: usize) -> Option<Rational> {
        Self::plane_value(&self.z_distance, plane)
    }

    pub fn set_z_distance(&mut self, plane: usize, value: Rational) {
        Self::set_plane_value(&mut self.z_distance, plane, value);
    }

    /// Creation time as (julian day, milliseconds since midnight)
    pub fn creation_time_raw(&self, plane: usize) -> Option<(u32, u32)> {
        Self::plane_value(&self.creation_time, plane).map(|r| (r.numerator, r.denominator))
    }

    pub fn set_creation_time_raw(&mut self, plane: usize, julian_day: u32, millis: u32) {
        Self::set_plane_value(&mut self.creation_time, plane, Rational::new(julian_day, millis));
    }

    /// Creation time of a plane as a UTC timestamp
    ///
    /// # Arguments
    /// * `plane` - Plane index
    ///
    /// # Returns
    /// The timestamp, `ImageIndexOutOfRange`, or `DateConversion` when the
    /// stored julian day and milliseconds are not a valid date
    pub fn creation_time(&self, plane: usize) -> TiffResult<DateTime<Utc>> {
        let (day, millis) = self.creation_time_raw(plane).ok_or(TiffError::ImageIndexOutOfRange {
            index: plane,
            count: self.num_plane,
        })?;
        julian::from_julian(day, millis)
    }

    pub fn set_creation_time<Tz: TimeZone>(&mut self, plane: usize, when: &DateTime<Tz>) {
        let (day, millis) = julian::to_julian(when);
        self.set_creation_time_raw(plane, day, millis);
    }

    pub fn modified_time_raw(&self, plane: usize) -> Option<(u32, u32)> {
        Self::plane_value(&self.modified_time, plane).map(|r| (r.numerator, r.denominator))
    }

    pub fn set_modified_time_raw(&mut self, plane: usize, julian_day: u32, millis: u32) {
        Self::set_plane_value(&mut self.modified_time, plane, Rational::new(julian_day, millis));
    }

    pub fn modified_time(&self, plane: usize) -> TiffResult<DateTime<Utc>> {
        let (day, millis) = self.modified_time_raw(plane).ok_or(TiffError::ImageIndexOutOfRange {
            index: plane,
            count: self.num_plane,
        })?;
        julian::from_julian(day, millis)
    }

    pub fn set_modified_time<Tz: TimeZone>(&mut self, plane: usize, when: &DateTime<Tz>) {
        let (day, millis) = julian::to_julian(when);
        self.set_modified_time_raw(plane, day, millis);
    }

    fn check_plane_len(&self, len: usize) -> TiffResult<()> {
        if len != self.num_plane {
            return Err(TiffError::InvalidMetadata(format!(
                "{} values given for {} planes",
                len, self.num_plane
            )));
        }
        Ok(())
    }

    /// Stores AbsoluteZ in UIC1 and marks every plane valid
    ///
    /// # Arguments
    /// * `values` - One position per plane
    ///
    /// # Returns
    /// `InvalidMetadata` when `values` does not have one entry per plane
    pub fn set_absolute_z_uic1(&mut self, values: &[Rational]) -> TiffResult<()> {
        self.check_plane_len(values.len())?;
        self.uic1.insert(ids::ABSOLUTE_Z, vec![TiffValue::rationals(values)]);
        self.uic1
            .insert(ids::ABSOLUTE_Z_VALID, vec![TiffValue::Long(vec![1; self.num_plane])]);
        Ok(())
    }

    /// AbsoluteZ from UIC1; fails unless present for every plane and valid
    pub fn absolute_z_uic1(&self) -> TiffResult<Vec<Rational>> {
        let values = self
            .uic1
            .get(&ids::ABSOLUTE_Z)
            .and_then(|v| v.first())
            .and_then(|v| v.as_rationals())
            .filter(|v| v.len() == self.num_plane)
            .ok_or_else(|| TiffError::InvalidMetadata("no absolute Z in UIC1".to_string()))?;
        let valid = self
            .uic1
            .get(&ids::ABSOLUTE_Z_VALID)
            .and_then(|v| v.first())
            .and_then(|v| v.as_u32_vec())
            .filter(|v| v.len() == self.num_plane)
            .ok_or_else(|| TiffError::InvalidMetadata("no absolute Z validity in UIC1".to_string()))?;

        if let Some(plane) = valid.iter().position(|flag| *flag == 0) {
            return Err(TiffError::InvalidMetadata(format!(
                "absolute Z of plane {} is not valid",
                plane
            )));
        }
        Ok(values)
    }

    /// Stores AbsoluteZ in UIC4 and marks every plane valid
    pub fn set_absolute_z_uic4(&mut self, values: &[Rational]) -> TiffResult<()> {
        self.check_plane_len(values.len())?;
        let z = values
            .iter()
            .map(|r| TiffValue::rational(r.numerator, r.denominator))
            .collect();
        self.uic4.insert(ids::ABSOLUTE_Z as u16, z);
        self.uic4
            .insert(ids::ABSOLUTE_Z_VALID as u16, vec![TiffValue::long(1); self.num_plane]);
        Ok(())
    }

    pub fn absolute_z_uic4(&self) -> TiffResult<Vec<Rational>> {
        let z = self
            .uic4
            .get(&(ids::ABSOLUTE_Z as u16))
            .filter(|v| v.len() == self.num_plane)
            .ok_or_else(|| TiffError::InvalidMetadata("no absolute Z in UIC4".to_string()))?;
        let valid = self
            .uic4
            .get(&(ids::ABSOLUTE_Z_VALID as u16))
            .filter(|v| v.len() == self.num_plane)
            .ok_or_else(|| TiffError::InvalidMetadata("no absolute Z validity in UIC4".to_string()))?;

        z.iter()
            .zip(valid)
            .enumerate()
            .map(|(plane, (value, flag))| match (value.first_rational(), flag.first_u32()) {
                (Some(r), Some(f)) if f != 0 => Ok(r),
                _ => Err(TiffError::InvalidMetadata(format!(
                    "absolute Z of plane {} is not valid",
                    plane
                ))),
            })
            .collect()
    }

    fn calibration(&self, id: u32) -> Option<Rational> {
        let enabled = self
            .uic1
            .get(&ids::SPATIAL_CALIBRATION)
            .and_then(|v| v.first())
            .and_then(|v| v.first_u32())
            .unwrap_or(0);
        if enabled == 0 {
            return None;
        }
        self.uic1.get(&id).and_then(|v| v.first()).and_then(|v| v.first_rational())
    }

    fn set_calibration(&mut self, id: u32, value: Rational) {
        self.uic1.insert(ids::SPATIAL_CALIBRATION, vec![TiffValue::long(1)]);
        self.uic1
            .insert(id, vec![TiffValue::rational(value.numerator, value.denominator)]);
    }

    /// X calibration, None unless spatial calibration is on
    pub fn x_calibration(&self) -> Option<Rational> {
        self.calibration(ids::X_CALIBRATION)
    }

    /// Sets X calibration and turns spatial calibration on
    pub fn set_x_calibration(&mut self, value: Rational) {
        self.set_calibration(ids::X_CALIBRATION, value);
    }

    pub fn y_calibration(&self) -> Option<Rational> {
        self.calibration(ids::Y_CALIBRATION)
    }

    pub fn set_y_calibration(&mut self, value: Rational) {
        self.set_calibration(ids::Y_CALIBRATION, value);
    }

    pub fn calibration_unit(&self) -> Option<String> {
        self.uic1
            .get(&ids::CALIBRATION_UNITS)
            .and_then(|v| v.first())
            .and_then(|v| v.as_string())
            .filter(|s| !s.is_empty())
    }

    pub fn set_calibration_unit(&mut self, unit: &str) {
        self.uic1
            .insert(ids::CALIBRATION_UNITS, vec![TiffValue::ascii_raw(unit)]);
    }

    pub fn uic1(&self, id: u32) -> Option<&[TiffValue]> {
        self.uic1.get(&id).map(|v| v.as_slice())
    }

    pub fn uic4(&self, id: u16) -> Option<&[TiffValue]> {
        self.uic4.get(&id).map(|v| v.as_slice())
    }

    pub fn uic1_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.uic1.keys().copied()
    }

    pub fn uic4_ids(&self) -> impl Iterator<Item = u16> + '_ {
        self.uic4.keys().copied()
    }

    /// Adds a UIC1 record unless the id is already present
    pub fn add_uic1(&mut self, id: u32, values: Vec<TiffValue>) -> bool {
        if self.uic1.contains_key(&id) {
            return false;
        }
        self.uic1.insert(id, values);
        true
    }

    pub fn force_add_uic1(&mut self, id: u32, values: Vec<TiffValue>) {
        self.uic1.insert(id, values);
    }

    /// Adds a UIC4 list unless present; the list needs one value per plane
    ///
    /// # Arguments
    /// * `id` - UIC4 record id
    /// * `values` - One value per plane
    ///
    /// # Returns
    /// True if the list was added
    pub fn add_uic4(&mut self, id: u16, values: Vec<TiffValue>) -> bool {
        if values.len() != self.num_plane || self.uic4.contains_key(&id) {
            return false;
        }
        self.uic4.insert(id, values);
        true
    }

    /// Replaces a UIC4 list; lists of the wrong length are ignored
    pub fn force_add_uic4(&mut self, id: u16, values: Vec<TiffValue>) -> bool {
        if values.len() != self.num_plane {
            return false;
        }
        self.uic4.insert(id, values);
        true
    }

    /// Replaces the value of one plane in an existing UIC4 list
    pub fn set_uic4_value(&mut self, id: u16, plane: usize, value: TiffValue) {
        if plane >= self.num_plane {
            return;
        }
        if let Some(slot) = self.uic4.get_mut(&id).and_then(|v| v.get_mut(plane)) {
            *slot = value;
        }
    }

    pub fn valid_uic1(&self) -> bool {
        !self.uic1.is_empty() && self.uic1.values().all(|v| !v.is_empty())
    }

    pub fn valid_uic2(&self) -> bool {
        self.z_distance.len() == self.num_plane
            && self.creation_time.len() == self.num_plane
            && self.modified_time.len() == self.num_plane
    }

    pub fn valid_uic3(&self) -> bool {
        self.wavelength.len() == self.num_plane
    }

    pub fn valid_uic4(&self) -> bool {
        !self.uic4.is_empty()
            && self.uic4.values().all(|values| {
                values.len() >= self.num_plane && values[..self.num_plane].iter().all(|v| !v.is_empty())
            })
    }
}

/// Elements per plane inside a per-plane UIC1 block
fn plane_unit(kind: Uic1Kind) -> Option<usize> {
    match kind {
        Uic1Kind::PlaneRationals => Some(2),
        Uic1Kind::PlaneLongs => Some(1),
        Uic1Kind::PlaneRationalPairs => Some(4),
        _ => None,
    }
}

fn repeat_last_unit(block: &mut TiffValue, unit: usize) {
    if let TiffValue::Long(v) | TiffValue::Rational(v) = block {
        if v.len() >= unit {
            let last = v[v.len() - unit..].to_vec();
            v.extend(last);
        }
    }
}

fn remove_unit(block: &mut TiffValue, unit: usize, index: usize) {
    if let TiffValue::Long(v) | TiffValue::Rational(v) = block {
        let start = index * unit;
        if start + unit <= v.len() {
            v.drain(start..start + unit);
        }
    }
}

impl fmt::Display for StkDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ifd)?;
        writeln!(f, "  STK planes: {}", self.num_plane)?;

        for plane in 0..self.num_plane {
            write!(
                f,
                "  Plane #{}: z distance {}, wavelength {}",
                plane, self.z_distance[plane], self.wavelength[plane]
            )?;
            if let Ok(created) = self.creation_time(plane) {
                write!(f, ", created {}", created.format("%Y-%m-%d %H:%M:%S%.3f"))?;
            }
            if let Ok(modified) = self.modified_time(plane) {
                write!(f, ", modified {}", modified.format("%Y-%m-%d %H:%M:%S%.3f"))?;
            }
            writeln!(f)?;
        }

        for (id, values) in &self.uic1 {
            let text: Vec<String> = values.iter().map(|v| v.to_string()).collect();
            writeln!(f, "  UIC1 {} ({}): {}", id, uic_name(*id), text.join(", "))?;
        }
        for (id, values) in &self.uic4 {
            let text: Vec<String> = values.iter().map(|v| v.to_string()).collect();
            writeln!(f, "  UIC4 {} ({}): {}", id, uic_name(*id as u32), text.join(", "))?;
        }
        Ok(())
    }
}
