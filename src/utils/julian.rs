//! Julian day conversion for STK timestamps
//!
//! STK stores a timestamp as a (julian day, milliseconds since midnight)
//! pair in UTC.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Timelike, Utc};

use crate::tiff::errors::{TiffError, TiffResult};

/// First day of the Gregorian calendar, as yyyymmdd
const GREGORIAN_REFORM_DATE: f64 = 15821015.0;
/// Julian day of the Gregorian reform
const GREGORIAN_REFORM_DAY: i64 = 2299161;
const MILLIS_PER_DAY: i64 = 86_400_000;

/// Converts a UTC timestamp to (julian day, milliseconds since midnight)
pub fn to_julian<Tz: TimeZone>(when: &DateTime<Tz>) -> (u32, u32) {
    let utc = when.with_timezone(&Utc);

    let mut year = utc.year() as i64;
    let mut month = utc.month() as i64;
    let day = utc.day() as i64;

    if year < 0 {
        year += 1;
    }
    if month <= 2 {
        year -= 1;
        month += 12;
    }

    let mut b = 0;
    if year as f64 * 10000.0 + month as f64 * 100.0 + day as f64 >= GREGORIAN_REFORM_DATE {
        let a = (year as f64 / 100.0) as i64;
        b = 2 - a + a / 4;
    }

    let julian = (365.25 * year as f64) as i64 + (30.6001 * (month + 1) as f64) as i64 + day + 1_720_994 + b;
    let millis = 1000 * (utc.hour() as i64 * 3600 + utc.minute() as i64 * 60 + utc.second() as i64)
        + (utc.timestamp_subsec_millis() as i64).min(999);

    (julian.clamp(0, u32::MAX as i64) as u32, millis as u32)
}

/// Converts (julian day, milliseconds since midnight) back to UTC
pub fn from_julian(julian: u32, millis: u32) -> TiffResult<DateTime<Utc>> {
    let z = julian as i64 + 1;
    let a = if z < GREGORIAN_REFORM_DAY {
        z
    } else {
        let alpha = ((z as f64 - 1_867_216.25) / 36_524.25) as i64;
        z + 1 + alpha - alpha / 4
    };

    let b = if a > 1_721_423 { a + 1524 } else { a + 1158 };
    let c = ((b as f64 - 122.1) / 365.25) as i64;
    let d = (365.25 * c as f64) as i64;
    let e = ((b - d) as f64 / 30.6001) as i64;

    let day = b - d - (30.6001 * e as f64) as i64;
    let month = if e < 14 { e - 1 } else { e - 13 };
    let year = if month > 2 { c - 4716 } else { c - 4715 };

    let millis = millis as i64;
    if millis >= MILLIS_PER_DAY {
        return Err(TiffError::DateConversion(format!(
            "{} ms exceeds one day",
            millis
        )));
    }
    let ms = millis % 1000;
    let seconds = millis / 1000;

    let date = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32).ok_or_else(|| {
        TiffError::DateConversion(format!("julian day {} is not a valid date", julian))
    })?;
    let time = date
        .and_hms_milli_opt(
            (seconds / 3600) as u32,
            (seconds / 60 % 60) as u32,
            (seconds % 60) as u32,
            ms as u32,
        )
        .ok_or_else(|| TiffError::DateConversion(format!("invalid time of day: {} ms", millis)))?;

    Ok(Utc.from_utc_datetime(&time))
}
