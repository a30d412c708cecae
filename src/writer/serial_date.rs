//! Calendar date/time to Excel serial number conversion
//!
//! Excel stores dates as a floating-point day count from a 1900 epoch and
//! deliberately treats 1900 as a leap year (Lotus 1-2-3 compatibility).
//! This module reproduces that behavior exactly: the fictitious 1900-02-29
//! maps to serial 60, and every serial above 59 is shifted by one day
//! relative to the real calendar.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());
static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+):(\d{1,2})(?::(\d{1,2}))?$").unwrap());
// Matched by hand rather than via chrono so that the fictitious 1900-02-29
// reaches the serial algorithm instead of being rejected as an invalid date.
static YMD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})[-/](\d{1,2})[-/](\d{1,2})(?:[ T](\d{1,2}):(\d{1,2})(?::(\d{1,2}))?)?$")
        .unwrap()
});

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
const DATE_FORMATS: &[&str] = &["%d.%m.%Y", "%m/%d/%Y"];

/// Convert a date/time input into an Excel serial number.
///
/// Accepted forms:
/// - a digit-only string, interpreted as a UNIX timestamp;
/// - a bare time of day `H:MM[:SS]`, interpreted as a fraction of day zero;
/// - a digit-leading date or date-time string (`YYYY-MM-DD`, `YYYY/MM/DD`,
///   optionally with a time part, plus a few common calendar formats);
/// - anything else is treated as timestamp zero (1970-01-01).
///
/// Returns `None` for malformed calendar components (month out of range,
/// day past month end, year outside 1900..=9999) - never a clamped value.
pub fn convert_date_time(input: &str) -> Option<f64> {
    if DIGITS_RE.is_match(input) {
        return timestamp_to_serial(input.parse().ok()?);
    }
    if let Some(caps) = TIME_RE.captures(input) {
        let hour: u32 = caps[1].parse().ok()?;
        let min: u32 = caps[2].parse().ok()?;
        let sec: u32 = caps.get(3).map_or(Some(0), |m| m.as_str().parse().ok())?;
        if hour > 23 || min > 59 || sec > 59 {
            return None;
        }
        // offset from day zero of the 1900 epoch
        return Some(day_fraction(hour, min, sec));
    }
    if input.starts_with(|c: char| c.is_ascii_digit()) {
        if let Some(caps) = YMD_RE.captures(input) {
            let year: i32 = caps[1].parse().ok()?;
            let month: u32 = caps[2].parse().ok()?;
            let day: u32 = caps[3].parse().ok()?;
            let hour: u32 = caps.get(4).map_or(Some(0), |m| m.as_str().parse().ok())?;
            let min: u32 = caps.get(5).map_or(Some(0), |m| m.as_str().parse().ok())?;
            let sec: u32 = caps.get(6).map_or(Some(0), |m| m.as_str().parse().ok())?;
            if hour > 23 || min > 59 || sec > 59 {
                return None;
            }
            return calendar_to_serial(year, month, day, hour, min, sec);
        }
        for fmt in DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(input, fmt) {
                return datetime_to_serial(&dt);
            }
        }
        for fmt in DATE_FORMATS {
            if let Ok(d) = NaiveDate::parse_from_str(input, fmt) {
                return calendar_to_serial(d.year(), d.month(), d.day(), 0, 0, 0);
            }
        }
        return None;
    }
    timestamp_to_serial(0)
}

fn timestamp_to_serial(timestamp: i64) -> Option<f64> {
    let dt = DateTime::<Utc>::from_timestamp(timestamp, 0)?;
    datetime_to_serial(&dt.naive_utc())
}

fn datetime_to_serial(dt: &NaiveDateTime) -> Option<f64> {
    calendar_to_serial(
        dt.year(),
        dt.month(),
        dt.day(),
        dt.hour(),
        dt.minute(),
        dt.second(),
    )
}

fn day_fraction(hour: u32, min: u32, sec: u32) -> f64 {
    f64::from(sec) / 86_400.0 + f64::from(min) / 1_440.0 + f64::from(hour) / 24.0
}

fn is_leap_year(year: i32) -> bool {
    year % 400 == 0 || (year % 4 == 0 && year % 100 != 0)
}

/// Convert broken-down calendar components into an Excel 1900-epoch serial.
///
/// Ported from the day-count algorithm used by Excel::Writer::XLSX, including
/// the `days > 59` increment that reproduces the 1900 leap-year bug.
pub fn calendar_to_serial(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    min: u32,
    sec: u32,
) -> Option<f64> {
    let seconds = day_fraction(hour, min, sec);

    // Special cases for the 1900 epoch and Excel's false leap day.
    if (year, month, day) == (1899, 12, 31) || (year, month, day) == (1900, 1, 0) {
        return Some(seconds);
    }
    if (year, month, day) == (1900, 2, 29) {
        return Some(60.0 + seconds);
    }

    let epoch = 1900;
    let offset = 0;
    let norm = 300;
    let range = i64::from(year) - epoch;

    let leap = i64::from(is_leap_year(year));
    let mdays: [u32; 12] = [
        31,
        if leap == 1 { 29 } else { 28 },
        31,
        30,
        31,
        30,
        31,
        31,
        30,
        31,
        30,
        31,
    ];

    if year != 0 || month != 0 || day != 0 {
        if !(1900..=9999).contains(&year) {
            return None;
        }
        if !(1..=12).contains(&month) {
            return None;
        }
        if day < 1 || day > mdays[(month - 1) as usize] {
            return None;
        }
    }

    // Days in the current month, plus prior months of the year, plus whole
    // years since the epoch with 4/100/400-rule leap corrections. The
    // current year's leap day is already inside mdays, so it is backed out.
    let mut days = i64::from(day);
    days += mdays[..(month - 1) as usize]
        .iter()
        .map(|&d| i64::from(d))
        .sum::<i64>();
    days += range * 365;
    days += range / 4;
    days -= (range + offset) / 100;
    days += (range + offset + norm) / 400;
    days -= leap;

    // Excel erroneously treats 1900 as a leap year.
    if days > 59 {
        days += 1;
    }

    Some(days as f64 + seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Standard (non-buggy) serial -> calendar decoder used to check the
    /// round-trip property. Serials >= 61 carry the +1 shift, so the shift
    /// is removed before decoding against the real calendar.
    fn serial_to_calendar(serial: f64) -> (i32, u32, u32) {
        let days = serial.trunc() as i64;
        let adjusted = if days >= 61 { days - 1 } else { days };
        let date = NaiveDate::from_ymd_opt(1899, 12, 31).unwrap()
            + chrono::Duration::days(adjusted);
        (date.year(), date.month(), date.day())
    }

    #[test]
    fn test_known_serials() {
        assert_eq!(convert_date_time("1900-01-01"), Some(1.0));
        assert_eq!(convert_date_time("1900-02-28"), Some(59.0));
        assert_eq!(convert_date_time("1900-03-01"), Some(61.0));
        assert_eq!(convert_date_time("1970-01-01"), Some(25569.0));
        assert_eq!(convert_date_time("2024-01-01"), Some(45292.0));
    }

    #[test]
    fn test_false_leap_day() {
        assert_eq!(convert_date_time("1900-02-29"), Some(60.0));
        assert_eq!(
            convert_date_time("1900-02-29 12:00:00"),
            Some(60.5)
        );
    }

    #[test]
    fn test_epoch_pseudo_date() {
        assert_eq!(calendar_to_serial(1899, 12, 31, 6, 0, 0), Some(0.25));
    }

    #[test]
    fn test_time_fraction() {
        assert_eq!(convert_date_time("2024-01-01 12:00:00"), Some(45292.5));
        let serial = convert_date_time("2024-01-01 06:30:00").unwrap();
        assert!((serial - (45292.0 + 0.25 + 30.0 / 1440.0)).abs() < 1e-9);
    }

    #[test]
    fn test_time_only() {
        assert_eq!(convert_date_time("12:00"), Some(0.5));
        assert_eq!(convert_date_time("6:00:00"), Some(0.25));
        let serial = convert_date_time("0:01:30").unwrap();
        assert!((serial - 90.0 / 86_400.0).abs() < 1e-9);
    }

    #[test]
    fn test_unix_timestamp() {
        // 2021-01-01 00:00:00 UTC
        assert_eq!(convert_date_time("1609459200"), Some(44197.0));
    }

    #[test]
    fn test_non_date_input_is_timestamp_zero() {
        assert_eq!(convert_date_time("hello"), Some(25569.0));
        assert_eq!(convert_date_time(""), Some(25569.0));
    }

    #[test]
    fn test_malformed_components_fail() {
        assert!(convert_date_time("2024-13-01").is_none());
        assert!(convert_date_time("2024-01-32").is_none());
        assert!(convert_date_time("2023-02-29").is_none());
        assert!(convert_date_time("1899-06-15").is_none());
        assert!(convert_date_time("10000-01-01").is_none());
        assert!(convert_date_time("2024-01-01 25:00").is_none());
        assert!(convert_date_time("12abc").is_none());
    }

    #[test]
    fn test_alternate_formats() {
        assert_eq!(convert_date_time("1970/01/01"), Some(25569.0));
        assert_eq!(convert_date_time("01.01.1970"), Some(25569.0));
        assert_eq!(convert_date_time("2024-01-01T12:00:00"), Some(45292.5));
    }

    #[test]
    fn test_round_trip_excluding_false_leap_day() {
        for year in (1900..=9999).step_by(7) {
            for (month, day) in [(1, 1), (2, 28), (3, 1), (7, 31), (12, 31)] {
                let serial =
                    calendar_to_serial(year, month, day, 0, 0, 0).expect("valid date");
                assert_eq!(
                    serial_to_calendar(serial),
                    (year, month, day),
                    "round trip failed for {year}-{month}-{day}"
                );
            }
            if is_leap_year(year) {
                let serial = calendar_to_serial(year, 2, 29, 0, 0, 0).expect("leap day");
                assert_eq!(serial_to_calendar(serial), (year, 2, 29));
            }
        }
    }

    #[test]
    fn test_serials_after_epoch_bug_are_shifted() {
        // 1900-03-01 is the 60th real day of the epoch but gets serial 61.
        let real_days = 60.0;
        assert_eq!(convert_date_time("1900-03-01"), Some(real_days + 1.0));
    }
}
