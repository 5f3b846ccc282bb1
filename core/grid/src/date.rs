//! FILENAME: core/grid/src/date.rs
//! PURPOSE: Converts worksheet serial numbers to calendar dates.
//! CONTEXT: Worksheets store dates as day counts in the 1900 date system,
//! which counts the fictitious 1900-02-29 as day 60.

use chrono::{Days, NaiveDate};

/// Converts a 1900-system serial number to a calendar date, dropping time of day.
/// Serial 60, the fictitious 1900-02-29, has no calendar date and yields `None`.
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let days = serial.floor() as u64;
    if days == 60 {
        return None;
    }
    // Serials below 60 precede the fictitious 1900-02-29
    let epoch = if days < 60 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    epoch.checked_add_days(Days::new(days))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_to_date() {
        assert_eq!(serial_to_date(1.0), NaiveDate::from_ymd_opt(1900, 1, 1));
        assert_eq!(serial_to_date(59.0), NaiveDate::from_ymd_opt(1900, 2, 28));
        assert_eq!(serial_to_date(60.0), None);
        assert_eq!(serial_to_date(60.5), None);
        assert_eq!(serial_to_date(61.0), NaiveDate::from_ymd_opt(1900, 3, 1));
        assert_eq!(serial_to_date(45352.75), NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(serial_to_date(0.5), None);
        assert_eq!(serial_to_date(f64::NAN), None);
    }
}
