/// Date, time and text conversions for individual worksheet cells
///
/// Sample dates and times are typed by hand, so the same column can hold Excel
/// date values, serial numbers, or free text in several layouts. Every function
/// here returns `None` rather than failing.
use calamine::Data;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::sync::LazyLock;

use crate::domain::CellValue;

const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y", "%Y.%m.%d",
];

const DATETIME_FORMATS: [&str; 7] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

/// `10:30`, `10.30`, `10h30`, `9:05:30`
static CLOCK_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})\s*[:.hH]\s*(\d{2})(?:\s*[:.]\s*(\d{2}))?$")
        .expect("clock time pattern is valid")
});

/// ODS time cells: `PT10H30M00S`, `PT9H5M`, `PT10H30M15.5S`
static ISO_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)(?:\.\d+)?S)?$")
        .expect("ISO duration pattern is valid")
});

/// Convert Excel date serial to NaiveDate
///
/// Excel counts days from 1899-12-30 (the epoch absorbs Excel's 1900 leap-year bug).
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    // 2958465 = 9999-12-31, the last date Excel can show
    if serial > 2_958_465.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::try_days(serial.trunc() as i64)?)
}

/// Time of day from the fractional part of an Excel day value
pub fn day_fraction_to_time(value: f64) -> Option<NaiveTime> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let seconds = (value.fract() * 86_400.0).round() as u32 % 86_400;
    NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0)
}

/// Sample date from the first column of a data row
pub fn parse_date(cell: &Data) -> Option<NaiveDate> {
    match cell {
        // time-only cells carry no date
        Data::DateTime(dt) if dt.as_f64() < 1.0 => None,
        Data::DateTime(dt) => dt.as_datetime().map(|d| d.date()),
        Data::DateTimeIso(s) | Data::String(s) => parse_date_str(s),
        Data::Float(f) => excel_serial_to_date(*f),
        Data::Int(i) => excel_serial_to_date(*i as f64),
        _ => None,
    }
}

pub fn parse_date_str(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| parse_datetime_str(text).map(|dt| dt.date()))
}

/// Sample time from the second column; `None` means "use midnight"
pub fn parse_time(cell: &Data) -> Option<NaiveTime> {
    match cell {
        Data::DateTime(dt) => day_fraction_to_time(dt.as_f64()),
        Data::Float(f) => day_fraction_to_time(*f),
        Data::Int(i) => day_fraction_to_time(*i as f64),
        Data::DateTimeIso(s) | Data::String(s) => parse_time_str(s),
        Data::DurationIso(s) => parse_duration_time(s),
        _ => None,
    }
}

/// Time of day from an ISO 8601 duration such as `PT10H30M00S`
pub fn parse_duration_time(raw: &str) -> Option<NaiveTime> {
    let caps = ISO_DURATION.captures(raw.trim())?;
    let part = |i: usize| -> Option<u32> {
        match caps.get(i) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(0),
        }
    };
    NaiveTime::from_hms_opt(part(1)?, part(2)?, part(3)?)
}

pub fn parse_time_str(raw: &str) -> Option<NaiveTime> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(caps) = CLOCK_TIME.captures(text) {
        let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
        let minute: u32 = caps.get(2)?.as_str().parse().ok()?;
        let second: u32 = match caps.get(3) {
            Some(m) => m.as_str().parse().ok()?,
            None => 0,
        };
        return NaiveTime::from_hms_opt(hour, minute, second);
    }

    parse_datetime_str(text).map(|dt| dt.time())
}

fn parse_datetime_str(text: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
}

/// Trimmed text rendering of a registry cell; empty cells become `""`
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{f:.0}"),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(d) => d.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => dt.as_f64().to_string(),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
        Data::Error(e) => e.to_string(),
        Data::Empty => String::new(),
    }
}

/// Untyped copy of a context cell; `None` for empty cells
pub fn cell_value(cell: &Data) -> Option<CellValue> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(CellValue::Text(s.clone())),
        Data::Float(f) => Some(CellValue::Number(*f)),
        Data::Int(i) => Some(CellValue::Number(*i as f64)),
        Data::Bool(b) => Some(CellValue::Bool(*b)),
        Data::DateTime(dt) if dt.as_f64() < 1.0 => {
            day_fraction_to_time(dt.as_f64()).map(CellValue::Time)
        }
        Data::DateTime(dt) => dt.as_datetime().map(CellValue::DateTime),
        Data::DateTimeIso(s) => Some(
            parse_datetime_str(s)
                .map(CellValue::DateTime)
                .unwrap_or_else(|| CellValue::Text(s.clone())),
        ),
        Data::DurationIso(s) => Some(
            parse_duration_time(s)
                .map(CellValue::Time)
                .unwrap_or_else(|| CellValue::Text(s.clone())),
        ),
        Data::Error(e) => Some(CellValue::Text(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_excel_serial_to_date() {
        // 45306 = January 15, 2024
        let date = excel_serial_to_date(45306.0).unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2024, 1, 15));
    }

    #[test]
    fn test_excel_serial_ignores_time_part() {
        let date = excel_serial_to_date(45306.75).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn test_excel_serial_rejects_nonsense() {
        assert_eq!(excel_serial_to_date(0.0), None);
        assert_eq!(excel_serial_to_date(-3.0), None);
        assert_eq!(excel_serial_to_date(f64::NAN), None);
    }

    #[test]
    fn test_excel_serial_out_of_calendar_range() {
        // hand-typed 20240115103000 in a date column
        assert_eq!(excel_serial_to_date(20_240_115_103_000.0), None);
        assert_eq!(excel_serial_to_date(1e15), None);
        assert_eq!(parse_date(&Data::Int(i64::MAX)), None);
        assert_eq!(
            excel_serial_to_date(2_958_465.0),
            NaiveDate::from_ymd_opt(9999, 12, 31)
        );
    }

    #[test]
    fn test_day_fraction_to_time() {
        assert_eq!(
            day_fraction_to_time(0.4375),
            NaiveTime::from_hms_opt(10, 30, 0)
        );
        // date + time serial keeps only the time
        assert_eq!(
            day_fraction_to_time(45306.5),
            NaiveTime::from_hms_opt(12, 0, 0)
        );
        assert_eq!(day_fraction_to_time(-0.5), None);
    }

    #[test]
    fn test_parse_date_string_layouts() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15);
        assert_eq!(parse_date_str("2024-01-15"), expected);
        assert_eq!(parse_date_str("15.01.2024"), expected);
        assert_eq!(parse_date_str("15/01/2024"), expected);
        assert_eq!(parse_date_str("2024-01-15 10:30:00"), expected);
        assert_eq!(parse_date_str(" 2024-01-15T08:00:00 "), expected);
    }

    #[test]
    fn test_parse_date_cells() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15);
        assert_eq!(parse_date(&Data::Float(45306.0)), expected);
        assert_eq!(parse_date(&Data::Int(45306)), expected);
        assert_eq!(parse_date(&Data::DateTimeIso("2024-01-15".into())), expected);
        assert_eq!(parse_date(&Data::Empty), None);
        assert_eq!(parse_date(&Data::String("brak".into())), None);
        assert_eq!(parse_date(&Data::Bool(true)), None);
    }

    #[test]
    fn test_parse_time_string_layouts() {
        let expected = NaiveTime::from_hms_opt(10, 30, 0);
        assert_eq!(parse_time_str("10:30"), expected);
        assert_eq!(parse_time_str("10.30"), expected);
        assert_eq!(parse_time_str("10h30"), expected);
        assert_eq!(parse_time_str("10:30:00"), expected);
        assert_eq!(parse_time_str("2024-01-15 10:30:00"), expected);
        assert_eq!(parse_time_str("9:05:30"), NaiveTime::from_hms_opt(9, 5, 30));
    }

    #[test]
    fn test_parse_time_rejects_bad_values() {
        assert_eq!(parse_time_str("25:00"), None);
        assert_eq!(parse_time_str("rano"), None);
        assert_eq!(parse_time(&Data::Empty), None);
        assert_eq!(parse_time(&Data::Bool(false)), None);
    }

    #[test]
    fn test_parse_time_from_ods_duration() {
        let expected = NaiveTime::from_hms_opt(10, 30, 0);
        assert_eq!(parse_time(&Data::DurationIso("PT10H30M00S".into())), expected);
        assert_eq!(parse_duration_time("PT10H30M"), expected);
        assert_eq!(
            parse_duration_time("PT9H5M15.5S"),
            NaiveTime::from_hms_opt(9, 5, 15)
        );
        assert_eq!(parse_duration_time("PT30H"), None);
        assert_eq!(parse_duration_time("P1D"), None);
    }

    #[test]
    fn test_parse_date_rejects_time_only_cells() {
        use calamine::{ExcelDateTime, ExcelDateTimeType};

        let time_only = ExcelDateTime::new(0.4375, ExcelDateTimeType::DateTime, false);
        assert_eq!(parse_date(&Data::DateTime(time_only)), None);

        let full = ExcelDateTime::new(45306.4375, ExcelDateTimeType::DateTime, false);
        assert_eq!(
            parse_date(&Data::DateTime(full)),
            NaiveDate::from_ymd_opt(2024, 1, 15)
        );
    }

    #[test]
    fn test_parse_time_numeric_fraction() {
        assert_eq!(
            parse_time(&Data::Float(0.5)),
            NaiveTime::from_hms_opt(12, 0, 0)
        );
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Data::String("  Wisła ".into())), "Wisła");
        assert_eq!(cell_text(&Data::Float(101.0)), "101");
        assert_eq!(cell_text(&Data::Float(1.5)), "1.5");
        assert_eq!(cell_text(&Data::Int(7)), "7");
        assert_eq!(cell_text(&Data::Empty), "");
    }

    #[test]
    fn test_cell_value_keeps_text_verbatim() {
        assert_eq!(
            cell_value(&Data::String(" 0,5 m ".into())),
            Some(CellValue::Text(" 0,5 m ".into()))
        );
        assert_eq!(cell_value(&Data::Float(2.0)), Some(CellValue::Number(2.0)));
        assert_eq!(cell_value(&Data::Empty), None);
    }
}
