//! Value formatting for violation messages
//!
//! Message wording is part of the output contract, keep these stable.

use chrono::{DateTime, Utc};

const BYTE_UNITS: [&str; 5] = ["o", "Ko", "Mo", "Go", "To"];

/// `YYYY-MM-DD`
pub fn show_date(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Ratio as percent: integer, one decimal below 10%
pub fn show_percent(ratio: f64) -> String {
    let percent = ratio * 100.0;
    if percent.abs() >= 10.0 {
        format!("{:.0}%", percent)
    } else {
        format!("{}%", show_decimal(percent))
    }
}

/// Bytes with o/Ko/Mo/Go/To units (1024 based)
pub fn show_bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < BYTE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{} {}", show_decimal(value), BYTE_UNITS[unit])
}

/// Milliseconds as ms/s/min/h
pub fn show_duration(ms: f64) -> String {
    if ms < 1000.0 {
        format!("{:.0} ms", ms)
    } else if ms < 60_000.0 {
        format!("{} s", show_decimal(ms / 1000.0))
    } else if ms < 3_600_000.0 {
        format!("{} min", show_decimal(ms / 60_000.0))
    } else {
        format!("{} h", show_decimal(ms / 3_600_000.0))
    }
}

/// One decimal, without trailing `.0`
pub fn show_decimal(value: f64) -> String {
    let rounded = format!("{:.1}", value);
    match rounded.strip_suffix(".0") {
        Some(integer) => integer.to_string(),
        None => rounded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn format_date() {
        let date = Utc.with_ymd_and_hms(2024, 3, 7, 22, 10, 0).unwrap();
        assert_eq!(show_date(&date), "2024-03-07");
    }

    #[test]
    fn format_percent() {
        assert_eq!(show_percent(0.5), "50%");
        assert_eq!(show_percent(1.0), "100%");
        assert_eq!(show_percent(0.4839), "48%");
        assert_eq!(show_percent(0.05), "5%");
        assert_eq!(show_percent(0.0123), "1.2%");
    }

    #[test]
    fn format_bytes() {
        assert_eq!(show_bytes(500), "500 o");
        assert_eq!(show_bytes(2048), "2 Ko");
        assert_eq!(show_bytes(1_258_291), "1.2 Mo");
        assert_eq!(show_bytes(5 * 1024 * 1024 * 1024), "5 Go");
    }

    #[test]
    fn format_duration() {
        assert_eq!(show_duration(12.4), "12 ms");
        assert_eq!(show_duration(1500.0), "1.5 s");
        assert_eq!(show_duration(90_000.0), "1.5 min");
        assert_eq!(show_duration(7_200_000.0), "2 h");
    }
}
