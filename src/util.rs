// Utility helpers for parsing and number formatting.
//
// This module centralizes all the "dirty" GeoJSON property handling so the
// rest of the code can assume clean, typed values.
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};
use serde_json::Value as JsonValue;

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in exports (commas, spaces, text).
///
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters.
/// - Strips thousands separators like `","` before parsing.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(",", "");
    s.parse::<f64>().ok()
}

/// Years show up as `2023`, `"2023"` or `"2023.0"` depending on the export.
pub fn parse_year_safe(s: Option<&str>) -> Option<i32> {
    let v = parse_f64_safe(s)?;
    if v.fract() != 0.0 || !(0.0..=9999.0).contains(&v) {
        return None;
    }
    Some(v as i32)
}

const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
];

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

/// Permissive text-to-date coercion. Anything unrecognized is `None`,
/// never an error.
pub fn coerce_date(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Text view of a raw property. Empty strings count as missing.
pub fn json_text(v: Option<&JsonValue>) -> Option<String> {
    let s = match v? {
        JsonValue::String(s) => s.trim().to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Bool(b) => b.to_string(),
        _ => return None,
    };
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

pub fn json_f64(v: Option<&JsonValue>) -> Option<f64> {
    match v? {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => parse_f64_safe(Some(s)),
        _ => None,
    }
}

pub fn json_year(v: Option<&JsonValue>) -> Option<i32> {
    match v? {
        JsonValue::Number(n) => parse_year_safe(Some(&n.to_string())),
        JsonValue::String(s) => parse_year_safe(Some(s)),
        _ => None,
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with:
    // - a fixed number of decimal places, and
    // - locale-aware thousands separators (e.g., `1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

/// Peso amounts abbreviated to millions, e.g. `1,234.5M`.
pub fn format_millions(n: f64, decimals: usize) -> String {
    format!("{}M", format_number(n / 1_000_000.0, decimals))
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_numbers_with_separators() {
        assert_eq!(parse_f64_safe(Some(" 1,234,567.50 ")), Some(1_234_567.5));
        assert_eq!(parse_f64_safe(Some("N/A")), None);
        assert_eq!(parse_f64_safe(Some("")), None);
        assert_eq!(parse_f64_safe(None), None);
    }

    #[test]
    fn parses_years_from_float_text() {
        assert_eq!(parse_year_safe(Some("2023.0")), Some(2023));
        assert_eq!(parse_year_safe(Some("2023")), Some(2023));
        assert_eq!(parse_year_safe(Some("2023.5")), None);
        assert_eq!(json_year(Some(&json!(2021))), Some(2021));
        assert_eq!(json_year(Some(&json!(2021.0))), Some(2021));
        assert_eq!(json_year(Some(&JsonValue::Null)), None);
    }

    #[test]
    fn coerces_common_date_shapes() {
        let d = NaiveDate::from_ymd_opt(2022, 3, 15).unwrap();
        assert_eq!(coerce_date(Some("2022-03-15")), Some(d));
        assert_eq!(coerce_date(Some("2022/03/15")), Some(d));
        assert_eq!(coerce_date(Some("03/15/2022")), Some(d));
        assert_eq!(coerce_date(Some("March 15, 2022")), Some(d));
        assert_eq!(coerce_date(Some("15 March 2022")), Some(d));
        assert_eq!(coerce_date(Some("2022-03-15T08:30:00")), Some(d));
        assert_eq!(coerce_date(Some("2022-03-15T08:30:00+08:00")), Some(d));
        assert_eq!(coerce_date(Some("sometime in 2022")), None);
        assert_eq!(coerce_date(Some("2022-02-30")), None);
    }

    #[test]
    fn json_text_treats_blank_as_missing() {
        assert_eq!(json_text(Some(&json!("  Region I "))), Some("Region I".to_string()));
        assert_eq!(json_text(Some(&json!("   "))), None);
        assert_eq!(json_text(Some(&JsonValue::Null)), None);
        assert_eq!(json_text(None), None);
    }

    #[test]
    fn formats_with_thousands_separators() {
        assert_eq!(format_number(1_234_567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-1500.0, 0), "-1,500");
        assert_eq!(format_millions(12_345_678.0, 1), "12.3M");
        assert_eq!(format_millions(1_500_000_000.0, 1), "1,500.0M");
        assert_eq!(format_int(9855), "9,855");
    }
}
