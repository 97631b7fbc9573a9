use serde::Deserialize;

use crate::error::{HeatmapError, Result};

/// Frequency suffixes, base unit Hz.
pub const HZ_UNITS: &[(char, f64)] = &[('k', 1e3), ('M', 1e6), ('G', 1e9)];

/// Duration suffixes, base unit seconds.
pub const SEC_UNITS: &[(char, f64)] = &[('s', 1.0), ('m', 60.0), ('h', 3600.0)];

/// Converts `"100M"`, `"5k"`, `"30m"`... into a base-unit value using `table`.
///
/// A bare number is already in base units and is returned unchanged. The
/// suffix lookup prefers an exact match and then falls back to the other
/// case, so `"2m"` is 2 MHz against [`HZ_UNITS`] but 2 minutes against
/// [`SEC_UNITS`].
pub fn parse_with_units(value: &str, table: &[(char, f64)]) -> Result<f64> {
    let trimmed = value.trim();
    if let Ok(plain) = trimmed.parse::<f64>() {
        return Ok(plain);
    }

    let mut chars = trimmed.chars();
    let suffix = chars.next_back().ok_or_else(|| HeatmapError::InvalidNumber {
        value: value.to_string(),
    })?;
    let multiplier = lookup_unit(table, suffix).ok_or_else(|| HeatmapError::UnrecognizedUnit {
        value: value.to_string(),
    })?;
    let number: f64 = chars
        .as_str()
        .trim()
        .parse()
        .map_err(|_| HeatmapError::InvalidNumber {
            value: value.to_string(),
        })?;
    Ok(number * multiplier)
}

fn lookup_unit(table: &[(char, f64)], suffix: char) -> Option<f64> {
    table
        .iter()
        .find(|(unit, _)| *unit == suffix)
        .or_else(|| table.iter().find(|(unit, _)| unit.eq_ignore_ascii_case(&suffix)))
        .map(|(_, multiplier)| *multiplier)
}

pub fn parse_frequency(value: &str) -> Result<f64> {
    parse_with_units(value, HZ_UNITS)
}

pub fn parse_duration(value: &str) -> Result<f64> {
    parse_with_units(value, SEC_UNITS)
}

/// A frequency field in a JSON station file: either a number of Hz or a
/// unit-suffixed string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum UnitValue {
    Number(f64),
    Text(String),
}

impl UnitValue {
    pub fn to_hz(&self) -> Result<f64> {
        match self {
            UnitValue::Number(hz) => Ok(*hz),
            UnitValue::Text(text) => parse_frequency(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_suffixes() {
        assert!((parse_frequency("100M").unwrap() - 100e6).abs() < 1e-6);
        assert!((parse_frequency("5k").unwrap() - 5e3).abs() < 1e-9);
        assert!((parse_frequency("1.2G").unwrap() - 1.2e9).abs() < 1e-3);
        assert!((parse_frequency("-1.5M").unwrap() + 1.5e6).abs() < 1e-6);
    }

    #[test]
    fn test_frequency_suffix_case_insensitive() {
        let cases = [("20K", 20e3), ("20k", 20e3), ("3m", 3e6), ("3M", 3e6), ("1g", 1e9)];
        for (text, expected) in cases {
            let parsed = parse_frequency(text).unwrap();
            assert!((parsed - expected).abs() < 1e-6, "{} -> {}", text, parsed);
        }
    }

    #[test]
    fn test_duration_suffixes() {
        assert!((parse_duration("30m").unwrap() - 1800.0).abs() < 1e-9);
        assert!((parse_duration("2h").unwrap() - 7200.0).abs() < 1e-9);
        assert!((parse_duration("45s").unwrap() - 45.0).abs() < 1e-9);
        assert!((parse_duration("1H").unwrap() - 3600.0).abs() < 1e-9);
    }

    #[test]
    fn test_matches_number_times_table() {
        let samples = ["1", "2.5", "0.125", "88", "1000"];
        for number in samples {
            for (unit, multiplier) in HZ_UNITS {
                for suffix in [unit.to_ascii_lowercase(), unit.to_ascii_uppercase()] {
                    let text = format!("{}{}", number, suffix);
                    let expected = number.parse::<f64>().unwrap() * multiplier;
                    assert!((parse_frequency(&text).unwrap() - expected).abs() < 1e-6);
                }
            }
        }
    }

    #[test]
    fn test_bare_number_passes_through() {
        assert!((parse_frequency("1500").unwrap() - 1500.0).abs() < 1e-9);
        assert!((parse_duration("90").unwrap() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_suffix() {
        match parse_frequency("12x") {
            Err(HeatmapError::UnrecognizedUnit { value }) => assert_eq!(value, "12x"),
            other => panic!("expected UnrecognizedUnit, got {:?}", other),
        }
        assert!(matches!(parse_duration("5d"), Err(HeatmapError::UnrecognizedUnit { .. })));
        assert!(matches!(parse_frequency("abM"), Err(HeatmapError::InvalidNumber { .. })));
    }

    #[test]
    fn test_unit_value() {
        assert!((UnitValue::Number(433.92e6).to_hz().unwrap() - 433.92e6).abs() < 1e-6);
        assert!((UnitValue::Text("20k".into()).to_hz().unwrap() - 20e3).abs() < 1e-9);
        let parsed: Vec<UnitValue> = serde_json::from_str(r#"[1000, "1k"]"#).unwrap();
        assert_eq!(parsed[0], UnitValue::Number(1000.0));
        assert_eq!(parsed[1], UnitValue::Text("1k".into()));
    }
}
