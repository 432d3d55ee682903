//! Column targets and per-field cell cleanup.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::types::SizeUnit;

/// Leading magnitude of a size cell, with whatever trails it.
static SIZE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+(?:[.,]\d+)?)\s*(.*?)\s*$").expect("valid size regex"));

/// Numeric code exported by a spreadsheet as a float ("8011003809219.0").
static FLOAT_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\.0+$").expect("valid code regex"));

/// Record field a source column is mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnTarget {
    /// Product code. Overloaded cells ("12345 ADP BLU 30ML") are split: the
    /// first token is the code, the rest feeds description analysis.
    Code,
    /// Product name, taken verbatim.
    Name,
    /// Brand, either a numeric id or a brand name from the rule set.
    Brand,
    Concentration,
    DispenserType,
    Gender,
    /// Size; only the numeric prefix is kept, a trailing unit fills the unit.
    Size,
    Unit,
    CountryOfOrigin,
    /// Yes/no flag.
    LiFree,
}

impl ColumnTarget {
    /// Field name used in row issues and interactive prompts.
    pub fn field_name(&self) -> &'static str {
        match self {
            ColumnTarget::Code => "code",
            ColumnTarget::Name => "name",
            ColumnTarget::Brand => "brand_id",
            ColumnTarget::Concentration => "concentration",
            ColumnTarget::DispenserType => "dispenser_type",
            ColumnTarget::Gender => "gender",
            ColumnTarget::Size => "size",
            ColumnTarget::Unit => "unit",
            ColumnTarget::CountryOfOrigin => "country_of_origin",
            ColumnTarget::LiFree => "li_free",
        }
    }
}

/// Format a decimal magnitude without a forced trailing zero.
///
/// Accepts a comma as decimal separator. Returns `None` for anything that is
/// not a finite, non-negative number.
pub fn format_magnitude(raw: &str) -> Option<String> {
    let value: f64 = raw.trim().replace(',', ".").parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Some(value.to_string())
}

/// Extract the numeric prefix of a size cell and, if the remainder names a
/// unit, that unit.
pub fn split_size(cell: &str) -> Option<(String, Option<SizeUnit>)> {
    let caps = SIZE_PREFIX.captures(cell)?;
    let magnitude = format_magnitude(&caps[1])?;
    let unit = caps
        .get(2)
        .map(|m| m.as_str())
        .filter(|rest| !rest.is_empty())
        .and_then(|rest| rest.parse::<SizeUnit>().ok());
    Some((magnitude, unit))
}

/// Split an overloaded code cell into the code and any trailing text.
pub fn split_code(cell: &str) -> (String, Option<String>) {
    let trimmed = cell.trim();
    let (code, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((code, rest)) => (code, Some(rest.trim().to_string())),
        None => (trimmed, None),
    };

    let code = match FLOAT_CODE.captures(code) {
        Some(caps) => caps[1].to_string(),
        None => code.to_string(),
    };

    (code, rest.filter(|r| !r.is_empty()))
}

/// Interpret a yes/no style cell.
pub fn parse_flag(cell: &str) -> Option<bool> {
    match cell.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "true" | "1" | "x" | "si" | "oui" => Some(true),
        "n" | "no" | "false" | "0" | "non" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_magnitude() {
        assert_eq!(format_magnitude("30"), Some("30".to_string()));
        assert_eq!(format_magnitude("30.0"), Some("30".to_string()));
        assert_eq!(format_magnitude("29,6"), Some("29.6".to_string()));
        assert_eq!(format_magnitude("abc"), None);
    }

    #[test]
    fn test_split_size() {
        assert_eq!(split_size("100ML"), Some(("100".to_string(), Some(SizeUnit::Ml))));
        assert_eq!(split_size("3.4 fl oz"), Some(("3.4".to_string(), Some(SizeUnit::Oz))));
        assert_eq!(split_size("50"), Some(("50".to_string(), None)));
        assert_eq!(split_size("75 bottles"), Some(("75".to_string(), None)));
        assert_eq!(split_size("n/a"), None);
    }

    #[test]
    fn test_split_code() {
        assert_eq!(split_code("8011003809219.0"), ("8011003809219".to_string(), None));
        assert_eq!(
            split_code("ADP-001 BLU MEDITERRANEO 30ML"),
            ("ADP-001".to_string(), Some("BLU MEDITERRANEO 30ML".to_string()))
        );
        assert_eq!(split_code(" X1.5 "), ("X1.5".to_string(), None));
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("Yes"), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
