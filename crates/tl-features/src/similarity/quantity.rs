//! Quantity parsing and similarity.
//!
//! Table cells carry numbers in many shapes: `"1,234"`, `"1.234,5"`,
//! `"$ 12.5"`, `"+12.5Q11573"` (a Wikidata amount with unit). Values are
//! normalized to a plain decimal literal before comparison.

use std::sync::LazyLock;

use regex::Regex;
use tl_model::{Result, TlError, ValueType};

use super::string::split_pieces;

static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-?\d+(?:\.\d+)?(?:[eE][-+]?\d+)?").expect("Invalid quantity regex")
});

/// Parse a possibly badly formatted quantity.
///
/// # Errors
///
/// Returns [`TlError::MalformedValue`] when no number can be recovered.
pub fn parse_quantity(raw: &str) -> Result<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|ch| {
            !ch.is_whitespace() && !matches!(ch, '"' | '\'' | '+' | '$' | '€' | '£' | '¥' | '%')
        })
        .collect();
    let normalized = normalize_separators(&cleaned);
    NUMBER
        .find(&normalized)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .ok_or_else(|| TlError::malformed(raw, ValueType::Quantity))
}

/// Rewrite locale separators so `.` is the only decimal mark.
fn normalize_separators(value: &str) -> String {
    match (value.rfind(','), value.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => value.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => value.replace(',', ""),
        (Some(comma), None) => {
            let commas = value.matches(',').count();
            let digits_after = value[comma + 1..]
                .chars()
                .take_while(char::is_ascii_digit)
                .count();
            if commas > 1 || digits_after == 3 {
                value.replace(',', "")
            } else {
                value.replace(',', ".")
            }
        }
        _ => value.to_string(),
    }
}

/// Similarity from relative difference: 1 on equality, 0 below `threshold`.
pub fn quantity_similarity(a: f64, b: f64, threshold: f64) -> f64 {
    if a == b {
        return 1.0;
    }
    let scale = a.abs().max(b.abs());
    let sim = (1.0 - (a - b).abs() / scale).max(0.0);
    if sim >= threshold { sim } else { 0.0 }
}

/// Compare a row context value with a property quantity.
///
/// The context value is tried whole and split on `separator`.
///
/// # Errors
///
/// Returns [`TlError::MalformedValue`] when either side holds no number.
pub fn compare_quantities(
    context: &str,
    property: &str,
    threshold: f64,
    separator: char,
) -> Result<f64> {
    let reference = parse_quantity(property)?;
    let mut parsed = Vec::new();
    if let Ok(whole) = parse_quantity(context) {
        parsed.push(whole);
    }
    for piece in split_pieces(context, separator) {
        if let Ok(value) = parse_quantity(&piece) {
            parsed.push(value);
        }
    }
    if parsed.is_empty() {
        return Err(TlError::malformed(context, ValueType::Quantity));
    }
    Ok(parsed
        .into_iter()
        .map(|value| quantity_similarity(value, reference, threshold))
        .fold(0.0, f64::max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_badly_formatted_numbers() {
        assert_eq!(parse_quantity("1,234").unwrap(), 1234.0);
        assert_eq!(parse_quantity("1.234,5").unwrap(), 1234.5);
        assert_eq!(parse_quantity("12,5").unwrap(), 12.5);
        assert_eq!(parse_quantity("1,234,567.25").unwrap(), 1_234_567.25);
        assert_eq!(parse_quantity(" $ 300 ").unwrap(), 300.0);
        assert_eq!(parse_quantity("+12.5Q11573").unwrap(), 12.5);
        assert_eq!(parse_quantity("-3e2").unwrap(), -300.0);
    }

    #[test]
    fn rejects_text() {
        assert!(matches!(
            parse_quantity("windows"),
            Err(TlError::MalformedValue {
                expected: ValueType::Quantity,
                ..
            })
        ));
    }

    #[test]
    fn relative_difference() {
        assert_eq!(quantity_similarity(100.0, 100.0, 1.0), 1.0);
        assert!((quantity_similarity(90.0, 100.0, 0.85) - 0.9).abs() < 1e-12);
        assert_eq!(quantity_similarity(90.0, 100.0, 0.95), 0.0);
        assert_eq!(quantity_similarity(90.0, 100.0, 1.0), 0.0);
    }

    #[test]
    fn compares_split_context() {
        let sim = compare_quantities("2019,331", "331", 0.9, ',').unwrap();
        assert_eq!(sim, 1.0);
    }
}
