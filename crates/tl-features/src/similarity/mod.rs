//! Similarity primitives mapping a row context value and a property value
//! to a match strength in [0, 1].
//!
//! - **string**: best normalized Levenshtein similarity over separator pieces
//! - **quantity**: relative difference of normalized numbers
//! - **date**: temporal closeness at the common precision

pub mod date;
pub mod quantity;
pub mod string;

use tl_model::{ContextEntry, Thresholds, ValueType};
use tracing::trace;

pub use date::{DatePrecision, PartialDate, compare_dates, date_similarity, parse_partial_date};
pub use quantity::{compare_quantities, parse_quantity, quantity_similarity};
pub use string::{split_pieces, string_similarity};

/// Compare one row context value with one property value of a declared type.
///
/// Malformed values are recovered here: the comparison scores 0 and the
/// caller moves on to the next value.
pub fn compare_value(
    value_type: ValueType,
    context: &str,
    property: &str,
    thresholds: &Thresholds,
    separator: char,
) -> f64 {
    let result = match value_type {
        ValueType::String => Ok(string_similarity(
            context,
            property,
            thresholds.string,
            separator,
        )),
        ValueType::Quantity => compare_quantities(context, property, thresholds.quantity, separator),
        ValueType::Date => compare_dates(context, property, thresholds.date, separator),
    };
    match result {
        Ok(similarity) => similarity,
        Err(error) => {
            trace!(%error, "comparison skipped");
            0.0
        }
    }
}

/// Best similarity between a row context value and any value of `entry`.
pub fn entry_similarity(
    entry: &ContextEntry,
    context: &str,
    thresholds: &Thresholds,
    separator: char,
) -> f64 {
    entry
        .values
        .iter()
        .map(|value| compare_value(entry.value_type, context, value, thresholds, separator))
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incompatible_types_score_zero() {
        let thresholds = Thresholds::default();
        assert_eq!(
            compare_value(ValueType::Quantity, "windows", "12", &thresholds, ','),
            0.0
        );
        assert_eq!(
            compare_value(ValueType::Date, "windows", "2010", &thresholds, ','),
            0.0
        );
    }

    #[test]
    fn entry_takes_best_value() {
        let entry = ContextEntry::new("P400", ValueType::String)
            .with_value("Microsoft Windows")
            .with_value("PlayStation 3");
        let thresholds = Thresholds::default();
        assert_eq!(
            entry_similarity(&entry, "playstation 3,xbox 360", &thresholds, ','),
            1.0
        );
    }
}
