//! String similarity over separator-delimited pieces.

use rapidfuzz::distance::levenshtein;

/// Split a value on `separator` into normalized, non-empty pieces.
///
/// Pieces are trimmed, lower-cased and have inner whitespace collapsed.
pub fn split_pieces(value: &str, separator: char) -> Vec<String> {
    value
        .split(separator)
        .map(normalize)
        .filter(|piece| !piece.is_empty())
        .collect()
}

fn normalize(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Best normalized Levenshtein similarity between any piece of `context`
/// and any piece of `property`; 0 below `threshold`.
pub fn string_similarity(context: &str, property: &str, threshold: f64, separator: char) -> f64 {
    let left = split_pieces(context, separator);
    let right = split_pieces(property, separator);
    let mut best = 0.0_f64;
    for a in &left {
        for b in &right {
            let sim = if a == b {
                1.0
            } else {
                levenshtein::normalized_similarity(a.chars(), b.chars())
            };
            best = best.max(sim);
        }
    }
    if best >= threshold { best } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_normalizes() {
        assert_eq!(
            split_pieces(" Windows , PlayStation  3,,", ','),
            vec!["windows", "playstation 3"]
        );
    }

    #[test]
    fn case_insensitive_exact() {
        assert_eq!(string_similarity("Red Dead", "red dead", 0.9, ','), 1.0);
    }

    #[test]
    fn one_edit_in_eight_chars() {
        let sim = string_similarity("macos 12", "macOS 11", 0.85, ',');
        assert!((sim - 0.875).abs() < 1e-9, "got {sim}");
    }

    #[test]
    fn best_piece_wins() {
        let sim = string_similarity("linux,windows,playstation", "Windows", 0.9, ',');
        assert_eq!(sim, 1.0);
    }

    #[test]
    fn below_threshold_is_zero() {
        assert_eq!(string_similarity("nintendo", "sega", 0.5, ','), 0.0);
    }
}
