//! Lookup of candidate property values used for context matching.
//!
//! Each context record pairs a candidate id with a `|`-separated list of
//! entries `<tag>:<property>:<value>`:
//!
//! | tag | type     | value                     |
//! |-----|----------|---------------------------|
//! | `s` | string   | text                      |
//! | `q` | quantity | number, optionally unit   |
//! | `d` | date     | Wikidata time or ISO date |
//! | `i` | string   | `<entity id>:<label>`     |

use std::collections::{BTreeMap, HashMap};

use tl_model::{ContextEntry, Result, TlError, ValueType};
use tracing::{debug, trace};

/// A single parsed context entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEntry {
    pub property: String,
    pub value_type: ValueType,
    pub value: String,
}

/// Parse one `<tag>:<property>:<value>` entry.
///
/// # Errors
///
/// Returns [`TlError::MalformedValue`] for unknown tags or missing parts.
pub fn parse_context_entry(raw: &str) -> Result<ParsedEntry> {
    let trimmed = raw.trim();
    let mut parts = trimmed.splitn(3, ':');
    let (Some(tag), Some(property), Some(value)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(TlError::malformed(raw, ValueType::String));
    };
    let property = property.trim();
    let value = value.trim().trim_matches('"');
    if property.is_empty() || value.is_empty() {
        return Err(TlError::malformed(raw, ValueType::String));
    }
    let (value_type, value) = match tag.trim() {
        "s" => (ValueType::String, value),
        "q" => (ValueType::Quantity, value),
        "d" => (ValueType::Date, value),
        // Items compare by label; fall back to the id when no label is given.
        "i" => (
            ValueType::String,
            value.split_once(':').map_or(value, |(_, label)| label.trim()),
        ),
        _ => return Err(TlError::malformed(raw, ValueType::String)),
    };
    Ok(ParsedEntry {
        property: property.to_string(),
        value_type,
        value: value.to_string(),
    })
}

/// Candidate id → property id → context entry.
#[derive(Debug, Clone, Default)]
pub struct ContextIndex {
    candidates: HashMap<String, BTreeMap<String, ContextEntry>>,
    skipped: usize,
}

impl ContextIndex {
    /// Build the index from `(candidate id, context string)` records.
    ///
    /// Malformed entries are skipped one at a time; the rest of the record
    /// is kept.
    pub fn from_records<I, K, V>(records: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut index = Self::default();
        for (kg_id, context) in records {
            index.add_record(kg_id.as_ref(), context.as_ref());
        }
        debug!(
            candidates = index.candidates.len(),
            skipped = index.skipped,
            "context index built"
        );
        index
    }

    fn add_record(&mut self, kg_id: &str, context: &str) {
        let kg_id = kg_id.trim();
        if kg_id.is_empty() {
            return;
        }
        for raw in context.split('|').filter(|raw| !raw.trim().is_empty()) {
            match parse_context_entry(raw) {
                Ok(parsed) => self.insert(kg_id, parsed),
                Err(error) => {
                    trace!(kg_id, %error, "context entry skipped");
                    self.skipped += 1;
                }
            }
        }
    }

    /// Add one value; values of an already known property must share its type.
    pub fn insert(&mut self, kg_id: &str, parsed: ParsedEntry) {
        let properties = self.candidates.entry(kg_id.to_string()).or_default();
        let entry = properties
            .entry(parsed.property.clone())
            .or_insert_with(|| ContextEntry::new(parsed.property.clone(), parsed.value_type));
        if entry.value_type != parsed.value_type {
            trace!(kg_id, property = %parsed.property, "conflicting value type skipped");
            self.skipped += 1;
            return;
        }
        if !entry.values.contains(&parsed.value) {
            entry.values.push(parsed.value);
        }
    }

    /// Entries of a candidate in property order.
    pub fn entries(&self, kg_id: &str) -> impl Iterator<Item = &ContextEntry> {
        self.candidates
            .get(kg_id)
            .into_iter()
            .flat_map(BTreeMap::values)
    }

    pub fn entry(&self, kg_id: &str, property: &str) -> Option<&ContextEntry> {
        self.candidates.get(kg_id)?.get(property)
    }

    /// Whether any property value is recorded for the candidate.
    pub fn contains(&self, kg_id: &str) -> bool {
        self.candidates.contains_key(kg_id)
    }

    pub fn has_property(&self, kg_id: &str, property: &str) -> bool {
        self.entry(kg_id, property).is_some()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Number of entries dropped while building.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tags() {
        let entry = parse_context_entry("d:P577:+2010-05-18T00:00:00Z/11").unwrap();
        assert_eq!(entry.property, "P577");
        assert_eq!(entry.value_type, ValueType::Date);
        assert_eq!(entry.value, "+2010-05-18T00:00:00Z/11");

        let item = parse_context_entry("i:P400:Q1406:Microsoft Windows").unwrap();
        assert_eq!(item.value_type, ValueType::String);
        assert_eq!(item.value, "Microsoft Windows");
    }

    #[test]
    fn skips_malformed_entries_only() {
        let index = ContextIndex::from_records([(
            "Q548203",
            "s:P1476:Red Dead Redemption|x:P1:bad|q:P2044|d:P577:2010",
        )]);
        let properties: Vec<&str> = index
            .entries("Q548203")
            .map(|entry| entry.property.as_str())
            .collect();
        assert_eq!(properties, vec!["P1476", "P577"]);
        assert_eq!(index.skipped(), 2);
    }

    #[test]
    fn merges_values_per_property() {
        let index = ContextIndex::from_records([
            ("Q1", "s:P400:Windows|s:P400:Linux"),
            ("Q1", "s:P400:Windows"),
        ]);
        assert_eq!(
            index.entry("Q1", "P400").unwrap().values,
            vec!["Windows", "Linux"]
        );
        assert!(!index.has_property("Q2", "P400"));
        assert!(index.contains("Q1"));
        assert!(!index.contains("Q2"));
    }
}
