//! Context entries recorded against candidate entities.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Declared type of a property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    String,
    Quantity,
    Date,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("string"),
            Self::Quantity => f.write_str("quantity"),
            Self::Date => f.write_str("date"),
        }
    }
}

/// All reference values a candidate carries for one property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub property: String,
    pub value_type: ValueType,
    pub values: Vec<String>,
}

impl ContextEntry {
    pub fn new(property: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            property: property.into(),
            value_type,
            values: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.values.push(value.into());
        self
    }
}

/// Best similarity a candidate reached for one property at one row position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyMatch {
    pub property: String,
    pub similarity: f64,
}
