use thiserror::Error;

use crate::context::ValueType;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TlError {
    /// Options that cannot be used together, or out-of-range knobs.
    #[error("invalid configuration: {message}")]
    Configuration { message: String },

    #[error("no context source: pass --context-file or --custom-context-file")]
    MissingContextSource,

    /// A single value that cannot be read as its declared type.
    #[error("malformed {expected} value: {value:?}")]
    MalformedValue { value: String, expected: ValueType },

    #[error("missing required column: {column}")]
    MissingColumn { column: String },
}

impl TlError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn malformed(value: impl Into<String>, expected: ValueType) -> Self {
        Self::MalformedValue {
            value: value.into(),
            expected,
        }
    }
}

pub type Result<T> = std::result::Result<T, TlError>;
