use thiserror::Error;

/// Validation failures for configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid configuration value for `{field}`: {constraint}")]
    InvalidFieldValue { field: String, constraint: String },
}

impl ValidationError {
    /// Convenience constructor for field-level violations.
    pub fn invalid(field: &str, constraint: &str) -> Self {
        Self::InvalidFieldValue {
            field: field.to_string(),
            constraint: constraint.to_string(),
        }
    }
}
