use std::collections::HashMap;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub field_errors: HashMap<String, String>,
}

impl ValidationError {
    /// Whole-body failure, e.g. a JSON array where an object was expected.
    pub fn body(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field_errors: HashMap::new(),
        }
    }

    pub fn fields(field_errors: HashMap<String, String>) -> Self {
        Self {
            message: "Invalid request data".to_string(),
            field_errors,
        }
    }

    pub fn field(name: impl Into<String>, message: impl Into<String>) -> Self {
        let mut field_errors = HashMap::new();
        field_errors.insert(name.into(), message.into());
        Self::fields(field_errors)
    }
}
