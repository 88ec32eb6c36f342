use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Which table a lookup missed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Parent,
    Child,
}

impl Display for Entity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Entity::Parent => write!(f, "Parent"),
            Entity::Child => write!(f, "Child"),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0} not found.")]
    NotFound(Entity),

    #[error("Cannot delete parent with existing children.")]
    HasChildren,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Parent not found.")]
    ParentNotFound,

    /// Field name to messages, serialized as-is.
    #[error("invalid fields: {0:?}")]
    Fields(BTreeMap<String, Vec<String>>),

    #[error("JSON parse error - {0}")]
    Malformed(String),
}

impl ValidationError {
    pub fn field(name: &str, message: impl Into<String>) -> Self {
        Self::Fields(BTreeMap::from([(name.to_owned(), vec![message.into()])]))
    }

    pub fn body(&self) -> Value {
        match self {
            ValidationError::Fields(errors) => json!(errors),
            other => json!({ "error": other.to_string() }),
        }
    }
}

/// Collects field-level messages while a body is walked.
#[derive(Default, Debug)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn push(&mut self, name: &str, message: impl Into<String>) {
        self.0.entry(name.to_owned()).or_default().push(message.into());
    }

    pub fn into_result(self) -> Result<(), ValidationError> {
        match self.0.is_empty() {
            true => Ok(()),
            false => Err(ValidationError::Fields(self.0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_message_lists_names_in_order() {
        let err = ValidationError::MissingFields(vec!["first_name", "zip_code"]);

        assert_eq!(err.to_string(), "Missing required fields: first_name, zip_code");
        assert_eq!(
            err.body(),
            json!({ "error": "Missing required fields: first_name, zip_code" })
        );
    }

    #[test]
    fn field_errors_serialize_as_a_map() {
        let mut errors = FieldErrors::default();
        errors.push("city", "This field may not be blank.");
        errors.push("city", "second");

        let err = errors.into_result().unwrap_err();

        assert_eq!(
            err.body(),
            json!({ "city": ["This field may not be blank.", "second"] })
        );
    }

    #[test]
    fn empty_field_errors_pass() {
        assert!(FieldErrors::default().into_result().is_ok());
    }

    #[test]
    fn not_found_names_the_entity() {
        assert_eq!(StoreError::NotFound(Entity::Child).to_string(), "Child not found.");
    }
}
