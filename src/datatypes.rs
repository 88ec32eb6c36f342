use crate::error::{FieldErrors, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;

pub type Body = Map<String, Value>;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, FromRow)]
pub struct Child {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    #[sqlx(rename = "parent_id")]
    pub parent: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, FromRow)]
pub struct Parent {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    #[sqlx(skip)]
    pub children: Vec<Child>,
}

/// A text column and the longest value it accepts.
#[derive(Debug, Clone, Copy)]
pub struct TextField {
    pub name: &'static str,
    pub max_length: usize,
}

pub const PARENT_FIELDS: [TextField; 6] = [
    TextField { name: "first_name", max_length: 30 },
    TextField { name: "last_name", max_length: 30 },
    TextField { name: "street", max_length: 100 },
    TextField { name: "city", max_length: 50 },
    TextField { name: "state", max_length: 20 },
    TextField { name: "zip_code", max_length: 10 },
];

pub const CHILD_FIELDS: [TextField; 2] = [
    TextField { name: "first_name", max_length: 30 },
    TextField { name: "last_name", max_length: 30 },
];

pub const PARENT_KEY: &str = "parent";

/// Validated column values, in declaration order.
pub type Changes = Vec<(&'static str, String)>;

impl TextField {
    /// `Ok(None)` when the key is absent.
    pub fn read(&self, body: &Body) -> Result<Option<String>, String> {
        let raw = match body.get(self.name) {
            None => return Ok(None),
            Some(Value::Null) => return Err("This field may not be null.".into()),
            Some(Value::String(s)) => s.trim().to_owned(),
            Some(Value::Number(n)) => n.to_string(),
            Some(_) => return Err("Not a valid string.".into()),
        };

        if raw.is_empty() {
            return Err("This field may not be blank.".into());
        }

        if raw.chars().count() > self.max_length {
            return Err(format!(
                "Ensure this field has no more than {} characters.",
                self.max_length
            ));
        }

        Ok(Some(raw))
    }
}

/// Absent, null and blank values all count as missing on create.
fn is_missing(body: &Body, name: &str) -> bool {
    match body.get(name) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

pub fn require(body: &Body, names: &[&'static str]) -> Result<(), ValidationError> {
    let missing: Vec<&'static str> = names
        .iter()
        .copied()
        .filter(|name| is_missing(body, name))
        .collect();

    match missing.is_empty() {
        true => Ok(()),
        false => Err(ValidationError::MissingFields(missing)),
    }
}

/// Reads every supplied field, collecting all problems before failing.
pub fn read_changes(body: &Body, fields: &[TextField]) -> Result<Changes, ValidationError> {
    let mut errors = FieldErrors::default();
    let mut changes = Changes::new();

    for field in fields {
        match field.read(body) {
            Ok(Some(value)) => changes.push((field.name, value)),
            Ok(None) => {}
            Err(message) => errors.push(field.name, message),
        }
    }

    errors.into_result()?;

    Ok(changes)
}

/// `Ok(None)` when `parent` is absent.
pub fn read_parent_id(body: &Body) -> Result<Option<i64>, ValidationError> {
    let invalid = |kind: &str| {
        ValidationError::field(
            PARENT_KEY,
            format!("Incorrect type. Expected pk value, received {kind}."),
        )
    };

    match body.get(PARENT_KEY) {
        None => Ok(None),
        Some(Value::Null) => Err(ValidationError::field(PARENT_KEY, "This field may not be null.")),
        Some(Value::Number(n)) => n.as_i64().map(Some).ok_or_else(|| invalid("float")),
        Some(Value::String(s)) => s.trim().parse().map(Some).map_err(|_| invalid("str")),
        Some(Value::Bool(_)) => Err(invalid("bool")),
        Some(Value::Array(_)) => Err(invalid("list")),
        Some(Value::Object(_)) => Err(invalid("dict")),
    }
}

pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: Value) -> Body {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn require_reports_absent_null_and_blank() {
        let b = body(json!({ "first_name": "Shadman", "last_name": null, "street": "  " }));

        let err = require(&b, &["first_name", "last_name", "street", "city"]).unwrap_err();

        assert_eq!(
            err,
            ValidationError::MissingFields(vec!["last_name", "street", "city"])
        );
    }

    #[test]
    fn read_changes_trims_and_stringifies() {
        let b = body(json!({ "first_name": "  Jane ", "zip_code": 1214, "unknown": true }));

        let changes = read_changes(&b, &PARENT_FIELDS).unwrap();

        assert_eq!(
            changes,
            vec![("first_name", "Jane".to_string()), ("zip_code", "1214".to_string())]
        );
    }

    #[test]
    fn read_changes_collects_every_bad_field() {
        let b = body(json!({
            "first_name": "",
            "state": "a state name that is far too long",
            "city": ["Dhaka"],
        }));

        let err = read_changes(&b, &PARENT_FIELDS).unwrap_err();

        assert_eq!(
            err.body(),
            json!({
                "first_name": ["This field may not be blank."],
                "state": ["Ensure this field has no more than 20 characters."],
                "city": ["Not a valid string."],
            })
        );
    }

    #[test]
    fn parent_id_accepts_integers_and_numeric_strings() {
        assert_eq!(read_parent_id(&body(json!({ "parent": 4 }))).unwrap(), Some(4));
        assert_eq!(read_parent_id(&body(json!({ "parent": "7" }))).unwrap(), Some(7));
        assert_eq!(read_parent_id(&body(json!({}))).unwrap(), None);
    }

    #[test]
    fn parent_id_rejects_other_shapes() {
        let err = read_parent_id(&body(json!({ "parent": "abc" }))).unwrap_err();
        assert_eq!(
            err,
            ValidationError::field("parent", "Incorrect type. Expected pk value, received str.")
        );

        let err = read_parent_id(&body(json!({ "parent": null }))).unwrap_err();
        assert_eq!(err, ValidationError::field("parent", "This field may not be null."));
    }
}
