use super::row_from;
use crate::backend::Row;
use serde_json::{json, Value};

pub const TABLE: &str = "clients";
pub const MISSING_FIELDS: &str = "Le nom et l'email sont requis";
pub const DUPLICATE_EMAIL: &str = "Un client avec cet email existe déjà";
pub const NOT_FOUND: &str = "Client introuvable";
/// Wire names accepted as list filters.
pub const FILTERS: &[&str] = &["email"];

/// Body of a client create/replace. Only these two fields are ever written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewClient {
    pub name: String,
    pub email: String,
}

impl NewClient {
    /// None when `name` or `email` is absent, null, not a string, or blank.
    pub fn from_body(body: &Value) -> Option<Self> {
        let field = |key: &str| {
            body.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
        };
        Some(NewClient {
            name: field("name")?,
            email: field("email")?,
        })
    }

    pub fn to_row(&self) -> Row {
        row_from(json!({ "name": self.name, "email": self.email }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_fields_are_required() {
        assert!(NewClient::from_body(&json!({ "name": "Alice" })).is_none());
        assert!(NewClient::from_body(&json!({ "email": "a@x.com" })).is_none());
        assert!(NewClient::from_body(&json!({ "name": "", "email": "a@x.com" })).is_none());
        assert!(NewClient::from_body(&json!({ "name": 3, "email": "a@x.com" })).is_none());
        assert!(NewClient::from_body(&json!("Alice")).is_none());
    }

    #[test]
    fn extra_fields_are_not_forwarded() {
        let client = NewClient::from_body(&json!({ "name": "Alice", "email": "a@x.com", "id": "x" })).unwrap();
        let row = client.to_row();
        assert_eq!(row.len(), 2);
        assert_eq!(row["email"], json!("a@x.com"));
    }
}
