//! Values bound to a built query.

use serde_json::Value;

/// A bind parameter. Filters compare as text; rows travel as one JSONB document.
#[derive(Clone, Debug, PartialEq)]
pub enum BindValue {
    Text(String),
    Json(Value),
}
