//! CRM records: clients plus the three schema-validated resources.

pub mod client;
pub mod contact;
pub mod contract;
pub mod partner;

pub use client::NewClient;
pub use contact::{Contact, ContactStatus, ProfessionalDetails};
pub use contract::{Contract, ContractCategory, InsuranceType};
pub use partner::{Partner, PartnerStatus, PartnerType};

use crate::backend::Row;
use crate::service::{Schema, Violations};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A collection exposed under `/api/{path}` whose writes go through a validation schema.
pub trait Resource: Sized + Send + Sync + 'static {
    /// Storage table.
    const TABLE: &'static str;
    /// Message for 404 answers.
    const NOT_FOUND: &'static str;
    /// Wire (camelCase) names accepted as exact-match list filters.
    const FILTERS: &'static [&'static str];
    /// The wire shape, deserialized once the schema has accepted the payload.
    type Payload: DeserializeOwned;

    fn schema() -> &'static Schema;

    fn from_payload(payload: Self::Payload) -> Self;

    /// Storage row (snake_case columns). Never contains `id` or `created_at`.
    fn to_row(&self) -> Row;

    /// Validate then convert a request body.
    fn parse(body: &Value) -> Result<Self, Violations> {
        Self::schema().validate(body)?;
        let payload = serde_json::from_value(body.clone()).map_err(|e| {
            let mut v = Violations::default();
            v.push("$", e.to_string());
            v
        })?;
        Ok(Self::from_payload(payload))
    }
}

/// Build a `Row` from a `json!` object literal.
pub(crate) fn row_from(value: Value) -> Row {
    match value {
        Value::Object(m) => m,
        _ => Row::new(),
    }
}
