//! Record services over the backend, plus the declarative payload validator.

mod records;
mod validation;
pub use records::{ClientService, ListParams, RecordService};
pub use validation::{lookup, parse_date, FieldKind, FieldRule, Format, Schema, Violation, Violations};
