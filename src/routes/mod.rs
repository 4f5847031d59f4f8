//! Router construction.

mod common;
mod resources;

pub use common::common_routes;
pub use resources::{api_routes, client_routes, resource_routes};
