//! Safe SQL builder: identifiers always quoted, values always bound as parameters.

mod builder;
pub mod params;
pub use builder::*;
pub use params::*;
