//! Schema model, query synthesis and two-pass execution

pub mod arguments;
pub mod client;
pub mod errors;
pub mod executor;
pub mod introspection;
pub mod params;
pub mod planner;
pub mod schema;
pub mod selection;
pub mod type_ref;
