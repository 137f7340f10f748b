//! Resource-instance plumbing shared by every resource and data source:
//! schemas, instance state and data source filters.

pub mod filter;
pub mod schema;
pub mod state;
