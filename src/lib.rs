//! ncloud-provider - Naver Cloud Platform resources behind a Terraform-style
//! create/read/update/delete surface.
//!
//! [`Provider`] binds the resource registry to a signed API client. Every
//! resource validates its configuration against a [`terraform::schema::Schema`],
//! drives the platform API, and waits for the remote object to settle.

pub mod api;
pub mod config;
pub mod data_sources;
pub mod diff;
pub mod error;
pub mod network;
pub mod output;
pub mod provider;
pub mod resource;
pub mod resources;
pub mod terraform;
pub mod wait;

pub use config::{ProviderConfig, Site};
pub use error::ProviderError;
pub use network::Platform;
pub use provider::{Provider, Registry};
pub use resource::{DataSource, ProviderContext, Resource};
pub use terraform::state::ResourceData;
