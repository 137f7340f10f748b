//! Classic vs VPC platform generations.
//!
//! Both generations expose the same server and load balancer actions under
//! different service prefixes. Resources declare which generations they
//! support and look up service paths through the backend instead of
//! branching on the platform themselves.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::LoginKeyDelete;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Classic,
    Vpc,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Classic => write!(f, "classic"),
            Platform::Vpc => write!(f, "vpc"),
        }
    }
}

/// Platforms a VPC-only resource supports.
pub const VPC_ONLY: &[Platform] = &[Platform::Vpc];
/// Platforms a resource available on both generations supports.
pub const ALL_PLATFORMS: &[Platform] = &[Platform::Classic, Platform::Vpc];

pub trait NetworkBackend: Send + Sync + fmt::Debug {
    fn platform(&self) -> Platform;

    /// Service prefix of server-side actions (login keys, ACGs, regions).
    fn server_service(&self) -> &'static str;

    fn load_balancer_service(&self) -> &'static str;

    fn login_key_delete(&self) -> LoginKeyDelete;

    fn supports(&self, platforms: &[Platform]) -> bool {
        platforms.contains(&self.platform())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ClassicBackend;

impl NetworkBackend for ClassicBackend {
    fn platform(&self) -> Platform {
        Platform::Classic
    }

    fn server_service(&self) -> &'static str {
        "/server/v2"
    }

    fn load_balancer_service(&self) -> &'static str {
        "/loadbalancer/v2"
    }

    fn login_key_delete(&self) -> LoginKeyDelete {
        LoginKeyDelete::Single
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VpcBackend;

impl NetworkBackend for VpcBackend {
    fn platform(&self) -> Platform {
        Platform::Vpc
    }

    fn server_service(&self) -> &'static str {
        "/vserver/v2"
    }

    fn load_balancer_service(&self) -> &'static str {
        "/vloadbalancer/v2"
    }

    fn login_key_delete(&self) -> LoginKeyDelete {
        LoginKeyDelete::Batch
    }
}

pub fn backend_for(platform: Platform) -> Arc<dyn NetworkBackend> {
    match platform {
        Platform::Classic => Arc::new(ClassicBackend),
        Platform::Vpc => Arc::new(VpcBackend),
    }
}
