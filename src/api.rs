//! Signed client for the platform's REST API.
//!
//! RPC-style services (`/vpc/v2`, `/vserver/v2`, ...) take query parameters
//! and wrap every response in an `<action>Response` envelope. The data
//! streaming service speaks plain JSON under `/cdss/v1`.

mod cdss;
mod client;
mod error;
mod loadbalancer;
mod server;
mod signer;
pub mod types;
mod vpc;

pub use cdss::{CDSS_SERVICE, CmakInfo, CreateCdssClusterRequest, NodeInfo};
pub use client::{ApiClient, Params};
pub use error::{ApiError, CommonErrorBody, common_error_body};
pub use loadbalancer::CreateLoadBalancerRequest;
pub use server::{AcgRuleParams, LoginKeyDelete, RuleDirection};
pub use signer::{ACCESS_KEY_HEADER, SIGNATURE_HEADER, Signer, TIMESTAMP_HEADER};
pub use vpc::{CreateSubnetRequest, SubnetFilter, VPC_SERVICE};
