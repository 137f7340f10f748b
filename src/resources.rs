//! Managed resource implementations.

mod access_control_group;
mod access_control_group_rule;
mod cdss_cluster;
mod cdss_config_group;
mod load_balancer;
mod login_key;
mod subnet;
mod vpc;

use std::sync::Arc;

use crate::resource::Resource;

pub use access_control_group::AccessControlGroupResource;
pub use access_control_group_rule::{AccessControlGroupRuleResource, CONCURRENT_CHANGE_CODE};
pub use cdss_cluster::CdssClusterResource;
pub use cdss_config_group::CdssConfigGroupResource;
pub use load_balancer::LoadBalancerResource;
pub use login_key::LoginKeyResource;
pub use subnet::SubnetResource;
pub use vpc::VpcResource;

pub fn all() -> Vec<Arc<dyn Resource>> {
    vec![
        Arc::new(VpcResource),
        Arc::new(SubnetResource),
        Arc::new(AccessControlGroupResource),
        Arc::new(AccessControlGroupRuleResource),
        Arc::new(LoginKeyResource),
        Arc::new(LoadBalancerResource),
        Arc::new(CdssConfigGroupResource),
        Arc::new(CdssClusterResource),
    ]
}
