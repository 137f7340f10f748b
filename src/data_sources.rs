//! Read-only lookups.

mod regions;
mod subnets;
mod vpc;

use std::sync::Arc;

use crate::resource::DataSource;

pub use regions::RegionsDataSource;
pub use subnets::SubnetsDataSource;
pub use vpc::VpcDataSource;

pub fn all() -> Vec<Arc<dyn DataSource>> {
    vec![
        Arc::new(RegionsDataSource),
        Arc::new(VpcDataSource),
        Arc::new(SubnetsDataSource),
    ]
}
