use async_trait::async_trait;

use crate::error::ProviderError;
use crate::resource::{DataSource, ProviderContext};
use crate::terraform::schema::{Field, FieldType, Schema};
use crate::terraform::state::ResourceData;

/// Looks up exactly one VPC by `id` or `name`.
pub struct VpcDataSource;

#[async_trait]
impl DataSource for VpcDataSource {
    fn type_name(&self) -> &'static str {
        "ncloud_vpc"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            Field::optional_computed("name", FieldType::String),
            Field::computed("vpc_no", FieldType::String),
            Field::computed("ipv4_cidr_block", FieldType::String),
            Field::computed("status", FieldType::String),
        ])
    }

    async fn read(
        &self,
        ctx: &ProviderContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let vpc_no = data.id().map(|s| s.to_string());
        let name = data.get_string("name");
        let mut vpcs = ctx
            .client
            .list_vpcs(name.as_deref(), vpc_no.as_deref())
            .await?;
        // vpcName is a partial match on the platform side
        if let Some(name) = &name {
            vpcs.retain(|v| v.vpc_name == *name);
        }

        let vpc = match vpcs.len() {
            1 => vpcs.remove(0),
            0 => {
                return Err(ProviderError::NotFound {
                    resource: "vpc".to_string(),
                    id: vpc_no.or(name).unwrap_or_default(),
                });
            }
            count => {
                return Err(ProviderError::Ambiguous {
                    resource: "vpc".to_string(),
                    count,
                });
            }
        };

        data.set_id(vpc.vpc_no.clone());
        data.set("vpc_no", vpc.vpc_no);
        data.set("name", vpc.vpc_name);
        data.set("ipv4_cidr_block", vpc.ipv4_cidr_block);
        data.set("status", vpc.vpc_status.code);
        Ok(())
    }
}
