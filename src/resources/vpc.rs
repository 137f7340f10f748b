use std::time::Duration;

use async_trait::async_trait;

use crate::api::types::Vpc;
use crate::error::ProviderError;
use crate::resource::{ProviderContext, Resource};
use crate::terraform::schema::{Field, FieldType, Schema, Validator, name_validators};
use crate::terraform::state::{Operation, ResourceData, Timeouts};
use crate::wait::{NOT_FOUND_STATUS, Probe, mutate_and_wait};

const PENDING_CREATE: &[&str] = &["INIT", "CREATING"];
const RUNNING: &[&str] = &["RUN"];
const PENDING_DELETE: &[&str] = &["RUN", "TERMTING"];
const GONE: &[&str] = &[NOT_FOUND_STATUS];

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

pub struct VpcResource;

async fn probe_vpc(
    ctx: &ProviderContext,
    vpc_no: String,
) -> Result<Probe<Vpc>, ProviderError> {
    let vpc = ctx.client.get_vpc(&vpc_no).await?;
    Ok(Probe::from_option(vpc, |v| v.vpc_status.code.clone()))
}

fn flatten(vpc: &Vpc, data: &mut ResourceData) {
    data.set_id(vpc.vpc_no.clone());
    data.set("vpc_no", vpc.vpc_no.clone());
    data.set("name", vpc.vpc_name.clone());
    data.set("ipv4_cidr_block", vpc.ipv4_cidr_block.clone());
}

#[async_trait]
impl Resource for VpcResource {
    fn type_name(&self) -> &'static str {
        "ncloud_vpc"
    }

    fn schema(&self) -> Schema {
        let mut name = Field::optional_computed("name", FieldType::String).force_new();
        name.validators = name_validators();

        Schema::new(vec![
            name,
            Field::required("ipv4_cidr_block", FieldType::String)
                .force_new()
                .validate(Validator::Cidr)
                .describe("Private range of the VPC, /16 to /28"),
            Field::computed("vpc_no", FieldType::String),
            Field::computed("default_network_acl_no", FieldType::String),
            Field::computed("default_access_control_group_no", FieldType::String),
        ])
    }

    fn default_timeouts(&self) -> Timeouts {
        Timeouts {
            create: Some(DEFAULT_TIMEOUT),
            delete: Some(DEFAULT_TIMEOUT),
            ..Default::default()
        }
    }

    async fn create(
        &self,
        ctx: &ProviderContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let name = data.get_string("name");
        let cidr = data.require_str("ipv4_cidr_block")?.to_string();
        let change = ctx.state_change(
            PENDING_CREATE,
            RUNNING,
            data.timeout(Operation::Create, DEFAULT_TIMEOUT),
        );

        let (vpc_no, _) = mutate_and_wait(
            async {
                let vpc = ctx.client.create_vpc(name.as_deref(), &cidr).await?;
                tracing::info!(vpc_no = %vpc.vpc_no, "vpc created");
                Ok::<_, ProviderError>(vpc.vpc_no)
            },
            &change,
            |id| probe_vpc(ctx, id),
        )
        .await?;

        data.set_id(vpc_no);
        self.read(ctx, data).await
    }

    async fn read(
        &self,
        ctx: &ProviderContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let vpc_no = data.require_id()?.to_string();

        let Some(vpc) = ctx.client.get_vpc(&vpc_no).await? else {
            tracing::warn!(vpc_no = %vpc_no, "vpc not found, removing from state");
            data.clear_id();
            return Ok(());
        };
        flatten(&vpc, data);

        let acls = ctx.client.list_network_acls(&vpc_no).await?;
        data.set_opt(
            "default_network_acl_no",
            acls.into_iter()
                .find(|acl| acl.is_default)
                .map(|acl| acl.network_acl_no),
        );

        let acgs = ctx
            .client
            .list_access_control_groups(ctx.backend.server_service(), &vpc_no)
            .await?;
        data.set_opt(
            "default_access_control_group_no",
            acgs.into_iter()
                .find(|acg| acg.is_default)
                .map(|acg| acg.access_control_group_no),
        );

        Ok(())
    }

    async fn delete(&self, ctx: &ProviderContext, data: &ResourceData) -> Result<(), ProviderError> {
        let vpc_no = data.require_id()?;
        let change = ctx.state_change(
            PENDING_DELETE,
            GONE,
            data.timeout(Operation::Delete, DEFAULT_TIMEOUT),
        );

        mutate_and_wait(
            async {
                ctx.client.delete_vpc(vpc_no).await?;
                Ok::<_, ProviderError>(vpc_no.to_string())
            },
            &change,
            |id| probe_vpc(ctx, id),
        )
        .await?;

        tracing::info!(vpc_no, "vpc deleted");
        Ok(())
    }
}
