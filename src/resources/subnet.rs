use std::time::Duration;

use async_trait::async_trait;

use crate::api::types::Subnet;
use crate::api::CreateSubnetRequest;
use crate::error::ProviderError;
use crate::resource::{ProviderContext, Resource};
use crate::terraform::schema::{Field, FieldType, Schema, Validator, name_validators};
use crate::terraform::state::{Operation, ResourceData, Timeouts};
use crate::wait::{NOT_FOUND_STATUS, Probe, mutate_and_wait, wait_for_state};

const PENDING_CREATE: &[&str] = &["INIT", "CREATING"];
const PENDING_UPDATE: &[&str] = &["INIT", "CREATING", "UPDATING"];
const RUNNING: &[&str] = &["RUN"];
const PENDING_DELETE: &[&str] = &["RUN", "TERMTING"];
const GONE: &[&str] = &[NOT_FOUND_STATUS];

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

pub struct SubnetResource;

async fn probe_subnet(
    ctx: &ProviderContext,
    subnet_no: String,
) -> Result<Probe<Subnet>, ProviderError> {
    let subnet = ctx.client.get_subnet(&subnet_no).await?;
    Ok(Probe::from_option(subnet, |s| s.subnet_status.code.clone()))
}

fn flatten(subnet: &Subnet, data: &mut ResourceData) {
    data.set_id(subnet.subnet_no.clone());
    data.set("subnet_no", subnet.subnet_no.clone());
    data.set("vpc_no", subnet.vpc_no.clone());
    data.set("subnet", subnet.subnet.clone());
    data.set("zone", subnet.zone_code.clone());
    data.set("name", subnet.subnet_name.clone());
    data.set("network_acl_no", subnet.network_acl_no.clone());
    data.set("subnet_type", subnet.subnet_type.code.clone());
    data.set("usage_type", subnet.usage_type.code.clone());
}

#[async_trait]
impl Resource for SubnetResource {
    fn type_name(&self) -> &'static str {
        "ncloud_subnet"
    }

    fn schema(&self) -> Schema {
        let mut name = Field::optional_computed("name", FieldType::String).force_new();
        name.validators = name_validators();

        Schema::new(vec![
            Field::required("vpc_no", FieldType::String).force_new(),
            Field::required("subnet", FieldType::String)
                .force_new()
                .validate(Validator::Cidr),
            Field::required("zone", FieldType::String).force_new(),
            Field::required("network_acl_no", FieldType::String),
            Field::required("subnet_type", FieldType::String)
                .force_new()
                .validate(Validator::OneOf(&["PUBLIC", "PRIVATE"])),
            name,
            Field::optional_computed("usage_type", FieldType::String)
                .force_new()
                .validate(Validator::OneOf(&["GEN", "LOADB", "BM", "NATGW"])),
            Field::computed("subnet_no", FieldType::String),
        ])
    }

    fn default_timeouts(&self) -> Timeouts {
        Timeouts {
            create: Some(DEFAULT_TIMEOUT),
            update: Some(DEFAULT_TIMEOUT),
            delete: Some(DEFAULT_TIMEOUT),
            ..Default::default()
        }
    }

    async fn create(
        &self,
        ctx: &ProviderContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let request = CreateSubnetRequest {
            vpc_no: data.require_str("vpc_no")?.to_string(),
            subnet_name: data.get_string("name"),
            subnet: data.require_str("subnet")?.to_string(),
            zone_code: data.require_str("zone")?.to_string(),
            network_acl_no: data.require_str("network_acl_no")?.to_string(),
            subnet_type_code: data.require_str("subnet_type")?.to_string(),
            usage_type_code: data.get_string("usage_type"),
        };
        let change = ctx.state_change(
            PENDING_CREATE,
            RUNNING,
            data.timeout(Operation::Create, DEFAULT_TIMEOUT),
        );

        let (subnet_no, _) = mutate_and_wait(
            async {
                let subnet = ctx.client.create_subnet(&request).await?;
                tracing::info!(subnet_no = %subnet.subnet_no, vpc_no = %request.vpc_no, "subnet created");
                Ok::<_, ProviderError>(subnet.subnet_no)
            },
            &change,
            |id| probe_subnet(ctx, id),
        )
        .await?;

        data.set_id(subnet_no);
        self.read(ctx, data).await
    }

    async fn read(
        &self,
        ctx: &ProviderContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let subnet_no = data.require_id()?.to_string();
        match ctx.client.get_subnet(&subnet_no).await? {
            Some(subnet) => flatten(&subnet, data),
            None => {
                tracing::warn!(subnet_no = %subnet_no, "subnet not found, removing from state");
                data.clear_id();
            }
        }
        Ok(())
    }

    async fn update(
        &self,
        ctx: &ProviderContext,
        prior: &ResourceData,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        if data.changed(prior, "network_acl_no") {
            let subnet_no = data.require_id()?.to_string();
            let vpc_no = data.require_str("vpc_no")?.to_string();
            let network_acl_no = data.require_str("network_acl_no")?.to_string();

            ctx.client
                .set_subnet_network_acl(&vpc_no, &subnet_no, &network_acl_no)
                .await?;
            tracing::info!(subnet_no = %subnet_no, network_acl_no = %network_acl_no, "subnet network acl changed");

            let change = ctx.state_change(
                PENDING_UPDATE,
                RUNNING,
                data.timeout(Operation::Update, DEFAULT_TIMEOUT),
            );
            wait_for_state(&subnet_no, &change, |id| probe_subnet(ctx, id)).await?;
        }

        self.read(ctx, data).await
    }

    async fn delete(&self, ctx: &ProviderContext, data: &ResourceData) -> Result<(), ProviderError> {
        let subnet_no = data.require_id()?;
        let change = ctx.state_change(
            PENDING_DELETE,
            GONE,
            data.timeout(Operation::Delete, DEFAULT_TIMEOUT),
        );

        mutate_and_wait(
            async {
                ctx.client.delete_subnet(subnet_no).await?;
                Ok::<_, ProviderError>(subnet_no.to_string())
            },
            &change,
            |id| probe_subnet(ctx, id),
        )
        .await?;

        tracing::info!(subnet_no, "subnet deleted");
        Ok(())
    }
}
