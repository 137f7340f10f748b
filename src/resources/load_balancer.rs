use std::time::Duration;

use async_trait::async_trait;

use crate::api::CreateLoadBalancerRequest;
use crate::api::types::LoadBalancer;
use crate::error::ProviderError;
use crate::resource::{ProviderContext, Resource};
use crate::terraform::schema::{Field, FieldType, Schema, Validator, name_validators};
use crate::terraform::state::{Operation, ResourceData, Timeouts};
use crate::wait::{NOT_FOUND_STATUS, Probe, mutate_and_wait, wait_for_state};

// A balancer reports its operation code (CREAT, CHANG, TERMT) while one is
// in flight, so each pending set lists both kinds of code.
const PENDING_CREATE: &[&str] = &["INIT", "CREATING", "CREAT"];
const PENDING_UPDATE: &[&str] = &["CHANG", "INIT", "CREATING"];
const RUNNING: &[&str] = &["RUN"];
const PENDING_DELETE: &[&str] = &["RUN", "TERMTING", "TERMT"];
const GONE: &[&str] = &[NOT_FOUND_STATUS];

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

const CONFIGURATION_FIELDS: [&str; 2] = ["idle_timeout", "throughput_type"];

pub struct LoadBalancerResource;

async fn probe_load_balancer(
    ctx: &ProviderContext,
    load_balancer_no: String,
) -> Result<Probe<LoadBalancer>, ProviderError> {
    let lb = ctx
        .client
        .get_load_balancer(ctx.backend.load_balancer_service(), &load_balancer_no)
        .await?;
    Ok(Probe::from_option(lb, |lb| {
        lb.convergence_status().to_string()
    }))
}

fn flatten(lb: &LoadBalancer, data: &mut ResourceData) {
    data.set_id(lb.load_balancer_instance_no.clone());
    data.set("load_balancer_no", lb.load_balancer_instance_no.clone());
    data.set("name", lb.load_balancer_name.clone());
    data.set_opt("description", lb.load_balancer_description.clone());
    data.set_opt("domain", lb.load_balancer_domain.clone());
    data.set("ip_list", lb.load_balancer_ip_list.clone());
    data.set("network_type", lb.load_balancer_network_type.code.clone());
    data.set("type", lb.load_balancer_type.code.clone());
    data.set("throughput_type", lb.throughput_type.code.clone());
    data.set("idle_timeout", lb.idle_timeout);
    data.set("vpc_no", lb.vpc_no.clone());
    data.set("subnet_no_list", lb.subnet_no_list.clone());
}

#[async_trait]
impl Resource for LoadBalancerResource {
    fn type_name(&self) -> &'static str {
        "ncloud_lb"
    }

    fn schema(&self) -> Schema {
        let mut name = Field::optional_computed("name", FieldType::String).force_new();
        name.validators = name_validators();

        Schema::new(vec![
            name,
            Field::optional("description", FieldType::String)
                .validate(Validator::Length { min: 0, max: 1000 }),
            Field::required("network_type", FieldType::String)
                .force_new()
                .validate(Validator::OneOf(&["PUBLIC", "PRIVATE"])),
            Field::required("type", FieldType::String)
                .force_new()
                .validate(Validator::OneOf(&["APPLICATION", "NETWORK", "NETWORK_PROXY"])),
            Field::optional_computed("throughput_type", FieldType::String)
                .validate(Validator::OneOf(&["SMALL", "MEDIUM", "LARGE", "DYNAMIC"])),
            Field::optional_computed("idle_timeout", FieldType::Int)
                .validate(Validator::Range { min: 1, max: 3600 }),
            Field::required("subnet_no_list", FieldType::list_of(FieldType::String))
                .force_new()
                .max_items(2)
                .describe("Subnets the balancer is placed in, one per zone"),
            Field::computed("load_balancer_no", FieldType::String),
            Field::computed("domain", FieldType::String),
            Field::computed("vpc_no", FieldType::String),
            Field::computed("ip_list", FieldType::list_of(FieldType::String)),
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
        let subnet_no_list = data.get_string_list("subnet_no_list");
        let first_subnet = subnet_no_list
            .first()
            .ok_or_else(|| ProviderError::MissingAttribute("subnet_no_list".to_string()))?;
        let subnet = ctx
            .client
            .get_subnet(first_subnet)
            .await?
            .ok_or_else(|| ProviderError::NotFound {
                resource: "subnet".to_string(),
                id: first_subnet.clone(),
            })?;

        let request = CreateLoadBalancerRequest {
            vpc_no: subnet.vpc_no,
            name: data.get_string("name"),
            description: data.get_string("description"),
            network_type_code: data.require_str("network_type")?.to_string(),
            type_code: data.require_str("type")?.to_string(),
            throughput_type_code: data.get_string("throughput_type"),
            idle_timeout: data.get_i64("idle_timeout"),
            subnet_no_list,
        };
        let change = ctx.state_change(
            PENDING_CREATE,
            RUNNING,
            data.timeout(Operation::Create, DEFAULT_TIMEOUT),
        );

        let (lb_no, _) = mutate_and_wait(
            async {
                let lb = ctx
                    .client
                    .create_load_balancer(ctx.backend.load_balancer_service(), &request)
                    .await?;
                tracing::info!(
                    load_balancer_no = %lb.load_balancer_instance_no,
                    vpc_no = %request.vpc_no,
                    "load balancer created"
                );
                Ok::<_, ProviderError>(lb.load_balancer_instance_no)
            },
            &change,
            |id| probe_load_balancer(ctx, id),
        )
        .await?;

        data.set_id(lb_no);
        self.read(ctx, data).await
    }

    async fn read(
        &self,
        ctx: &ProviderContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let lb_no = data.require_id()?.to_string();
        let lb = ctx
            .client
            .get_load_balancer(ctx.backend.load_balancer_service(), &lb_no)
            .await?;
        match lb {
            Some(lb) => flatten(&lb, data),
            None => {
                tracing::warn!(load_balancer_no = %lb_no, "load balancer not found, removing from state");
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
        let lb_no = data.require_id()?.to_string();
        let service = ctx.backend.load_balancer_service();
        let change = ctx.state_change(
            PENDING_UPDATE,
            RUNNING,
            data.timeout(Operation::Update, DEFAULT_TIMEOUT),
        );

        if !data.changed_keys(prior, CONFIGURATION_FIELDS).is_empty() {
            ctx.client
                .change_load_balancer_configuration(
                    service,
                    &lb_no,
                    data.get_i64("idle_timeout"),
                    data.get_str("throughput_type"),
                )
                .await?;
            tracing::info!(load_balancer_no = %lb_no, "load balancer configuration changed");
            wait_for_state(&lb_no, &change, |id| probe_load_balancer(ctx, id)).await?;
        }

        if data.changed(prior, "description") {
            let description = data.get_str("description").unwrap_or_default();
            ctx.client
                .set_load_balancer_description(service, &lb_no, description)
                .await?;
            tracing::info!(load_balancer_no = %lb_no, "load balancer description changed");
            wait_for_state(&lb_no, &change, |id| probe_load_balancer(ctx, id)).await?;
        }

        self.read(ctx, data).await
    }

    async fn delete(&self, ctx: &ProviderContext, data: &ResourceData) -> Result<(), ProviderError> {
        let lb_no = data.require_id()?;
        let change = ctx.state_change(
            PENDING_DELETE,
            GONE,
            data.timeout(Operation::Delete, DEFAULT_TIMEOUT),
        );

        mutate_and_wait(
            async {
                ctx.client
                    .delete_load_balancer(ctx.backend.load_balancer_service(), lb_no)
                    .await?;
                Ok::<_, ProviderError>(lb_no.to_string())
            },
            &change,
            |id| probe_load_balancer(ctx, id),
        )
        .await?;

        tracing::info!(load_balancer_no = lb_no, "load balancer deleted");
        Ok(())
    }
}
