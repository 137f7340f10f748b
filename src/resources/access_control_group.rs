use std::time::Duration;

use async_trait::async_trait;

use crate::api::types::AccessControlGroup;
use crate::error::ProviderError;
use crate::resource::{ProviderContext, Resource};
use crate::terraform::schema::{Field, FieldType, Schema, Validator, name_validators};
use crate::terraform::state::{Operation, ResourceData, Timeouts};
use crate::wait::{NOT_FOUND_STATUS, Probe, mutate_and_wait};

const PENDING_CREATE: &[&str] = &["INIT", "SET"];
const RUNNING: &[&str] = &["RUN"];
const PENDING_DELETE: &[&str] = &["RUN", "TERMTING"];
const GONE: &[&str] = &[NOT_FOUND_STATUS];

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

pub struct AccessControlGroupResource;

/// Probes an access control group. Shared with the rule resource, whose
/// changes move the group through `SET` back to `RUN`.
pub(crate) async fn probe_access_control_group(
    ctx: &ProviderContext,
    access_control_group_no: String,
) -> Result<Probe<AccessControlGroup>, ProviderError> {
    let acg = ctx
        .client
        .get_access_control_group(ctx.backend.server_service(), &access_control_group_no)
        .await?;
    Ok(Probe::from_option(acg, |g| {
        g.access_control_group_status.code.clone()
    }))
}

fn flatten(acg: &AccessControlGroup, data: &mut ResourceData) {
    data.set_id(acg.access_control_group_no.clone());
    data.set("access_control_group_no", acg.access_control_group_no.clone());
    data.set("name", acg.access_control_group_name.clone());
    data.set_opt("description", acg.access_control_group_description.clone());
    data.set("vpc_no", acg.vpc_no.clone());
    data.set("is_default", acg.is_default);
}

#[async_trait]
impl Resource for AccessControlGroupResource {
    fn type_name(&self) -> &'static str {
        "ncloud_access_control_group"
    }

    fn schema(&self) -> Schema {
        let mut name = Field::optional_computed("name", FieldType::String).force_new();
        name.validators = name_validators();

        Schema::new(vec![
            Field::required("vpc_no", FieldType::String).force_new(),
            name,
            Field::optional("description", FieldType::String)
                .force_new()
                .validate(Validator::Length { min: 0, max: 1000 }),
            Field::computed("access_control_group_no", FieldType::String),
            Field::computed("is_default", FieldType::Bool),
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
        let vpc_no = data.require_str("vpc_no")?.to_string();
        let name = data.get_string("name");
        let description = data.get_string("description");
        let change = ctx.state_change(
            PENDING_CREATE,
            RUNNING,
            data.timeout(Operation::Create, DEFAULT_TIMEOUT),
        );

        let (acg_no, _) = mutate_and_wait(
            async {
                let acg = ctx
                    .client
                    .create_access_control_group(
                        ctx.backend.server_service(),
                        &vpc_no,
                        name.as_deref(),
                        description.as_deref(),
                    )
                    .await?;
                tracing::info!(
                    access_control_group_no = %acg.access_control_group_no,
                    vpc_no = %vpc_no,
                    "access control group created"
                );
                Ok::<_, ProviderError>(acg.access_control_group_no)
            },
            &change,
            |id| probe_access_control_group(ctx, id),
        )
        .await?;

        data.set_id(acg_no);
        self.read(ctx, data).await
    }

    async fn read(
        &self,
        ctx: &ProviderContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let acg_no = data.require_id()?.to_string();
        let acg = ctx
            .client
            .get_access_control_group(ctx.backend.server_service(), &acg_no)
            .await?;
        match acg {
            Some(acg) => flatten(&acg, data),
            None => {
                tracing::warn!(access_control_group_no = %acg_no, "access control group not found, removing from state");
                data.clear_id();
            }
        }
        Ok(())
    }

    async fn delete(&self, ctx: &ProviderContext, data: &ResourceData) -> Result<(), ProviderError> {
        let acg_no = data.require_id()?;
        let vpc_no = data.require_str("vpc_no")?;
        let change = ctx.state_change(
            PENDING_DELETE,
            GONE,
            data.timeout(Operation::Delete, DEFAULT_TIMEOUT),
        );

        mutate_and_wait(
            async {
                ctx.client
                    .delete_access_control_group(ctx.backend.server_service(), vpc_no, acg_no)
                    .await?;
                Ok::<_, ProviderError>(acg_no.to_string())
            },
            &change,
            |id| probe_access_control_group(ctx, id),
        )
        .await?;

        tracing::info!(access_control_group_no = acg_no, "access control group deleted");
        Ok(())
    }
}
