use async_trait::async_trait;

use crate::api::types::ConfigGroup;
use crate::error::ProviderError;
use crate::resource::{ProviderContext, Resource};
use crate::terraform::schema::{Field, FieldType, Schema, Validator};
use crate::terraform::state::ResourceData;

/// Kafka broker configuration group. Created synchronously.
pub struct CdssConfigGroupResource;

fn flatten(group: &ConfigGroup, data: &mut ResourceData) {
    data.set_id(group.config_group_no.clone());
    data.set("config_group_no", group.config_group_no.clone());
    data.set("name", group.config_group_name.clone());
    data.set("kafka_version_code", group.kafka_version_code.clone());
    data.set_opt(
        "description",
        group.description.clone().filter(|d| !d.is_empty()),
    );
}

#[async_trait]
impl Resource for CdssConfigGroupResource {
    fn type_name(&self) -> &'static str {
        "ncloud_cdss_config_group"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            Field::required("name", FieldType::String)
                .force_new()
                .validate(Validator::Length { min: 3, max: 15 })
                .validate(Validator::regex(
                    r"^[a-z][a-z0-9-]*[a-z0-9]$",
                    "must start with a lowercase letter and contain only lowercase letters, digits and hyphens",
                )),
            Field::required("kafka_version_code", FieldType::String).force_new(),
            Field::optional("description", FieldType::String)
                .validate(Validator::Length { min: 0, max: 255 }),
            Field::computed("config_group_no", FieldType::String),
        ])
    }

    async fn create(
        &self,
        ctx: &ProviderContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let name = data.require_str("name")?.to_string();
        let kafka_version_code = data.require_str("kafka_version_code")?.to_string();
        let config_group_no = ctx
            .client
            .create_config_group(&name, &kafka_version_code, data.get_str("description"))
            .await?;
        tracing::info!(config_group_no = %config_group_no, name = %name, "config group created");

        data.set_id(config_group_no);
        self.read(ctx, data).await
    }

    async fn read(
        &self,
        ctx: &ProviderContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let config_group_no = data.require_id()?.to_string();
        let kafka_version_code = data.require_str("kafka_version_code")?.to_string();
        let group = ctx
            .client
            .get_config_group(&config_group_no, &kafka_version_code)
            .await?;
        match group {
            Some(group) => flatten(&group, data),
            None => {
                tracing::warn!(config_group_no = %config_group_no, "config group not found, removing from state");
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
        if data.changed(prior, "description") {
            let config_group_no = data.require_id()?.to_string();
            let kafka_version_code = data.require_str("kafka_version_code")?.to_string();
            let description = data.get_str("description").unwrap_or_default().to_string();
            ctx.client
                .set_config_group_description(&config_group_no, &kafka_version_code, &description)
                .await?;
            tracing::info!(config_group_no = %config_group_no, "config group description changed");
        }
        self.read(ctx, data).await
    }

    async fn delete(&self, ctx: &ProviderContext, data: &ResourceData) -> Result<(), ProviderError> {
        let config_group_no = data.require_id()?;
        ctx.client.delete_config_group(config_group_no).await?;
        tracing::info!(config_group_no, "config group deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_drops_empty_description() {
        let group = ConfigGroup {
            config_group_no: "12".to_string(),
            config_group_name: "kafka-conf".to_string(),
            kafka_version_code: "2403000".to_string(),
            description: Some(String::new()),
        };
        let mut data = ResourceData::new();
        flatten(&group, &mut data);

        assert_eq!(data.id(), Some("12"));
        assert_eq!(data.get_str("kafka_version_code"), Some("2403000"));
        assert_eq!(data.get("description"), None);
    }

    #[test]
    fn test_only_description_is_updatable() {
        let schema = CdssConfigGroupResource.schema();
        let updatable: Vec<_> = schema
            .fields
            .iter()
            .filter(|f| !f.force_new && !f.is_computed_only())
            .map(|f| f.name)
            .collect();
        assert_eq!(updatable, vec!["description"]);
    }
}
