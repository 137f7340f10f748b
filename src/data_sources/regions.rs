use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::api::types::Region;
use crate::error::ProviderError;
use crate::network::{ALL_PLATFORMS, Platform};
use crate::resource::{DataSource, ProviderContext};
use crate::terraform::filter::{apply_filters, filter_field, list_id};
use crate::terraform::schema::{Field, FieldType, Schema};
use crate::terraform::state::ResourceData;

pub struct RegionsDataSource;

fn region_item(region: &Region) -> Map<String, Value> {
    let mut item = Map::new();
    item.insert(
        "region_code".to_string(),
        Value::String(region.region_code.clone()),
    );
    item.insert(
        "region_name".to_string(),
        region
            .region_name
            .clone()
            .map(Value::String)
            .unwrap_or(Value::Null),
    );
    item
}

#[async_trait]
impl DataSource for RegionsDataSource {
    fn type_name(&self) -> &'static str {
        "ncloud_regions"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            filter_field(),
            Field::computed(
                "regions",
                FieldType::list_of(FieldType::Block(Schema::new(vec![
                    Field::computed("region_code", FieldType::String),
                    Field::computed("region_name", FieldType::String),
                ]))),
            ),
        ])
    }

    fn platforms(&self) -> &'static [Platform] {
        ALL_PLATFORMS
    }

    async fn read(
        &self,
        ctx: &ProviderContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let regions = ctx
            .client
            .list_regions(ctx.backend.server_service())
            .await?;
        let items = regions.iter().map(region_item).collect();
        let kept = apply_filters(items, &data.get_blocks("filter"))?;
        tracing::debug!(total = regions.len(), kept = kept.len(), "regions listed");

        let codes: Vec<&str> = kept
            .iter()
            .filter_map(|item| item.get("region_code").and_then(|v| v.as_str()))
            .collect();
        data.set_id(list_id(&codes));
        data.set(
            "regions",
            kept.into_iter().map(Value::Object).collect::<Vec<_>>(),
        );
        Ok(())
    }
}
