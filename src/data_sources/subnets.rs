use async_trait::async_trait;
use serde_json::{Map, Value, json};

use crate::api::SubnetFilter;
use crate::api::types::Subnet;
use crate::error::ProviderError;
use crate::resource::{DataSource, ProviderContext};
use crate::terraform::filter::{apply_filters, filter_field, list_id};
use crate::terraform::schema::{Field, FieldType, Schema, Validator};
use crate::terraform::state::ResourceData;

pub struct SubnetsDataSource;

fn subnet_item(subnet: &Subnet) -> Map<String, Value> {
    let item = json!({
        "subnet_no": subnet.subnet_no,
        "vpc_no": subnet.vpc_no,
        "subnet": subnet.subnet,
        "zone": subnet.zone_code,
        "name": subnet.subnet_name,
        "subnet_type": subnet.subnet_type.code,
        "usage_type": subnet.usage_type.code,
        "network_acl_no": subnet.network_acl_no,
    });
    match item {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[async_trait]
impl DataSource for SubnetsDataSource {
    fn type_name(&self) -> &'static str {
        "ncloud_subnets"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            Field::optional("vpc_no", FieldType::String),
            Field::optional("subnet_type", FieldType::String)
                .validate(Validator::OneOf(&["PUBLIC", "PRIVATE"])),
            Field::optional("zone", FieldType::String),
            filter_field(),
            Field::computed("ids", FieldType::list_of(FieldType::String)),
        ])
    }

    async fn read(
        &self,
        ctx: &ProviderContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let filter = SubnetFilter {
            vpc_no: data.get_string("vpc_no"),
            subnet_type_code: data.get_string("subnet_type"),
            zone_code: data.get_string("zone"),
        };
        let subnets = ctx.client.list_subnets(&filter).await?;
        let items = subnets.iter().map(subnet_item).collect();
        let kept = apply_filters(items, &data.get_blocks("filter"))?;

        let ids: Vec<String> = kept
            .iter()
            .filter_map(|item| item.get("subnet_no").and_then(|v| v.as_str()))
            .map(|s| s.to_string())
            .collect();
        tracing::debug!(total = subnets.len(), kept = ids.len(), "subnets listed");

        data.set_id(list_id(&ids));
        data.set("ids", ids);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::CommonCode;

    fn subnet(no: &str, zone: &str) -> Subnet {
        let code = |c: &str| CommonCode {
            code: c.to_string(),
            code_name: None,
        };
        Subnet {
            subnet_no: no.to_string(),
            vpc_no: "3201".to_string(),
            zone_code: zone.to_string(),
            subnet_name: format!("subnet-{}", no),
            subnet: "10.0.1.0/24".to_string(),
            subnet_status: code("RUN"),
            subnet_type: code("PRIVATE"),
            usage_type: code("GEN"),
            network_acl_no: "77".to_string(),
        }
    }

    #[test]
    fn test_filter_on_flattened_attributes() {
        let items = vec![subnet_item(&subnet("1", "KR-1")), subnet_item(&subnet("2", "KR-2"))];
        let filters = vec![
            json!({"name": "zone", "values": ["KR-2"]})
                .as_object()
                .cloned()
                .unwrap(),
        ];
        let kept = apply_filters(items, &filters).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0]["subnet_no"], "2");
    }
}
