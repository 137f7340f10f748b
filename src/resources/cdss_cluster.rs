use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use crate::api::types::{CdssCluster, CdssNode};
use crate::api::{CmakInfo, CreateCdssClusterRequest, NodeInfo};
use crate::error::ProviderError;
use crate::resource::{ProviderContext, Resource};
use crate::terraform::schema::{Field, FieldType, Schema, Validator};
use crate::terraform::state::{Operation, ResourceData, Timeouts};
use crate::wait::{NOT_FOUND_STATUS, Probe, mutate_and_wait};

const PENDING_CREATE: &[&str] = &["CREATING", "SETTING"];
const RUNNING: &[&str] = &["RUNNING"];
const FAILED: &[&str] = &["ERROR"];
const PENDING_DELETE: &[&str] = &["DELETING", "RUNNING"];
const GONE: &[&str] = &[NOT_FOUND_STATUS];

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Managed Kafka cluster of one manager node and a set of broker nodes.
pub struct CdssClusterResource;

async fn probe_cluster(
    ctx: &ProviderContext,
    service_group_instance_no: String,
) -> Result<Probe<CdssCluster>, ProviderError> {
    let cluster = ctx
        .client
        .get_cdss_cluster(&service_group_instance_no)
        .await?;
    Ok(Probe::from_option(cluster, |c| {
        c.cluster_status.to_ascii_uppercase()
    }))
}

fn node_schema(with_brokers: bool) -> Schema {
    let mut fields = vec![
        Field::required("node_product_code", FieldType::String),
        Field::required("subnet_no", FieldType::String),
    ];
    if with_brokers {
        fields.push(
            Field::required("node_count", FieldType::Int)
                .validate(Validator::Range { min: 3, max: 10 }),
        );
        fields.push(
            Field::required("storage_size", FieldType::Int)
                .validate(Validator::Range { min: 100, max: 2000 })
                .describe("Broker storage in GB"),
        );
    }
    Schema::new(fields)
}

fn single_block(data: &ResourceData, key: &str) -> Result<Map<String, Value>, ProviderError> {
    data.get_blocks(key)
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::MissingAttribute(key.to_string()))
}

fn block_str(block: &Map<String, Value>, parent: &str, key: &str) -> Result<String, ProviderError> {
    block
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .ok_or_else(|| ProviderError::MissingAttribute(format!("{}.{}", parent, key)))
}

fn node_info(block: &Map<String, Value>, parent: &str) -> Result<NodeInfo, ProviderError> {
    Ok(NodeInfo {
        node_product_code: block_str(block, parent, "node_product_code")?,
        subnet_no: block_str(block, parent, "subnet_no")?,
        node_count: block.get("node_count").and_then(|v| v.as_i64()),
        storage_size: block.get("storage_size").and_then(|v| v.as_i64()),
    })
}

fn build_request(data: &ResourceData) -> Result<CreateCdssClusterRequest, ProviderError> {
    let cmak = single_block(data, "cmak")?;
    Ok(CreateCdssClusterRequest {
        cluster_name: data.require_str("name")?.to_string(),
        kafka_version_code: data.require_str("kafka_version_code")?.to_string(),
        config_group_no: data.require_str("config_group_no")?.to_string(),
        vpc_no: data.require_str("vpc_no")?.to_string(),
        os_image: data.require_str("os_image")?.to_string(),
        cmak_info: CmakInfo {
            user_id: block_str(&cmak, "cmak", "user_name")?,
            user_password: block_str(&cmak, "cmak", "user_password")?,
        },
        manager_node_info: node_info(&single_block(data, "manager_node")?, "manager_node")?,
        broker_node_info: node_info(&single_block(data, "broker_nodes")?, "broker_nodes")?,
    })
}

fn flatten_node(node: &CdssNode, with_brokers: bool) -> Value {
    let mut block = json!({
        "node_product_code": node.node_product_code,
        "subnet_no": node.subnet_no,
    });
    if with_brokers {
        block["node_count"] = json!(node.node_count);
        block["storage_size"] = json!(node.storage_size);
    }
    Value::Array(vec![block])
}

fn flatten(cluster: &CdssCluster, data: &mut ResourceData) {
    data.set_id(cluster.service_group_instance_no.clone());
    data.set(
        "service_group_instance_no",
        cluster.service_group_instance_no.clone(),
    );
    data.set("name", cluster.cluster_name.clone());
    data.set("kafka_version_code", cluster.kafka_version_code.clone());
    data.set("config_group_no", cluster.config_group_no.clone());
    data.set("vpc_no", cluster.vpc_no.clone());
    data.set("os_image", cluster.os_image_code.clone());
    data.set("manager_node", flatten_node(&cluster.manager_node, false));
    data.set("broker_nodes", flatten_node(&cluster.broker_nodes, true));
}

#[async_trait]
impl Resource for CdssClusterResource {
    fn type_name(&self) -> &'static str {
        "ncloud_cdss_cluster"
    }

    fn schema(&self) -> Schema {
        let cmak = Schema::new(vec![
            Field::required("user_name", FieldType::String)
                .validate(Validator::Length { min: 3, max: 15 }),
            Field::required("user_password", FieldType::String)
                .sensitive()
                .validate(Validator::Length { min: 8, max: 20 }),
        ]);

        Schema::new(vec![
            Field::required("name", FieldType::String)
                .force_new()
                .validate(Validator::Length { min: 3, max: 15 }),
            Field::required("kafka_version_code", FieldType::String).force_new(),
            Field::required("config_group_no", FieldType::String).force_new(),
            Field::required("vpc_no", FieldType::String).force_new(),
            Field::required("os_image", FieldType::String).force_new(),
            Field::required("cmak", FieldType::list_of(FieldType::Block(cmak)))
                .force_new()
                .max_items(1)
                .describe("Credentials of the cluster manager web UI"),
            Field::required(
                "manager_node",
                FieldType::list_of(FieldType::Block(node_schema(false))),
            )
            .force_new()
            .max_items(1),
            Field::required(
                "broker_nodes",
                FieldType::list_of(FieldType::Block(node_schema(true))),
            )
            .force_new()
            .max_items(1),
            Field::computed("service_group_instance_no", FieldType::String),
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
        let request = build_request(data)?;
        let change = ctx
            .state_change(
                PENDING_CREATE,
                RUNNING,
                data.timeout(Operation::Create, DEFAULT_TIMEOUT),
            )
            .with_errors(FAILED);

        let (instance_no, _) = mutate_and_wait(
            async {
                let instance_no = ctx.client.create_cdss_cluster(&request).await?;
                tracing::info!(
                    service_group_instance_no = %instance_no,
                    cluster_name = %request.cluster_name,
                    "kafka cluster created"
                );
                Ok::<_, ProviderError>(instance_no)
            },
            &change,
            |id| probe_cluster(ctx, id),
        )
        .await?;

        data.set_id(instance_no);
        self.read(ctx, data).await
    }

    async fn read(
        &self,
        ctx: &ProviderContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let instance_no = data.require_id()?.to_string();
        match ctx.client.get_cdss_cluster(&instance_no).await? {
            Some(cluster) => flatten(&cluster, data),
            None => {
                tracing::warn!(service_group_instance_no = %instance_no, "kafka cluster not found, removing from state");
                data.clear_id();
            }
        }
        Ok(())
    }

    async fn delete(&self, ctx: &ProviderContext, data: &ResourceData) -> Result<(), ProviderError> {
        let instance_no = data.require_id()?;
        let change = ctx
            .state_change(
                PENDING_DELETE,
                GONE,
                data.timeout(Operation::Delete, DEFAULT_TIMEOUT),
            )
            .with_errors(FAILED);

        mutate_and_wait(
            async {
                ctx.client.delete_cdss_cluster(instance_no).await?;
                Ok::<_, ProviderError>(instance_no.to_string())
            },
            &change,
            |id| probe_cluster(ctx, id),
        )
        .await?;

        tracing::info!(service_group_instance_no = instance_no, "kafka cluster deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Value {
        json!({
            "name": "kafka",
            "kafka_version_code": "2403000",
            "config_group_no": "12",
            "vpc_no": "3201",
            "os_image": "SW.VCDSS.OS.LNX64.CNTOS.0708.B050",
            "cmak": [{"user_name": "admin", "user_password": "Secret123!"}],
            "manager_node": [{"node_product_code": "SVR.M", "subnet_no": "4401"}],
            "broker_nodes": [{
                "node_product_code": "SVR.B",
                "subnet_no": "4402",
                "node_count": 3,
                "storage_size": 100
            }]
        })
    }

    #[test]
    fn test_schema_accepts_full_config() {
        let config = config();
        assert!(
            CdssClusterResource
                .schema()
                .validate(config.as_object().unwrap())
                .is_ok()
        );
    }

    #[test]
    fn test_schema_rejects_small_broker_count() {
        let mut config = config();
        config["broker_nodes"][0]["node_count"] = json!(1);
        let err = CdssClusterResource
            .schema()
            .validate(config.as_object().unwrap())
            .unwrap_err();
        assert_eq!(err.errors()[0].path, "broker_nodes.0.node_count");
    }

    #[test]
    fn test_build_request_from_blocks() {
        let data = ResourceData::from_value(config()).unwrap();
        let request = build_request(&data).unwrap();

        assert_eq!(request.cluster_name, "kafka");
        assert_eq!(request.cmak_info.user_id, "admin");
        assert_eq!(request.manager_node_info.node_count, None);
        assert_eq!(request.broker_node_info.node_count, Some(3));
        assert_eq!(request.broker_node_info.subnet_no, "4402");
    }

    #[test]
    fn test_build_request_missing_block() {
        let mut config = config();
        config["manager_node"] = json!([]);
        let data = ResourceData::from_value(config).unwrap();
        assert!(matches!(
            build_request(&data),
            Err(ProviderError::MissingAttribute(attr)) if attr == "manager_node"
        ));
    }

    #[test]
    fn test_flatten_round_trip() {
        let cluster: CdssCluster = serde_json::from_value(json!({
            "serviceGroupInstanceNo": "8801",
            "clusterName": "kafka",
            "kafkaVersionCode": "2403000",
            "configGroupNo": "12",
            "vpcNo": "3201",
            "osImageCode": "SW.VCDSS.OS.LNX64.CNTOS.0708.B050",
            "clusterStatus": "running",
            "managerNode": {"nodeProductCode": "SVR.M", "subnetNo": "4401"},
            "brokerNodes": {
                "nodeProductCode": "SVR.B",
                "subnetNo": "4402",
                "nodeCount": 3,
                "storageSize": 100
            }
        }))
        .unwrap();
        let mut data = ResourceData::from_value(config()).unwrap();
        flatten(&cluster, &mut data);

        assert_eq!(data.id(), Some("8801"));
        let brokers = data.get_blocks("broker_nodes");
        assert_eq!(brokers[0]["node_count"], 3);
        assert!(data.get_blocks("manager_node")[0].get("node_count").is_none());
        assert_eq!(data.get_blocks("cmak")[0]["user_name"], "admin");
    }
}
