use reqwest::Method;
use serde::Serialize;

use super::client::ApiClient;
use super::types::{CdssCluster, ConfigGroup, CreatedCdssCluster, CreatedConfigGroup};
use super::ApiError;

pub const CDSS_SERVICE: &str = "/cdss/v1";

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCdssClusterRequest {
    pub cluster_name: String,
    pub kafka_version_code: String,
    pub config_group_no: String,
    pub vpc_no: String,
    pub os_image: String,
    pub cmak_info: CmakInfo,
    pub manager_node_info: NodeInfo,
    pub broker_node_info: NodeInfo,
}

#[derive(Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CmakInfo {
    pub user_id: String,
    pub user_password: String,
}

impl std::fmt::Debug for CmakInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CmakInfo")
            .field("user_id", &self.user_id)
            .field("user_password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    pub node_product_code: String,
    pub subnet_no: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_size: Option<i64>,
}

fn encode_body<T: Serialize>(action: &str, value: &T) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::InvalidRequest(format!("{}: {}", action, e)))
}

fn missing_result(action: &str) -> ApiError {
    ApiError::Decode {
        action: action.to_string(),
        message: "missing result".to_string(),
    }
}

impl ApiClient {
    pub async fn create_cdss_cluster(
        &self,
        request: &CreateCdssClusterRequest,
    ) -> Result<String, ApiError> {
        let body = encode_body("createCDSSCluster", request)?;
        let path = format!("{}/cluster/createCDSSCluster", CDSS_SERVICE);
        let created: CreatedCdssCluster = self
            .cdss(Method::POST, &path, Some(&body))
            .await?
            .ok_or_else(|| missing_result("createCDSSCluster"))?;
        Ok(created.service_group_instance_no)
    }

    pub async fn get_cdss_cluster(
        &self,
        service_group_instance_no: &str,
    ) -> Result<Option<CdssCluster>, ApiError> {
        let path = format!(
            "{}/cluster/getClusterInfo/{}",
            CDSS_SERVICE, service_group_instance_no
        );
        match self.cdss(Method::GET, &path, None).await {
            Ok(cluster) => Ok(cluster),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn delete_cdss_cluster(&self, service_group_instance_no: &str) -> Result<(), ApiError> {
        let path = format!(
            "{}/cluster/deleteCDSSCluster/{}",
            CDSS_SERVICE, service_group_instance_no
        );
        self.cdss::<serde_json::Value>(Method::DELETE, &path, None)
            .await?;
        Ok(())
    }

    pub async fn create_config_group(
        &self,
        name: &str,
        kafka_version_code: &str,
        description: Option<&str>,
    ) -> Result<String, ApiError> {
        let body = serde_json::json!({
            "configGroupName": name,
            "kafkaVersionCode": kafka_version_code,
            "description": description.unwrap_or_default(),
        });
        let path = format!("{}/configGroup/createConfigGroup", CDSS_SERVICE);
        let created: CreatedConfigGroup = self
            .cdss(Method::POST, &path, Some(&body))
            .await?
            .ok_or_else(|| missing_result("createConfigGroup"))?;
        Ok(created.config_group_no)
    }

    /// Config groups are addressed by their number together with the Kafka
    /// version they were created for.
    pub async fn get_config_group(
        &self,
        config_group_no: &str,
        kafka_version_code: &str,
    ) -> Result<Option<ConfigGroup>, ApiError> {
        let path = format!(
            "{}/configGroup/getKafkaConfigGroup/{}/{}",
            CDSS_SERVICE, config_group_no, kafka_version_code
        );
        match self.cdss(Method::GET, &path, None).await {
            Ok(group) => Ok(group),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn set_config_group_description(
        &self,
        config_group_no: &str,
        kafka_version_code: &str,
        description: &str,
    ) -> Result<(), ApiError> {
        let body = serde_json::json!({
            "kafkaVersionCode": kafka_version_code,
            "description": description,
        });
        let path = format!(
            "{}/configGroup/setConfigGroupDescription/{}",
            CDSS_SERVICE, config_group_no
        );
        self.cdss::<serde_json::Value>(Method::POST, &path, Some(&body))
            .await?;
        Ok(())
    }

    pub async fn delete_config_group(&self, config_group_no: &str) -> Result<(), ApiError> {
        let path = format!("{}/configGroup/deleteConfigGroup/{}", CDSS_SERVICE, config_group_no);
        self.cdss::<serde_json::Value>(Method::DELETE, &path, None)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_cluster_request_wire_names() {
        let request = CreateCdssClusterRequest {
            cluster_name: "kafka".to_string(),
            kafka_version_code: "2403000".to_string(),
            config_group_no: "12".to_string(),
            vpc_no: "1".to_string(),
            os_image: "SW.VCDSS.OS.LNX64.CNTOS.0708.B050".to_string(),
            cmak_info: CmakInfo {
                user_id: "admin".to_string(),
                user_password: "pw".to_string(),
            },
            manager_node_info: NodeInfo {
                node_product_code: "SVR.VCDSS.STAND.C002.M008.NET.SSD.B050.G002".to_string(),
                subnet_no: "10".to_string(),
                ..Default::default()
            },
            broker_node_info: NodeInfo {
                node_product_code: "SVR.VCDSS.STAND.C002.M008.NET.SSD.B050.G002".to_string(),
                subnet_no: "11".to_string(),
                node_count: Some(3),
                storage_size: Some(100),
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["clusterName"], "kafka");
        assert_eq!(json["cmakInfo"]["userId"], "admin");
        assert_eq!(json["brokerNodeInfo"]["nodeCount"], 3);
        assert!(json["managerNodeInfo"].get("nodeCount").is_none());
    }

    #[test]
    fn test_cmak_debug_redacts_password() {
        let info = CmakInfo {
            user_id: "admin".to_string(),
            user_password: "hunter2_secret".to_string(),
        };
        let debug_output = format!("{:?}", info);
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("hunter2_secret"));
    }
}
