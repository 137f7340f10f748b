use serde::Deserialize;

/// Return code of a successful RPC-style call.
pub const SUCCESS_RETURN_CODE: &str = "0";

/// Enumerated value as the platform sends it: `{"code": "RUN", "codeName": "run"}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonCode {
    pub code: String,
    #[serde(default)]
    pub code_name: Option<String>,
}

impl CommonCode {
    pub fn as_str(&self) -> &str {
        &self.code
    }
}

/// Header fields every RPC-style `<action>Response` object carries.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcEnvelope {
    #[serde(default)]
    pub request_id: Option<String>,
    pub return_code: String,
    #[serde(default)]
    pub return_message: Option<String>,
    #[serde(default)]
    pub total_rows: Option<u64>,
}

/// Envelope of the data streaming (Kafka) service.
#[derive(Debug, Deserialize)]
pub struct CdssResponse<T> {
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    pub result: Option<T>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub region_code: String,
    #[serde(default)]
    pub region_name: Option<String>,
    #[serde(default)]
    pub region_no: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vpc {
    pub vpc_no: String,
    pub vpc_name: String,
    pub ipv4_cidr_block: String,
    pub vpc_status: CommonCode,
    #[serde(default)]
    pub region_code: Option<String>,
    #[serde(default)]
    pub create_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkAcl {
    pub network_acl_no: String,
    #[serde(default)]
    pub network_acl_name: Option<String>,
    pub vpc_no: String,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subnet {
    pub subnet_no: String,
    pub vpc_no: String,
    pub zone_code: String,
    pub subnet_name: String,
    pub subnet: String,
    pub subnet_status: CommonCode,
    pub subnet_type: CommonCode,
    pub usage_type: CommonCode,
    pub network_acl_no: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessControlGroup {
    pub access_control_group_no: String,
    pub access_control_group_name: String,
    pub access_control_group_status: CommonCode,
    #[serde(default)]
    pub access_control_group_description: Option<String>,
    pub vpc_no: String,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessControlGroupRule {
    pub access_control_group_no: String,
    pub protocol_type: CommonCode,
    #[serde(default)]
    pub ip_block: Option<String>,
    #[serde(default)]
    pub access_control_group_sequence: Option<String>,
    #[serde(default)]
    pub port_range: Option<String>,
    pub access_control_group_rule_type: CommonCode,
    #[serde(default)]
    pub access_control_group_rule_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginKey {
    pub key_name: String,
    pub fingerprint: String,
    #[serde(default)]
    pub create_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancer {
    pub load_balancer_instance_no: String,
    pub load_balancer_name: String,
    #[serde(default)]
    pub load_balancer_description: Option<String>,
    #[serde(default)]
    pub load_balancer_domain: Option<String>,
    #[serde(default)]
    pub load_balancer_ip_list: Vec<String>,
    pub load_balancer_instance_status: CommonCode,
    #[serde(default)]
    pub load_balancer_instance_operation: CommonCode,
    pub load_balancer_type: CommonCode,
    pub load_balancer_network_type: CommonCode,
    pub throughput_type: CommonCode,
    pub idle_timeout: i64,
    pub vpc_no: String,
    #[serde(default)]
    pub subnet_no_list: Vec<String>,
}

impl LoadBalancer {
    /// Status used for convergence: a running balancer that is still applying
    /// an operation reports the operation code instead.
    pub fn convergence_status(&self) -> &str {
        match self.load_balancer_instance_operation.as_str() {
            "" | "NULL" => self.load_balancer_instance_status.as_str(),
            operation => operation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigGroup {
    pub config_group_no: String,
    pub config_group_name: String,
    pub kafka_version_code: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CdssCluster {
    pub service_group_instance_no: String,
    pub cluster_name: String,
    pub kafka_version_code: String,
    pub config_group_no: String,
    pub vpc_no: String,
    pub os_image_code: String,
    pub cluster_status: String,
    pub manager_node: CdssNode,
    pub broker_nodes: CdssNode,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CdssNode {
    pub node_product_code: String,
    pub subnet_no: String,
    #[serde(default)]
    pub node_count: Option<i64>,
    #[serde(default)]
    pub storage_size: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedCdssCluster {
    pub service_group_instance_no: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedConfigGroup {
    pub config_group_no: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_code_deserialization() {
        let code: CommonCode =
            serde_json::from_str(r#"{"code": "RUN", "codeName": "run"}"#).unwrap();
        assert_eq!(code.as_str(), "RUN");
        assert_eq!(code.code_name.as_deref(), Some("run"));
    }

    #[test]
    fn test_rpc_envelope_deserialization() {
        let json = r#"{
            "requestId": "d1b2",
            "returnCode": "0",
            "returnMessage": "success",
            "totalRows": 1,
            "vpcList": []
        }"#;
        let envelope: RpcEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.return_code, SUCCESS_RETURN_CODE);
        assert_eq!(envelope.total_rows, Some(1));
    }

    #[test]
    fn test_vpc_deserialization_ignores_unknown_fields() {
        let json = r#"{
            "vpcNo": "3201",
            "vpcName": "test-vpc",
            "ipv4CidrBlock": "10.0.0.0/16",
            "vpcStatus": {"code": "RUN", "codeName": "run"},
            "regionCode": "KR",
            "createDate": "2024-01-01T00:00:00+0900",
            "someFutureField": 1
        }"#;
        let vpc: Vpc = serde_json::from_str(json).unwrap();
        assert_eq!(vpc.vpc_no, "3201");
        assert_eq!(vpc.vpc_status.as_str(), "RUN");
        assert_eq!(vpc.region_code.as_deref(), Some("KR"));
    }

    #[test]
    fn test_load_balancer_convergence_status() {
        let json = r#"{
            "loadBalancerInstanceNo": "77",
            "loadBalancerName": "lb",
            "loadBalancerInstanceStatus": {"code": "RUN"},
            "loadBalancerInstanceOperation": {"code": "CHANG"},
            "loadBalancerType": {"code": "APPLICATION"},
            "loadBalancerNetworkType": {"code": "PUBLIC"},
            "throughputType": {"code": "SMALL"},
            "idleTimeout": 60,
            "vpcNo": "1"
        }"#;
        let mut lb: LoadBalancer = serde_json::from_str(json).unwrap();
        assert_eq!(lb.convergence_status(), "CHANG");

        lb.load_balancer_instance_operation.code = "NULL".to_string();
        assert_eq!(lb.convergence_status(), "RUN");
    }

    #[test]
    fn test_cdss_envelope_deserialization() {
        let json = r#"{"code": 0, "message": "SUCCESS", "result": {"configGroupNo": "12"}}"#;
        let response: CdssResponse<CreatedConfigGroup> = serde_json::from_str(json).unwrap();
        assert_eq!(response.code, 0);
        assert_eq!(response.result.unwrap().config_group_no, "12");
    }
}
