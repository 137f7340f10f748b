use std::time::Duration;

use ncloud_provider::{Platform, Provider, ProviderConfig, ProviderError};
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(server: &MockServer, platform: Platform) -> Provider {
    let config = ProviderConfig::new("test_access", "test_secret")
        .with_platform(platform)
        .with_api_gateway(server.uri())
        .with_poll_interval(Duration::from_millis(10));
    Provider::new(config).unwrap()
}

fn vpc(no: &str, name: &str) -> Value {
    json!({
        "vpcNo": no,
        "vpcName": name,
        "ipv4CidrBlock": "10.0.0.0/16",
        "vpcStatus": {"code": "RUN"}
    })
}

async fn mount_vpc_list(server: &MockServer, vpcs: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path("/vpc/v2/getVpcList"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "getVpcListResponse": {"returnCode": "0", "vpcList": vpcs}
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_regions_filter() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/server/v2/getRegionList"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "getRegionListResponse": {
                "returnCode": "0",
                "regionList": [
                    {"regionNo": "1", "regionCode": "KR", "regionName": "Korea"},
                    {"regionNo": "2", "regionCode": "USWN", "regionName": "US-West"},
                    {"regionNo": "3", "regionCode": "JPN", "regionName": "Japan"}
                ]
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let data = provider(&mock_server, Platform::Classic)
        .read_data_source(
            "ncloud_regions",
            json!({"filter": [{"name": "region_code", "values": ["^(KR|JPN)$"], "regex": true}]}),
        )
        .await
        .unwrap();

    assert_eq!(data.id(), Some("KR,JPN"));
    let regions = data.get_blocks("regions");
    assert_eq!(regions.len(), 2);
    assert_eq!(regions[1]["region_name"], "Japan");
}

#[tokio::test]
async fn test_vpc_lookup_by_exact_name() {
    let mock_server = MockServer::start().await;
    mount_vpc_list(
        &mock_server,
        vec![vpc("3201", "web"), vpc("3202", "web-staging")],
    )
    .await;

    let data = provider(&mock_server, Platform::Vpc)
        .read_data_source("ncloud_vpc", json!({"name": "web"}))
        .await
        .unwrap();

    assert_eq!(data.id(), Some("3201"));
    assert_eq!(data.get_str("status"), Some("RUN"));
}

#[tokio::test]
async fn test_vpc_lookup_by_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/vpc/v2/getVpcList"))
        .and(query_param("vpcNoList.1", "3202"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "getVpcListResponse": {"returnCode": "0", "vpcList": [vpc("3202", "api")]}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let data = provider(&mock_server, Platform::Vpc)
        .read_data_source("ncloud_vpc", json!({"id": "3202"}))
        .await
        .unwrap();
    assert_eq!(data.get_str("name"), Some("api"));
}

#[tokio::test]
async fn test_vpc_lookup_ambiguous() {
    let mock_server = MockServer::start().await;
    mount_vpc_list(&mock_server, vec![vpc("3201", "web"), vpc("3202", "web")]).await;

    let err = provider(&mock_server, Platform::Vpc)
        .read_data_source("ncloud_vpc", json!({"name": "web"}))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Ambiguous { count: 2, .. }));
}

#[tokio::test]
async fn test_vpc_lookup_not_found() {
    let mock_server = MockServer::start().await;
    mount_vpc_list(&mock_server, vec![vpc("3202", "web-staging")]).await;

    let err = provider(&mock_server, Platform::Vpc)
        .read_data_source("ncloud_vpc", json!({"name": "web"}))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::NotFound { .. }));
}

#[tokio::test]
async fn test_subnets_by_vpc() {
    let mock_server = MockServer::start().await;
    let subnet = |no: &str, kind: &str| {
        json!({
            "subnetNo": no,
            "vpcNo": "3201",
            "zoneCode": "KR-1",
            "subnetName": format!("subnet-{}", no),
            "subnet": "10.0.1.0/24",
            "subnetStatus": {"code": "RUN"},
            "subnetType": {"code": kind},
            "usageType": {"code": "GEN"},
            "networkAclNo": "71"
        })
    };

    Mock::given(method("GET"))
        .and(path("/vpc/v2/getSubnetList"))
        .and(query_param("vpcNo", "3201"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "getSubnetListResponse": {
                "returnCode": "0",
                "subnetList": [subnet("11", "PUBLIC"), subnet("12", "PRIVATE"), subnet("13", "PUBLIC")]
            }
        })))
        .mount(&mock_server)
        .await;

    let data = provider(&mock_server, Platform::Vpc)
        .read_data_source(
            "ncloud_subnets",
            json!({
                "vpc_no": "3201",
                "filter": [{"name": "subnet_type", "values": ["PUBLIC"]}]
            }),
        )
        .await
        .unwrap();

    assert_eq!(data.id(), Some("11,13"));
    assert_eq!(data.get_string_list("ids"), vec!["11", "13"]);
}

#[tokio::test]
async fn test_subnets_without_matches_keep_an_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/vpc/v2/getSubnetList"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "getSubnetListResponse": {"returnCode": "0", "subnetList": []}
        })))
        .mount(&mock_server)
        .await;

    let data = provider(&mock_server, Platform::Vpc)
        .read_data_source("ncloud_subnets", json!({"vpc_no": "3201"}))
        .await
        .unwrap();

    assert_eq!(data.id(), Some("none"));
    assert!(data.get_string_list("ids").is_empty());
}

#[tokio::test]
async fn test_subnets_not_available_on_classic() {
    let mock_server = MockServer::start().await;

    let err = provider(&mock_server, Platform::Classic)
        .read_data_source("ncloud_subnets", json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::NotSupportClassic { .. }));
}
