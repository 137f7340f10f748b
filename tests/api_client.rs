use ncloud_provider::api::{
    ACCESS_KEY_HEADER, ApiClient, ApiError, Params, SIGNATURE_HEADER, TIMESTAMP_HEADER,
};
use ncloud_provider::api::types::Vpc;
use reqwest::Method;
use wiremock::matchers::{header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> ApiClient {
    ApiClient::with_base_url(
        "test_access".to_string(),
        "test_secret".to_string(),
        "KR".to_string(),
        server.uri(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_call_signs_request_and_unwraps_envelope() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/vpc/v2/getVpcList"))
        .and(query_param("regionCode", "KR"))
        .and(query_param("responseFormatType", "json"))
        .and(header(ACCESS_KEY_HEADER, "test_access"))
        .and(header_exists(TIMESTAMP_HEADER))
        .and(header_exists(SIGNATURE_HEADER))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "getVpcListResponse": {
                "requestId": "req-1",
                "returnCode": "0",
                "returnMessage": "success",
                "totalRows": 1,
                "vpcList": [{
                    "vpcNo": "3201",
                    "vpcName": "test-vpc",
                    "ipv4CidrBlock": "10.0.0.0/16",
                    "vpcStatus": {"code": "RUN", "codeName": "run"},
                    "regionCode": "KR"
                }]
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let vpcs: Vec<Vpc> = client(&mock_server)
        .call_list(Method::GET, "/vpc/v2", "getVpcList", Params::new(), "vpcList")
        .await
        .unwrap();

    assert_eq!(vpcs.len(), 1);
    assert_eq!(vpcs[0].vpc_no, "3201");
    assert_eq!(vpcs[0].vpc_status.code, "RUN");
}

#[tokio::test]
async fn test_explicit_region_is_not_overridden() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/vserver/v2/getRegionList"))
        .and(query_param("regionCode", "JPN"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "getRegionListResponse": {"returnCode": "0", "regionList": []}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let inner = client(&mock_server)
        .call(
            Method::GET,
            "/vserver/v2",
            "getRegionList",
            Params::new().with("regionCode", "JPN"),
        )
        .await
        .unwrap();
    assert_eq!(inner["returnCode"], "0");
}

#[tokio::test]
async fn test_error_body_carries_return_code() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/vpc/v2/createVpc"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "responseError": {
                "returnCode": "1000036",
                "returnMessage": "The VPC name is already in use."
            }
        })))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .create_vpc(Some("test-vpc"), "10.0.0.0/16")
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Api { status: 400, .. }));
    assert_eq!(err.return_code(), Some("1000036".to_string()));
}

#[tokio::test]
async fn test_non_zero_return_code_in_success_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/vpc/v2/deleteVpc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "deleteVpcResponse": {"returnCode": "1007000", "returnMessage": "in use"}
        })))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).delete_vpc("3201").await.unwrap_err();
    assert_eq!(err.return_code(), Some("1007000".to_string()));
}

#[tokio::test]
async fn test_unauthorized_maps_to_auth_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/vpc/v2/getVpcDetail"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": {"errorCode": "200", "message": "Authentication Failed"}
        })))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).get_vpc("3201").await.unwrap_err();
    match err {
        ApiError::Auth { message } => assert_eq!(message, "Authentication Failed"),
        other => panic!("Expected Auth error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_detail_is_none() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/vpc/v2/getVpcDetail"))
        .and(query_param("vpcNo", "404"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "getVpcDetailResponse": {"returnCode": "0", "totalRows": 0, "vpcList": []}
        })))
        .mount(&mock_server)
        .await;

    let vpc = client(&mock_server).get_vpc("404").await.unwrap();
    assert!(vpc.is_none());
}

#[tokio::test]
async fn test_cdss_envelope() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cdss/v1/cluster/getClusterInfo/812"))
        .and(header_exists(SIGNATURE_HEADER))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 0,
            "message": "SUCCESS",
            "result": {"clusterName": "events"}
        })))
        .mount(&mock_server)
        .await;

    let result: Option<serde_json::Value> = client(&mock_server)
        .cdss(Method::GET, "/cdss/v1/cluster/getClusterInfo/812", None)
        .await
        .unwrap();
    assert_eq!(result.unwrap()["clusterName"], "events");
}
