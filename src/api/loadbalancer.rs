use reqwest::Method;

use super::client::{ApiClient, Params};
use super::types::LoadBalancer;
use super::ApiError;

const LIST_KEY: &str = "loadBalancerInstanceList";

#[derive(Debug, Clone, Default)]
pub struct CreateLoadBalancerRequest {
    pub vpc_no: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub network_type_code: String,
    pub type_code: String,
    pub throughput_type_code: Option<String>,
    pub idle_timeout: Option<i64>,
    pub subnet_no_list: Vec<String>,
}

impl ApiClient {
    pub async fn create_load_balancer(
        &self,
        service: &str,
        request: &CreateLoadBalancerRequest,
    ) -> Result<LoadBalancer, ApiError> {
        let params = Params::new()
            .with("vpcNo", request.vpc_no.clone())
            .with_opt("loadBalancerName", request.name.clone())
            .with_opt("loadBalancerDescription", request.description.clone())
            .with("loadBalancerNetworkTypeCode", request.network_type_code.clone())
            .with("loadBalancerTypeCode", request.type_code.clone())
            .with_opt("throughputTypeCode", request.throughput_type_code.clone())
            .with_opt("idleTimeout", request.idle_timeout.map(|t| t.to_string()))
            .with_list("subnetNoList", request.subnet_no_list.iter().cloned());
        let list: Vec<LoadBalancer> = self
            .call_list(
                Method::POST,
                service,
                "createLoadBalancerInstance",
                params,
                LIST_KEY,
            )
            .await?;
        list.into_iter().next().ok_or_else(|| ApiError::Decode {
            action: "createLoadBalancerInstance".to_string(),
            message: format!("empty {}", LIST_KEY),
        })
    }

    pub async fn get_load_balancer(
        &self,
        service: &str,
        load_balancer_no: &str,
    ) -> Result<Option<LoadBalancer>, ApiError> {
        let params = Params::new().with("loadBalancerInstanceNo", load_balancer_no);
        match self
            .call_list::<LoadBalancer>(
                Method::GET,
                service,
                "getLoadBalancerInstanceDetail",
                params,
                LIST_KEY,
            )
            .await
        {
            Ok(list) => Ok(list.into_iter().next()),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn change_load_balancer_configuration(
        &self,
        service: &str,
        load_balancer_no: &str,
        idle_timeout: Option<i64>,
        throughput_type_code: Option<&str>,
    ) -> Result<(), ApiError> {
        let params = Params::new()
            .with("loadBalancerInstanceNo", load_balancer_no)
            .with_opt("idleTimeout", idle_timeout.map(|t| t.to_string()))
            .with_opt("throughputTypeCode", throughput_type_code);
        self.call(
            Method::POST,
            service,
            "changeLoadBalancerInstanceConfiguration",
            params,
        )
        .await?;
        Ok(())
    }

    pub async fn set_load_balancer_description(
        &self,
        service: &str,
        load_balancer_no: &str,
        description: &str,
    ) -> Result<(), ApiError> {
        let params = Params::new()
            .with("loadBalancerInstanceNo", load_balancer_no)
            .with("loadBalancerDescription", description);
        self.call(Method::POST, service, "setLoadBalancerDescription", params)
            .await?;
        Ok(())
    }

    pub async fn delete_load_balancer(
        &self,
        service: &str,
        load_balancer_no: &str,
    ) -> Result<(), ApiError> {
        let params = Params::new().with_list("loadBalancerInstanceNoList", [load_balancer_no]);
        self.call(Method::POST, service, "deleteLoadBalancerInstances", params)
            .await?;
        Ok(())
    }
}
