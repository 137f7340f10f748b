use reqwest::Method;

use super::client::{ApiClient, Params};
use super::types::{NetworkAcl, Subnet, Vpc};
use super::ApiError;

pub const VPC_SERVICE: &str = "/vpc/v2";

#[derive(Debug, Clone, Default)]
pub struct CreateSubnetRequest {
    pub vpc_no: String,
    pub subnet_name: Option<String>,
    pub subnet: String,
    pub zone_code: String,
    pub network_acl_no: String,
    pub subnet_type_code: String,
    pub usage_type_code: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SubnetFilter {
    pub vpc_no: Option<String>,
    pub subnet_type_code: Option<String>,
    pub zone_code: Option<String>,
}

fn first_or_none<T>(list: Vec<T>) -> Option<T> {
    list.into_iter().next()
}

impl ApiClient {
    pub async fn create_vpc(
        &self,
        vpc_name: Option<&str>,
        ipv4_cidr_block: &str,
    ) -> Result<Vpc, ApiError> {
        let params = Params::new()
            .with_opt("vpcName", vpc_name)
            .with("ipv4CidrBlock", ipv4_cidr_block);
        let list: Vec<Vpc> = self
            .call_list(Method::POST, VPC_SERVICE, "createVpc", params, "vpcList")
            .await?;
        first_or_none(list).ok_or_else(|| ApiError::Decode {
            action: "createVpc".to_string(),
            message: "empty vpcList".to_string(),
        })
    }

    pub async fn get_vpc(&self, vpc_no: &str) -> Result<Option<Vpc>, ApiError> {
        let params = Params::new().with("vpcNo", vpc_no);
        match self
            .call_list(Method::GET, VPC_SERVICE, "getVpcDetail", params, "vpcList")
            .await
        {
            Ok(list) => Ok(first_or_none(list)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn list_vpcs(
        &self,
        vpc_name: Option<&str>,
        vpc_no: Option<&str>,
    ) -> Result<Vec<Vpc>, ApiError> {
        let params = Params::new()
            .with_opt("vpcName", vpc_name)
            .with_list("vpcNoList", vpc_no);
        self.call_list(Method::GET, VPC_SERVICE, "getVpcList", params, "vpcList")
            .await
    }

    pub async fn delete_vpc(&self, vpc_no: &str) -> Result<(), ApiError> {
        let params = Params::new().with("vpcNo", vpc_no);
        self.call(Method::POST, VPC_SERVICE, "deleteVpc", params)
            .await?;
        Ok(())
    }

    pub async fn list_network_acls(&self, vpc_no: &str) -> Result<Vec<NetworkAcl>, ApiError> {
        let params = Params::new().with("vpcNo", vpc_no);
        self.call_list(
            Method::GET,
            VPC_SERVICE,
            "getNetworkAclList",
            params,
            "networkAclList",
        )
        .await
    }

    pub async fn create_subnet(&self, request: &CreateSubnetRequest) -> Result<Subnet, ApiError> {
        let params = Params::new()
            .with("vpcNo", request.vpc_no.clone())
            .with_opt("subnetName", request.subnet_name.clone())
            .with("subnet", request.subnet.clone())
            .with("zoneCode", request.zone_code.clone())
            .with("networkAclNo", request.network_acl_no.clone())
            .with("subnetTypeCode", request.subnet_type_code.clone())
            .with_opt("usageTypeCode", request.usage_type_code.clone());
        let list: Vec<Subnet> = self
            .call_list(Method::POST, VPC_SERVICE, "createSubnet", params, "subnetList")
            .await?;
        first_or_none(list).ok_or_else(|| ApiError::Decode {
            action: "createSubnet".to_string(),
            message: "empty subnetList".to_string(),
        })
    }

    pub async fn get_subnet(&self, subnet_no: &str) -> Result<Option<Subnet>, ApiError> {
        let params = Params::new().with("subnetNo", subnet_no);
        match self
            .call_list(
                Method::GET,
                VPC_SERVICE,
                "getSubnetDetail",
                params,
                "subnetList",
            )
            .await
        {
            Ok(list) => Ok(first_or_none(list)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn list_subnets(&self, filter: &SubnetFilter) -> Result<Vec<Subnet>, ApiError> {
        let params = Params::new()
            .with_opt("vpcNo", filter.vpc_no.clone())
            .with_opt("subnetTypeCode", filter.subnet_type_code.clone())
            .with_opt("zoneCode", filter.zone_code.clone());
        self.call_list(Method::GET, VPC_SERVICE, "getSubnetList", params, "subnetList")
            .await
    }

    pub async fn set_subnet_network_acl(
        &self,
        vpc_no: &str,
        subnet_no: &str,
        network_acl_no: &str,
    ) -> Result<(), ApiError> {
        let params = Params::new()
            .with("vpcNo", vpc_no)
            .with("subnetNo", subnet_no)
            .with("networkAclNo", network_acl_no);
        self.call(Method::POST, VPC_SERVICE, "setSubnetNetworkAcl", params)
            .await?;
        Ok(())
    }

    pub async fn delete_subnet(&self, subnet_no: &str) -> Result<(), ApiError> {
        let params = Params::new().with("subnetNo", subnet_no);
        self.call(Method::POST, VPC_SERVICE, "deleteSubnet", params)
            .await?;
        Ok(())
    }
}
