use reqwest::Method;

use super::client::{ApiClient, Params};
use super::types::{AccessControlGroup, AccessControlGroupRule, LoginKey, Region};
use super::ApiError;

/// Direction of an access control group rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleDirection {
    Inbound,
    Outbound,
}

impl RuleDirection {
    pub fn code(self) -> &'static str {
        match self {
            RuleDirection::Inbound => "INBND",
            RuleDirection::Outbound => "OTBND",
        }
    }

    fn add_action(self) -> &'static str {
        match self {
            RuleDirection::Inbound => "addAccessControlGroupInboundRule",
            RuleDirection::Outbound => "addAccessControlGroupOutboundRule",
        }
    }

    fn remove_action(self) -> &'static str {
        match self {
            RuleDirection::Inbound => "removeAccessControlGroupInboundRule",
            RuleDirection::Outbound => "removeAccessControlGroupOutboundRule",
        }
    }
}

/// Login key deletion: classic takes one `keyName`, VPC a `keyNameList`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginKeyDelete {
    Single,
    Batch,
}

/// One rule as sent to the add/remove actions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AcgRuleParams {
    pub protocol: String,
    pub ip_block: Option<String>,
    pub source_access_control_group_no: Option<String>,
    pub port_range: Option<String>,
    pub description: Option<String>,
}

fn with_rules(mut params: Params, rules: &[AcgRuleParams]) -> Params {
    for (i, rule) in rules.iter().enumerate() {
        let prefix = format!("accessControlGroupRuleList.{}", i + 1);
        params = params
            .with(&format!("{}.protocolTypeCode", prefix), rule.protocol.clone())
            .with_opt(&format!("{}.ipBlock", prefix), rule.ip_block.clone())
            .with_opt(
                &format!("{}.accessControlGroupSequence", prefix),
                rule.source_access_control_group_no.clone(),
            )
            .with_opt(&format!("{}.portRange", prefix), rule.port_range.clone())
            .with_opt(
                &format!("{}.accessControlGroupRuleDescription", prefix),
                rule.description.clone(),
            );
    }
    params
}

impl ApiClient {
    pub async fn list_regions(&self, service: &str) -> Result<Vec<Region>, ApiError> {
        self.call_list(
            Method::GET,
            service,
            "getRegionList",
            Params::new(),
            "regionList",
        )
        .await
    }

    pub async fn create_login_key(&self, service: &str, key_name: &str) -> Result<String, ApiError> {
        let params = Params::new().with("keyName", key_name);
        let inner = self
            .call(Method::POST, service, "createLoginKey", params)
            .await?;
        inner
            .get("privateKey")
            .and_then(|k| k.as_str())
            .map(|k| k.to_string())
            .ok_or_else(|| ApiError::Decode {
                action: "createLoginKey".to_string(),
                message: "missing privateKey".to_string(),
            })
    }

    pub async fn get_login_key(
        &self,
        service: &str,
        key_name: &str,
    ) -> Result<Option<LoginKey>, ApiError> {
        let params = Params::new().with("keyName", key_name);
        let list: Vec<LoginKey> = self
            .call_list(Method::GET, service, "getLoginKeyList", params, "loginKeyList")
            .await?;
        // keyName is a prefix filter on the platform side
        Ok(list.into_iter().find(|k| k.key_name == key_name))
    }

    pub async fn delete_login_key(
        &self,
        service: &str,
        style: LoginKeyDelete,
        key_name: &str,
    ) -> Result<(), ApiError> {
        let (action, params) = match style {
            LoginKeyDelete::Single => ("deleteLoginKey", Params::new().with("keyName", key_name)),
            LoginKeyDelete::Batch => (
                "deleteLoginKeys",
                Params::new().with_list("keyNameList", [key_name]),
            ),
        };
        self.call(Method::POST, service, action, params).await?;
        Ok(())
    }

    pub async fn create_access_control_group(
        &self,
        service: &str,
        vpc_no: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<AccessControlGroup, ApiError> {
        let params = Params::new()
            .with("vpcNo", vpc_no)
            .with_opt("accessControlGroupName", name)
            .with_opt("accessControlGroupDescription", description);
        let list: Vec<AccessControlGroup> = self
            .call_list(
                Method::POST,
                service,
                "createAccessControlGroup",
                params,
                "accessControlGroupList",
            )
            .await?;
        list.into_iter().next().ok_or_else(|| ApiError::Decode {
            action: "createAccessControlGroup".to_string(),
            message: "empty accessControlGroupList".to_string(),
        })
    }

    pub async fn get_access_control_group(
        &self,
        service: &str,
        access_control_group_no: &str,
    ) -> Result<Option<AccessControlGroup>, ApiError> {
        let params = Params::new().with("accessControlGroupNo", access_control_group_no);
        match self
            .call_list::<AccessControlGroup>(
                Method::GET,
                service,
                "getAccessControlGroupDetail",
                params,
                "accessControlGroupList",
            )
            .await
        {
            Ok(list) => Ok(list.into_iter().next()),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn list_access_control_groups(
        &self,
        service: &str,
        vpc_no: &str,
    ) -> Result<Vec<AccessControlGroup>, ApiError> {
        let params = Params::new().with("vpcNo", vpc_no);
        self.call_list(
            Method::GET,
            service,
            "getAccessControlGroupList",
            params,
            "accessControlGroupList",
        )
        .await
    }

    pub async fn delete_access_control_group(
        &self,
        service: &str,
        vpc_no: &str,
        access_control_group_no: &str,
    ) -> Result<(), ApiError> {
        let params = Params::new()
            .with("vpcNo", vpc_no)
            .with("accessControlGroupNo", access_control_group_no);
        self.call(Method::POST, service, "deleteAccessControlGroup", params)
            .await?;
        Ok(())
    }

    pub async fn list_access_control_group_rules(
        &self,
        service: &str,
        access_control_group_no: &str,
        direction: RuleDirection,
    ) -> Result<Vec<AccessControlGroupRule>, ApiError> {
        let params = Params::new()
            .with("accessControlGroupNo", access_control_group_no)
            .with("accessControlGroupRuleTypeCode", direction.code());
        self.call_list(
            Method::GET,
            service,
            "getAccessControlGroupRuleList",
            params,
            "accessControlGroupRuleList",
        )
        .await
    }

    pub async fn add_access_control_group_rules(
        &self,
        service: &str,
        vpc_no: &str,
        access_control_group_no: &str,
        direction: RuleDirection,
        rules: &[AcgRuleParams],
    ) -> Result<(), ApiError> {
        if rules.is_empty() {
            return Ok(());
        }
        let params = Params::new()
            .with("vpcNo", vpc_no)
            .with("accessControlGroupNo", access_control_group_no);
        let params = with_rules(params, rules);
        self.call(Method::POST, service, direction.add_action(), params)
            .await?;
        Ok(())
    }

    pub async fn remove_access_control_group_rules(
        &self,
        service: &str,
        vpc_no: &str,
        access_control_group_no: &str,
        direction: RuleDirection,
        rules: &[AcgRuleParams],
    ) -> Result<(), ApiError> {
        if rules.is_empty() {
            return Ok(());
        }
        let params = Params::new()
            .with("vpcNo", vpc_no)
            .with("accessControlGroupNo", access_control_group_no);
        let params = with_rules(params, rules);
        self.call(Method::POST, service, direction.remove_action(), params)
            .await?;
        Ok(())
    }
}
