//! Inbound and outbound rules of one access control group.
//!
//! The platform only offers add and remove actions for rules, so updates are
//! computed as a diff between the prior and the desired rule sets. Every
//! change moves the group to `SET` until it is applied; a second change sent
//! in that window is rejected with a concurrent-change return code and
//! retried.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::access_control_group::probe_access_control_group;
use crate::api::types::{AccessControlGroup, AccessControlGroupRule};
use crate::api::{AcgRuleParams, RuleDirection};
use crate::diff::{Rule, diff_by_arg};
use crate::error::ProviderError;
use crate::resource::{ProviderContext, Resource};
use crate::terraform::schema::{Field, FieldType, Schema, Validator};
use crate::terraform::state::{Operation, ResourceData, Timeouts};
use crate::wait::{RetryPolicy, StateChange, retry_on_return_codes, wait_for_state};

const APPLYING: &[&str] = &["SET", "INIT"];
const RUNNING: &[&str] = &["RUN"];

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Returned while another change to the same group is still being applied.
pub const CONCURRENT_CHANGE_CODE: &str = "1007052";

const RETRY: RetryPolicy = RetryPolicy {
    return_codes: &[CONCURRENT_CHANGE_CODE],
    attempts: 5,
    backoff: Duration::from_secs(5),
};

const DIRECTIONS: [(RuleDirection, &str); 2] = [
    (RuleDirection::Inbound, "inbound"),
    (RuleDirection::Outbound, "outbound"),
];

/// Synthetic attribute holding a rule's identity while diffing.
const RULE_KEY: &str = "__rule_key";

const RULE_FIELDS: [&str; 5] = [
    "protocol",
    "ip_block",
    "source_access_control_group_no",
    "port_range",
    "description",
];

pub struct AccessControlGroupRuleResource;

fn rule_schema() -> Schema {
    Schema::new(vec![
        Field::required("protocol", FieldType::String).validate(Validator::regex(
            r"^(TCP|UDP|ICMP|[1-9][0-9]{0,2})$",
            "must be TCP, UDP, ICMP or an IP protocol number",
        )),
        Field::optional("ip_block", FieldType::String).validate(Validator::Cidr),
        Field::optional("source_access_control_group_no", FieldType::String),
        Field::optional("port_range", FieldType::String).validate(Validator::regex(
            r"^[0-9]{1,5}(-[0-9]{1,5})?$",
            "must be a port or a port range like 1-65535",
        )),
        Field::optional("description", FieldType::String)
            .validate(Validator::Length { min: 0, max: 1000 }),
    ])
}

fn text(rule: &Rule, field: &str) -> Option<String> {
    rule.get(field)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn rule_key(rule: &Rule) -> String {
    RULE_FIELDS
        .iter()
        .map(|f| text(rule, f).unwrap_or_default())
        .collect::<Vec<_>>()
        .join("|")
}

fn keyed(rules: Vec<Rule>) -> Vec<Rule> {
    rules
        .into_iter()
        .map(|mut rule| {
            let key = rule_key(&rule);
            rule.insert(RULE_KEY.to_string(), Value::String(key));
            rule
        })
        .collect()
}

fn to_param(rule: &Rule) -> AcgRuleParams {
    AcgRuleParams {
        protocol: text(rule, "protocol").unwrap_or_default(),
        ip_block: text(rule, "ip_block"),
        source_access_control_group_no: text(rule, "source_access_control_group_no"),
        port_range: text(rule, "port_range"),
        description: text(rule, "description"),
    }
}

fn to_params(rules: &[Rule]) -> Vec<AcgRuleParams> {
    rules.iter().map(to_param).collect()
}

fn flatten_rule(rule: &AccessControlGroupRule) -> Rule {
    let mut block = Rule::new();
    block.insert(
        "protocol".to_string(),
        Value::String(rule.protocol_type.code.clone()),
    );
    let optional = [
        ("ip_block", &rule.ip_block),
        (
            "source_access_control_group_no",
            &rule.access_control_group_sequence,
        ),
        ("port_range", &rule.port_range),
        ("description", &rule.access_control_group_rule_description),
    ];
    for (name, value) in optional {
        if let Some(value) = value.as_ref().filter(|v| !v.is_empty()) {
            block.insert(name.to_string(), Value::String(value.clone()));
        }
    }
    block
}

/// Applies one add or remove call, then waits for the group to settle.
async fn apply(
    ctx: &ProviderContext,
    change: &StateChange,
    acg: &AccessControlGroup,
    direction: RuleDirection,
    add: bool,
    rules: &[AcgRuleParams],
) -> Result<(), ProviderError> {
    if rules.is_empty() {
        return Ok(());
    }
    let service = ctx.backend.server_service();
    let vpc_no = acg.vpc_no.as_str();
    let acg_no = acg.access_control_group_no.as_str();

    retry_on_return_codes(&RETRY, move || async move {
        let result = if add {
            ctx.client
                .add_access_control_group_rules(service, vpc_no, acg_no, direction, rules)
                .await
        } else {
            ctx.client
                .remove_access_control_group_rules(service, vpc_no, acg_no, direction, rules)
                .await
        };
        result.map_err(ProviderError::from)
    })
    .await?;

    tracing::info!(
        access_control_group_no = acg_no,
        direction = direction.code(),
        count = rules.len(),
        added = add,
        "access control group rules changed"
    );
    wait_for_state(acg_no, change, |id| probe_access_control_group(ctx, id)).await?;
    Ok(())
}

/// Rules the group currently holds in one direction, for a state that only
/// carries the id.
async fn current_rules(
    ctx: &ProviderContext,
    acg_no: &str,
    direction: RuleDirection,
) -> Result<Vec<AcgRuleParams>, ProviderError> {
    let rules = ctx
        .client
        .list_access_control_group_rules(ctx.backend.server_service(), acg_no, direction)
        .await?;
    Ok(rules.iter().map(|r| to_param(&flatten_rule(r))).collect())
}

/// Waits until the group accepts changes and returns it.
async fn ready_group(
    ctx: &ProviderContext,
    change: &StateChange,
    acg_no: &str,
) -> Result<AccessControlGroup, ProviderError> {
    wait_for_state(acg_no, change, |id| probe_access_control_group(ctx, id))
        .await?
        .ok_or_else(|| ProviderError::NotFound {
            resource: "access control group".to_string(),
            id: acg_no.to_string(),
        })
}

#[async_trait]
impl Resource for AccessControlGroupRuleResource {
    fn type_name(&self) -> &'static str {
        "ncloud_access_control_group_rule"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            Field::required("access_control_group_no", FieldType::String).force_new(),
            Field::optional("inbound", FieldType::set_of(FieldType::Block(rule_schema()))),
            Field::optional("outbound", FieldType::set_of(FieldType::Block(rule_schema()))),
        ])
    }

    fn default_timeouts(&self) -> Timeouts {
        Timeouts {
            create: Some(DEFAULT_TIMEOUT),
            update: Some(DEFAULT_TIMEOUT),
            delete: Some(DEFAULT_TIMEOUT),
            ..Default::default()
        }
    }

    async fn create(
        &self,
        ctx: &ProviderContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let acg_no = data.require_str("access_control_group_no")?.to_string();
        let change = ctx.state_change(
            APPLYING,
            RUNNING,
            data.timeout(Operation::Create, DEFAULT_TIMEOUT),
        );
        let acg = ready_group(ctx, &change, &acg_no).await?;

        for (direction, field) in DIRECTIONS {
            let rules = to_params(&data.get_blocks(field));
            apply(ctx, &change, &acg, direction, true, &rules).await?;
        }

        data.set_id(acg_no);
        self.read(ctx, data).await
    }

    async fn read(
        &self,
        ctx: &ProviderContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let acg_no = data.require_id()?.to_string();
        let service = ctx.backend.server_service();

        if ctx
            .client
            .get_access_control_group(service, &acg_no)
            .await?
            .is_none()
        {
            tracing::warn!(access_control_group_no = %acg_no, "access control group not found, removing rules from state");
            data.clear_id();
            return Ok(());
        }

        data.set("access_control_group_no", acg_no.clone());
        for (direction, field) in DIRECTIONS {
            let rules = ctx
                .client
                .list_access_control_group_rules(service, &acg_no, direction)
                .await?;
            let blocks: Vec<Value> = rules
                .iter()
                .map(|r| Value::Object(flatten_rule(r)))
                .collect();
            data.set(field, blocks);
        }
        Ok(())
    }

    async fn update(
        &self,
        ctx: &ProviderContext,
        prior: &ResourceData,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let acg_no = data.require_id()?.to_string();
        let change = ctx.state_change(
            APPLYING,
            RUNNING,
            data.timeout(Operation::Update, DEFAULT_TIMEOUT),
        );
        let acg = ready_group(ctx, &change, &acg_no).await?;

        for (direction, field) in DIRECTIONS {
            let diff = diff_by_arg(
                &keyed(prior.get_blocks(field)),
                &keyed(data.get_blocks(field)),
                RULE_KEY,
            );
            if diff.is_empty() {
                continue;
            }
            tracing::debug!(
                access_control_group_no = %acg_no,
                direction = direction.code(),
                added = diff.added.len(),
                deleted = diff.deleted.len(),
                "rule diff"
            );
            apply(ctx, &change, &acg, direction, false, &to_params(&diff.deleted)).await?;
            apply(ctx, &change, &acg, direction, true, &to_params(&diff.added)).await?;
        }

        self.read(ctx, data).await
    }

    async fn delete(&self, ctx: &ProviderContext, data: &ResourceData) -> Result<(), ProviderError> {
        let acg_no = data.require_id()?;
        let change = ctx.state_change(
            APPLYING,
            RUNNING,
            data.timeout(Operation::Delete, DEFAULT_TIMEOUT),
        );

        let exists = ctx
            .client
            .get_access_control_group(ctx.backend.server_service(), acg_no)
            .await?
            .is_some();
        if !exists {
            tracing::info!(access_control_group_no = acg_no, "access control group already gone");
            return Ok(());
        }
        let acg = ready_group(ctx, &change, acg_no).await?;

        for (direction, field) in DIRECTIONS {
            let rules = match data.get(field) {
                Some(_) => to_params(&data.get_blocks(field)),
                None => current_rules(ctx, acg_no, direction).await?,
            };
            apply(ctx, &change, &acg, direction, false, &rules).await?;
        }
        Ok(())
    }
}
