//! Registry of resource and data source types, and the entry points the CLI
//! drives.
//!
//! Every operation resolves the type, checks the configured platform and
//! validates the configuration before any network call.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::network::{NetworkBackend, Platform, backend_for};
use crate::resource::{DataSource, ProviderContext, Resource};
use crate::terraform::schema::{Presence, Schema};
use crate::terraform::state::ResourceData;
use crate::{data_sources, resources};

/// Type lookup and offline validation for one platform. Needs no
/// credentials.
pub struct Registry {
    backend: Arc<dyn NetworkBackend>,
    resources: BTreeMap<&'static str, Arc<dyn Resource>>,
    data_sources: BTreeMap<&'static str, Arc<dyn DataSource>>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("platform", &self.backend.platform())
            .field("resources", &self.resources.keys().collect::<Vec<_>>())
            .field("data_sources", &self.data_sources.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn config_object(config: &Value) -> Result<&serde_json::Map<String, Value>, ProviderError> {
    config.as_object().ok_or_else(|| {
        ProviderError::Config("resource configuration must be a JSON object".to_string())
    })
}

fn validate_against(schema: &Schema, config: &Value) -> Result<(), ProviderError> {
    schema
        .validate(config_object(config)?)
        .map_err(ProviderError::Validation)
}

impl Registry {
    pub fn new(platform: Platform) -> Self {
        Self {
            backend: backend_for(platform),
            resources: resources::all()
                .into_iter()
                .map(|r| (r.type_name(), r))
                .collect(),
            data_sources: data_sources::all()
                .into_iter()
                .map(|d| (d.type_name(), d))
                .collect(),
        }
    }

    pub fn platform(&self) -> Platform {
        self.backend.platform()
    }

    pub fn resource_types(&self) -> Vec<&'static str> {
        self.resources.keys().copied().collect()
    }

    pub fn data_source_types(&self) -> Vec<&'static str> {
        self.data_sources.keys().copied().collect()
    }

    pub fn resource(&self, type_name: &str) -> Result<&Arc<dyn Resource>, ProviderError> {
        self.resources
            .get(type_name)
            .ok_or_else(|| ProviderError::UnknownResource(type_name.to_string()))
    }

    pub fn data_source(&self, type_name: &str) -> Result<&Arc<dyn DataSource>, ProviderError> {
        self.data_sources
            .get(type_name)
            .ok_or_else(|| ProviderError::UnknownResource(type_name.to_string()))
    }

    /// Resource lookup that also rejects types unavailable on the
    /// configured platform.
    pub fn supported_resource(&self, type_name: &str) -> Result<&Arc<dyn Resource>, ProviderError> {
        let resource = self.resource(type_name)?;
        if !self.backend.supports(resource.platforms()) {
            return Err(ProviderError::not_supported_classic(type_name));
        }
        Ok(resource)
    }

    pub fn supported_data_source(
        &self,
        type_name: &str,
    ) -> Result<&Arc<dyn DataSource>, ProviderError> {
        let data_source = self.data_source(type_name)?;
        if !self.backend.supports(data_source.platforms()) {
            return Err(ProviderError::not_supported_classic(type_name));
        }
        Ok(data_source)
    }

    /// Validates a resource configuration without touching the network.
    pub fn validate(&self, type_name: &str, config: &Value) -> Result<(), ProviderError> {
        let resource = self.supported_resource(type_name)?;
        validate_against(&resource.schema(), config)
    }

    pub fn validate_data_source(&self, type_name: &str, config: &Value) -> Result<(), ProviderError> {
        let data_source = self.supported_data_source(type_name)?;
        validate_against(&data_source.schema(), config)
    }
}

/// The registry bound to an API client.
#[derive(Debug)]
pub struct Provider {
    ctx: ProviderContext,
    registry: Registry,
}

impl Provider {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let ctx = ProviderContext::new(config)?;
        let registry = Registry::new(ctx.platform());

        tracing::debug!(platform = %ctx.platform(), region = ctx.client.region(), "provider configured");
        Ok(Self { ctx, registry })
    }

    pub fn context(&self) -> &ProviderContext {
        &self.ctx
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Instance data for `resource`, with timeouts filled from its defaults.
    fn instance(resource: &dyn Resource, value: Value) -> Result<ResourceData, ProviderError> {
        let mut data = ResourceData::from_value(value)?;
        let timeouts = data.timeouts().or(&resource.default_timeouts());
        data.set_timeouts(timeouts);
        Ok(data)
    }

    pub async fn create(&self, type_name: &str, config: Value) -> Result<ResourceData, ProviderError> {
        let resource = self.registry.supported_resource(type_name)?;
        validate_against(&resource.schema(), &config)?;
        let mut data = Self::instance(resource.as_ref(), config)?;
        data.clear_id();

        tracing::info!(resource = type_name, "creating");
        resource.create(&self.ctx, &mut data).await?;
        Ok(data)
    }

    /// Refreshes an instance from its stored state. `None` when the remote
    /// object no longer exists.
    pub async fn read(
        &self,
        type_name: &str,
        state: Value,
    ) -> Result<Option<ResourceData>, ProviderError> {
        let resource = self.registry.supported_resource(type_name)?;
        let mut data = Self::instance(resource.as_ref(), state)?;
        data.require_id()?;

        resource.read(&self.ctx, &mut data).await?;
        Ok(data.id().is_some().then_some(data))
    }

    /// Applies `config` to the instance described by `prior`.
    ///
    /// Attributes the provider computes are carried over from `prior` when
    /// the configuration leaves them out. A change to a force-new attribute
    /// is rejected with [`ProviderError::RequiresReplacement`].
    pub async fn update(
        &self,
        type_name: &str,
        prior: Value,
        config: Value,
    ) -> Result<ResourceData, ProviderError> {
        let resource = self.registry.supported_resource(type_name)?;
        let schema = resource.schema();
        validate_against(&schema, &config)?;

        let prior = Self::instance(resource.as_ref(), prior)?;
        let id = prior.require_id()?.to_string();
        let mut data = Self::instance(resource.as_ref(), config)?;
        data.set_id(id);

        for field in &schema.fields {
            let carried = matches!(field.presence, Presence::Computed | Presence::OptionalComputed);
            if carried
                && data.get(field.name).is_none()
                && let Some(value) = prior.get(field.name)
            {
                data.set(field.name, value.clone());
            }
        }

        let replaced: Vec<String> = schema
            .fields
            .iter()
            .filter(|f| f.force_new && !f.is_computed_only())
            .filter(|f| data.changed(&prior, f.name))
            .map(|f| f.name.to_string())
            .collect();
        if !replaced.is_empty() {
            return Err(ProviderError::RequiresReplacement {
                resource: type_name.to_string(),
                fields: replaced,
            });
        }

        tracing::info!(resource = type_name, id = prior.id(), "updating");
        resource.update(&self.ctx, &prior, &mut data).await?;
        Ok(data)
    }

    pub async fn delete(&self, type_name: &str, state: Value) -> Result<(), ProviderError> {
        let resource = self.registry.supported_resource(type_name)?;
        let data = Self::instance(resource.as_ref(), state)?;
        data.require_id()?;

        tracing::info!(resource = type_name, id = data.id(), "deleting");
        resource.delete(&self.ctx, &data).await
    }

    pub async fn read_data_source(
        &self,
        type_name: &str,
        config: Value,
    ) -> Result<ResourceData, ProviderError> {
        let data_source = self.registry.supported_data_source(type_name)?;
        validate_against(&data_source.schema(), &config)?;
        let mut data = ResourceData::from_value(config)?;

        data_source.read(&self.ctx, &mut data).await?;
        Ok(data)
    }
}
