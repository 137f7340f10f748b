use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::api::ApiClient;
use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::network::{NetworkBackend, Platform, VPC_ONLY, backend_for};
use crate::terraform::schema::Schema;
use crate::terraform::state::{ResourceData, Timeouts};
use crate::wait::StateChange;

/// Everything a resource operation needs: configuration, API client and the
/// platform backend. Read-only after construction.
#[derive(Debug, Clone)]
pub struct ProviderContext {
    pub config: Arc<ProviderConfig>,
    pub client: ApiClient,
    pub backend: Arc<dyn NetworkBackend>,
}

impl ProviderContext {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let client = ApiClient::new(&config)?;
        let backend = backend_for(config.platform);
        Ok(Self {
            config: Arc::new(config),
            client,
            backend,
        })
    }

    pub fn platform(&self) -> Platform {
        self.backend.platform()
    }

    /// A [`StateChange`] using the configured poll interval.
    pub fn state_change(
        &self,
        pending: &'static [&'static str],
        target: &'static [&'static str],
        timeout: Duration,
    ) -> StateChange {
        StateChange::new(pending, target)
            .with_interval(self.config.poll_interval)
            .with_timeout(timeout)
    }
}

/// A managed resource type.
///
/// `read` clears the instance id when the remote object no longer exists.
#[async_trait]
pub trait Resource: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    fn platforms(&self) -> &'static [Platform] {
        VPC_ONLY
    }

    fn default_timeouts(&self) -> Timeouts {
        Timeouts::default()
    }

    async fn create(&self, ctx: &ProviderContext, data: &mut ResourceData)
    -> Result<(), ProviderError>;

    async fn read(&self, ctx: &ProviderContext, data: &mut ResourceData)
    -> Result<(), ProviderError>;

    /// Resources without in-place updatable fields only refresh state.
    async fn update(
        &self,
        ctx: &ProviderContext,
        _prior: &ResourceData,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        self.read(ctx, data).await
    }

    async fn delete(&self, ctx: &ProviderContext, data: &ResourceData) -> Result<(), ProviderError>;
}

/// A read-only lookup.
#[async_trait]
pub trait DataSource: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    fn platforms(&self) -> &'static [Platform] {
        VPC_ONLY
    }

    async fn read(&self, ctx: &ProviderContext, data: &mut ResourceData)
    -> Result<(), ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_uses_configured_platform() {
        let config = ProviderConfig::new("a", "s").with_platform(Platform::Classic);
        let ctx = ProviderContext::new(config).unwrap();
        assert_eq!(ctx.platform(), Platform::Classic);
        assert_eq!(ctx.backend.server_service(), "/server/v2");
    }

    #[test]
    fn test_state_change_uses_poll_interval() {
        let config =
            ProviderConfig::new("a", "s").with_poll_interval(Duration::from_millis(10));
        let ctx = ProviderContext::new(config).unwrap();
        let change = ctx.state_change(&["CREATING"], &["RUN"], Duration::from_secs(60));
        assert_eq!(change.interval, Duration::from_millis(10));
        assert_eq!(change.timeout, Duration::from_secs(60));
        assert_eq!(change.target, &["RUN"]);
    }

    #[test]
    fn test_context_requires_credentials() {
        let config = ProviderConfig::new("", "");
        assert!(matches!(
            ProviderContext::new(config),
            Err(ProviderError::Api(_))
        ));
    }
}
