//! Exoscale provider implementation

use crate::api::ComputeApi;
use crate::client::HttpComputeClient;
use crate::config::ExoscaleConfig;
use crate::data_sources::{DomainLookup, InstancePoolList, InstancePoolLookup, NetworkLookup};
use crate::error::Result;
use crate::resources::{AffinityResource, DomainResource, NetworkResource, SksNodepoolResource};
use async_trait::async_trait;
use fleetflow_cloud::{ApiErrorKind, AuthStatus, CloudError, CloudProvider, Registry, Timeouts};
use std::sync::Arc;

/// Every resource kind and data source of the provider
pub fn default_registry() -> Registry<dyn ComputeApi> {
    Registry::new()
        .with_resource(NetworkResource)
        .with_resource(AffinityResource)
        .with_resource(DomainResource)
        .with_resource(SksNodepoolResource)
        .with_data_source(NetworkLookup)
        .with_data_source(DomainLookup)
        .with_data_source(InstancePoolLookup)
        .with_data_source(InstancePoolList)
}

/// Exoscale provider
pub struct ExoscaleProvider {
    config: ExoscaleConfig,
    client: Arc<dyn ComputeApi>,
    registry: Registry<dyn ComputeApi>,
}

impl ExoscaleProvider {
    /// Provider talking to the HTTP API described by `config`
    pub fn new(config: ExoscaleConfig) -> Result<Self> {
        config.validate()?;
        let client = Arc::new(HttpComputeClient::new(&config));
        Ok(Self::with_client(config, client))
    }

    /// Provider using an arbitrary API implementation
    pub fn with_client(config: ExoscaleConfig, client: Arc<dyn ComputeApi>) -> Self {
        Self {
            config,
            client,
            registry: default_registry(),
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::new(ExoscaleConfig::from_env()?)
    }

    pub fn config(&self) -> &ExoscaleConfig {
        &self.config
    }
}

#[async_trait]
impl CloudProvider for ExoscaleProvider {
    type Client = dyn ComputeApi;

    fn name(&self) -> &str {
        "exoscale"
    }

    fn display_name(&self) -> &str {
        "Exoscale"
    }

    fn client(&self) -> &Self::Client {
        self.client.as_ref()
    }

    fn registry(&self) -> &Registry<dyn ComputeApi> {
        &self.registry
    }

    fn timeouts(&self) -> Timeouts {
        Timeouts::uniform(self.config.timeout)
    }

    async fn check_auth(&self) -> fleetflow_cloud::Result<AuthStatus> {
        match self.client.list_zones().await {
            Ok(zones) => {
                tracing::debug!(zones = zones.len(), "exoscale credentials accepted");
                Ok(AuthStatus::ok(format!(
                    "{} ({} ゾーン)",
                    self.config.base_url(),
                    zones.len()
                )))
            }
            Err(CloudError::Api {
                kind: ApiErrorKind::Unauthorized | ApiErrorKind::Forbidden,
                ..
            }) => Ok(AuthStatus::failed(
                "Exoscale の API キーが認証されていません",
            )),
            Err(e) => Ok(AuthStatus::failed(e.to_string())),
        }
    }
}
