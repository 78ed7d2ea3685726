//! Cloud provider trait definition

use crate::data::{ResourceData, Timeouts};
use crate::error::Result;
use crate::reconciler::read_data_source;
use crate::registry::Registry;
use crate::schema::Schema;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Cloud provider abstraction trait
///
/// A provider owns an API client and a [`Registry`] of resource kinds
/// talking to it. The lifecycle entry points dispatch by resource type
/// name; providers normally only supply the accessors and `check_auth`.
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// API client shared by every registered kind
    type Client: ?Sized + Send + Sync + 'static;

    /// Returns the provider name (e.g., "exoscale")
    fn name(&self) -> &str;

    /// Returns the provider display name for UI
    fn display_name(&self) -> &str;

    fn client(&self) -> &Self::Client;

    fn registry(&self) -> &Registry<Self::Client>;

    /// Timeouts applied to every lifecycle call
    fn timeouts(&self) -> Timeouts {
        Timeouts::default()
    }

    /// Check if the provider is properly configured and authenticated
    async fn check_auth(&self) -> Result<AuthStatus>;

    fn resource_types(&self) -> Vec<&'static str> {
        self.registry().resource_types()
    }

    fn data_source_types(&self) -> Vec<&'static str> {
        self.registry().data_source_types()
    }

    fn resource_schema(&self, resource_type: &str) -> Result<Arc<Schema>> {
        Ok(self.registry().resource(resource_type)?.schema())
    }

    fn data_source_schema(&self, data_type: &str) -> Result<Arc<Schema>> {
        self.registry().data_source_schema(data_type)
    }

    /// Offline validation of a declared configuration
    fn validate(&self, resource_type: &str, config: &Map<String, Value>) -> Result<()> {
        let lifecycle = self.registry().resource(resource_type)?;
        let d = ResourceData::for_create(lifecycle.schema(), config.clone());
        lifecycle.validate(&d)
    }

    async fn create(&self, resource_type: &str, d: &mut ResourceData) -> Result<()> {
        self.registry()
            .resource(resource_type)?
            .create(self.client(), d)
            .await
    }

    async fn read(&self, resource_type: &str, d: &mut ResourceData) -> Result<()> {
        self.registry()
            .resource(resource_type)?
            .read(self.client(), d)
            .await
    }

    async fn refresh(&self, resource_type: &str, d: &mut ResourceData) -> Result<bool> {
        self.registry()
            .resource(resource_type)?
            .refresh(self.client(), d)
            .await
    }

    async fn update(&self, resource_type: &str, d: &mut ResourceData) -> Result<()> {
        self.registry()
            .resource(resource_type)?
            .update(self.client(), d)
            .await
    }

    async fn delete(&self, resource_type: &str, d: &mut ResourceData) -> Result<()> {
        self.registry()
            .resource(resource_type)?
            .delete(self.client(), d)
            .await
    }

    async fn exists(&self, resource_type: &str, d: &mut ResourceData) -> Result<bool> {
        self.registry()
            .resource(resource_type)?
            .exists(self.client(), d)
            .await
    }

    async fn import(&self, resource_type: &str, raw_id: &str) -> Result<ResourceData> {
        self.registry()
            .resource(resource_type)?
            .import(self.client(), raw_id, self.timeouts())
            .await
    }

    /// Runs a data source lookup and returns the filled record
    async fn read_data_source(
        &self,
        data_type: &str,
        config: &Map<String, Value>,
    ) -> Result<ResourceData> {
        let registry = self.registry();
        let source = registry.data_source(data_type)?;
        let schema = registry.data_source_schema(data_type)?;
        let mut d = ResourceData::for_create(schema, config.clone()).with_timeouts(self.timeouts());
        read_data_source(source, self.client(), &mut d).await?;
        Ok(d)
    }
}

/// Authentication status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthStatus {
    /// Whether authentication is valid
    pub authenticated: bool,

    /// Account/user information if available
    pub account_info: Option<String>,

    /// Error message if not authenticated
    pub error: Option<String>,
}

impl AuthStatus {
    pub fn ok(account_info: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            account_info: Some(account_info.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            authenticated: false,
            account_info: None,
            error: Some(error.into()),
        }
    }
}

/// Declared resources, in declaration order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceSet {
    pub resources: Vec<ResourceConfig>,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a resource, replacing an earlier declaration at the same address
    pub fn add(&mut self, resource: ResourceConfig) {
        match self
            .resources
            .iter_mut()
            .find(|r| r.address() == resource.address())
        {
            Some(existing) => *existing = resource,
            None => self.resources.push(resource),
        }
    }

    pub fn get(&self, address: &str) -> Option<&ResourceConfig> {
        self.resources.iter().find(|r| r.address() == address)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceConfig> {
        self.resources.iter()
    }

    pub fn by_type(&self, resource_type: &str) -> Vec<&ResourceConfig> {
        self.resources
            .iter()
            .filter(|r| r.resource_type == resource_type)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Configuration for a declared resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Resource type (e.g., "exoscale_network")
    pub resource_type: String,

    /// Local name, unique per type
    pub name: String,

    /// Provider name
    pub provider: String,

    /// Declared attributes
    pub config: Map<String, Value>,
}

impl ResourceConfig {
    pub fn new(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        provider: impl Into<String>,
        config: Map<String, Value>,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            provider: provider.into(),
            config,
        }
    }

    /// Get the resource address (type.name)
    pub fn address(&self) -> String {
        format!("{}.{}", self.resource_type, self.name)
    }

    /// Get a configuration value as a specific type
    pub fn get_config<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.config
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Splits a `type.name` address
pub fn parse_address(address: &str) -> Option<(&str, &str)> {
    address
        .split_once('.')
        .filter(|(t, n)| !t.is_empty() && !n.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_resource_set_keeps_declaration_order() {
        let mut set = ResourceSet::new();
        set.add(ResourceConfig::new("exoscale_network", "web", "exoscale", Map::new()));
        set.add(ResourceConfig::new("exoscale_domain", "main", "exoscale", Map::new()));
        set.add(ResourceConfig::new(
            "exoscale_network",
            "web",
            "exoscale",
            config(json!({"name": "web"})),
        ));

        let addresses: Vec<String> = set.iter().map(|r| r.address()).collect();
        assert_eq!(addresses, vec!["exoscale_network.web", "exoscale_domain.main"]);
        assert_eq!(
            set.get("exoscale_network.web")
                .and_then(|r| r.get_config::<String>("name"))
                .as_deref(),
            Some("web")
        );
        assert_eq!(set.by_type("exoscale_domain").len(), 1);
    }

    #[test]
    fn test_parse_address() {
        assert_eq!(
            parse_address("exoscale_network.web"),
            Some(("exoscale_network", "web"))
        );
        assert_eq!(parse_address("exoscale_network"), None);
        assert_eq!(parse_address(".web"), None);
    }
}
