//! Registry of the resource kinds and data sources a provider exposes

use crate::error::{CloudError, Result};
use crate::reconciler::{DataSource, Lifecycle, Reconciler, ResourceKind};
use crate::schema::Schema;
use std::collections::BTreeMap;
use std::sync::Arc;

struct DataSourceEntry<C: ?Sized> {
    schema: Arc<Schema>,
    source: Box<dyn DataSource<C>>,
}

/// Named lifecycle handlers sharing one client type
pub struct Registry<C: ?Sized> {
    resources: BTreeMap<&'static str, Box<dyn Lifecycle<C>>>,
    data_sources: BTreeMap<&'static str, DataSourceEntry<C>>,
}

impl<C: ?Sized + Send + Sync + 'static> Registry<C> {
    pub fn new() -> Self {
        Self {
            resources: BTreeMap::new(),
            data_sources: BTreeMap::new(),
        }
    }

    /// Registers a resource kind under its type name
    pub fn with_resource<K>(mut self, kind: K) -> Self
    where
        K: ResourceKind<Client = C>,
    {
        let reconciler = Reconciler::new(kind);
        let name = Lifecycle::type_name(&reconciler);
        self.resources.insert(name, Box::new(reconciler));
        self
    }

    pub fn with_data_source<S>(mut self, source: S) -> Self
    where
        S: DataSource<C> + 'static,
    {
        let name = source.type_name();
        let schema = Arc::new(source.schema());
        self.data_sources.insert(
            name,
            DataSourceEntry {
                schema,
                source: Box::new(source),
            },
        );
        self
    }

    pub fn resource(&self, type_name: &str) -> Result<&dyn Lifecycle<C>> {
        self.resources
            .get(type_name)
            .map(|r| r.as_ref())
            .ok_or_else(|| CloudError::UnknownResourceType(type_name.to_string()))
    }

    pub fn data_source(&self, type_name: &str) -> Result<&dyn DataSource<C>> {
        self.data_sources
            .get(type_name)
            .map(|e| e.source.as_ref())
            .ok_or_else(|| CloudError::UnknownResourceType(type_name.to_string()))
    }

    pub fn data_source_schema(&self, type_name: &str) -> Result<Arc<Schema>> {
        self.data_sources
            .get(type_name)
            .map(|e| e.schema.clone())
            .ok_or_else(|| CloudError::UnknownResourceType(type_name.to_string()))
    }

    /// Registered resource type names, sorted
    pub fn resource_types(&self) -> Vec<&'static str> {
        self.resources.keys().copied().collect()
    }

    /// Registered data source type names, sorted
    pub fn data_source_types(&self) -> Vec<&'static str> {
        self.data_sources.keys().copied().collect()
    }
}

impl<C: ?Sized + Send + Sync + 'static> Default for Registry<C> {
    fn default() -> Self {
        Self::new()
    }
}
