//! Generic resource reconciler
//!
//! Every resource kind supplies the same small capability set: how to turn
//! a state record into requests, how to map a remote object back onto the
//! record, and which cross-field rules to check. [`Reconciler`] drives the
//! create/read/update/delete/exists/import cycle once for all kinds.

use crate::data::{Operation, ResourceData, Timeouts};
use crate::error::{CloudError, Result};
use crate::schema::Schema;
use crate::tags::{TagPatch, Tags, diff_tags};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// A resource kind exposed to the host
#[async_trait]
pub trait ResourceKind: Send + Sync + 'static {
    /// API client the kind talks to
    type Client: ?Sized + Send + Sync;

    /// Remote object as returned by the API
    type Remote: Send + Sync;

    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    /// Cross-field checks run before any remote call on create
    fn validate(&self, _d: &ResourceData) -> Result<()> {
        Ok(())
    }

    /// Checks run before any remote call on update
    fn validate_update(&self, _d: &ResourceData) -> Result<()> {
        Ok(())
    }

    /// Issues the create request and returns the new identifier
    async fn create(&self, client: &Self::Client, d: &ResourceData) -> Result<String>;

    /// Fetches the remote object identified by the record
    async fn fetch(&self, client: &Self::Client, d: &ResourceData) -> Result<Self::Remote>;

    /// Maps the remote object onto the record
    fn apply(&self, d: &mut ResourceData, remote: &Self::Remote) -> Result<()>;

    async fn update(&self, _client: &Self::Client, _d: &ResourceData) -> Result<()> {
        Err(CloudError::Unsupported(format!(
            "{} cannot be updated in place",
            self.type_name()
        )))
    }

    async fn delete(&self, client: &Self::Client, d: &ResourceData) -> Result<()>;

    /// Fills the record from an import identifier
    fn import_id(&self, raw: &str, d: &mut ResourceData) -> Result<()> {
        d.set_id(raw);
        Ok(())
    }

    /// Attribute holding the tags managed through [`ResourceKind::patch_tags`]
    fn tags_attribute(&self) -> Option<&'static str> {
        None
    }

    fn remote_tags(&self, _remote: &Self::Remote) -> Tags {
        Tags::new()
    }

    async fn patch_tags(
        &self,
        _client: &Self::Client,
        _d: &ResourceData,
        _patch: &TagPatch,
    ) -> Result<()> {
        Ok(())
    }
}

/// Bounds a remote phase by the operation's timeout
async fn bounded<T, F>(operation: Operation, timeouts: Timeouts, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let after = timeouts.get(operation);
    match tokio::time::timeout(after, fut).await {
        Ok(result) => result,
        Err(_) => Err(CloudError::Timeout {
            operation: operation.to_string(),
            after,
        }),
    }
}

/// Drives the lifecycle of one resource kind
pub struct Reconciler<K> {
    kind: K,
    schema: Arc<Schema>,
}

impl<K: ResourceKind> Reconciler<K> {
    pub fn new(kind: K) -> Self {
        let schema = Arc::new(kind.schema());
        Self { kind, schema }
    }

    pub fn kind(&self) -> &K {
        &self.kind
    }

    pub fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    /// Validates a declared configuration before creation
    pub fn validate(&self, d: &ResourceData) -> Result<()> {
        self.schema.validate(d.attributes())?;
        self.kind.validate(d)
    }

    pub async fn create(&self, client: &K::Client, d: &mut ResourceData) -> Result<()> {
        let type_name = self.kind.type_name();
        tracing::debug!(id = %d.id_string(type_name), "beginning create");

        self.validate(d)?;
        bounded(Operation::Create, d.timeouts(), self.create_remote(client, d)).await?;

        tracing::debug!(id = %d.id_string(type_name), "create finished successfully");

        self.read(client, d).await
    }

    async fn create_remote(&self, client: &K::Client, d: &mut ResourceData) -> Result<()> {
        let id = self.kind.create(client, d).await?;
        d.set_id(id);

        let Some(key) = self.kind.tags_attribute() else {
            return Ok(());
        };
        let patch = diff_tags(&Tags::new(), &d.get_map(key));
        if patch.is_empty() {
            return Ok(());
        }

        if let Err(err) = self.kind.patch_tags(client, d, &patch).await {
            // Attempting to destroy the freshly created object
            match self.kind.delete(client, d).await {
                Ok(()) => d.set_id(""),
                Err(cleanup) => {
                    tracing::warn!(
                        id = %d.id_string(self.kind.type_name()),
                        api_error = %cleanup,
                        "failure to create the tags, but the resource was created"
                    );
                }
            }
            return Err(err);
        }

        Ok(())
    }

    /// Fetches the remote object and mirrors it onto the record.
    /// A missing object is reported as not-found.
    pub async fn read(&self, client: &K::Client, d: &mut ResourceData) -> Result<()> {
        let type_name = self.kind.type_name();
        tracing::debug!(id = %d.id_string(type_name), "beginning read");
        let remote = bounded(Operation::Read, d.timeouts(), self.kind.fetch(client, d)).await?;
        self.kind.apply(d, &remote)?;
        d.commit();

        tracing::debug!(id = %d.id_string(type_name), "read finished successfully");
        Ok(())
    }

    /// Like [`Reconciler::read`], but an object deleted outside of the host
    /// clears the identifier and yields `false`.
    pub async fn refresh(&self, client: &K::Client, d: &mut ResourceData) -> Result<bool> {
        match self.read(client, d).await {
            Ok(()) => Ok(true),
            Err(e) if e.is_not_found() => {
                tracing::warn!(
                    id = %d.id_string(self.kind.type_name()),
                    "resource not found, removing from state"
                );
                d.set_id("");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn update(&self, client: &K::Client, d: &mut ResourceData) -> Result<()> {
        let type_name = self.kind.type_name();
        tracing::debug!(id = %d.id_string(type_name), "beginning update");

        self.kind.validate_update(d)?;
        bounded(Operation::Update, d.timeouts(), self.update_remote(client, d)).await?;

        tracing::debug!(id = %d.id_string(type_name), "update finished successfully");

        self.read(client, d).await
    }

    async fn update_remote(&self, client: &K::Client, d: &ResourceData) -> Result<()> {
        self.kind.update(client, d).await?;

        if let Some(key) = self.kind.tags_attribute() {
            if d.has_change(key) {
                let remote = self.kind.fetch(client, d).await?;
                let patch = diff_tags(&self.kind.remote_tags(&remote), &d.get_map(key));
                if !patch.is_empty() {
                    self.kind.patch_tags(client, d, &patch).await?;
                }
            }
        }

        Ok(())
    }

    /// Deletes the remote object; an already absent object counts as deleted
    pub async fn delete(&self, client: &K::Client, d: &mut ResourceData) -> Result<()> {
        let type_name = self.kind.type_name();
        tracing::debug!(id = %d.id_string(type_name), "beginning delete");
        match bounded(Operation::Delete, d.timeouts(), self.kind.delete(client, d)).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::debug!(id = %d.id_string(type_name), "already deleted");
            }
            Err(e) => return Err(e),
        }
        d.set_id("");

        tracing::debug!(id = %d.id_string(type_name), "delete finished successfully");
        Ok(())
    }

    /// Existence check without a full read
    pub async fn exists(&self, client: &K::Client, d: &mut ResourceData) -> Result<bool> {
        if d.id().is_empty() {
            return Ok(false);
        }
        match bounded(Operation::Read, d.timeouts(), self.kind.fetch(client, d)).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => {
                d.set_id("");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Rebuilds a full record from an identifier alone
    pub async fn import(
        &self,
        client: &K::Client,
        raw_id: &str,
        timeouts: Timeouts,
    ) -> Result<ResourceData> {
        let mut d = ResourceData::new(self.schema.clone()).with_timeouts(timeouts);
        self.kind.import_id(raw_id, &mut d)?;
        self.read(client, &mut d).await?;
        Ok(d)
    }
}

/// Object-safe view of a [`Reconciler`], used to register heterogeneous
/// kinds sharing one client type
#[async_trait]
pub trait Lifecycle<C: ?Sized + Send + Sync>: Send + Sync {
    fn type_name(&self) -> &'static str;
    fn schema(&self) -> Arc<Schema>;
    fn validate(&self, d: &ResourceData) -> Result<()>;
    async fn create(&self, client: &C, d: &mut ResourceData) -> Result<()>;
    async fn read(&self, client: &C, d: &mut ResourceData) -> Result<()>;
    async fn refresh(&self, client: &C, d: &mut ResourceData) -> Result<bool>;
    async fn update(&self, client: &C, d: &mut ResourceData) -> Result<()>;
    async fn delete(&self, client: &C, d: &mut ResourceData) -> Result<()>;
    async fn exists(&self, client: &C, d: &mut ResourceData) -> Result<bool>;
    async fn import(&self, client: &C, raw_id: &str, timeouts: Timeouts) -> Result<ResourceData>;
}

#[async_trait]
impl<K: ResourceKind> Lifecycle<K::Client> for Reconciler<K> {
    fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    fn validate(&self, d: &ResourceData) -> Result<()> {
        Reconciler::validate(self, d)
    }

    async fn create(&self, client: &K::Client, d: &mut ResourceData) -> Result<()> {
        Reconciler::create(self, client, d).await
    }

    async fn read(&self, client: &K::Client, d: &mut ResourceData) -> Result<()> {
        Reconciler::read(self, client, d).await
    }

    async fn refresh(&self, client: &K::Client, d: &mut ResourceData) -> Result<bool> {
        Reconciler::refresh(self, client, d).await
    }

    async fn update(&self, client: &K::Client, d: &mut ResourceData) -> Result<()> {
        Reconciler::update(self, client, d).await
    }

    async fn delete(&self, client: &K::Client, d: &mut ResourceData) -> Result<()> {
        Reconciler::delete(self, client, d).await
    }

    async fn exists(&self, client: &K::Client, d: &mut ResourceData) -> Result<bool> {
        Reconciler::exists(self, client, d).await
    }

    async fn import(
        &self,
        client: &K::Client,
        raw_id: &str,
        timeouts: Timeouts,
    ) -> Result<ResourceData> {
        Reconciler::import(self, client, raw_id, timeouts).await
    }
}

/// A read-only lookup exposed to the host
#[async_trait]
pub trait DataSource<C: ?Sized + Send + Sync>: Send + Sync {
    fn type_name(&self) -> &'static str;
    fn schema(&self) -> Schema;
    async fn read(&self, client: &C, d: &mut ResourceData) -> Result<()>;
}

/// Validates the lookup criteria and runs a data source read under the
/// read timeout
pub async fn read_data_source<C>(
    source: &dyn DataSource<C>,
    client: &C,
    d: &mut ResourceData,
) -> Result<()>
where
    C: ?Sized + Send + Sync,
{
    let type_name = source.type_name();
    tracing::debug!(id = %d.id_string(type_name), "beginning read");

    d.schema().validate(d.attributes())?;
    bounded(Operation::Read, d.timeouts(), source.read(client, d)).await?;
    d.commit();

    tracing::debug!(id = %d.id_string(type_name), "read finished successfully");
    Ok(())
}
