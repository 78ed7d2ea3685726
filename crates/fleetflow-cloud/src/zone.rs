//! Zone resolution
//!
//! Zone names are resolved to identifiers on every call with a linear scan
//! over the zone listing. The listing is small and stable, so nothing is
//! cached.

use crate::error::{CloudError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// A named deployment region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
}

/// Source of the zone listing
#[async_trait]
pub trait ZoneDirectory: Send + Sync {
    async fn list_zones(&self) -> Result<Vec<Zone>>;
}

/// Resolves a zone name to its zone record
pub async fn resolve_zone<D>(directory: &D, name: &str) -> Result<Zone>
where
    D: ZoneDirectory + ?Sized,
{
    directory
        .list_zones()
        .await?
        .into_iter()
        .find(|zone| zone.name == name)
        .ok_or_else(|| CloudError::NotFound(format!("zone {:?} not found", name)))
}

/// Tries every zone in turn and returns the first match.
///
/// Zones answering with a parameter error (the object does not live there)
/// or not-found are skipped; any other error aborts the search.
pub async fn search_zones<D, T, F, Fut>(directory: &D, mut attempt: F) -> Result<T>
where
    D: ZoneDirectory + ?Sized,
    F: FnMut(Zone) -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    for zone in directory.list_zones().await? {
        let name = zone.name.clone();
        match attempt(zone).await {
            Ok(Some(found)) => return Ok(found),
            Ok(None) => continue,
            Err(e) if e.is_param_error() || e.is_not_found() => {
                tracing::trace!(zone = %name, "skipping zone: {}", e);
                continue;
            }
            Err(e) => return Err(e),
        }
    }

    Err(CloudError::NotFound("no zone holds the requested object".to_string()))
}
