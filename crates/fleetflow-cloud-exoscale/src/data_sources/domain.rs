//! `exoscale_domain` data source

use crate::api::ComputeApi;
use async_trait::async_trait;
use fleetflow_cloud::{Attribute, CloudError, DataSource, ResourceData, Result, Schema};

pub const TYPE_NAME: &str = "exoscale_domain";

pub struct DomainLookup;

#[async_trait]
impl DataSource<dyn ComputeApi> for DomainLookup {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::new("Fetch Exoscale DNS Domains data.")
            .with_attribute("name", Attribute::required_string().describe("Name of the Domain"))
    }

    async fn read(&self, client: &dyn ComputeApi, d: &mut ResourceData) -> Result<()> {
        let name = d.get_str("name").to_string();

        let domain = client
            .list_dns_domains()
            .await?
            .into_iter()
            .find(|domain| domain.unicode_name == name)
            .ok_or_else(|| CloudError::NotFound(format!("domain {:?} not found", name)))?;

        d.set_id(domain.id.as_str());
        d.set("name", domain.unicode_name.as_str())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::DnsDomain;
    use crate::mock::MemoryComputeApi;
    use fleetflow_cloud::read_data_source;
    use serde_json::json;
    use std::sync::Arc;

    async fn lookup(api: &MemoryComputeApi, name: &str) -> Result<ResourceData> {
        let config = json!({"name": name}).as_object().cloned().unwrap();
        let mut d = ResourceData::for_create(Arc::new(DomainLookup.schema()), config);
        read_data_source::<dyn ComputeApi>(&DomainLookup, api, &mut d).await?;
        Ok(d)
    }

    #[tokio::test]
    async fn test_lookup_by_unicode_name() {
        let api = MemoryComputeApi::new();
        api.insert_dns_domain(DnsDomain {
            id: "dom-7".into(),
            name: "xn--caf-dma.ch".into(),
            unicode_name: "café.ch".into(),
        });

        let d = lookup(&api, "café.ch").await.unwrap();
        assert_eq!(d.id(), "dom-7");
        assert_eq!(d.get_str("name"), "café.ch");
    }

    #[tokio::test]
    async fn test_missing_domain() {
        let api = MemoryComputeApi::new();
        let err = lookup(&api, "example.org").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("domain \"example.org\" not found"));
    }
}
