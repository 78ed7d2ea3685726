//! `exoscale_domain`: DNS domains

use crate::api::{ComputeApi, DnsDomain};
use async_trait::async_trait;
use fleetflow_cloud::{Attribute, ResourceData, ResourceKind, Result, Schema};

pub const TYPE_NAME: &str = "exoscale_domain";

pub struct DomainResource;

#[async_trait]
impl ResourceKind for DomainResource {
    type Client = dyn ComputeApi;
    type Remote = DnsDomain;

    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::new("Manage Exoscale DNS Domains.")
            .with_attribute(
                "name",
                Attribute::required_string()
                    .force_new()
                    .describe("The DNS domain name."),
            )
            .with_attribute(
                "unicode_name",
                Attribute::computed_string().describe("The domain name in Unicode form."),
            )
    }

    async fn create(&self, client: &dyn ComputeApi, d: &ResourceData) -> Result<String> {
        let domain = client.create_dns_domain(d.get_str("name")).await?;
        Ok(domain.id)
    }

    async fn fetch(&self, client: &dyn ComputeApi, d: &ResourceData) -> Result<DnsDomain> {
        client.get_dns_domain(d.id()).await
    }

    fn apply(&self, d: &mut ResourceData, domain: &DnsDomain) -> Result<()> {
        // Either spelling of the declared name is kept as is
        let current = d.get_str("name");
        let known = !current.is_empty() && (current == domain.name || current == domain.unicode_name);
        if !known {
            d.set("name", domain.unicode_name.as_str())?;
        }
        d.set("unicode_name", domain.unicode_name.as_str())?;
        Ok(())
    }

    async fn delete(&self, client: &dyn ComputeApi, d: &ResourceData) -> Result<()> {
        client.delete_dns_domain(d.id()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MemoryComputeApi;
    use fleetflow_cloud::{Reconciler, Timeouts};
    use serde_json::json;

    #[tokio::test]
    async fn test_create_read_import() {
        let api = MemoryComputeApi::new();
        let r = Reconciler::new(DomainResource);
        let config = json!({"name": "example.ch"}).as_object().cloned().unwrap();
        let mut d = ResourceData::for_create(r.schema(), config);

        r.create(&api, &mut d).await.unwrap();
        assert_eq!(d.get_str("unicode_name"), "example.ch");

        let imported = r.import(&api, d.id(), Timeouts::default()).await.unwrap();
        assert_eq!(imported.attributes(), d.attributes());
    }

    #[tokio::test]
    async fn test_punycode_name_is_preserved() {
        let api = MemoryComputeApi::new();
        api.insert_dns_domain(DnsDomain {
            id: "dom-9".into(),
            name: "xn--caf-dma.ch".into(),
            unicode_name: "café.ch".into(),
        });

        let r = Reconciler::new(DomainResource);
        let attrs = json!({"name": "xn--caf-dma.ch"}).as_object().cloned().unwrap();
        let mut d = ResourceData::from_state(r.schema(), "dom-9", attrs);
        r.read(&api, &mut d).await.unwrap();

        assert_eq!(d.get_str("name"), "xn--caf-dma.ch");
        assert_eq!(d.get_str("unicode_name"), "café.ch");
    }
}
