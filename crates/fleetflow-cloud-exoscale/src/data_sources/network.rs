//! `exoscale_network` data source

use crate::api::ComputeApi;
use async_trait::async_trait;
use fleetflow_cloud::{
    Attribute, DataSource, ResourceData, Result, Schema, Selector, find_unique, resolve_zone,
};

pub const TYPE_NAME: &str = "exoscale_network";

const RANGE_DESCRIPTION: &str =
    "The first/last IPv4 addresses used by the DHCP service for dynamic leases.";

pub struct NetworkLookup;

#[async_trait]
impl DataSource<dyn ComputeApi> for NetworkLookup {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::new("Fetch Exoscale Private Networks data.")
            .with_attribute(
                "zone",
                Attribute::required_string().describe("The Exoscale Zone name."),
            )
            .with_attribute(
                "id",
                Attribute::optional_string()
                    .conflicts_with(&["name"])
                    .describe("The private network ID to match (conflicts with `name`)."),
            )
            .with_attribute(
                "name",
                Attribute::optional_string()
                    .conflicts_with(&["id"])
                    .describe("The network name to match (conflicts with `id`)."),
            )
            .with_attribute(
                "description",
                Attribute::computed_string().describe("The private network description."),
            )
            .with_attribute("start_ip", Attribute::computed_string().describe(RANGE_DESCRIPTION))
            .with_attribute("end_ip", Attribute::computed_string().describe(RANGE_DESCRIPTION))
            .with_attribute(
                "netmask",
                Attribute::computed_string().describe(
                    "The network mask defining the IPv4 network allowed for static leases.",
                ),
            )
    }

    async fn read(&self, client: &dyn ComputeApi, d: &mut ResourceData) -> Result<()> {
        let selector = Selector::from_data(d)?;
        let zone = resolve_zone(client, d.get_str("zone")).await?;

        let networks = client.list_networks(&zone.id, None).await?;
        let network = find_unique(
            networks,
            &selector,
            |n| n.id.as_str(),
            |n| n.name.as_str(),
            "network",
        )?;

        d.set_id(network.id.as_str());
        d.set("id", network.id.as_str())?;
        d.set("name", network.name.as_str())?;
        d.set("description", network.display_text.as_str())?;

        let managed = network.is_managed();
        let range = |value: &Option<String>| match (managed, value) {
            (true, Some(v)) => v.clone(),
            _ => String::new(),
        };
        d.set("start_ip", range(&network.start_ip))?;
        d.set("end_ip", range(&network.end_ip))?;
        d.set("netmask", range(&network.netmask))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Network;
    use crate::mock::MemoryComputeApi;
    use fleetflow_cloud::{CloudError, read_data_source};
    use serde_json::{Value, json};
    use std::sync::Arc;

    fn network(id: &str, name: &str, zone_id: &str) -> Network {
        Network {
            id: id.into(),
            name: name.into(),
            display_text: format!("{} network", name),
            zone_id: zone_id.into(),
            ..Default::default()
        }
    }

    async fn lookup(api: &MemoryComputeApi, config: Value) -> Result<ResourceData> {
        let source = NetworkLookup;
        let config = config.as_object().cloned().unwrap();
        let mut d = ResourceData::for_create(Arc::new(source.schema()), config);
        read_data_source::<dyn ComputeApi>(&source, api, &mut d).await?;
        Ok(d)
    }

    #[tokio::test]
    async fn test_lookup_by_name() {
        let api = MemoryComputeApi::new();
        let mut managed = network("n-1", "web", "zone-1");
        managed.start_ip = Some("10.0.0.10".into());
        managed.end_ip = Some("10.0.0.50".into());
        managed.netmask = Some("255.255.255.0".into());
        api.insert_network(managed);
        api.insert_network(network("n-2", "db", "zone-1"));

        let d = lookup(&api, json!({"zone": "ch-gva-2", "name": "web"}))
            .await
            .unwrap();
        assert_eq!(d.id(), "n-1");
        assert_eq!(d.get_str("id"), "n-1");
        assert_eq!(d.get_str("description"), "web network");
        assert_eq!(d.get_str("netmask"), "255.255.255.0");

        let d = lookup(&api, json!({"zone": "ch-gva-2", "id": "n-2"}))
            .await
            .unwrap();
        assert_eq!(d.get_str("name"), "db");
        assert_eq!(d.get_str("start_ip"), "");
    }

    #[tokio::test]
    async fn test_lookup_duplicate_name_is_ambiguous() {
        let api = MemoryComputeApi::new();
        api.insert_network(network("n-1", "web", "zone-1"));
        api.insert_network(network("n-2", "web", "zone-1"));
        // Same name in another zone does not count
        api.insert_network(network("n-3", "db", "zone-2"));

        let err = lookup(&api, json!({"zone": "ch-gva-2", "name": "web"}))
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::Ambiguous { .. }));
        assert!(
            err.to_string()
                .contains("please specify a unique ID instead")
        );

        let d = lookup(&api, json!({"zone": "ch-gva-2", "id": "n-2"}))
            .await
            .unwrap();
        assert_eq!(d.id(), "n-2");

        let err = lookup(&api, json!({"zone": "ch-gva-2", "name": "db"}))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_lookup_requires_criterion() {
        let api = MemoryComputeApi::new();
        let err = lookup(&api, json!({"zone": "lolnope"})).await.unwrap_err();
        assert!(
            err.to_string()
                .contains("either name or id must be specified")
        );
        assert!(api.calls().is_empty());

        let err = lookup(&api, json!({"zone": "ch-gva-2", "id": "n-1", "name": "web"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("conflicts with"));
    }
}
