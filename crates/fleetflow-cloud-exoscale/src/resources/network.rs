//! `exoscale_network`: private networks

use crate::api::{ComputeApi, NETWORK_RESOURCE_TYPE, Network, NetworkRequest};
use async_trait::async_trait;
use fleetflow_cloud::{
    Attribute, Check, CloudError, ResourceData, ResourceKind, Result, Schema, TagPatch, Tags,
    resolve_zone, search_zones,
};
use serde_json::json;

pub const TYPE_NAME: &str = "exoscale_network";

const RANGE_DESCRIPTION: &str = "The first/last IP addresses used by the DHCP service for dynamic leases. Required for *managed* private networks.";

pub struct NetworkResource;

/// `None` for an empty attribute
fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn display_text(d: &ResourceData) -> String {
    match d.get_str("display_text") {
        "" => d.get_str("name").to_string(),
        text => text.to_string(),
    }
}

#[async_trait]
impl ResourceKind for NetworkResource {
    type Client = dyn ComputeApi;
    type Remote = Network;

    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::new("Manage Exoscale Private Networks.")
            .with_attribute(
                "zone",
                Attribute::required_string()
                    .force_new()
                    .describe("The Exoscale Zone name."),
            )
            .with_attribute(
                "network_offering",
                Attribute::optional_string().deprecate(
                    "This attribute is deprecated, please remove it from your configuration.",
                ),
            )
            .with_attribute(
                "name",
                Attribute::required_string().describe("The private network name."),
            )
            .with_attribute(
                "display_text",
                Attribute::optional_string()
                    .with_computed()
                    .describe("A free-form text describing the network."),
            )
            .with_attribute(
                "start_ip",
                Attribute::optional_string()
                    .check(Check::IpAddress)
                    .describe(RANGE_DESCRIPTION),
            )
            .with_attribute(
                "end_ip",
                Attribute::optional_string()
                    .check(Check::IpAddress)
                    .describe(RANGE_DESCRIPTION),
            )
            .with_attribute(
                "netmask",
                Attribute::optional_string().check(Check::IpAddress).describe(
                    "The network mask defining the IP network allowed for static leases. Required for *managed* private networks.",
                ),
            )
            .with_tags("tags")
    }

    fn validate(&self, d: &ResourceData) -> Result<()> {
        let start = d.get_str("start_ip");
        let end = d.get_str("end_ip");
        if start.is_empty() != end.is_empty() {
            return Err(CloudError::Validation(
                "start_ip and end_ip must be both specified".to_string(),
            ));
        }
        if !start.is_empty() && d.get_str("netmask").is_empty() {
            return Err(CloudError::Validation(
                "netmask must be specified with start_ip and end_ip".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_update(&self, d: &ResourceData) -> Result<()> {
        d.reject_cleared(&["start_ip", "end_ip"])
    }

    async fn create(&self, client: &dyn ComputeApi, d: &ResourceData) -> Result<String> {
        let zone = resolve_zone(client, d.get_str("zone")).await?;

        let req = NetworkRequest {
            name: d.get_str("name").to_string(),
            display_text: display_text(d),
            zone_id: zone.id,
            start_ip: non_empty(d.get_str("start_ip")),
            end_ip: non_empty(d.get_str("end_ip")),
            netmask: non_empty(d.get_str("netmask")),
        };

        let network = client.create_network(&req).await?;
        Ok(network.id)
    }

    /// The network's zone is not part of its identifier, so every zone is
    /// searched in turn
    async fn fetch(&self, client: &dyn ComputeApi, d: &ResourceData) -> Result<Network> {
        let id = d.id().to_string();
        if id.is_empty() {
            return Err(CloudError::NotFound("network has no ID".to_string()));
        }

        search_zones(client, |zone| {
            let id = id.clone();
            async move {
                let networks = client.list_networks(&zone.id, Some(&id)).await?;
                Ok(networks.into_iter().next())
            }
        })
        .await
        .map_err(|e| {
            if e.is_not_found() {
                CloudError::NotFound(format!("no network found for ID {}", id))
            } else {
                e
            }
        })
    }

    fn apply(&self, d: &mut ResourceData, network: &Network) -> Result<()> {
        d.set_id(network.id.clone());
        d.set("name", network.name.as_str())?;
        d.set("display_text", network.display_text.as_str())?;
        d.set("zone", network.zone_name.as_str())?;

        if network.is_managed() {
            d.set("start_ip", network.start_ip.clone())?;
            d.set("end_ip", network.end_ip.clone())?;
            d.set("netmask", network.netmask.clone())?;
        } else {
            d.set("start_ip", "")?;
            d.set("end_ip", "")?;
            d.set("netmask", "")?;
        }

        d.set("tags", json!(network.tags))?;
        Ok(())
    }

    async fn update(&self, client: &dyn ComputeApi, d: &ResourceData) -> Result<()> {
        let req = NetworkRequest {
            name: d.get_str("name").to_string(),
            display_text: display_text(d),
            zone_id: String::new(),
            start_ip: non_empty(d.get_str("start_ip")),
            end_ip: non_empty(d.get_str("end_ip")),
            netmask: non_empty(d.get_str("netmask")),
        };
        client.update_network(d.id(), &req).await
    }

    async fn delete(&self, client: &dyn ComputeApi, d: &ResourceData) -> Result<()> {
        client.delete_network(d.id()).await
    }

    fn tags_attribute(&self) -> Option<&'static str> {
        Some("tags")
    }

    fn remote_tags(&self, network: &Network) -> Tags {
        network.tags.clone()
    }

    async fn patch_tags(
        &self,
        client: &dyn ComputeApi,
        d: &ResourceData,
        patch: &TagPatch,
    ) -> Result<()> {
        if !patch.create.is_empty() {
            client
                .create_tags(NETWORK_RESOURCE_TYPE, d.id(), &patch.create)
                .await?;
        }
        if !patch.update.is_empty() {
            client
                .update_tags(NETWORK_RESOURCE_TYPE, d.id(), &patch.update)
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MemoryComputeApi;
    use fleetflow_cloud::{ApiErrorKind, Reconciler};
    use serde_json::{Map, Value};

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    async fn create(api: &MemoryComputeApi, config: Value) -> Result<ResourceData> {
        let r = Reconciler::new(NetworkResource);
        let mut d = ResourceData::for_create(r.schema(), obj(config));
        r.create(api, &mut d).await.map(|_| d)
    }

    #[tokio::test]
    async fn test_create_managed_network() {
        let api = MemoryComputeApi::new();
        let d = create(
            &api,
            json!({
                "zone": "de-fra-1",
                "name": "backend",
                "start_ip": "10.0.0.10",
                "end_ip": "10.0.0.50",
                "netmask": "255.255.255.0",
                "tags": {"env": "prod"}
            }),
        )
        .await
        .unwrap();

        let network = api.network(d.id()).unwrap();
        assert_eq!(network.zone_name, "de-fra-1");
        assert_eq!(network.display_text, "backend");
        assert_eq!(d.get_str("display_text"), "backend");
        assert_eq!(d.get_str("netmask"), "255.255.255.0");
        assert_eq!(d.get_map("tags").get("env").map(String::as_str), Some("prod"));
    }

    #[tokio::test]
    async fn test_create_requires_complete_range() {
        let api = MemoryComputeApi::new();
        let err = create(
            &api,
            json!({"zone": "ch-gva-2", "name": "n", "start_ip": "10.0.0.1"}),
        )
        .await
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: start_ip and end_ip must be both specified"
        );

        let err = create(
            &api,
            json!({"zone": "ch-gva-2", "name": "n", "start_ip": "10.0.0.1", "end_ip": "10.0.0.9"}),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("netmask must be specified"));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_ip() {
        let api = MemoryComputeApi::new();
        let err = create(
            &api,
            json!({"zone": "ch-gva-2", "name": "n", "start_ip": "nope", "end_ip": "10.0.0.9", "netmask": "255.255.255.0"}),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CloudError::Validation(_)));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_zone() {
        let api = MemoryComputeApi::new();
        let err = create(&api, json!({"zone": "mars-1", "name": "n"}))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(!api.calls().contains(&"create_network".to_string()));
    }

    #[tokio::test]
    async fn test_tag_failure_destroys_network() {
        let api = MemoryComputeApi::new();
        api.fail_on("create_tags", ApiErrorKind::ParamError, "invalid tag");

        let err = create(&api, json!({"zone": "ch-gva-2", "name": "n", "tags": {"a": "1"}}))
            .await
            .unwrap_err();

        assert!(err.is_param_error());
        assert_eq!(
            api.calls(),
            vec!["list_zones", "create_network", "create_tags", "delete_network"]
        );
        assert!(api.network("net-1").is_none());
    }

    #[tokio::test]
    async fn test_read_searches_every_zone() {
        let api = MemoryComputeApi::new();
        let d = create(&api, json!({"zone": "at-vie-1", "name": "far"}))
            .await
            .unwrap();

        let r = Reconciler::new(NetworkResource);
        let mut read = ResourceData::from_state(r.schema(), d.id(), Map::new());
        r.read(&api, &mut read).await.unwrap();
        assert_eq!(read.get_str("zone"), "at-vie-1");
        assert_eq!(read.attributes(), d.attributes());
    }

    #[tokio::test]
    async fn test_read_missing_network() {
        let api = MemoryComputeApi::new();
        let r = Reconciler::new(NetworkResource);
        let mut d = ResourceData::from_state(r.schema(), "net-404", Map::new());

        let err = r.read(&api, &mut d).await.unwrap_err();
        assert_eq!(err.to_string(), "Resource not found: no network found for ID net-404");

        assert!(!r.exists(&api, &mut d).await.unwrap());
        assert_eq!(d.id(), "");
    }

    #[tokio::test]
    async fn test_update_in_place_and_tags() {
        let api = MemoryComputeApi::new();
        let d = create(
            &api,
            json!({"zone": "ch-gva-2", "name": "n", "tags": {"a": "1", "b": "2"}}),
        )
        .await
        .unwrap();
        let id = d.id().to_string();

        let r = Reconciler::new(NetworkResource);
        let mut planned = ResourceData::planned(
            r.schema(),
            d.id(),
            d.attributes().clone(),
            obj(json!({"zone": "ch-gva-2", "name": "renamed", "tags": {"b": "3", "c": "4"}})),
        );
        r.update(&api, &mut planned).await.unwrap();

        assert_eq!(planned.id(), id);
        let network = api.network(&id).unwrap();
        assert_eq!(network.name, "renamed");
        assert_eq!(network.tags.len(), 3);
        assert_eq!(network.tags.get("b").map(String::as_str), Some("3"));
    }

    #[tokio::test]
    async fn test_update_rejects_clearing_range() {
        let api = MemoryComputeApi::new();
        let d = create(
            &api,
            json!({
                "zone": "ch-gva-2",
                "name": "n",
                "start_ip": "10.0.0.10",
                "end_ip": "10.0.0.50",
                "netmask": "255.255.255.0"
            }),
        )
        .await
        .unwrap();
        let calls = api.calls().len();

        let r = Reconciler::new(NetworkResource);
        let mut planned = ResourceData::planned(
            r.schema(),
            d.id(),
            d.attributes().clone(),
            obj(json!({"zone": "ch-gva-2", "name": "n", "netmask": "255.255.255.0"})),
        );
        let err = r.update(&api, &mut planned).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "Validation failed: new value of \"start_ip\" cannot be empty. old value was 10.0.0.10. The resource must be recreated instead"
        );
        assert_eq!(api.calls().len(), calls);
        assert_eq!(
            api.network(d.id()).unwrap().start_ip.as_deref(),
            Some("10.0.0.10")
        );
    }

    #[tokio::test]
    async fn test_delete() {
        let api = MemoryComputeApi::new();
        let mut d = create(&api, json!({"zone": "ch-gva-2", "name": "n"}))
            .await
            .unwrap();
        let id = d.id().to_string();

        let r = Reconciler::new(NetworkResource);
        r.delete(&api, &mut d).await.unwrap();
        assert!(api.network(&id).is_none());
        assert_eq!(d.id(), "");
    }
}
