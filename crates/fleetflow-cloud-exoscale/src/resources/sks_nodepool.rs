//! `exoscale_sks_nodepool`: node pools of managed Kubernetes clusters

use crate::api::{ComputeApi, SksNodepool, SksNodepoolRequest, SksNodepoolUpdate};
use async_trait::async_trait;
use fleetflow_cloud::{
    Attribute, AttributeType, Check, CloudError, ResourceData, ResourceKind, Result, Schema,
};
use serde_json::json;

pub const TYPE_NAME: &str = "exoscale_sks_nodepool";
pub const DEFAULT_DISK_SIZE: i64 = 50;

/// Attributes changed through the update request; `size` has its own RPC
const UPDATABLE: &[&str] = &[
    "name",
    "description",
    "instance_type",
    "disk_size",
    "security_group_ids",
    "labels",
];

pub struct SksNodepoolResource;

/// Splits an import identifier of the form `<cluster-id>/<nodepool-id>@<zone>`
pub fn parse_import_id(raw: &str) -> Result<(&str, &str, &str)> {
    let invalid = || {
        CloudError::Validation(format!(
            "invalid import ID {:?}, expected <cluster-id>/<nodepool-id>@<zone>",
            raw
        ))
    };

    let (ids, zone) = raw.split_once('@').ok_or_else(invalid)?;
    let (cluster_id, id) = ids.split_once('/').ok_or_else(invalid)?;
    if cluster_id.is_empty() || id.is_empty() || zone.is_empty() {
        return Err(invalid());
    }
    Ok((cluster_id, id, zone))
}

#[async_trait]
impl ResourceKind for SksNodepoolResource {
    type Client = dyn ComputeApi;
    type Remote = SksNodepool;

    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::new("Manage Exoscale SKS Nodepools.")
            .with_attribute(
                "zone",
                Attribute::required_string().force_new().describe("The Exoscale Zone name."),
            )
            .with_attribute(
                "cluster_id",
                Attribute::required_string()
                    .force_new()
                    .describe("The parent SKS cluster ID."),
            )
            .with_attribute("name", Attribute::required_string().describe("The nodepool name."))
            .with_attribute(
                "description",
                Attribute::optional_string().describe("A free-form text describing the nodepool."),
            )
            .with_attribute(
                "instance_type",
                Attribute::required_string()
                    .describe("The managed compute instances type (`<family>.<size>`)."),
            )
            .with_attribute(
                "disk_size",
                Attribute::optional_int()
                    .with_default(DEFAULT_DISK_SIZE)
                    .check(Check::AtLeast(20))
                    .describe("The managed compute instances disk size (GiB)."),
            )
            .with_attribute(
                "size",
                Attribute::required_int()
                    .check(Check::AtLeast(1))
                    .describe("The number of managed compute instances."),
            )
            .with_attribute(
                "anti_affinity_group_ids",
                Attribute::optional_set()
                    .force_new()
                    .describe("A list of anti-affinity group IDs."),
            )
            .with_attribute(
                "security_group_ids",
                Attribute::optional_set().describe("A list of security group IDs."),
            )
            .with_attribute(
                "labels",
                Attribute::optional_map().describe("A map of key/value labels."),
            )
            .with_attribute(
                "instance_pool_id",
                Attribute::computed_string().describe("The underlying instance pool ID."),
            )
            .with_attribute(
                "template_id",
                Attribute::computed_string().describe("The managed instances template ID."),
            )
            .with_attribute(
                "version",
                Attribute::computed_string().describe("The managed instances version."),
            )
            .with_attribute(
                "state",
                Attribute::computed_string().describe("The current nodepool state."),
            )
            .with_attribute(
                "created_at",
                Attribute::computed(AttributeType::String)
                    .describe("The pool creation date."),
            )
    }

    async fn create(&self, client: &dyn ComputeApi, d: &ResourceData) -> Result<String> {
        let disk_size = match d.get_int("disk_size") {
            0 => DEFAULT_DISK_SIZE,
            size => size,
        };
        let req = SksNodepoolRequest {
            name: d.get_str("name").to_string(),
            description: d.get_str("description").to_string(),
            instance_type: d.get_str("instance_type").to_string(),
            disk_size,
            size: d.get_int("size"),
            anti_affinity_group_ids: d.get_set("anti_affinity_group_ids"),
            security_group_ids: d.get_set("security_group_ids"),
            labels: d.get_map("labels"),
        };

        let nodepool = client
            .create_sks_nodepool(d.get_str("zone"), d.get_str("cluster_id"), &req)
            .await?;
        Ok(nodepool.id)
    }

    async fn fetch(&self, client: &dyn ComputeApi, d: &ResourceData) -> Result<SksNodepool> {
        client
            .get_sks_nodepool(d.get_str("zone"), d.get_str("cluster_id"), d.id())
            .await
    }

    fn apply(&self, d: &mut ResourceData, nodepool: &SksNodepool) -> Result<()> {
        d.set("name", nodepool.name.as_str())?;
        d.set("description", nodepool.description.as_str())?;
        d.set("instance_type", nodepool.instance_type.as_str())?;
        d.set("disk_size", nodepool.disk_size)?;
        d.set("size", nodepool.size)?;
        d.set(
            "anti_affinity_group_ids",
            nodepool.anti_affinity_group_ids.clone(),
        )?;
        d.set("security_group_ids", nodepool.security_group_ids.clone())?;
        d.set("labels", json!(nodepool.labels))?;
        d.set("instance_pool_id", nodepool.instance_pool_id.as_str())?;
        d.set("template_id", nodepool.template_id.as_str())?;
        d.set("version", nodepool.version.as_str())?;
        d.set("state", nodepool.state.as_str())?;
        d.set("created_at", nodepool.created_at.as_str())?;
        Ok(())
    }

    async fn update(&self, client: &dyn ComputeApi, d: &ResourceData) -> Result<()> {
        let zone = d.get_str("zone");
        let cluster_id = d.get_str("cluster_id");

        if UPDATABLE.iter().any(|key| d.has_change(key)) {
            let req = SksNodepoolUpdate {
                name: d.get_str("name").to_string(),
                description: d.get_str("description").to_string(),
                instance_type: d.get_str("instance_type").to_string(),
                disk_size: d.get_int("disk_size"),
                security_group_ids: d.get_set("security_group_ids"),
                labels: d.get_map("labels"),
            };
            client
                .update_sks_nodepool(zone, cluster_id, d.id(), &req)
                .await?;
        }

        if d.has_change("size") {
            tracing::debug!(
                id = %d.id_string(TYPE_NAME),
                size = d.get_int("size"),
                "scaling nodepool"
            );
            client
                .scale_sks_nodepool(zone, cluster_id, d.id(), d.get_int("size"))
                .await?;
        }

        Ok(())
    }

    async fn delete(&self, client: &dyn ComputeApi, d: &ResourceData) -> Result<()> {
        client
            .delete_sks_nodepool(d.get_str("zone"), d.get_str("cluster_id"), d.id())
            .await
    }

    fn import_id(&self, raw: &str, d: &mut ResourceData) -> Result<()> {
        let (cluster_id, id, zone) = parse_import_id(raw)?;
        d.set_id(id);
        d.set("cluster_id", cluster_id)?;
        d.set("zone", zone)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MemoryComputeApi;
    use fleetflow_cloud::{Reconciler, Timeouts};
    use serde_json::{Map, Value};

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    async fn created(api: &MemoryComputeApi) -> ResourceData {
        let r = Reconciler::new(SksNodepoolResource);
        let mut d = ResourceData::for_create(
            r.schema(),
            obj(json!({
                "zone": "ch-gva-2",
                "cluster_id": "c-1",
                "name": "workers",
                "instance_type": "standard.medium",
                "size": 2,
                "labels": {"role": "worker"}
            })),
        );
        r.create(api, &mut d).await.unwrap();
        d
    }

    #[test]
    fn test_parse_import_id() {
        assert_eq!(
            parse_import_id("c-1/np-2@ch-gva-2").unwrap(),
            ("c-1", "np-2", "ch-gva-2")
        );
        assert!(parse_import_id("np-2@ch-gva-2").is_err());
        assert!(parse_import_id("c-1/np-2").is_err());
        assert!(parse_import_id("/np-2@ch-gva-2").is_err());
    }

    #[test]
    fn test_schema_checks() {
        let schema = SksNodepoolResource.schema();
        let err = schema
            .validate(&obj(json!({
                "zone": "ch-gva-2",
                "cluster_id": "c-1",
                "name": "workers",
                "instance_type": "standard.medium",
                "size": 0,
                "disk_size": 10
            })))
            .unwrap_err()
            .to_string();
        assert!(err.contains("\"size\""));
        assert!(err.contains("\"disk_size\""));
    }

    #[tokio::test]
    async fn test_create_fills_computed_attributes() {
        let api = MemoryComputeApi::new();
        let d = created(&api).await;

        assert_eq!(d.get_int("disk_size"), 50);
        assert_eq!(d.get_str("state"), "running");
        assert!(!d.get_str("instance_pool_id").is_empty());
        assert_eq!(d.get_map("labels").get("role").map(String::as_str), Some("worker"));
    }

    #[tokio::test]
    async fn test_size_change_uses_scale() {
        let api = MemoryComputeApi::new();
        let d = created(&api).await;
        let r = Reconciler::new(SksNodepoolResource);

        let mut desired = d.attributes().clone();
        desired.insert("size".into(), json!(5));
        let mut planned = ResourceData::planned(r.schema(), d.id(), d.attributes().clone(), desired);
        r.update(&api, &mut planned).await.unwrap();

        let calls = api.calls();
        assert!(calls.contains(&"scale_sks_nodepool".to_string()));
        assert!(!calls.contains(&"update_sks_nodepool".to_string()));
        assert_eq!(api.nodepool(d.id()).unwrap().size, 5);
        assert_eq!(planned.get_int("size"), 5);
    }

    #[tokio::test]
    async fn test_rename_uses_update() {
        let api = MemoryComputeApi::new();
        let d = created(&api).await;
        let r = Reconciler::new(SksNodepoolResource);

        let mut desired = d.attributes().clone();
        desired.insert("name".into(), json!("workers-v2"));
        desired.insert("disk_size".into(), json!(100));
        let mut planned = ResourceData::planned(r.schema(), d.id(), d.attributes().clone(), desired);
        r.update(&api, &mut planned).await.unwrap();

        let calls = api.calls();
        assert!(calls.contains(&"update_sks_nodepool".to_string()));
        assert!(!calls.contains(&"scale_sks_nodepool".to_string()));
        let nodepool = api.nodepool(d.id()).unwrap();
        assert_eq!(nodepool.name, "workers-v2");
        assert_eq!(nodepool.disk_size, 100);
        assert_eq!(planned.id(), d.id());
    }

    #[tokio::test]
    async fn test_import() {
        let api = MemoryComputeApi::new();
        let d = created(&api).await;
        let r = Reconciler::new(SksNodepoolResource);

        let raw = format!("c-1/{}@ch-gva-2", d.id());
        let imported = r.import(&api, &raw, Timeouts::default()).await.unwrap();
        assert_eq!(imported.id(), d.id());
        assert_eq!(imported.get_str("cluster_id"), "c-1");
        assert_eq!(imported.get_str("zone"), "ch-gva-2");
        assert_eq!(imported.get_str("name"), "workers");

        let err = r
            .import(&api, &format!("c-2/{}@ch-gva-2", d.id()), Timeouts::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
