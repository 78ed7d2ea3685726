//! `exoscale_affinity`: anti-affinity groups
//!
//! Every user-settable attribute forces a new group, so there is no
//! in-place update.

use crate::api::{AntiAffinityGroup, AntiAffinityGroupRequest, ComputeApi};
use async_trait::async_trait;
use fleetflow_cloud::{Attribute, AttributeType, ResourceData, ResourceKind, Result, Schema};

pub const TYPE_NAME: &str = "exoscale_affinity";
pub const DEFAULT_GROUP_TYPE: &str = "host anti-affinity";

pub struct AffinityResource;

#[async_trait]
impl ResourceKind for AffinityResource {
    type Client = dyn ComputeApi;
    type Remote = AntiAffinityGroup;

    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::new("Manage Exoscale Anti-Affinity Groups.")
            .with_attribute(
                "name",
                Attribute::required_string()
                    .force_new()
                    .describe("The anti-affinity group name."),
            )
            .with_attribute(
                "description",
                Attribute::optional_string()
                    .force_new()
                    .describe("A free-form text describing the group."),
            )
            .with_attribute(
                "type",
                Attribute::optional_string()
                    .force_new()
                    .with_default(DEFAULT_GROUP_TYPE)
                    .describe("The type of the group (`host anti-affinity` is the only supported value)."),
            )
            .with_attribute(
                "virtual_machine_ids",
                Attribute::computed(AttributeType::Set)
                    .describe("The compute instances (IDs) members of the group."),
            )
    }

    async fn create(&self, client: &dyn ComputeApi, d: &ResourceData) -> Result<String> {
        let group_type = match d.get_str("type") {
            "" => DEFAULT_GROUP_TYPE,
            t => t,
        };
        let req = AntiAffinityGroupRequest {
            name: d.get_str("name").to_string(),
            description: d.get_str("description").to_string(),
            group_type: group_type.to_string(),
        };
        let group = client.create_anti_affinity_group(&req).await?;
        Ok(group.id)
    }

    async fn fetch(&self, client: &dyn ComputeApi, d: &ResourceData) -> Result<AntiAffinityGroup> {
        client.get_anti_affinity_group(d.id()).await
    }

    fn apply(&self, d: &mut ResourceData, group: &AntiAffinityGroup) -> Result<()> {
        d.set("name", group.name.as_str())?;
        d.set("description", group.description.as_str())?;
        d.set("type", group.group_type.as_str())?;
        d.set("virtual_machine_ids", group.virtual_machine_ids.clone())?;
        Ok(())
    }

    async fn delete(&self, client: &dyn ComputeApi, d: &ResourceData) -> Result<()> {
        client.delete_anti_affinity_group(d.id()).await
    }
}
