//! `exoscale_instance_pool` and `exoscale_instance_pool_list` data sources

use crate::api::{ComputeApi, InstancePool, PoolInstance};
use async_trait::async_trait;
use fleetflow_cloud::{
    Attribute, AttributeType, DataSource, ResourceData, Result, Schema, Selector, find_unique,
};
use serde_json::{Map, Value, json};

pub const TYPE_NAME: &str = "exoscale_instance_pool";
pub const LIST_TYPE_NAME: &str = "exoscale_instance_pool_list";

/// Computed attributes shared by the single and the list lookups
const POOL_ATTRIBUTES: &[(&str, AttributeType, &str)] = &[
    ("description", AttributeType::String, "The instance pool description."),
    ("instance_type", AttributeType::String, "The managed compute instances type."),
    ("instance_prefix", AttributeType::String, "The string used to prefix the managed instances name."),
    ("template_id", AttributeType::String, "The managed compute instances template ID."),
    ("deploy_target_id", AttributeType::String, "The deploy target ID."),
    ("size", AttributeType::Int, "The number of managed instances."),
    ("disk_size", AttributeType::Int, "The managed instances disk size."),
    ("ipv6", AttributeType::Bool, "Whether IPv6 is enabled on managed instances."),
    ("key_pair", AttributeType::String, "The SSH key pair attached to the managed instances."),
    ("user_data", AttributeType::String, "cloud-init configuration."),
    ("state", AttributeType::String, "The pool state."),
    ("affinity_group_ids", AttributeType::Set, "The list of attached anti-affinity group IDs."),
    ("security_group_ids", AttributeType::Set, "The list of attached security group IDs."),
    ("network_ids", AttributeType::Set, "The list of attached private network IDs."),
    ("elastic_ip_ids", AttributeType::Set, "The list of attached elastic IP IDs."),
    ("labels", AttributeType::Map, "A map of key/value labels."),
    ("instances", AttributeType::List, "The list of managed instances."),
];

fn instance_attributes(instance: &PoolInstance) -> Value {
    json!({
        "id": instance.id,
        "name": instance.name,
        "public_ip_address": instance.public_ip_address.clone().unwrap_or_default(),
        "ipv6_address": instance.ipv6_address.clone().unwrap_or_default(),
    })
}

/// Flattens a pool into data source attributes
pub fn pool_attributes(pool: &InstancePool) -> Map<String, Value> {
    let mut attrs = Map::new();
    attrs.insert("id".into(), json!(pool.id));
    attrs.insert("name".into(), json!(pool.name));
    attrs.insert("zone".into(), json!(pool.zone));
    attrs.insert("description".into(), json!(pool.description));
    attrs.insert("instance_type".into(), json!(pool.instance_type));
    attrs.insert("instance_prefix".into(), json!(pool.instance_prefix));
    attrs.insert("template_id".into(), json!(pool.template_id));
    attrs.insert("deploy_target_id".into(), json!(pool.deploy_target_id));
    attrs.insert("size".into(), json!(pool.size));
    attrs.insert("disk_size".into(), json!(pool.disk_size));
    attrs.insert("ipv6".into(), json!(pool.ipv6_enabled));
    attrs.insert("key_pair".into(), json!(pool.key_pair));
    attrs.insert("user_data".into(), json!(pool.user_data));
    attrs.insert("state".into(), json!(pool.state));
    attrs.insert("affinity_group_ids".into(), json!(pool.anti_affinity_group_ids));
    attrs.insert("security_group_ids".into(), json!(pool.security_group_ids));
    attrs.insert("network_ids".into(), json!(pool.private_network_ids));
    attrs.insert("elastic_ip_ids".into(), json!(pool.elastic_ip_ids));
    attrs.insert("labels".into(), json!(pool.labels));
    attrs.insert(
        "instances".into(),
        Value::Array(pool.instances.iter().map(instance_attributes).collect()),
    );
    attrs
}

pub struct InstancePoolLookup;

#[async_trait]
impl DataSource<dyn ComputeApi> for InstancePoolLookup {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        let schema = Schema::new("Fetch Exoscale Instance Pools data.")
            .with_attribute(
                "zone",
                Attribute::required_string().describe("The Exoscale Zone name."),
            )
            .with_attribute(
                "id",
                Attribute::optional_string()
                    .conflicts_with(&["name"])
                    .describe("The instance pool ID to match (conflicts with `name`)."),
            )
            .with_attribute(
                "name",
                Attribute::optional_string()
                    .conflicts_with(&["id"])
                    .describe("The pool name to match (conflicts with `id`)."),
            );

        POOL_ATTRIBUTES
            .iter()
            .fold(schema, |schema, (key, kind, description)| {
                schema.with_attribute(*key, Attribute::computed(*kind).describe(*description))
            })
    }

    async fn read(&self, client: &dyn ComputeApi, d: &mut ResourceData) -> Result<()> {
        let selector = Selector::from_data(d)?;
        let zone = d.get_str("zone").to_string();

        let pool = match &selector {
            Selector::Id(id) => client.get_instance_pool(&zone, id).await?,
            Selector::Name(_) => find_unique(
                client.list_instance_pools(&zone).await?,
                &selector,
                |p| p.id.as_str(),
                |p| p.name.as_str(),
                "instance pool",
            )?,
        };

        d.set_id(pool.id.as_str());
        for (key, value) in pool_attributes(&pool) {
            if key == "zone" {
                continue;
            }
            d.set(&key, value)?;
        }
        Ok(())
    }
}

pub struct InstancePoolList;

#[async_trait]
impl DataSource<dyn ComputeApi> for InstancePoolList {
    fn type_name(&self) -> &'static str {
        LIST_TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::new("List Exoscale Instance Pools.")
            .with_attribute(
                "zone",
                Attribute::required_string().describe("The Exoscale Zone name."),
            )
            .with_attribute(
                "pools",
                Attribute::computed(AttributeType::List)
                    .describe("The list of instance pools of the zone."),
            )
    }

    async fn read(&self, client: &dyn ComputeApi, d: &mut ResourceData) -> Result<()> {
        let zone = d.get_str("zone").to_string();

        let pools: Vec<Value> = client
            .list_instance_pools(&zone)
            .await?
            .iter()
            .map(|pool| Value::Object(pool_attributes(pool)))
            .collect();

        tracing::debug!(zone = %zone, count = pools.len(), "listed instance pools");

        d.set_id(zone.as_str());
        d.set("pools", pools)?;
        Ok(())
    }
}
