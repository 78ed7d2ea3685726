//! Remote API abstraction
//!
//! Wire models of the Exoscale v2 API and the [`ComputeApi`] trait the
//! resource kinds talk to. [`crate::client::HttpComputeClient`] is the
//! production implementation.

use async_trait::async_trait;
use fleetflow_cloud::{Result, Tags, ZoneDirectory};
use serde::{Deserialize, Serialize};

/// Tag namespace of private networks
pub const NETWORK_RESOURCE_TYPE: &str = "network";

/// Private network
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Network {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub display_text: String,
    #[serde(default)]
    pub zone_id: String,
    #[serde(default)]
    pub zone_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub netmask: Option<String>,
    #[serde(default)]
    pub tags: Tags,
}

impl Network {
    /// Whether the network has a DHCP range
    pub fn is_managed(&self) -> bool {
        self.start_ip.is_some() && self.end_ip.is_some() && self.netmask.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkRequest {
    pub name: String,
    pub display_text: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub zone_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub netmask: Option<String>,
}

/// Anti-affinity group
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AntiAffinityGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub group_type: String,
    #[serde(default)]
    pub virtual_machine_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AntiAffinityGroupRequest {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub group_type: String,
}

/// DNS domain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DnsDomain {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub unicode_name: String,
}

/// Node pool of a managed Kubernetes (SKS) cluster
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SksNodepool {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub instance_type: String,
    pub disk_size: i64,
    pub size: i64,
    #[serde(default)]
    pub anti_affinity_group_ids: Vec<String>,
    #[serde(default)]
    pub security_group_ids: Vec<String>,
    #[serde(default)]
    pub labels: Tags,
    #[serde(default)]
    pub instance_pool_id: String,
    #[serde(default)]
    pub template_id: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SksNodepoolRequest {
    pub name: String,
    pub description: String,
    pub instance_type: String,
    pub disk_size: i64,
    pub size: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anti_affinity_group_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_group_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub labels: Tags,
}

/// In-place update of a node pool. Size changes go through
/// [`ComputeApi::scale_sks_nodepool`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SksNodepoolUpdate {
    pub name: String,
    pub description: String,
    pub instance_type: String,
    pub disk_size: i64,
    pub security_group_ids: Vec<String>,
    pub labels: Tags,
}

/// Member instance of an instance pool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PoolInstance {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6_address: Option<String>,
}

/// Instance pool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct InstancePool {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub zone: String,
    #[serde(default)]
    pub instance_type: String,
    #[serde(default)]
    pub instance_prefix: String,
    #[serde(default)]
    pub template_id: String,
    #[serde(default)]
    pub deploy_target_id: String,
    pub size: i64,
    #[serde(default)]
    pub disk_size: i64,
    #[serde(default)]
    pub ipv6_enabled: bool,
    #[serde(default)]
    pub key_pair: String,
    #[serde(default)]
    pub user_data: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub anti_affinity_group_ids: Vec<String>,
    #[serde(default)]
    pub security_group_ids: Vec<String>,
    #[serde(default)]
    pub private_network_ids: Vec<String>,
    #[serde(default)]
    pub elastic_ip_ids: Vec<String>,
    #[serde(default)]
    pub instances: Vec<PoolInstance>,
    #[serde(default)]
    pub labels: Tags,
}

/// Operations of the Exoscale compute API used by this provider
#[async_trait]
pub trait ComputeApi: ZoneDirectory {
    async fn create_network(&self, req: &NetworkRequest) -> Result<Network>;

    /// Lists the private networks of one zone, optionally filtered by ID
    async fn list_networks(&self, zone_id: &str, id: Option<&str>) -> Result<Vec<Network>>;

    async fn update_network(&self, id: &str, req: &NetworkRequest) -> Result<()>;

    async fn delete_network(&self, id: &str) -> Result<()>;

    async fn create_tags(&self, resource_type: &str, id: &str, tags: &Tags) -> Result<()>;

    async fn update_tags(&self, resource_type: &str, id: &str, tags: &Tags) -> Result<()>;

    async fn create_anti_affinity_group(
        &self,
        req: &AntiAffinityGroupRequest,
    ) -> Result<AntiAffinityGroup>;

    async fn get_anti_affinity_group(&self, id: &str) -> Result<AntiAffinityGroup>;

    async fn delete_anti_affinity_group(&self, id: &str) -> Result<()>;

    async fn list_dns_domains(&self) -> Result<Vec<DnsDomain>>;

    async fn create_dns_domain(&self, name: &str) -> Result<DnsDomain>;

    async fn get_dns_domain(&self, id: &str) -> Result<DnsDomain>;

    async fn delete_dns_domain(&self, id: &str) -> Result<()>;

    async fn create_sks_nodepool(
        &self,
        zone: &str,
        cluster_id: &str,
        req: &SksNodepoolRequest,
    ) -> Result<SksNodepool>;

    async fn get_sks_nodepool(&self, zone: &str, cluster_id: &str, id: &str) -> Result<SksNodepool>;

    async fn update_sks_nodepool(
        &self,
        zone: &str,
        cluster_id: &str,
        id: &str,
        req: &SksNodepoolUpdate,
    ) -> Result<()>;

    async fn scale_sks_nodepool(
        &self,
        zone: &str,
        cluster_id: &str,
        id: &str,
        size: i64,
    ) -> Result<()>;

    async fn delete_sks_nodepool(&self, zone: &str, cluster_id: &str, id: &str) -> Result<()>;

    async fn list_instance_pools(&self, zone: &str) -> Result<Vec<InstancePool>>;

    async fn get_instance_pool(&self, zone: &str, id: &str) -> Result<InstancePool>;
}
