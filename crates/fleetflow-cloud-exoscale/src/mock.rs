//! In-memory [`ComputeApi`] used by tests and offline dry runs

use crate::api::{
    AntiAffinityGroup, AntiAffinityGroupRequest, ComputeApi, DnsDomain, InstancePool, Network,
    NetworkRequest, SksNodepool, SksNodepoolRequest, SksNodepoolUpdate,
};
use async_trait::async_trait;
use fleetflow_cloud::{ApiErrorKind, CloudError, Result, Tags, Zone, ZoneDirectory};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Objects {
    zones: Vec<Zone>,
    networks: BTreeMap<String, Network>,
    groups: BTreeMap<String, AntiAffinityGroup>,
    domains: BTreeMap<String, DnsDomain>,
    nodepools: BTreeMap<String, (String, String, SksNodepool)>,
    pools: BTreeMap<String, InstancePool>,
    next_id: u64,
}

impl Objects {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }
}

/// Fake control plane keeping every object in memory
#[derive(Default)]
pub struct MemoryComputeApi {
    objects: Mutex<Objects>,
    calls: Mutex<Vec<String>>,
    failures: Mutex<BTreeMap<String, (ApiErrorKind, String)>>,
}

fn not_found(what: &str, id: &str) -> CloudError {
    CloudError::api(ApiErrorKind::NotFound, format!("{} {} not found", what, id))
}

impl MemoryComputeApi {
    /// Fake with three zones: `ch-gva-2`, `de-fra-1` and `at-vie-1`
    pub fn new() -> Self {
        let api = Self::default();
        api.objects().zones = ["ch-gva-2", "de-fra-1", "at-vie-1"]
            .iter()
            .enumerate()
            .map(|(i, name)| Zone {
                id: format!("zone-{}", i + 1),
                name: name.to_string(),
            })
            .collect();
        api
    }

    fn objects(&self) -> MutexGuard<'_, Objects> {
        self.objects.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Records the call and returns the failure injected for it, if any
    fn enter(&self, call: &str) -> Result<()> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call.to_string());
        match self
            .failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(call)
        {
            Some((kind, message)) => Err(CloudError::api(*kind, message.clone())),
            None => Ok(()),
        }
    }

    /// Makes every later call to `operation` fail
    pub fn fail_on(&self, operation: &str, kind: ApiErrorKind, message: &str) {
        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(operation.to_string(), (kind, message.to_string()));
    }

    pub fn clear_failures(&self) {
        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    /// Names of the operations called so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn zone_id(&self, name: &str) -> Option<String> {
        self.objects()
            .zones
            .iter()
            .find(|z| z.name == name)
            .map(|z| z.id.clone())
    }

    pub fn network(&self, id: &str) -> Option<Network> {
        self.objects().networks.get(id).cloned()
    }

    pub fn insert_network(&self, network: Network) {
        self.objects().networks.insert(network.id.clone(), network);
    }

    pub fn remove_network(&self, id: &str) -> Option<Network> {
        self.objects().networks.remove(id)
    }

    pub fn anti_affinity_group(&self, id: &str) -> Option<AntiAffinityGroup> {
        self.objects().groups.get(id).cloned()
    }

    pub fn dns_domain(&self, id: &str) -> Option<DnsDomain> {
        self.objects().domains.get(id).cloned()
    }

    pub fn insert_dns_domain(&self, domain: DnsDomain) {
        self.objects().domains.insert(domain.id.clone(), domain);
    }

    pub fn nodepool(&self, id: &str) -> Option<SksNodepool> {
        self.objects().nodepools.get(id).map(|(_, _, np)| np.clone())
    }

    pub fn insert_instance_pool(&self, pool: InstancePool) {
        self.objects().pools.insert(pool.id.clone(), pool);
    }
}

#[async_trait]
impl ZoneDirectory for MemoryComputeApi {
    async fn list_zones(&self) -> Result<Vec<Zone>> {
        self.enter("list_zones")?;
        Ok(self.objects().zones.clone())
    }
}

#[async_trait]
impl ComputeApi for MemoryComputeApi {
    async fn create_network(&self, req: &NetworkRequest) -> Result<Network> {
        self.enter("create_network")?;
        let mut objects = self.objects();
        let zone_name = objects
            .zones
            .iter()
            .find(|z| z.id == req.zone_id)
            .map(|z| z.name.clone())
            .ok_or_else(|| {
                CloudError::api(ApiErrorKind::ParamError, format!("invalid zone {}", req.zone_id))
            })?;
        let network = Network {
            id: objects.next_id("net"),
            name: req.name.clone(),
            display_text: req.display_text.clone(),
            zone_id: req.zone_id.clone(),
            zone_name,
            start_ip: req.start_ip.clone(),
            end_ip: req.end_ip.clone(),
            netmask: req.netmask.clone(),
            tags: Tags::new(),
        };
        objects.networks.insert(network.id.clone(), network.clone());
        Ok(network)
    }

    async fn list_networks(&self, zone_id: &str, id: Option<&str>) -> Result<Vec<Network>> {
        self.enter("list_networks")?;
        let objects = self.objects();
        if let Some(id) = id {
            return match objects.networks.get(id) {
                Some(n) if n.zone_id == zone_id => Ok(vec![n.clone()]),
                Some(_) => Err(CloudError::api(
                    ApiErrorKind::ParamError,
                    format!("network {} does not belong to zone {}", id, zone_id),
                )),
                None => Ok(Vec::new()),
            };
        }
        Ok(objects
            .networks
            .values()
            .filter(|n| n.zone_id == zone_id)
            .cloned()
            .collect())
    }

    async fn update_network(&self, id: &str, req: &NetworkRequest) -> Result<()> {
        self.enter("update_network")?;
        let mut objects = self.objects();
        let network = objects
            .networks
            .get_mut(id)
            .ok_or_else(|| not_found("network", id))?;
        network.name = req.name.clone();
        network.display_text = req.display_text.clone();
        network.start_ip = req.start_ip.clone();
        network.end_ip = req.end_ip.clone();
        network.netmask = req.netmask.clone();
        Ok(())
    }

    async fn delete_network(&self, id: &str) -> Result<()> {
        self.enter("delete_network")?;
        self.objects()
            .networks
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found("network", id))
    }

    async fn create_tags(&self, resource_type: &str, id: &str, tags: &Tags) -> Result<()> {
        self.enter("create_tags")?;
        let mut objects = self.objects();
        let network = objects
            .networks
            .get_mut(id)
            .ok_or_else(|| not_found(resource_type, id))?;
        for (key, value) in tags {
            if network.tags.contains_key(key) {
                return Err(CloudError::api(
                    ApiErrorKind::ParamError,
                    format!("tag {:?} already exists", key),
                ));
            }
            network.tags.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    async fn update_tags(&self, resource_type: &str, id: &str, tags: &Tags) -> Result<()> {
        self.enter("update_tags")?;
        let mut objects = self.objects();
        let network = objects
            .networks
            .get_mut(id)
            .ok_or_else(|| not_found(resource_type, id))?;
        for (key, value) in tags {
            network.tags.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    async fn create_anti_affinity_group(
        &self,
        req: &AntiAffinityGroupRequest,
    ) -> Result<AntiAffinityGroup> {
        self.enter("create_anti_affinity_group")?;
        let mut objects = self.objects();
        let group = AntiAffinityGroup {
            id: objects.next_id("aag"),
            name: req.name.clone(),
            description: req.description.clone(),
            group_type: req.group_type.clone(),
            virtual_machine_ids: Vec::new(),
        };
        objects.groups.insert(group.id.clone(), group.clone());
        Ok(group)
    }

    async fn get_anti_affinity_group(&self, id: &str) -> Result<AntiAffinityGroup> {
        self.enter("get_anti_affinity_group")?;
        self.objects()
            .groups
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("anti-affinity group", id))
    }

    async fn delete_anti_affinity_group(&self, id: &str) -> Result<()> {
        self.enter("delete_anti_affinity_group")?;
        self.objects()
            .groups
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found("anti-affinity group", id))
    }

    async fn list_dns_domains(&self) -> Result<Vec<DnsDomain>> {
        self.enter("list_dns_domains")?;
        Ok(self.objects().domains.values().cloned().collect())
    }

    async fn create_dns_domain(&self, name: &str) -> Result<DnsDomain> {
        self.enter("create_dns_domain")?;
        let mut objects = self.objects();
        if objects.domains.values().any(|d| d.unicode_name == name) {
            return Err(CloudError::api(
                ApiErrorKind::Conflict,
                format!("domain {} already exists", name),
            ));
        }
        let domain = DnsDomain {
            id: objects.next_id("dom"),
            name: name.to_string(),
            unicode_name: name.to_string(),
        };
        objects.domains.insert(domain.id.clone(), domain.clone());
        Ok(domain)
    }

    async fn get_dns_domain(&self, id: &str) -> Result<DnsDomain> {
        self.enter("get_dns_domain")?;
        self.objects()
            .domains
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("domain", id))
    }

    async fn delete_dns_domain(&self, id: &str) -> Result<()> {
        self.enter("delete_dns_domain")?;
        self.objects()
            .domains
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found("domain", id))
    }

    async fn create_sks_nodepool(
        &self,
        zone: &str,
        cluster_id: &str,
        req: &SksNodepoolRequest,
    ) -> Result<SksNodepool> {
        self.enter("create_sks_nodepool")?;
        let mut objects = self.objects();
        let nodepool = SksNodepool {
            id: objects.next_id("np"),
            name: req.name.clone(),
            description: req.description.clone(),
            instance_type: req.instance_type.clone(),
            disk_size: req.disk_size,
            size: req.size,
            anti_affinity_group_ids: req.anti_affinity_group_ids.clone(),
            security_group_ids: req.security_group_ids.clone(),
            labels: req.labels.clone(),
            instance_pool_id: objects.next_id("pool"),
            template_id: "tmpl-sks-1".to_string(),
            version: "1.31.0".to_string(),
            state: "running".to_string(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
        };
        objects.nodepools.insert(
            nodepool.id.clone(),
            (zone.to_string(), cluster_id.to_string(), nodepool.clone()),
        );
        Ok(nodepool)
    }

    async fn get_sks_nodepool(&self, zone: &str, cluster_id: &str, id: &str) -> Result<SksNodepool> {
        self.enter("get_sks_nodepool")?;
        match self.objects().nodepools.get(id) {
            Some((z, c, np)) if z == zone && c == cluster_id => Ok(np.clone()),
            _ => Err(not_found("nodepool", id)),
        }
    }

    async fn update_sks_nodepool(
        &self,
        zone: &str,
        cluster_id: &str,
        id: &str,
        req: &SksNodepoolUpdate,
    ) -> Result<()> {
        self.enter("update_sks_nodepool")?;
        let mut objects = self.objects();
        match objects.nodepools.get_mut(id) {
            Some((z, c, np)) if z == zone && c == cluster_id => {
                np.name = req.name.clone();
                np.description = req.description.clone();
                np.instance_type = req.instance_type.clone();
                np.disk_size = req.disk_size;
                np.security_group_ids = req.security_group_ids.clone();
                np.labels = req.labels.clone();
                Ok(())
            }
            _ => Err(not_found("nodepool", id)),
        }
    }

    async fn scale_sks_nodepool(
        &self,
        zone: &str,
        cluster_id: &str,
        id: &str,
        size: i64,
    ) -> Result<()> {
        self.enter("scale_sks_nodepool")?;
        let mut objects = self.objects();
        match objects.nodepools.get_mut(id) {
            Some((z, c, np)) if z == zone && c == cluster_id => {
                np.size = size;
                Ok(())
            }
            _ => Err(not_found("nodepool", id)),
        }
    }

    async fn delete_sks_nodepool(&self, zone: &str, cluster_id: &str, id: &str) -> Result<()> {
        self.enter("delete_sks_nodepool")?;
        let mut objects = self.objects();
        let owned = matches!(
            objects.nodepools.get(id),
            Some((z, c, _)) if z == zone && c == cluster_id
        );
        if !owned {
            return Err(not_found("nodepool", id));
        }
        objects.nodepools.remove(id);
        Ok(())
    }

    async fn list_instance_pools(&self, zone: &str) -> Result<Vec<InstancePool>> {
        self.enter("list_instance_pools")?;
        Ok(self
            .objects()
            .pools
            .values()
            .filter(|p| p.zone == zone)
            .cloned()
            .collect())
    }

    async fn get_instance_pool(&self, zone: &str, id: &str) -> Result<InstancePool> {
        self.enter("get_instance_pool")?;
        match self.objects().pools.get(id) {
            Some(pool) if pool.zone == zone => Ok(pool.clone()),
            _ => Err(not_found("instance pool", id)),
        }
    }
}
