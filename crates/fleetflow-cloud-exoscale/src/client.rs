//! Exoscale v2 API client
//!
//! Direct HTTP implementation of [`ComputeApi`]. Every request carries the
//! configured API key and secret as basic credentials.

use crate::api::{
    AntiAffinityGroup, AntiAffinityGroupRequest, ComputeApi, DnsDomain, InstancePool, Network,
    NetworkRequest, SksNodepool, SksNodepoolRequest, SksNodepoolUpdate,
};
use crate::config::ExoscaleConfig;
use crate::error::{ExoscaleError, Result};
use async_trait::async_trait;
use fleetflow_cloud::{Tags, Zone, ZoneDirectory};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// HTTP client for the Exoscale compute API
pub struct HttpComputeClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    api_secret: String,
}

impl HttpComputeClient {
    pub fn new(config: &ExoscaleConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        tracing::trace!(%method, %url, "exoscale request");
        self.client
            .request(method, url)
            .basic_auth(&self.api_key, Some(&self.api_secret))
    }

    /// Sends the request and decodes the response body, turning error
    /// responses into [`ExoscaleError::Api`]
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error: ApiErrorBody = serde_json::from_str(&body).unwrap_or_default();
            let message = error
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("Unknown error")
                        .to_string()
                });
            return Err(ExoscaleError::Api {
                status: status.as_u16(),
                code: error.error_code.unwrap_or_default(),
                message,
            });
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(serde_json::from_str("null")?);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<()> {
        let _: serde_json::Value = self.send(request).await?;
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(self.request(Method::GET, path)).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.send_empty(self.request(Method::DELETE, path)).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        self.send_empty(self.request(Method::PUT, path).json(body))
            .await
    }

    fn nodepool_path(zone: &str, cluster_id: &str, id: Option<&str>) -> String {
        match id {
            Some(id) => format!("/sks-cluster/{}/nodepool/{}?zone={}", cluster_id, id, zone),
            None => format!("/sks-cluster/{}/nodepool?zone={}", cluster_id, zone),
        }
    }

    fn nodepool_scale_path(zone: &str, cluster_id: &str, id: &str) -> String {
        format!("/sks-cluster/{}/nodepool/{}:scale?zone={}", cluster_id, id, zone)
    }
}

#[async_trait]
impl ZoneDirectory for HttpComputeClient {
    async fn list_zones(&self) -> fleetflow_cloud::Result<Vec<Zone>> {
        let response: ZonesResponse = self.get("/zone").await?;
        Ok(response.zones)
    }
}

#[async_trait]
impl ComputeApi for HttpComputeClient {
    async fn create_network(&self, req: &NetworkRequest) -> fleetflow_cloud::Result<Network> {
        Ok(self.post("/private-network", req).await?)
    }

    async fn list_networks(
        &self,
        zone_id: &str,
        id: Option<&str>,
    ) -> fleetflow_cloud::Result<Vec<Network>> {
        let path = match id {
            Some(id) => format!("/private-network?zone-id={}&id={}", zone_id, id),
            None => format!("/private-network?zone-id={}", zone_id),
        };
        let response: NetworksResponse = self.get(&path).await?;
        Ok(response.private_networks)
    }

    async fn update_network(&self, id: &str, req: &NetworkRequest) -> fleetflow_cloud::Result<()> {
        Ok(self.put(&format!("/private-network/{}", id), req).await?)
    }

    async fn delete_network(&self, id: &str) -> fleetflow_cloud::Result<()> {
        Ok(self.delete(&format!("/private-network/{}", id)).await?)
    }

    async fn create_tags(
        &self,
        resource_type: &str,
        id: &str,
        tags: &Tags,
    ) -> fleetflow_cloud::Result<()> {
        let body = TagsRequest {
            resource_type,
            resource_ids: vec![id],
            tags,
        };
        let _: serde_json::Value = self.post("/tag", &body).await?;
        Ok(())
    }

    async fn update_tags(
        &self,
        resource_type: &str,
        id: &str,
        tags: &Tags,
    ) -> fleetflow_cloud::Result<()> {
        let body = TagsRequest {
            resource_type,
            resource_ids: vec![id],
            tags,
        };
        Ok(self.put("/tag", &body).await?)
    }

    async fn create_anti_affinity_group(
        &self,
        req: &AntiAffinityGroupRequest,
    ) -> fleetflow_cloud::Result<AntiAffinityGroup> {
        Ok(self.post("/anti-affinity-group", req).await?)
    }

    async fn get_anti_affinity_group(&self, id: &str) -> fleetflow_cloud::Result<AntiAffinityGroup> {
        Ok(self.get(&format!("/anti-affinity-group/{}", id)).await?)
    }

    async fn delete_anti_affinity_group(&self, id: &str) -> fleetflow_cloud::Result<()> {
        Ok(self.delete(&format!("/anti-affinity-group/{}", id)).await?)
    }

    async fn list_dns_domains(&self) -> fleetflow_cloud::Result<Vec<DnsDomain>> {
        let response: DnsDomainsResponse = self.get("/dns-domain").await?;
        Ok(response.dns_domains)
    }

    async fn create_dns_domain(&self, name: &str) -> fleetflow_cloud::Result<DnsDomain> {
        let body = DnsDomainRequest { unicode_name: name };
        Ok(self.post("/dns-domain", &body).await?)
    }

    async fn get_dns_domain(&self, id: &str) -> fleetflow_cloud::Result<DnsDomain> {
        Ok(self.get(&format!("/dns-domain/{}", id)).await?)
    }

    async fn delete_dns_domain(&self, id: &str) -> fleetflow_cloud::Result<()> {
        Ok(self.delete(&format!("/dns-domain/{}", id)).await?)
    }

    async fn create_sks_nodepool(
        &self,
        zone: &str,
        cluster_id: &str,
        req: &SksNodepoolRequest,
    ) -> fleetflow_cloud::Result<SksNodepool> {
        Ok(self
            .post(&Self::nodepool_path(zone, cluster_id, None), req)
            .await?)
    }

    async fn get_sks_nodepool(
        &self,
        zone: &str,
        cluster_id: &str,
        id: &str,
    ) -> fleetflow_cloud::Result<SksNodepool> {
        Ok(self
            .get(&Self::nodepool_path(zone, cluster_id, Some(id)))
            .await?)
    }

    async fn update_sks_nodepool(
        &self,
        zone: &str,
        cluster_id: &str,
        id: &str,
        req: &SksNodepoolUpdate,
    ) -> fleetflow_cloud::Result<()> {
        Ok(self
            .put(&Self::nodepool_path(zone, cluster_id, Some(id)), req)
            .await?)
    }

    async fn scale_sks_nodepool(
        &self,
        zone: &str,
        cluster_id: &str,
        id: &str,
        size: i64,
    ) -> fleetflow_cloud::Result<()> {
        Ok(self
            .put(
                &Self::nodepool_scale_path(zone, cluster_id, id),
                &ScaleRequest { size },
            )
            .await?)
    }

    async fn delete_sks_nodepool(
        &self,
        zone: &str,
        cluster_id: &str,
        id: &str,
    ) -> fleetflow_cloud::Result<()> {
        Ok(self
            .delete(&Self::nodepool_path(zone, cluster_id, Some(id)))
            .await?)
    }

    async fn list_instance_pools(&self, zone: &str) -> fleetflow_cloud::Result<Vec<InstancePool>> {
        let response: InstancePoolsResponse =
            self.get(&format!("/instance-pool?zone={}", zone)).await?;
        Ok(response.instance_pools)
    }

    async fn get_instance_pool(&self, zone: &str, id: &str) -> fleetflow_cloud::Result<InstancePool> {
        Ok(self
            .get(&format!("/instance-pool/{}?zone={}", id, zone))
            .await?)
    }
}

// ============ API Types ============

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ApiErrorBody {
    error_code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ZonesResponse {
    #[serde(default)]
    zones: Vec<Zone>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct NetworksResponse {
    #[serde(default)]
    private_networks: Vec<Network>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DnsDomainsResponse {
    #[serde(default)]
    dns_domains: Vec<DnsDomain>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct InstancePoolsResponse {
    #[serde(default)]
    instance_pools: Vec<InstancePool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct TagsRequest<'a> {
    resource_type: &'a str,
    resource_ids: Vec<&'a str>,
    tags: &'a Tags,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct DnsDomainRequest<'a> {
    unicode_name: &'a str,
}

#[derive(Debug, Serialize)]
struct ScaleRequest {
    size: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nodepool_paths() {
        assert_eq!(
            HttpComputeClient::nodepool_path("ch-gva-2", "c-1", None),
            "/sks-cluster/c-1/nodepool?zone=ch-gva-2"
        );
        assert_eq!(
            HttpComputeClient::nodepool_path("ch-gva-2", "c-1", Some("np-1")),
            "/sks-cluster/c-1/nodepool/np-1?zone=ch-gva-2"
        );
        assert_eq!(
            HttpComputeClient::nodepool_scale_path("ch-gva-2", "c-1", "np-1"),
            "/sks-cluster/c-1/nodepool/np-1:scale?zone=ch-gva-2"
        );
    }

    #[test]
    fn test_base_url_from_config() {
        let config = ExoscaleConfig::new("k", "s").with_environment("ppapi");
        let client = HttpComputeClient::new(&config);
        assert_eq!(client.base_url(), "https://ppapi.exoscale.com/v2");
    }
}
