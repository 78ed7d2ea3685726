//! Integration tests for the Exoscale HTTP client using wiremock

use fleetflow_cloud::{ApiErrorKind, CloudError, CloudProvider, ResourceData, ZoneDirectory};
use fleetflow_cloud_exoscale::{ComputeApi, ExoscaleConfig, ExoscaleProvider, HttpComputeClient};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{basic_auth, body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> ExoscaleConfig {
    ExoscaleConfig::new("EXOtestkey", "testsecret").with_endpoint(format!("{}/v2/", server.uri()))
}

fn client(server: &MockServer) -> HttpComputeClient {
    HttpComputeClient::new(&config(server))
}

#[tokio::test]
async fn test_list_zones_sends_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/zone"))
        .and(basic_auth("EXOtestkey", "testsecret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "zones": [
                {"id": "1128bd56", "name": "ch-gva-2"},
                {"id": "35eb7739", "name": "de-fra-1"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let zones = client(&server).list_zones().await.unwrap();
    assert_eq!(zones.len(), 2);
    assert_eq!(zones[1].name, "de-fra-1");
}

#[tokio::test]
async fn test_list_networks_filters_by_zone() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/private-network"))
        .and(query_param("zone-id", "1128bd56"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "private-networks": [{
                "id": "net-1",
                "name": "web",
                "display-text": "web tier",
                "start-ip": "10.0.0.10",
                "end-ip": "10.0.0.50",
                "netmask": "255.255.255.0",
                "tags": {"env": "prod"}
            }]
        })))
        .mount(&server)
        .await;

    let networks = client(&server).list_networks("1128bd56", None).await.unwrap();
    assert_eq!(networks.len(), 1);
    assert!(networks[0].is_managed());
    assert_eq!(networks[0].tags.get("env").map(String::as_str), Some("prod"));
}

#[tokio::test]
async fn test_error_body_is_classified() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/anti-affinity-group/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error-code": "not-found",
            "message": "anti-affinity group not found"
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/private-network"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error-code": "parameter-error",
            "message": "invalid zone"
        })))
        .mount(&server)
        .await;

    let client = client(&server);

    let err = client.get_anti_affinity_group("missing").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("anti-affinity group not found"));

    let err = client.list_networks("zone-x", Some("net-1")).await.unwrap_err();
    assert!(err.is_param_error());
}

#[tokio::test]
async fn test_error_without_body_falls_back_to_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/zone"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = client(&server).list_zones().await.unwrap_err();
    assert!(matches!(
        err,
        CloudError::Api {
            kind: ApiErrorKind::Forbidden,
            ..
        }
    ));
}

#[tokio::test]
async fn test_tags_request_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/tag"))
        .and(body_json(json!({
            "resource-type": "network",
            "resource-ids": ["net-1"],
            "tags": {"a": "1"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let tags = [("a".to_string(), "1".to_string())].into();
    client(&server)
        .create_tags("network", "net-1", &tags)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_scale_nodepool() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/v2/sks-cluster/c-1/nodepool/np-1:scale"))
        .and(query_param("zone", "ch-gva-2"))
        .and(body_json(json!({"size": 4})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .scale_sks_nodepool("ch-gva-2", "c-1", "np-1", 4)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_provider_creates_domain() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/dns-domain"))
        .and(body_json(json!({"unicode-name": "example.ch"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "dom-1",
            "unicode-name": "example.ch"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/dns-domain/dom-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "dom-1",
            "unicode-name": "example.ch"
        })))
        .mount(&server)
        .await;

    let provider = ExoscaleProvider::new(config(&server)).unwrap();
    let schema = provider.resource_schema("exoscale_domain").unwrap();
    let attrs = json!({"name": "example.ch"}).as_object().cloned().unwrap();
    let mut d = ResourceData::for_create(schema, attrs).with_timeouts(provider.timeouts());

    provider.create("exoscale_domain", &mut d).await.unwrap();

    assert_eq!(d.id(), "dom-1");
    assert_eq!(d.get_str("unicode_name"), "example.ch");
}

#[tokio::test]
async fn test_check_auth_rejected_key() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/zone"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error-code": "unauthorized",
            "message": "invalid API key"
        })))
        .mount(&server)
        .await;

    let client: Arc<dyn ComputeApi> = Arc::new(client(&server));
    let provider = ExoscaleProvider::with_client(config(&server), client);
    let status = provider.check_auth().await.unwrap();
    assert!(!status.authenticated);
}
