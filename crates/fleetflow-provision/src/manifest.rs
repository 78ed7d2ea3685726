//! プロビジョニングマニフェスト (KDL) のパース
//!
//! ```kdl
//! provider "exoscale" {
//!     zone "ch-gva-2"
//!     timeout 300
//! }
//!
//! resource "exoscale_network" "backend" {
//!     zone "ch-gva-2"
//!     name "backend"
//!     tags env="prod"
//! }
//!
//! data "exoscale_domain" "main" {
//!     name "example.ch"
//! }
//! ```

use anyhow::{Context, anyhow, bail};
use fleetflow_cloud::{AttributeType, ResourceConfig, ResourceSet, Schema};
use kdl::{KdlDocument, KdlNode, KdlValue};
use serde_json::{Map, Value, json};
use std::path::{Path, PathBuf};

pub const DEFAULT_MANIFEST: &str = "provision.kdl";

/// provider ブロックの設定
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderBlock {
    pub name: String,
    pub zone: Option<String>,
    pub environment: Option<String>,
    pub endpoint: Option<String>,
    /// 秒単位
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pub provider: ProviderBlock,
    pub resources: ResourceSet,
    pub data: ResourceSet,
}

impl Manifest {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("マニフェストを読み込めません: {}", path.display()))?;
        parse_manifest(&content)
            .with_context(|| format!("マニフェストのパースに失敗しました: {}", path.display()))
    }
}

/// マニフェストを置いたディレクトリ (state の保存先)
pub fn project_root(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

pub fn parse_manifest(content: &str) -> anyhow::Result<Manifest> {
    let doc: KdlDocument = content.parse()?;
    let mut manifest = Manifest::default();
    let mut provider_seen = false;

    for node in doc.nodes() {
        match node.name().value() {
            "provider" => {
                if provider_seen {
                    bail!("provider ブロックは1つだけ指定できます");
                }
                manifest.provider = parse_provider(node)?;
                provider_seen = true;
            }
            "resource" => {
                let resource = parse_block(node, "resource")?;
                insert_unique(&mut manifest.resources, resource, "resource")?;
            }
            "data" => {
                let source = parse_block(node, "data")?;
                insert_unique(&mut manifest.data, source, "data")?;
            }
            other => bail!("不明なノードです: {}", other),
        }
    }

    if !provider_seen {
        bail!("provider ブロックがありません");
    }

    for resource in manifest.resources.resources.iter_mut() {
        resource.provider = manifest.provider.name.clone();
    }
    for source in manifest.data.resources.iter_mut() {
        source.provider = manifest.provider.name.clone();
    }

    Ok(manifest)
}

fn insert_unique(set: &mut ResourceSet, resource: ResourceConfig, kind: &str) -> anyhow::Result<()> {
    if set.get(&resource.address()).is_some() {
        bail!("{} {} が重複しています", kind, resource.address());
    }
    set.add(resource);
    Ok(())
}

fn first_string(node: &KdlNode) -> Option<&str> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
}

fn parse_provider(node: &KdlNode) -> anyhow::Result<ProviderBlock> {
    let name = first_string(node)
        .ok_or_else(|| anyhow!("provider には名前が必要です"))?
        .to_string();

    let mut provider = ProviderBlock {
        name,
        ..Default::default()
    };

    if let Some(children) = node.children() {
        for child in children.nodes() {
            let key = child.name().value();
            match key {
                "zone" => provider.zone = first_string(child).map(str::to_string),
                "environment" => provider.environment = first_string(child).map(str::to_string),
                "endpoint" => provider.endpoint = first_string(child).map(str::to_string),
                "timeout" => {
                    let secs = child
                        .entries()
                        .first()
                        .and_then(|e| e.value().as_integer())
                        .and_then(|v| u64::try_from(v).ok())
                        .filter(|v| *v > 0)
                        .ok_or_else(|| anyhow!("timeout には正の秒数を指定してください"))?;
                    provider.timeout = Some(secs);
                }
                other => bail!("provider の不明な設定です: {}", other),
            }
        }
    }

    Ok(provider)
}

/// `resource "<type>" "<name>" { ... }` と `data` ブロック
fn parse_block(node: &KdlNode, kind: &str) -> anyhow::Result<ResourceConfig> {
    let args: Vec<&str> = node
        .entries()
        .iter()
        .filter(|e| e.name().is_none())
        .filter_map(|e| e.value().as_string())
        .collect();

    let [resource_type, name] = args.as_slice() else {
        bail!("{} には型と名前が必要です: {} \"<type>\" \"<name>\"", kind, kind);
    };

    let mut config = Map::new();
    if let Some(children) = node.children() {
        for child in children.nodes() {
            let key = child.name().value().to_string();
            let value = attribute_value(child)
                .with_context(|| format!("{}.{} の {}", resource_type, name, key))?;
            config.insert(key, value);
        }
    }

    Ok(ResourceConfig::new(*resource_type, *name, "", config))
}

fn scalar(value: &KdlValue) -> anyhow::Result<Value> {
    Ok(match value {
        KdlValue::String(s) => json!(s),
        KdlValue::Integer(i) => {
            let i = i64::try_from(*i).map_err(|_| anyhow!("整数が大きすぎます: {}", i))?;
            json!(i)
        }
        KdlValue::Float(f) => json!(f),
        KdlValue::Bool(b) => json!(b),
        KdlValue::Null => Value::Null,
    })
}

fn as_text(value: &KdlValue) -> anyhow::Result<String> {
    match value {
        KdlValue::String(s) => Ok(s.clone()),
        other => Ok(scalar(other)?.to_string()),
    }
}

/// 属性ノードを値に変換する
///
/// 引数1つはスカラー、複数は集合、`k=v` プロパティと子ブロックはマップ。
fn attribute_value(node: &KdlNode) -> anyhow::Result<Value> {
    let mut positional = Vec::new();
    let mut properties = Map::new();

    for entry in node.entries() {
        match entry.name() {
            Some(key) => {
                properties.insert(key.value().to_string(), json!(as_text(entry.value())?));
            }
            None => positional.push(entry.value()),
        }
    }

    if let Some(children) = node.children() {
        for child in children.nodes() {
            let entry = child
                .entries()
                .first()
                .ok_or_else(|| anyhow!("{} に値がありません", child.name().value()))?;
            let value = as_text(entry.value())?;
            properties.insert(child.name().value().to_string(), json!(value));
        }
    }

    match (positional.as_slice(), properties.is_empty()) {
        ([], false) => Ok(Value::Object(properties)),
        ([], true) => bail!("値がありません"),
        ([single], true) => scalar(single),
        (many, true) => Ok(Value::Array(
            many.iter()
                .map(|v| as_text(v).map(Value::String))
                .collect::<anyhow::Result<_>>()?,
        )),
        (_, false) => bail!("引数とプロパティは混在できません"),
    }
}

/// スキーマに合わせて値を整える。集合型に1要素だけ書かれた場合は配列にする。
pub fn conform(config: &mut Map<String, Value>, schema: &Schema) {
    for (key, value) in config.iter_mut() {
        let Some(attribute) = schema.get(key) else {
            continue;
        };
        if attribute.kind == AttributeType::Set
            && let Value::String(s) = value
        {
            let single = std::mem::take(s);
            *value = json!([single]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetflow_cloud::Attribute;

    const SAMPLE: &str = r#"
provider "exoscale" {
    zone "de-fra-1"
    environment "ppapi"
    timeout 120
}

resource "exoscale_network" "backend" {
    zone "ch-gva-2"
    name "backend"
    start_ip "10.0.0.10"
    tags env="prod" team="infra"
}

resource "exoscale_sks_nodepool" "workers" {
    zone "ch-gva-2"
    cluster_id "c-1"
    size 3
    security_group_ids "sg-1" "sg-2"
    labels {
        role "worker"
    }
}

data "exoscale_domain" "main" {
    name "example.ch"
}
"#;

    #[test]
    fn test_parse_manifest() {
        let manifest = parse_manifest(SAMPLE).unwrap();

        assert_eq!(
            manifest.provider,
            ProviderBlock {
                name: "exoscale".into(),
                zone: Some("de-fra-1".into()),
                environment: Some("ppapi".into()),
                endpoint: None,
                timeout: Some(120),
            }
        );
        assert_eq!(manifest.resources.len(), 2);
        assert_eq!(manifest.data.len(), 1);

        let network = manifest.resources.get("exoscale_network.backend").unwrap();
        assert_eq!(network.provider, "exoscale");
        assert_eq!(network.config["start_ip"], "10.0.0.10");
        assert_eq!(network.config["tags"], json!({"env": "prod", "team": "infra"}));

        let pool = manifest.resources.get("exoscale_sks_nodepool.workers").unwrap();
        assert_eq!(pool.config["size"], 3);
        assert_eq!(pool.config["security_group_ids"], json!(["sg-1", "sg-2"]));
        assert_eq!(pool.config["labels"], json!({"role": "worker"}));

        assert!(manifest.data.get("exoscale_domain.main").is_some());
    }

    #[test]
    fn test_provider_is_required() {
        let err = parse_manifest(r#"resource "exoscale_affinity" "a" { name "a" }"#).unwrap_err();
        assert!(err.to_string().contains("provider"));
    }

    #[test]
    fn test_duplicate_address_rejected() {
        let content = r#"
provider "exoscale"
resource "exoscale_affinity" "a" { name "a" }
resource "exoscale_affinity" "a" { name "b" }
"#;
        let err = parse_manifest(content).unwrap_err();
        assert!(err.to_string().contains("重複"));
    }

    #[test]
    fn test_block_requires_type_and_name() {
        let err = parse_manifest("provider \"exoscale\"\nresource \"exoscale_affinity\" { name \"a\" }")
            .unwrap_err();
        assert!(err.to_string().contains("型と名前"));
    }

    #[test]
    fn test_mixed_arguments_rejected() {
        let content = r#"
provider "exoscale"
resource "exoscale_network" "n" { tags "a" env="prod" }
"#;
        assert!(parse_manifest(content).is_err());
    }

    #[test]
    fn test_unknown_node_rejected() {
        assert!(parse_manifest("provider \"exoscale\"\nmodule \"x\"").is_err());
    }

    #[test]
    fn test_invalid_timeout() {
        let content = "provider \"exoscale\" {\n    timeout 0\n}";
        assert!(parse_manifest(content).is_err());
    }

    #[test]
    fn test_integer_out_of_range_rejected() {
        let content = r#"
provider "exoscale"
resource "exoscale_sks_nodepool" "workers" { size 9223372036854775808 }
"#;
        let err = parse_manifest(content).unwrap_err();
        assert!(format!("{:#}", err).contains("整数が大きすぎます"));

        let content = r#"
provider "exoscale"
resource "exoscale_sks_nodepool" "workers" { size 9223372036854775807 }
"#;
        let manifest = parse_manifest(content).unwrap();
        let pool = manifest.resources.get("exoscale_sks_nodepool.workers").unwrap();
        assert_eq!(pool.config["size"], i64::MAX);
    }

    #[test]
    fn test_conform_wraps_single_set_value() {
        let schema = Schema::new("test")
            .with_attribute("ids", Attribute::optional_set())
            .with_attribute("name", Attribute::optional_string());
        let mut config = Map::new();
        config.insert("ids".into(), json!("sg-1"));
        config.insert("name".into(), json!("web"));

        conform(&mut config, &schema);

        assert_eq!(config["ids"], json!(["sg-1"]));
        assert_eq!(config["name"], "web");
    }

    #[test]
    fn test_project_root() {
        assert_eq!(project_root(Path::new("provision.kdl")), PathBuf::from("."));
        assert_eq!(
            project_root(Path::new("infra/provision.kdl")),
            PathBuf::from("infra")
        );
    }
}
