pub mod apply;
pub mod auth;
pub mod destroy;
pub mod import;
pub mod plan;
pub mod read;
pub mod refresh;
pub mod schema;
pub mod validate;

use crate::manifest::{Manifest, ProviderBlock, conform, project_root};
use anyhow::bail;
use colored::Colorize;
use fleetflow_cloud::{ActionType, Lifecycle, Plan, Registry, ResourceSet, StateManager};
use fleetflow_cloud_exoscale::{ComputeApi, ExoscaleConfig, ExoscaleProvider};
use std::path::Path;
use std::time::Duration;

/// 読み込んだマニフェストと state の保存先
pub struct Workspace {
    pub manifest: Manifest,
    pub store: StateManager,
}

impl Workspace {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let manifest = Manifest::load(path)?;
        if manifest.provider.name != "exoscale" {
            bail!(
                "未対応のプロバイダーです: {} (exoscale のみ対応)",
                manifest.provider.name
            );
        }
        Ok(Self {
            manifest,
            store: StateManager::new(project_root(path)),
        })
    }

    /// 環境変数の認証情報と provider ブロックからプロバイダーを作成
    pub fn provider(&self) -> anyhow::Result<ExoscaleProvider> {
        let config = exoscale_config(&self.manifest.provider)?;
        tracing::debug!(endpoint = %config.base_url(), "using exoscale endpoint");
        Ok(ExoscaleProvider::new(config)?)
    }

    /// スキーマに合わせて整えた resource 宣言
    pub fn resources(&self, registry: &Registry<dyn ComputeApi>) -> anyhow::Result<ResourceSet> {
        let mut set = ResourceSet::new();
        for resource in self.manifest.resources.iter() {
            let schema = registry.resource(&resource.resource_type)?.schema();
            let mut resource = resource.clone();
            conform(&mut resource.config, &schema);
            set.add(resource);
        }
        Ok(set)
    }

    /// スキーマに合わせて整えた data 宣言
    pub fn data_sources(&self, registry: &Registry<dyn ComputeApi>) -> anyhow::Result<ResourceSet> {
        let mut set = ResourceSet::new();
        for source in self.manifest.data.iter() {
            let schema = registry.data_source_schema(&source.resource_type)?;
            let mut source = source.clone();
            conform(&mut source.config, &schema);
            set.add(source);
        }
        Ok(set)
    }
}

/// 認証情報は環境変数のみ。その他は環境変数が優先され、未設定なら provider ブロックの値を使う。
pub fn exoscale_config(block: &ProviderBlock) -> anyhow::Result<ExoscaleConfig> {
    let mut config = ExoscaleConfig::from_env()?;

    let unset = |name: &str| std::env::var_os(name).is_none();
    if let Some(zone) = &block.zone
        && unset("EXOSCALE_ZONE")
    {
        config.default_zone = zone.clone();
    }
    if let Some(environment) = &block.environment
        && unset("EXOSCALE_ENVIRONMENT")
    {
        config.environment = environment.clone();
    }
    if let Some(endpoint) = &block.endpoint
        && unset("EXOSCALE_ENDPOINT")
    {
        config.endpoint = Some(endpoint.clone());
    }
    if let Some(secs) = block.timeout
        && unset("EXOSCALE_TIMEOUT")
    {
        config.timeout = Duration::from_secs(secs);
    }

    config.validate()?;
    Ok(config)
}

/// プランを表示する。変更がなければ false
pub fn print_plan(plan: &Plan) -> bool {
    if !plan.has_changes {
        println!("{}", "✓ 変更はありません".green().bold());
        return false;
    }

    println!("実行予定のアクション:");
    for action in &plan.actions {
        let line = match action.action_type {
            ActionType::Create => format!("  + {}", action.address).green(),
            ActionType::Update => format!("  ~ {}", action.address).yellow(),
            ActionType::Replace => format!("-/+ {}", action.address).magenta(),
            ActionType::Delete => format!("  - {}", action.address).red(),
            ActionType::NoOp => continue,
        };
        if action.changed.is_empty() {
            println!("{}", line);
        } else {
            println!("{} ({})", line, action.changed.join(", ").dimmed());
        }
    }
    println!();
    println!("{}", plan.summary().to_string().bold());
    true
}
