use super::Workspace;
use crate::manifest::conform;
use colored::Colorize;
use fleetflow_cloud::{Lifecycle, Registry, ResourceData};
use fleetflow_cloud_exoscale::{ComputeApi, default_registry};
use std::path::Path;

/// API を呼ばずにマニフェストを検証する
pub fn handle(path: &Path) -> anyhow::Result<()> {
    println!("{}", "マニフェストを検証中...".blue());
    println!("マニフェスト: {}", path.display().to_string().cyan());

    let workspace = match Workspace::open(path) {
        Ok(workspace) => workspace,
        Err(e) => {
            eprintln!();
            eprintln!("{}", "✗ マニフェストを読み込めません".red().bold());
            eprintln!("  {:#}", e);
            std::process::exit(1);
        }
    };

    let problems = check(&workspace, &default_registry());
    if !problems.is_empty() {
        eprintln!();
        eprintln!("{}", "✗ 設定エラー".red().bold());
        for problem in &problems {
            eprintln!("  {}", problem);
        }
        std::process::exit(1);
    }

    let manifest = &workspace.manifest;
    println!("{}", "✓ マニフェストは正常です！".green().bold());
    println!();
    println!("サマリー:");
    println!(
        "  プロバイダー: {} (zone: {})",
        manifest.provider.name.cyan(),
        manifest.provider.zone.as_deref().unwrap_or("(未設定)")
    );
    println!("  リソース: {}個", manifest.resources.len());
    for resource in manifest.resources.iter() {
        println!("    - {}", resource.address().cyan());
    }
    println!("  データソース: {}個", manifest.data.len());
    for source in manifest.data.iter() {
        println!("    - {}", source.address().cyan());
    }

    Ok(())
}

/// 宣言ごとのスキーマ検証。問題をアドレス付きで返す
pub fn check(workspace: &Workspace, registry: &Registry<dyn ComputeApi>) -> Vec<String> {
    let mut problems = Vec::new();

    for resource in workspace.manifest.resources.iter() {
        let address = resource.address();
        let lifecycle = match registry.resource(&resource.resource_type) {
            Ok(lifecycle) => lifecycle,
            Err(e) => {
                problems.push(format!("{}: {}", address, e));
                continue;
            }
        };
        let schema = lifecycle.schema();
        let mut config = resource.config.clone();
        conform(&mut config, &schema);
        schema.apply_defaults(&mut config);
        if let Err(e) = lifecycle.validate(&ResourceData::for_create(schema, config)) {
            problems.push(format!("{}: {}", address, e));
        }
    }

    for source in workspace.manifest.data.iter() {
        let address = format!("data.{}", source.address());
        let result = registry
            .data_source_schema(&source.resource_type)
            .and_then(|schema| {
                let mut config = source.config.clone();
                conform(&mut config, &schema);
                schema.validate(&config)
            });
        if let Err(e) = result {
            problems.push(format!("{}: {}", address, e));
        }
    }

    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::parse_manifest;
    use fleetflow_cloud::StateManager;

    fn workspace(content: &str) -> Workspace {
        Workspace {
            manifest: parse_manifest(content).unwrap(),
            store: StateManager::new("."),
        }
    }

    #[test]
    fn test_valid_manifest() {
        let ws = workspace(
            r#"
provider "exoscale"
resource "exoscale_sks_nodepool" "workers" {
    zone "ch-gva-2"
    cluster_id "c-1"
    name "workers"
    instance_type "standard.medium"
    size 3
    security_group_ids "sg-1"
}
data "exoscale_network" "shared" {
    zone "ch-gva-2"
    name "shared"
}
"#,
        );
        assert!(check(&ws, &default_registry()).is_empty());
    }

    #[test]
    fn test_problems_carry_address() {
        let ws = workspace(
            r#"
provider "exoscale"
resource "exoscale_sks_nodepool" "workers" {
    zone "ch-gva-2"
    cluster_id "c-1"
    name "workers"
    instance_type "standard.medium"
    size 0
}
resource "exoscale_compute" "vm" {
    name "vm"
}
data "exoscale_network" "shared" {
    zone "ch-gva-2"
    id "n-1"
    name "shared"
}
"#,
        );
        let problems = check(&ws, &default_registry());
        assert_eq!(problems.len(), 3, "{:?}", problems);
        assert!(problems[0].starts_with("exoscale_sks_nodepool.workers: "));
        assert!(problems[0].contains("at least (1)"));
        assert!(problems[1].contains("Unknown resource type"));
        assert!(problems[2].starts_with("data.exoscale_network.shared: "));
        assert!(problems[2].contains("conflicts with"));
    }
}
