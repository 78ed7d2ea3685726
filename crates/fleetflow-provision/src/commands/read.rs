use super::Workspace;
use colored::Colorize;
use fleetflow_cloud::{CloudProvider, Planner};
use std::path::Path;

/// data ブロックを評価して結果を表示する
pub async fn handle(path: &Path, only: Option<&str>, json: bool) -> anyhow::Result<()> {
    let workspace = Workspace::open(path)?;
    let provider = workspace.provider()?;
    let sources = workspace.data_sources(provider.registry())?;
    let planner = Planner::new(&provider);

    let selected: Vec<_> = sources
        .iter()
        .filter(|s| only.is_none_or(|address| s.address() == address))
        .collect();
    if let Some(address) = only
        && selected.is_empty()
    {
        anyhow::bail!("data {} はマニフェストに宣言されていません", address);
    }

    let mut results = serde_json::Map::new();
    for source in selected {
        let address = format!("data.{}", source.address());
        tracing::debug!(address = %address, "reading data source");
        let d = planner.read_data(source).await?;

        if json {
            results.insert(address, serde_json::Value::Object(d.into_attributes()));
            continue;
        }

        println!("{} (ID: {})", address.cyan().bold(), d.id());
        for (key, value) in d.attributes() {
            println!("  {} = {}", key, value);
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }
    Ok(())
}
