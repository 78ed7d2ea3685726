use super::Workspace;
use colored::Colorize;
use fleetflow_cloud::{Planner, parse_address};
use std::path::Path;

/// 既存のリモートオブジェクトを state に取り込む
pub async fn handle(path: &Path, address: &str, id: &str) -> anyhow::Result<()> {
    if parse_address(address).is_none() {
        anyhow::bail!("無効なアドレスです: {} (<type>.<name> の形式で指定してください)", address);
    }

    let workspace = Workspace::open(path)?;
    if workspace.manifest.resources.get(address).is_none() {
        println!(
            "{} {} はマニフェストに宣言されていません。次回の apply で削除されます",
            "!".yellow(),
            address
        );
    }

    let provider = workspace.provider()?;
    let planner = Planner::new(&provider);

    let lock = workspace.store.acquire_lock().await?;
    let mut state = workspace.store.load().await?;

    println!("{}", format!("{} をインポート中...", address).blue());
    planner.import(address, id, &mut state).await?;
    workspace.store.save(&state).await?;
    lock.release().await?;

    let stored = state
        .get_resource(address)
        .map(|r| r.id.as_str())
        .unwrap_or(id);
    println!(
        "{}",
        format!("✓ {} をインポートしました (ID: {})", address, stored)
            .green()
            .bold()
    );
    Ok(())
}
