use super::{Workspace, print_plan};
use colored::Colorize;
use fleetflow_cloud::{CloudProvider, Planner};
use std::path::Path;

/// 宣言と state の差分を表示する。state は変更しない
pub async fn handle(path: &Path, refresh: bool) -> anyhow::Result<()> {
    let workspace = Workspace::open(path)?;
    let provider = workspace.provider()?;
    let desired = workspace.resources(provider.registry())?;
    let planner = Planner::new(&provider);

    let mut state = workspace.store.load().await?;
    if refresh {
        println!("{}", "リモートの状態を取得中...".blue());
        for address in planner.refresh_state(&mut state).await? {
            println!("  {} {} (リモートに存在しません)", "!".yellow(), address);
        }
    }

    println!("{}", "プランを作成中...".blue());
    let plan = planner.plan(&desired, &state)?;
    print_plan(&plan);
    Ok(())
}
