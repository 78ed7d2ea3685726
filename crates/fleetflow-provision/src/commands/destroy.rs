use super::{Workspace, apply::report, print_plan};
use colored::Colorize;
use fleetflow_cloud::{Planner, ResourceSet};
use std::path::Path;

/// state にあるすべてのリソースを削除する
pub async fn handle(path: &Path, yes: bool) -> anyhow::Result<()> {
    let workspace = Workspace::open(path)?;
    let provider = workspace.provider()?;
    let planner = Planner::new(&provider);

    let lock = workspace.store.acquire_lock().await?;
    let mut state = workspace.store.load().await?;

    let plan = planner.destroy_plan(&state);
    if !print_plan(&plan) {
        lock.release().await?;
        return Ok(());
    }

    if !yes {
        lock.release().await?;
        println!();
        println!(
            "{}",
            "削除するには --yes を付けて再実行してください".yellow()
        );
        return Ok(());
    }

    println!();
    println!("{}", "削除中...".blue());
    let result = planner
        .apply(&plan, &ResourceSet::new(), &mut state, &workspace.store)
        .await?;
    lock.release().await?;

    report(&result)
}
