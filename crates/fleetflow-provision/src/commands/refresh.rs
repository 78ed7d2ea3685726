use super::Workspace;
use colored::Colorize;
use fleetflow_cloud::Planner;
use std::path::Path;

/// リモートの状態を state に反映する
pub async fn handle(path: &Path) -> anyhow::Result<()> {
    let workspace = Workspace::open(path)?;
    let provider = workspace.provider()?;
    let planner = Planner::new(&provider);

    let lock = workspace.store.acquire_lock().await?;
    let mut state = workspace.store.load().await?;

    println!("{}", "リモートの状態を取得中...".blue());
    let removed = planner.refresh_state(&mut state).await?;
    workspace.store.save(&state).await?;
    lock.release().await?;

    for address in &removed {
        println!("  {} {} (state から削除)", "-".red(), address);
    }
    println!(
        "{}",
        format!(
            "✓ {}件のリソースを更新しました",
            state.resources.len()
        )
        .green()
        .bold()
    );
    Ok(())
}
