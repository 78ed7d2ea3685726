use super::{Workspace, print_plan};
use colored::Colorize;
use fleetflow_cloud::{ApplyResult, CloudProvider, Planner};
use std::path::Path;

/// プランを作成して実行する
pub async fn handle(path: &Path) -> anyhow::Result<()> {
    let workspace = Workspace::open(path)?;
    let provider = workspace.provider()?;
    let desired = workspace.resources(provider.registry())?;
    let planner = Planner::new(&provider);

    let lock = workspace.store.acquire_lock().await?;
    let mut state = workspace.store.load().await?;

    println!("{}", "プランを作成中...".blue());
    let plan = planner.plan(&desired, &state)?;
    if !print_plan(&plan) {
        lock.release().await?;
        return Ok(());
    }

    println!();
    println!("{}", "適用中...".blue());
    let result = planner
        .apply(&plan, &desired, &mut state, &workspace.store)
        .await?;
    lock.release().await?;

    report(&result)
}

/// 実行結果を表示し、失敗があればエラーにする
pub fn report(result: &ApplyResult) -> anyhow::Result<()> {
    for failure in &result.failed {
        eprintln!(
            "  {} {}",
            "✗".red(),
            failure.error.as_deref().unwrap_or(&failure.message)
        );
    }

    let seconds = result.duration_ms as f64 / 1000.0;
    if result.is_success() {
        println!(
            "{}",
            format!(
                "✓ {}件のアクションを適用しました ({:.1}秒)",
                result.succeeded.len(),
                seconds
            )
            .green()
            .bold()
        );
        Ok(())
    } else {
        anyhow::bail!(
            "{}件のアクションが失敗しました (成功: {}件)",
            result.failed.len(),
            result.succeeded.len()
        )
    }
}
