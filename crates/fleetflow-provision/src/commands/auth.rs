use super::Workspace;
use colored::Colorize;
use fleetflow_cloud::CloudProvider;
use std::path::Path;

/// API キーが受け付けられるか確認する
pub async fn handle(path: &Path) -> anyhow::Result<()> {
    let workspace = Workspace::open(path)?;
    let provider = workspace.provider()?;

    println!(
        "{}",
        format!("{} の認証を確認中...", provider.display_name()).blue()
    );
    let status = provider.check_auth().await?;

    if status.authenticated {
        println!("{}", "✓ 認証済み".green().bold());
        if let Some(info) = &status.account_info {
            println!("  {}", info);
        }
        Ok(())
    } else {
        eprintln!("{}", "✗ 認証に失敗しました".red().bold());
        if let Some(error) = &status.error {
            eprintln!("  {}", error);
        }
        std::process::exit(1);
    }
}
