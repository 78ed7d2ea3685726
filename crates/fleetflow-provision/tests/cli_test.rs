#![allow(deprecated)] // TODO: cargo_bin → cargo_bin_cmd! へ移行

mod common;

use assert_cmd::Command;
use common::TestProject;
use predicates::prelude::*;

const MANIFEST: &str = r#"
provider "exoscale" {
    zone "ch-gva-2"
}

resource "exoscale_network" "backend" {
    zone "ch-gva-2"
    name "backend"
    tags env="prod"
}

resource "exoscale_sks_nodepool" "workers" {
    zone "ch-gva-2"
    cluster_id "c-1"
    name "workers"
    instance_type "standard.medium"
    size 3
    security_group_ids "sg-1"
}

data "exoscale_domain" "main" {
    name "example.ch"
}
"#;

fn cli(project: &TestProject) -> Command {
    let mut cmd = Command::cargo_bin("fleet-provision").unwrap();
    cmd.current_dir(project.path())
        .env_remove("FLEET_PROVISION_FILE")
        .env_remove("EXOSCALE_ENDPOINT")
        .env_remove("EXOSCALE_ENVIRONMENT")
        .env_remove("EXOSCALE_ZONE")
        .env_remove("EXOSCALE_TIMEOUT");
    cmd
}

fn with_credentials(project: &TestProject, endpoint: &str) -> Command {
    let mut cmd = cli(project);
    cmd.env("EXOSCALE_API_KEY", "EXOtestkey")
        .env("EXOSCALE_API_SECRET", "testsecret")
        .env("EXOSCALE_ENDPOINT", endpoint);
    cmd
}

/// CLIヘルプが正しく表示されることを確認
#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("fleet-provision").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("宣言したクラウドリソース"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("apply"))
        .stdout(predicate::str::contains("destroy"))
        .stdout(predicate::str::contains("import"));
}

/// バージョン表示が正しく動作することを確認
#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("fleet-provision").unwrap();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("fleet-provision"));
}

/// importコマンドのヘルプに引数が表示されることを確認
#[test]
fn test_import_help() {
    let mut cmd = Command::cargo_bin("fleet-provision").unwrap();
    cmd.arg("import")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("<ADDRESS>"))
        .stdout(predicate::str::contains("<ID>"));
}

/// 型を省略すると一覧が表示されることを確認
#[test]
fn test_schema_lists_types() {
    let mut cmd = Command::cargo_bin("fleet-provision").unwrap();
    cmd.arg("schema")
        .assert()
        .success()
        .stdout(predicate::str::contains("exoscale_sks_nodepool"))
        .stdout(predicate::str::contains("exoscale_instance_pool_list"));
}

/// リソースのスキーマに属性と制約が表示されることを確認
#[test]
fn test_schema_of_resource() {
    let mut cmd = Command::cargo_bin("fleet-provision").unwrap();
    cmd.args(["schema", "exoscale_sks_nodepool"])
        .assert()
        .success()
        .stdout(predicate::str::contains("disk_size"))
        .stdout(predicate::str::contains("default=50"))
        .stdout(predicate::str::contains("force-new"));
}

/// データソースのスキーマを表示できることを確認
#[test]
fn test_schema_of_data_source() {
    let mut cmd = Command::cargo_bin("fleet-provision").unwrap();
    cmd.args(["schema", "--data", "exoscale_instance_pool_list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pools"));
}

/// 未知の型はエラーになることを確認
#[test]
fn test_schema_of_unknown_type() {
    let mut cmd = Command::cargo_bin("fleet-provision").unwrap();
    cmd.args(["schema", "exoscale_compute"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("exoscale_compute"));
}

/// 認証情報なしでも validate は成功することを確認
#[test]
fn test_validate_offline() {
    let project = TestProject::new();
    project.write_manifest(MANIFEST);

    cli(&project)
        .env_remove("EXOSCALE_API_KEY")
        .env_remove("EXOSCALE_API_SECRET")
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("マニフェストは正常です"))
        .stdout(predicate::str::contains("exoscale_network.backend"))
        .stdout(predicate::str::contains("exoscale_domain.main"));
}

/// スキーマ違反がアドレス付きで報告されることを確認
#[test]
fn test_validate_reports_problems() {
    let project = TestProject::new();
    project.write_manifest(
        r#"
provider "exoscale"
resource "exoscale_sks_nodepool" "workers" {
    zone "ch-gva-2"
    cluster_id "c-1"
    name "workers"
    instance_type "standard.medium"
    size 3
    disk_size 10
}
"#,
    );

    cli(&project)
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("設定エラー"))
        .stderr(predicate::str::contains("exoscale_sks_nodepool.workers"))
        .stderr(predicate::str::contains("disk_size"));
}

/// -f で別のマニフェストを指定できることを確認
#[test]
fn test_validate_custom_file() {
    let project = TestProject::new();
    std::fs::write(
        project.path().join("infra.kdl"),
        "provider \"exoscale\"\nresource \"exoscale_affinity\" \"spread\" { name \"spread\" }\n",
    )
    .unwrap();

    cli(&project)
        .args(["validate", "-f", "infra.kdl"])
        .assert()
        .success()
        .stdout(predicate::str::contains("exoscale_affinity.spread"));
}

/// マニフェストがない場合はエラーになることを確認
#[test]
fn test_validate_missing_manifest() {
    let project = TestProject::new();

    cli(&project)
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("マニフェストを読み込めません"));
}

/// 認証情報がなければ plan は失敗することを確認
#[test]
fn test_plan_requires_credentials() {
    let project = TestProject::new();
    project.write_manifest(MANIFEST);

    cli(&project)
        .env_remove("EXOSCALE_API_KEY")
        .env_remove("EXOSCALE_API_SECRET")
        .arg("plan")
        .assert()
        .failure()
        .stderr(predicate::str::contains("EXOSCALE_API_KEY"));
}

/// state が空なら plan はすべて作成になることを確認 (API は呼ばない)
#[test]
fn test_plan_from_empty_state() {
    let project = TestProject::new();
    project.write_manifest(MANIFEST);

    with_credentials(&project, "http://127.0.0.1:9/v2")
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("+ exoscale_network.backend"))
        .stdout(predicate::str::contains("+ exoscale_sks_nodepool.workers"))
        .stdout(predicate::str::contains("2 to create"));
}

/// state が空なら destroy は何もしないことを確認
#[test]
fn test_destroy_nothing() {
    let project = TestProject::new();
    project.write_manifest(MANIFEST);

    with_credentials(&project, "http://127.0.0.1:9/v2")
        .args(["destroy", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("変更はありません"));
}

/// 無効なアドレスの import はエラーになることを確認
#[test]
fn test_import_invalid_address() {
    let project = TestProject::new();
    project.write_manifest(MANIFEST);

    with_credentials(&project, "http://127.0.0.1:9/v2")
        .args(["import", "workers", "np-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("無効なアドレス"));
}
