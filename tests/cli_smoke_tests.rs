//! Runs the `integration-store` binary against a SQLite file in a temp dir.

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

fn cli(dir: &TempDir) -> Command {
    let db_path = dir.path().join("store.db");
    let mut cmd = Command::cargo_bin("integration-store").expect("binary builds");
    cmd.current_dir(dir.path())
        .env(
            "INTEGRATION_STORE_DATABASE_URL",
            format!("sqlite://{}?mode=rwc", db_path.display()),
        )
        .env("INTEGRATION_STORE_AUTO_MIGRATE", "true")
        .env("INTEGRATION_STORE_DB_MAX_CONNECTIONS", "1")
        .env("INTEGRATION_STORE_LOG_LEVEL", "warn")
        .env_remove("INTEGRATION_STORE_INTEGRATION_NAME")
        .env_remove("INTEGRATION_STORE_STORE_BACKEND")
        .env_remove("INTEGRATION_STORE_PROFILE");
    cmd
}

fn run_json(dir: &TempDir, args: &[&str]) -> Value {
    let output = cli(dir).args(args).assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).expect("stdout is JSON")
}

#[test]
fn migrate_and_health_report_success() {
    let dir = TempDir::new().unwrap();

    assert_eq!(run_json(&dir, &["migrate"])["migrated"], true);
    assert_eq!(run_json(&dir, &["health"])["healthy"], true);
}

#[test]
fn secrets_settings_and_data_points_round_trip() {
    let dir = TempDir::new().unwrap();

    let created = run_json(&dir, &["-i", "acme", "secrets", "cid1", "sec1"]);
    assert_eq!(created["created"], true);
    let again = run_json(&dir, &["-i", "acme", "secrets", "cid2", "sec2"]);
    assert_eq!(again["created"], false);

    let shown = run_json(&dir, &["-i", "acme", "show"]);
    assert_eq!(shown["client_id"], "cid1");

    run_json(&dir, &["-i", "acme", "--backend", "sql", "setting", "set", "region", "eu"]);
    let setting = run_json(&dir, &["-i", "acme", "setting", "get", "region"]);
    assert_eq!(setting["value"], "eu");

    let point = run_json(&dir, &["-i", "acme", "data", "add", "leads", "{\"n\":1}"]);
    let id = point["id"].as_i64().expect("id is numeric").to_string();
    let listed = run_json(&dir, &["-i", "acme", "data", "list", "leads"]);
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    let deleted = run_json(&dir, &["-i", "acme", "data", "delete", &id]);
    assert_eq!(deleted["deleted"], true);
}

#[test]
fn stale_upsert_is_reported() {
    let dir = TempDir::new().unwrap();
    let payload = |expiry: i64| {
        serde_json::json!({
            "account_id": 1,
            "subdomain": "acme",
            "client_id": "cid",
            "client_secret": "sec",
            "redirect_uri": "https://acme.example/cb",
            "last_query_at": 0,
            "refresh_token": "r",
            "access_token": "a",
            "expire_access_token": expiry,
            "expire_refresh_token": 0,
            "free_query": 0
        })
        .to_string()
    };

    let written = run_json(&dir, &["-i", "acme", "upsert", &payload(200)]);
    assert_eq!(written["outcome"], "written");
    let stale = run_json(&dir, &["-i", "acme", "upsert", &payload(100)]);
    assert_eq!(stale["outcome"], "stale");

    let shown = run_json(&dir, &["-i", "acme", "show"]);
    assert_eq!(shown["expire_access_token"], 200);
    assert_eq!(shown["limit_query"], 5);
}

#[test]
fn store_command_without_integration_fails() {
    let dir = TempDir::new().unwrap();

    cli(&dir).args(["show"]).assert().failure();
}
