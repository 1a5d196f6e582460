// Shared test helpers

#![allow(dead_code)]

use statusd::config::AppConfig;
use statusd::models::StatusForm;
use statusd::status_repo::StatusRepo;
use sqlx::{Connection, SqliteConnection};
use tempfile::TempDir;

pub const DB_FILE: &str = "status.db";

pub const TEST_CONFIG: &str = r#"
[server]
port = 8787
host = "127.0.0.1"

[database]
path = "data/test.db"
max_pool_size = 4
max_records_per_client = 10

[rate_limit]
window_secs = 60
max_requests = 100
client_ip_header = "cf-connecting-ip"

[template]
url = "http://127.0.0.1:9/index.html"
cache_max_age_secs = 3600
"#;

pub fn test_app_config() -> AppConfig {
    AppConfig::load_from_str(TEST_CONFIG).unwrap()
}

/// Fresh, initialized repo in a temp dir. Keep the `TempDir` alive for the test.
pub async fn temp_repo(max_records_per_client: u32) -> (TempDir, StatusRepo) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(DB_FILE);
    let repo = StatusRepo::connect(path.to_str().unwrap(), 4, max_records_per_client)
        .await
        .unwrap();
    repo.init().await.unwrap();
    (dir, repo)
}

/// Form with the required fields only.
pub fn minimal_form(machine_id: &str, name: &str) -> StatusForm {
    StatusForm {
        machine_id: Some(machine_id.into()),
        name: Some(name.into()),
        system: Some("linux".into()),
        uptime: Some("100".into()),
        ..Default::default()
    }
}

/// Run `sql` against the repo's database over a separate connection.
pub async fn exec_on_db(dir: &TempDir, sql: &str) {
    let path = dir.path().join(DB_FILE);
    let mut conn = SqliteConnection::connect(&format!("sqlite:{}", path.to_str().unwrap()))
        .await
        .unwrap();
    sqlx::query(sql).execute(&mut conn).await.unwrap();
    conn.close().await.unwrap();
}

pub const FAIL_STATUS_DELETE: &str =
    "CREATE TRIGGER fail_status_delete BEFORE DELETE ON status BEGIN SELECT RAISE(ABORT, 'delete blocked'); END";

pub const FAIL_STATUS_INSERT: &str =
    "CREATE TRIGGER fail_status_insert BEFORE INSERT ON status BEGIN SELECT RAISE(ABORT, 'insert blocked'); END";
