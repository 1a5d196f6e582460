// Table definitions; every statement is IF NOT EXISTS so init can rerun.

use sqlx::sqlite::SqlitePool;

pub(super) async fn create_tables(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS client (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            machine_id TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS status (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            client_id INTEGER NOT NULL REFERENCES client(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            system TEXT NOT NULL,
            location TEXT NOT NULL,
            insert_utc_ts INTEGER NOT NULL,
            uptime INTEGER NOT NULL,
            cpu_percent REAL NOT NULL,
            net_tx INTEGER NOT NULL,
            net_rx INTEGER NOT NULL,
            disks_total_kb INTEGER NOT NULL,
            disks_avail_kb INTEGER NOT NULL,
            cpu_num_cores INTEGER NOT NULL,
            mem_total REAL NOT NULL,
            mem_free REAL NOT NULL,
            mem_used REAL NOT NULL,
            swap_total REAL NOT NULL,
            swap_free REAL NOT NULL,
            process_count INTEGER NOT NULL,
            connection_count INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_status_client_ts ON status(client_id, insert_utc_ts)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
