// SQLite store for clients and their status snapshots, bounded per client.

mod schema;

use crate::models::{Client, LatestStatus, Metrics, StatusReport};
use sqlx::SqliteConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;

/// Rows removed by one retention sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetentionSweep {
    pub snapshots_deleted: u64,
    pub clients_deleted: u64,
}

pub struct StatusRepo {
    pool: SqlitePool,
    max_records_per_client: u32,
}

impl StatusRepo {
    pub async fn connect(
        path: &str,
        max_pool_size: u32,
        max_records_per_client: u32,
    ) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_pool_size)
            .connect_with(opts)
            .await?;
        Ok(Self {
            pool,
            max_records_per_client,
        })
    }

    pub fn max_records_per_client(&self) -> u32 {
        self.max_records_per_client
    }

    pub async fn init(&self) -> anyhow::Result<()> {
        schema::create_tables(&self.pool).await
    }

    /// Insert or rename the client for `machine_id`; returns its id.
    #[instrument(skip(self, name), fields(repo = "status", operation = "upsert_client"))]
    pub async fn upsert_client(&self, machine_id: &str, name: &str) -> anyhow::Result<i64> {
        let mut conn = self.pool.acquire().await?;
        upsert_client_on(&mut conn, machine_id, name).await
    }

    #[instrument(skip(self, report), fields(repo = "status", operation = "insert_snapshot"))]
    pub async fn insert_snapshot(
        &self,
        client_id: i64,
        report: &StatusReport,
        insert_utc_ts: i64,
    ) -> anyhow::Result<i64> {
        let mut conn = self.pool.acquire().await?;
        insert_snapshot_on(&mut conn, client_id, report, insert_utc_ts).await
    }

    /// Upsert the client and insert its snapshot in one transaction, so a
    /// concurrent sweep never sees the client without the new snapshot.
    /// Returns the client id.
    #[instrument(
        skip(self, report),
        fields(repo = "status", operation = "record_snapshot", machine_id = %report.machine_id)
    )]
    pub async fn record_snapshot(
        &self,
        report: &StatusReport,
        insert_utc_ts: i64,
    ) -> anyhow::Result<i64> {
        let mut tx = self.pool.begin().await?;
        let client_id = upsert_client_on(&mut tx, &report.machine_id, &report.name).await?;
        insert_snapshot_on(&mut tx, client_id, report, insert_utc_ts).await?;
        tx.commit().await?;
        Ok(client_id)
    }

    /// Keep the newest `max_records_per_client` snapshots of every client
    /// (newest by timestamp, then by id), then drop clients left with none.
    /// Running it again without writes in between deletes nothing.
    #[instrument(skip(self), fields(repo = "status", operation = "enforce_retention"))]
    pub async fn enforce_retention(&self) -> anyhow::Result<RetentionSweep> {
        let mut tx = self.pool.begin().await?;
        let snapshots = sqlx::query(
            r#"
            DELETE FROM status WHERE id IN (
                SELECT id FROM (
                    SELECT id, ROW_NUMBER() OVER (
                        PARTITION BY client_id
                        ORDER BY insert_utc_ts DESC, id DESC
                    ) AS rn
                    FROM status
                )
                WHERE rn > $1
            )
            "#,
        )
        .bind(i64::from(self.max_records_per_client))
        .execute(&mut *tx)
        .await?;
        let clients = sqlx::query(
            "DELETE FROM client WHERE NOT EXISTS (SELECT 1 FROM status WHERE status.client_id = client.id)",
        )
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        let sweep = RetentionSweep {
            snapshots_deleted: snapshots.rows_affected(),
            clients_deleted: clients.rows_affected(),
        };
        tracing::debug!(
            snapshots_deleted = sweep.snapshots_deleted,
            clients_deleted = sweep.clients_deleted,
            keep = self.max_records_per_client,
            "retention sweep"
        );
        Ok(sweep)
    }

    /// Newest snapshot (highest id) of every client, with the client's identity.
    #[instrument(skip(self), fields(repo = "status", operation = "latest_per_client"))]
    pub async fn latest_per_client(&self) -> anyhow::Result<Vec<LatestStatus>> {
        let rows = sqlx::query_as::<_, LatestStatus>(
            r#"
            SELECT c.machine_id, c.name,
                   s.id, s.client_id, s.system, s.location, s.insert_utc_ts,
                   s.uptime, s.cpu_percent, s.net_tx, s.net_rx,
                   s.disks_total_kb, s.disks_avail_kb, s.cpu_num_cores,
                   s.mem_total, s.mem_free, s.mem_used, s.swap_total, s.swap_free,
                   s.process_count, s.connection_count
            FROM status s
            JOIN client c ON s.client_id = c.id
            WHERE s.id IN (SELECT MAX(id) FROM status GROUP BY client_id)
            ORDER BY c.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_client(&self, machine_id: &str) -> anyhow::Result<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(
            "SELECT id, machine_id, name FROM client WHERE machine_id = $1",
        )
        .bind(machine_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(client)
    }

    pub async fn client_count(&self) -> anyhow::Result<i64> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM client")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    pub async fn snapshot_count(&self, client_id: i64) -> anyhow::Result<i64> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM status WHERE client_id = $1")
            .bind(client_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    /// Snapshot ids of `client_id`, newest first.
    pub async fn snapshot_ids(&self, client_id: i64) -> anyhow::Result<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM status WHERE client_id = $1 ORDER BY insert_utc_ts DESC, id DESC",
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }
}

async fn upsert_client_on(
    conn: &mut SqliteConnection,
    machine_id: &str,
    name: &str,
) -> anyhow::Result<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO client (machine_id, name) VALUES ($1, $2)
        ON CONFLICT (machine_id) DO UPDATE SET name = excluded.name
        RETURNING id
        "#,
    )
    .bind(machine_id)
    .bind(name)
    .fetch_one(&mut *conn)
    .await?;
    Ok(id)
}

async fn insert_snapshot_on(
    conn: &mut SqliteConnection,
    client_id: i64,
    report: &StatusReport,
    insert_utc_ts: i64,
) -> anyhow::Result<i64> {
    let Metrics {
        uptime,
        cpu_percent,
        net_tx,
        net_rx,
        disks_total_kb,
        disks_avail_kb,
        cpu_num_cores,
        mem_total,
        mem_free,
        mem_used,
        swap_total,
        swap_free,
        process_count,
        connection_count,
    } = report.metrics;
    let r = sqlx::query(
        r#"
        INSERT INTO status (
            client_id, name, system, location, insert_utc_ts,
            uptime, cpu_percent, net_tx, net_rx, disks_total_kb,
            disks_avail_kb, cpu_num_cores, mem_total, mem_free,
            mem_used, swap_total, swap_free, process_count, connection_count
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
        "#,
    )
    .bind(client_id)
    .bind(&report.name)
    .bind(&report.system)
    .bind(&report.location)
    .bind(insert_utc_ts)
    .bind(uptime)
    .bind(cpu_percent)
    .bind(net_tx)
    .bind(net_rx)
    .bind(disks_total_kb)
    .bind(disks_avail_kb)
    .bind(cpu_num_cores)
    .bind(mem_total)
    .bind(mem_free)
    .bind(mem_used)
    .bind(swap_total)
    .bind(swap_free)
    .bind(process_count)
    .bind(connection_count)
    .execute(&mut *conn)
    .await?;
    Ok(r.last_insert_rowid())
}
