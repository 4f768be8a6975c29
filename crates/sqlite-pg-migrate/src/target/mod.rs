//! PostgreSQL target database operations.

mod replication;

pub use replication::ReplicationGuard;

use crate::ddl::multi_insert_sql;
use crate::error::{MigrateError, Result};
use crate::transform::PgValue;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, error, info};

/// Target database handle.
///
/// Owns a single connection, exclusively held by the orchestrator for the
/// duration of the run; the connection driver task is spawned here.
pub struct PgTarget {
    client: Client,
}

impl PgTarget {
    /// Connect to PostgreSQL and probe the connection.
    pub async fn connect(dsn: &str) -> Result<Self> {
        let (client, connection) = tokio_postgres::connect(dsn, NoTls).await?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("PostgreSQL connection error: {}", e);
            }
        });

        client.simple_query("SELECT 1").await?;
        info!("Connected to PostgreSQL target");

        Ok(Self { client })
    }

    /// Execute a DDL statement; errors carry the table name for remediation.
    pub async fn execute_ddl(&self, sql: &str, table: &str) -> Result<()> {
        self.client
            .batch_execute(sql)
            .await
            .map_err(|e| MigrateError::ddl(table, e.to_string()))?;
        debug!("Created table \"{}\" (if absent)", table);
        Ok(())
    }

    /// Bulk-load transformed rows in page-sized batches.
    ///
    /// Referential-integrity enforcement is suspended for the session while
    /// loading (best-effort) and restored on every exit path, including
    /// batch failure. Returns the number of rows actually inserted;
    /// conflict no-ops are not counted.
    pub async fn load_table(
        &self,
        table: &str,
        columns: &[String],
        rows: Vec<Vec<PgValue>>,
        batch_size: usize,
    ) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }

        let guard = ReplicationGuard::suspend(&self.client).await;
        let result = self.insert_batches(table, columns, rows, batch_size).await;
        guard.restore(&self.client).await;

        result
    }

    async fn insert_batches(
        &self,
        table: &str,
        columns: &[String],
        rows: Vec<Vec<PgValue>>,
        batch_size: usize,
    ) -> Result<u64> {
        let mut inserted: u64 = 0;

        for batch in rows.chunks(batch_size.max(1)) {
            let sql = multi_insert_sql(table, columns, batch.len())?;
            let params: Vec<&(dyn ToSql + Sync)> = batch
                .iter()
                .flatten()
                .map(|v| v as &(dyn ToSql + Sync))
                .collect();

            let count = self
                .client
                .execute(sql.as_str(), &params)
                .await
                .map_err(|e| MigrateError::load(table, e.to_string()))?;
            inserted += count;
        }

        Ok(inserted)
    }
}
