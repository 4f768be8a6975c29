//! Migration orchestrator - main workflow coordinator.
//!
//! Tables are processed sequentially and independently: schema creation
//! and data load for one table are committed before the next table
//! starts. A table failure is recorded in its outcome and the loop
//! continues; failures are surfaced in the final result, never silently
//! treated as success.

use crate::config::Config;
use crate::ddl::create_table_sql;
use crate::error::Result;
use crate::source::{SqliteSource, Table};
use crate::target::PgTarget;
use crate::transform::coerce_row;
use crate::typemap::json_columns_for_table;
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

/// Migration orchestrator.
pub struct Orchestrator {
    config: Config,
    source: SqliteSource,
    // Not connected in dry-run mode: nothing is ever executed there.
    target: Option<PgTarget>,
}

/// Per-table state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TableStatus {
    Pending,
    Skipped,
    DryRunReported,
    SchemaCreated,
    DataLoaded,
    Done,
    Failed,
}

/// Outcome of one table's migration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableOutcome {
    /// Table name.
    pub table: String,

    /// Final status.
    pub status: TableStatus,

    /// Rows inserted into the target (conflict no-ops excluded).
    pub rows_loaded: u64,

    /// Error message, when status is failed.
    pub error: Option<String>,
}

/// Result of a migration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationResult {
    /// When the migration started.
    pub started_at: DateTime<Utc>,

    /// When the migration completed.
    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// Total tables seen in the source.
    pub tables_total: usize,

    /// Tables fully migrated (or dry-run-reported).
    pub tables_migrated: usize,

    /// Tables skipped via the skip list.
    pub tables_skipped: usize,

    /// Tables that failed.
    pub tables_failed: usize,

    /// Total rows inserted.
    pub rows_loaded: u64,

    /// Names of failed tables.
    pub failed_tables: Vec<String>,

    /// Per-table outcomes in processing order.
    pub outcomes: Vec<TableOutcome>,
}

impl MigrationResult {
    /// Whether every processed table succeeded.
    pub fn is_success(&self) -> bool {
        self.tables_failed == 0
    }

    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Orchestrator {
    /// Create a new orchestrator: open the source and, unless this is a
    /// dry run, connect the target.
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let source = SqliteSource::open(&config.source_path)?;
        let target = if config.dry_run {
            info!("Dry-run mode: target will not be connected");
            None
        } else {
            Some(PgTarget::connect(&config.target_dsn).await?)
        };

        Ok(Self {
            config,
            source,
            target,
        })
    }

    /// Run the migration over every source table.
    pub async fn run(&self) -> Result<MigrationResult> {
        let started_at = Utc::now();

        let tables = self.source.table_names()?;
        if tables.is_empty() {
            warn!("No tables found in source database");
        } else {
            info!("Found {} tables to migrate", tables.len());
        }

        let mut outcomes = Vec::with_capacity(tables.len());

        for name in &tables {
            if self.config.skip_tables.contains(&name.to_lowercase()) {
                info!("Skipping table {}", name);
                outcomes.push(TableOutcome {
                    table: name.clone(),
                    status: TableStatus::Skipped,
                    rows_loaded: 0,
                    error: None,
                });
                continue;
            }

            // One table's failure stops that table only; the loop moves on
            // and the failure is reported in the result.
            match self.migrate_table(name).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    error!("{}: migration failed - {}", name, e);
                    outcomes.push(TableOutcome {
                        table: name.clone(),
                        status: TableStatus::Failed,
                        rows_loaded: 0,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        let completed_at = Utc::now();
        let duration = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;

        let mut result = MigrationResult {
            started_at,
            completed_at,
            duration_seconds: duration,
            tables_total: tables.len(),
            tables_migrated: 0,
            tables_skipped: 0,
            tables_failed: 0,
            rows_loaded: 0,
            failed_tables: Vec::new(),
            outcomes,
        };

        for outcome in &result.outcomes {
            match outcome.status {
                TableStatus::Done | TableStatus::DryRunReported => {
                    result.tables_migrated += 1;
                    result.rows_loaded += outcome.rows_loaded;
                }
                TableStatus::Skipped => result.tables_skipped += 1,
                TableStatus::Failed => {
                    result.tables_failed += 1;
                    result.failed_tables.push(outcome.table.clone());
                }
                _ => {}
            }
        }

        info!(
            "Migration finished: {}/{} tables, {} rows in {:.1}s ({} skipped, {} failed)",
            result.tables_migrated,
            result.tables_total,
            result.rows_loaded,
            result.duration_seconds,
            result.tables_skipped,
            result.tables_failed
        );

        Ok(result)
    }

    /// Migrate one table: introspect, generate DDL, create, bulk-load.
    async fn migrate_table(&self, name: &str) -> Result<TableOutcome> {
        info!("Migrating table: {}", name);

        let table = self
            .source
            .table_info(name)
            .map_err(|e| introspect_context(name, e))?;
        let samples = self
            .source
            .sample_rows(&table, self.config.sample_rows)
            .map_err(|e| introspect_context(name, e))?;
        let json_cols = json_columns_for_table(
            &table,
            &samples,
            &self.config.json_name_hints,
            &self.config.json_columns,
        );
        if !json_cols.is_empty() {
            debug!("{}: JSON columns: {:?}", name, json_cols);
        }

        let column_samples = first_samples(&table, &samples);
        let ddl = create_table_sql(&table, &json_cols, &column_samples)?;

        // Console reports per-table DDL so generated schemas can be
        // reviewed and tweaked by hand
        println!("-- {}\n{}", name, ddl);

        if self.config.dry_run {
            return Ok(TableOutcome {
                table: name.to_string(),
                status: TableStatus::DryRunReported,
                rows_loaded: 0,
                error: None,
            });
        }

        let target = self
            .target
            .as_ref()
            .expect("target is connected outside dry-run");

        target.execute_ddl(&ddl, name).await?;
        debug!("{}: reached {:?}", name, TableStatus::SchemaCreated);

        let rows = self
            .source
            .fetch_rows(&table)
            .map_err(|e| introspect_context(name, e))?;
        if rows.is_empty() {
            println!("  no rows for {}", name);
            return Ok(TableOutcome {
                table: name.to_string(),
                status: TableStatus::Done,
                rows_loaded: 0,
                error: None,
            });
        }

        let transformed: Vec<_> = rows
            .into_iter()
            .map(|row| coerce_row(row, &table, &json_cols))
            .collect();
        let row_count = transformed.len();

        let loaded = target
            .load_table(
                name,
                &table.column_names(),
                transformed,
                self.config.batch_size,
            )
            .await?;
        debug!("{}: reached {:?}", name, TableStatus::DataLoaded);

        println!("  inserted {} of {} rows into {}", loaded, row_count, name);

        Ok(TableOutcome {
            table: name.to_string(),
            status: TableStatus::Done,
            rows_loaded: loaded,
            error: None,
        })
    }
}

/// Attach table context to source-side failures so remediation knows the
/// phase that broke.
fn introspect_context(table: &str, err: crate::error::MigrateError) -> crate::error::MigrateError {
    match err {
        e @ crate::error::MigrateError::Introspect { .. } => e,
        other => crate::error::MigrateError::introspect(table, other.to_string()),
    }
}

/// First non-null sampled value per column, for the type mapper.
fn first_samples(table: &Table, samples: &[Vec<Value>]) -> Vec<Option<Value>> {
    (0..table.columns.len())
        .map(|i| {
            samples
                .iter()
                .filter_map(|row| row.get(i))
                .find(|v| !matches!(v, Value::Null))
                .cloned()
        })
        .collect()
}
