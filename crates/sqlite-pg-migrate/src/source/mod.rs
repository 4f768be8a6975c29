//! SQLite source database operations.

mod types;

pub use types::*;

use crate::ddl::quote_ident;
use crate::error::{MigrateError, Result};
use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use tracing::{debug, info};

/// Source database handle.
///
/// Owns a single read-only connection for the duration of the run; the
/// source file is never written to.
pub struct SqliteSource {
    conn: Connection,
}

impl SqliteSource {
    /// Open a SQLite database file read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path.as_ref(),
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        info!("Opened SQLite source: {}", path.as_ref().display());
        Ok(Self { conn })
    }

    /// List user table names, ordered by name. `sqlite_` internals are
    /// excluded.
    pub fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        debug!("Found {} tables in source", names.len());
        Ok(names)
    }

    /// Read the column descriptors for a table via `PRAGMA table_info`.
    pub fn table_info(&self, table: &str) -> Result<Table> {
        let sql = format!("PRAGMA table_info({})", quote_ident(table)?);
        let mut stmt = self.conn.prepare(&sql)?;

        // table_info rows: (cid, name, type, notnull, dflt_value, pk)
        let columns = stmt
            .query_map([], |row| {
                Ok(Column {
                    name: row.get::<_, String>(1)?,
                    decl_type: row.get::<_, String>(2)?,
                    not_null: row.get::<_, i64>(3)? != 0,
                    default: row.get::<_, Option<String>>(4)?,
                    primary_key: row.get::<_, i64>(5)? != 0,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if columns.is_empty() {
            return Err(MigrateError::introspect(
                table,
                "table has no columns (does it exist?)",
            ));
        }

        Ok(Table {
            name: table.to_string(),
            columns,
        })
    }

    /// Fetch the first `limit` rows of a table for heuristic sampling.
    pub fn sample_rows(&self, table: &Table, limit: usize) -> Result<Vec<Vec<Value>>> {
        let sql = format!(
            "SELECT {} FROM {} LIMIT {}",
            quoted_column_list(table)?,
            quote_ident(&table.name)?,
            limit
        );
        self.query_rows(&sql, table.columns.len())
    }

    /// Fetch all rows of a table, columns in descriptor order.
    pub fn fetch_rows(&self, table: &Table) -> Result<Vec<Vec<Value>>> {
        let sql = format!(
            "SELECT {} FROM {}",
            quoted_column_list(table)?,
            quote_ident(&table.name)?
        );
        self.query_rows(&sql, table.columns.len())
    }

    /// Row count for console reporting.
    pub fn row_count(&self, table: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table)?);
        let count = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count)
    }

    fn query_rows(&self, sql: &str, width: usize) -> Result<Vec<Vec<Value>>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map([], |row| {
                let mut values = Vec::with_capacity(width);
                for i in 0..width {
                    values.push(row.get::<_, Value>(i)?);
                }
                Ok(values)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn quoted_column_list(table: &Table) -> Result<String> {
    let quoted: Vec<String> = table
        .columns
        .iter()
        .map(|c| quote_ident(&c.name))
        .collect::<Result<_>>()?;
    Ok(quoted.join(", "))
}
