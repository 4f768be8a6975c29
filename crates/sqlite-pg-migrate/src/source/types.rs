//! Schema descriptor types read from the source database.

use serde::{Deserialize, Serialize};

/// Table descriptor: name plus ordered column descriptors.
///
/// One per source table, immutable once read; column order is preserved
/// everywhere downstream (DDL and row tuples).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    /// Table name.
    pub name: String,

    /// Column definitions in source order.
    pub columns: Vec<Column>,
}

impl Table {
    /// Column names in source order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Primary key column names in source order.
    pub fn primary_key(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.name.clone())
            .collect()
    }

    /// Check if the table has a primary key.
    pub fn has_pk(&self) -> bool {
        self.columns.iter().any(|c| c.primary_key)
    }
}

/// Column descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,

    /// Declared type as written in the source schema. SQLite allows
    /// untyped columns, in which case this is empty.
    pub decl_type: String,

    /// Whether the column carries NOT NULL.
    pub not_null: bool,

    /// Raw default expression, if any.
    pub default: Option<String>,

    /// Whether the column is part of the primary key.
    pub primary_key: bool,
}
