//! Error types for the migration library.

use thiserror::Error;

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid flag value, missing path, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source database connection or query error
    #[error("Source database error: {0}")]
    Source(#[from] rusqlite::Error),

    /// Target database connection or query error
    #[error("Target database error: {0}")]
    Target(#[from] tokio_postgres::Error),

    /// Reading schema or rows from the source failed for a table
    #[error("Introspection failed for table {table}: {message}")]
    Introspect { table: String, message: String },

    /// Target rejected the generated schema for a table
    #[error("DDL execution failed for table {table}: {message}")]
    Ddl { table: String, message: String },

    /// Bulk insert failed for a table
    #[error("Bulk load failed for table {table}: {message}")]
    Load { table: String, message: String },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MigrateError {
    /// Create an Introspect error with table context.
    pub fn introspect(table: impl Into<String>, message: impl Into<String>) -> Self {
        MigrateError::Introspect {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a Ddl error with table context.
    pub fn ddl(table: impl Into<String>, message: impl Into<String>) -> Self {
        MigrateError::Ddl {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a Load error with table context.
    pub fn load(table: impl Into<String>, message: impl Into<String>) -> Self {
        MigrateError::Load {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Process exit code for this error category.
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrateError::Config(_) => 1,
            MigrateError::Source(_) | MigrateError::Introspect { .. } => 2,
            MigrateError::Target(_) => 3,
            MigrateError::Ddl { .. } => 4,
            MigrateError::Load { .. } => 5,
            MigrateError::Io(_) => 7,
            MigrateError::Json(_) => 1,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
