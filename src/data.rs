use rusqlite::Connection;
use thiserror::Error;

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::internal_error::InternalResult;

pub type DBConnection = Arc<Mutex<Connection>>;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS seeds (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    type TEXT NOT NULL,
    name TEXT NOT NULL,
    packets_made INTEGER NOT NULL DEFAULT 0,
    seed_source TEXT NOT NULL DEFAULT '',
    date_ordered TEXT,
    date_finished TEXT,
    date_cataloged TEXT,
    date_ran_out TEXT,
    amount_text TEXT NOT NULL DEFAULT '',
    name_key TEXT NOT NULL,
    type_key TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS ix_seeds_type ON seeds (type);
CREATE UNIQUE INDEX IF NOT EXISTS uq_seeds_identity ON seeds (type_key, name_key);

CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    seed_id INTEGER NOT NULL REFERENCES seeds (id) ON DELETE CASCADE,
    task_type TEXT NOT NULL,
    status TEXT NOT NULL,
    priority TEXT NOT NULL DEFAULT 'Medium',
    due_date TEXT,
    completed_at TEXT,
    description TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS ix_tasks_seed_id ON tasks (seed_id);
CREATE INDEX IF NOT EXISTS ix_tasks_due_date ON tasks (due_date);
CREATE UNIQUE INDEX IF NOT EXISTS uq_tasks_seed_type_not_cancelled
    ON tasks (seed_id, task_type) WHERE status <> 'Cancelled';

CREATE TABLE IF NOT EXISTS inventory (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    seed_id INTEGER NOT NULL UNIQUE REFERENCES seeds (id) ON DELETE CASCADE,
    current_amount REAL NOT NULL DEFAULT 0,
    buy_more INTEGER NOT NULL DEFAULT 0,
    extra INTEGER NOT NULL DEFAULT 0,
    notes TEXT NOT NULL DEFAULT '',
    last_updated TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS inventory_adjustments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    seed_id INTEGER NOT NULL REFERENCES seeds (id) ON DELETE CASCADE,
    adjustment_type TEXT NOT NULL,
    amount_change REAL NOT NULL,
    reason TEXT NOT NULL DEFAULT '',
    adjusted_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS ix_inventory_adjustments_seed_id ON inventory_adjustments (seed_id);

CREATE TRIGGER IF NOT EXISTS inventory_adjustments_append_only
    BEFORE UPDATE ON inventory_adjustments
BEGIN
    SELECT RAISE(ABORT, 'inventory adjustments are append-only');
END;
";

/// Opens (creating if needed) the store file and brings the schema up to date.
pub fn open_database(path: &Path) -> InternalResult<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let connection = Connection::open(path)?;
    prepare_connection(&connection)?;

    tracing::info!(path = %path.display(), "database ready");
    Ok(connection)
}

pub fn prepare_connection(connection: &Connection) -> InternalResult<()> {
    connection.pragma_update(None, "foreign_keys", "ON")?;
    connection.execute_batch(SCHEMA)?;
    Ok(())
}

#[derive(Debug, Error)]
#[error("unknown {kind}: '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Stores a fieldless enum as its `as_str()` text and reads it back through `FromStr`.
macro_rules! impl_text_column {
    ($ty:ty) => {
        impl rusqlite::types::ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
                Ok(rusqlite::types::ToSqlOutput::from(self.as_str()))
            }
        }

        impl rusqlite::types::FromSql for $ty {
            fn column_result(
                value: rusqlite::types::ValueRef<'_>,
            ) -> rusqlite::types::FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: crate::data::UnknownVariant| {
                        rusqlite::types::FromSqlError::Other(Box::new(e))
                    })
            }
        }

        impl TryFrom<String> for $ty {
            type Error = crate::data::UnknownVariant;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

pub(crate) use impl_text_column;

#[cfg(test)]
pub fn test_connection() -> Connection {
    let connection = Connection::open_in_memory().unwrap();
    prepare_connection(&connection).unwrap();
    connection
}
