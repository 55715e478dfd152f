//! Database schema management.

use rusqlite::Connection;
use tokio_rusqlite::Error;

/// Initialize the database schema.
pub fn init_schema(conn: &Connection) -> Result<(), Error> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

const SCHEMA: &str = r#"
-- One row per remote object to ferry. Rows are never deleted.
CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    item_key TEXT NOT NULL UNIQUE,
    status TEXT NOT NULL DEFAULT 'available',
    owner TEXT,
    discovered_at TEXT NOT NULL,
    last_attempted_at TEXT,
    completed_at TEXT,
    attempt_count INTEGER NOT NULL DEFAULT 0,
    error_message TEXT
);

-- Indexes for claim candidate selection and status reporting
CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);
CREATE INDEX IF NOT EXISTS idx_tasks_owner ON tasks(owner);
CREATE INDEX IF NOT EXISTS idx_tasks_status_attempts ON tasks(status, attempt_count, discovered_at);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_creation() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        // Verify table exists
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name='tasks'")
            .unwrap();
        assert!(stmt.exists([]).unwrap());

        // Schema is idempotent
        init_schema(&conn).unwrap();
    }

    #[test]
    fn test_item_key_unique() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        conn.execute(
            "INSERT INTO tasks (item_key, discovered_at) VALUES ('k', '2024-01-01T00:00:00Z')",
            [],
        )
        .unwrap();
        let dup = conn.execute(
            "INSERT INTO tasks (item_key, discovered_at) VALUES ('k', '2024-01-01T00:00:00Z')",
            [],
        );
        assert!(dup.is_err());
    }
}
