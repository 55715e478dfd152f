//! SQLite task store implementation.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Row, ToSql, params};
use tokio_rusqlite::Connection;

use crate::error::QueueError;
use crate::schema::init_schema;
use crate::store::{InsertOutcome, TaskStore, TaskUpdate};
use crate::task::{Task, TaskStatus};

#[cfg(test)]
#[path = "sqlite_tests.rs"]
mod tests;

/// SQLite-backed task store.
///
/// Clones share one connection actor, so many claim loops in the same
/// process still funnel through a single serialized connection.
#[derive(Clone)]
pub struct SqliteTaskStore {
    conn: Connection,
}

impl SqliteTaskStore {
    /// Open a file-backed store, creating the schema if needed.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, QueueError> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(path)
            .await
            .map_err(|e| QueueError::Database(e.to_string()))?;

        conn.call(|conn| {
            conn.busy_timeout(Duration::from_secs(5))?;
            // journal_mode returns a row, so execute_batch would reject it
            conn.query_row("PRAGMA journal_mode = WAL", [], |_row| Ok(()))?;
            Ok(init_schema(conn)?)
        })
        .await
        .map_err(|e| QueueError::Database(e.to_string()))?;

        Ok(Self { conn })
    }

    /// Create a new in-memory store.
    pub async fn in_memory() -> Result<Self, QueueError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| QueueError::Database(e.to_string()))?;

        conn.call(|conn| Ok(init_schema(conn)?))
            .await
            .map_err(|e| QueueError::Database(e.to_string()))?;

        Ok(Self { conn })
    }
}

fn parse_dt(column: usize, value: String) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn row_to_task(row: &Row<'_>) -> Result<Task, rusqlite::Error> {
    let status_text: String = row.get(2)?;
    let status = status_text.parse::<TaskStatus>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let discovered_raw: String = row.get(4)?;
    let last_attempted_raw: Option<String> = row.get(5)?;
    let completed_raw: Option<String> = row.get(6)?;

    Ok(Task {
        id: row.get(0)?,
        item_key: row.get(1)?,
        status,
        owner: row.get(3)?,
        discovered_at: parse_dt(4, discovered_raw)?,
        last_attempted_at: last_attempted_raw.map(|v| parse_dt(5, v)).transpose()?,
        completed_at: completed_raw.map(|v| parse_dt(6, v)).transpose()?,
        attempt_count: row.get(7)?,
        error_message: row.get(8)?,
    })
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    async fn insert_if_absent(&self, item_key: &str) -> Result<InsertOutcome, QueueError> {
        let item_key = item_key.to_string();
        let discovered_at = Utc::now().to_rfc3339();
        let changed = self
            .conn
            .call(move |conn| {
                let changed = conn.execute(
                    "INSERT OR IGNORE INTO tasks (item_key, status, discovered_at)
                     VALUES (?1, ?2, ?3)",
                    params![item_key, TaskStatus::Available.as_str(), discovered_at],
                )?;
                Ok(changed)
            })
            .await
            .map_err(|e| QueueError::Database(e.to_string()))?;

        if changed == 1 {
            Ok(InsertOutcome::Inserted)
        } else {
            Ok(InsertOutcome::AlreadyPresent)
        }
    }

    async fn find_by_key(&self, item_key: &str) -> Result<Option<Task>, QueueError> {
        let item_key = item_key.to_string();
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, item_key, status, owner, discovered_at, last_attempted_at,
                            completed_at, attempt_count, error_message
                     FROM tasks WHERE item_key = ?1",
                )?;
                match stmt.query_row([&item_key], row_to_task) {
                    Ok(task) => Ok(Some(task)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(|e| QueueError::Database(e.to_string()))
    }

    async fn get(&self, id: i64) -> Result<Option<Task>, QueueError> {
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, item_key, status, owner, discovered_at, last_attempted_at,
                            completed_at, attempt_count, error_message
                     FROM tasks WHERE id = ?1",
                )?;
                match stmt.query_row(params![id], row_to_task) {
                    Ok(task) => Ok(Some(task)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(|e| QueueError::Database(e.to_string()))
    }

    async fn next_eligible(&self, max_attempts: u32) -> Result<Option<Task>, QueueError> {
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, item_key, status, owner, discovered_at, last_attempted_at,
                            completed_at, attempt_count, error_message
                     FROM tasks
                     WHERE owner IS NULL
                       AND (status = 'available'
                            OR (status IN ('failed_download', 'failed_upload')
                                AND attempt_count < ?1))
                     ORDER BY attempt_count ASC, discovered_at ASC
                     LIMIT 1",
                )?;
                match stmt.query_row(params![max_attempts], row_to_task) {
                    Ok(task) => Ok(Some(task)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(|e| QueueError::Database(e.to_string()))
    }

    async fn update_fields(
        &self,
        id: i64,
        expected_owner: Option<&str>,
        update: TaskUpdate,
    ) -> Result<usize, QueueError> {
        let expected_owner = expected_owner.map(|s| s.to_string());
        self.conn
            .call(move |conn| {
                let mut sets: Vec<String> = Vec::new();
                let mut values: Vec<Box<dyn ToSql>> = Vec::new();

                if let Some(status) = update.status {
                    values.push(Box::new(status.as_str()));
                    sets.push(format!("status = ?{}", values.len()));
                }
                if let Some(owner) = update.owner {
                    values.push(Box::new(owner));
                    sets.push(format!("owner = ?{}", values.len()));
                }
                if let Some(at) = update.last_attempted_at {
                    values.push(Box::new(at.to_rfc3339()));
                    sets.push(format!("last_attempted_at = ?{}", values.len()));
                }
                if let Some(at) = update.completed_at {
                    values.push(Box::new(at.to_rfc3339()));
                    sets.push(format!("completed_at = ?{}", values.len()));
                }
                if let Some(message) = update.error_message {
                    values.push(Box::new(message));
                    sets.push(format!("error_message = ?{}", values.len()));
                }
                if update.bump_attempt {
                    sets.push("attempt_count = attempt_count + 1".to_string());
                }
                if sets.is_empty() {
                    return Ok(0);
                }

                values.push(Box::new(id));
                let mut conditions = vec![format!("id = ?{}", values.len())];
                match expected_owner {
                    Some(owner) => {
                        values.push(Box::new(owner));
                        conditions.push(format!("owner = ?{}", values.len()));
                    }
                    None => conditions.push("owner IS NULL".to_string()),
                }
                if let Some(status) = update.guard_status {
                    values.push(Box::new(status.as_str()));
                    conditions.push(format!("status = ?{}", values.len()));
                }
                if let Some(attempts) = update.guard_attempts {
                    values.push(Box::new(attempts));
                    conditions.push(format!("attempt_count = ?{}", values.len()));
                }

                let sql = format!(
                    "UPDATE tasks SET {} WHERE {}",
                    sets.join(", "),
                    conditions.join(" AND ")
                );
                let param_refs: Vec<&dyn ToSql> = values.iter().map(|b| b.as_ref()).collect();
                let affected = conn.execute(&sql, param_refs.as_slice())?;
                Ok(affected)
            })
            .await
            .map_err(|e| QueueError::Database(e.to_string()))
    }

    async fn reclaim_stale(
        &self,
        stale_after: Duration,
        max_attempts: u32,
    ) -> Result<usize, QueueError> {
        let stale_after =
            chrono::Duration::from_std(stale_after).map_err(|e| QueueError::Custom(e.to_string()))?;
        let cutoff = (Utc::now() - stale_after).to_rfc3339();
        self.conn
            .call(move |conn| {
                // SET expressions see the pre-update row, so the old owner is
                // still available for the message.
                let affected = conn.execute(
                    "UPDATE tasks
                     SET status = CASE
                             WHEN attempt_count >= ?1 THEN 'permanent_failure'
                             WHEN status = 'downloaded' THEN 'failed_upload'
                             ELSE 'failed_download'
                         END,
                         owner = NULL,
                         error_message = 'Reclaimed from stale owner ' || owner
                     WHERE owner IS NOT NULL
                       AND status IN ('processing', 'downloaded')
                       AND last_attempted_at < ?2",
                    params![max_attempts, cutoff],
                )?;
                Ok(affected)
            })
            .await
            .map_err(|e| QueueError::Database(e.to_string()))
    }

    async fn counts_by_status(&self) -> Result<Vec<(TaskStatus, i64)>, QueueError> {
        let counts = self
            .conn
            .call(|conn| {
                let mut stmt =
                    conn.prepare("SELECT status, COUNT(*) FROM tasks GROUP BY status ORDER BY status")?;
                let rows = stmt.query_map([], |row| {
                    let status: String = row.get(0)?;
                    let count: i64 = row.get(1)?;
                    Ok((status, count))
                })?;
                let mut counts = Vec::new();
                for row in rows {
                    counts.push(row?);
                }
                Ok(counts)
            })
            .await
            .map_err(|e| QueueError::Database(e.to_string()))?;

        counts
            .into_iter()
            .map(|(status, count)| {
                status
                    .parse::<TaskStatus>()
                    .map(|s| (s, count))
                    .map_err(|e| QueueError::InvalidStatus(e.0))
            })
            .collect()
    }
}
