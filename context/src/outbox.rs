//! Persisted queue of commands handed to the command layer.

use chrono::Utc;
use rusqlite::params;
use warble_types::{CommandData, CommandId, CommandResult};

use crate::{Database, StorageError};

/// A command waiting in the outbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxEntry {
    pub row_id: i64,
    pub queued_at: i64,
    pub command: CommandData,
}

impl Database {
    /// Append `command` to the outbox.
    pub fn enqueue_command(&self, command: &CommandData) -> Result<i64, StorageError> {
        let data = serde_json::to_string(command)?;
        let command_id = i64::try_from(command.id().value())
            .map_err(|_| StorageError::Malformed(format!("command id {}", command.id())))?;
        let conn = self.conn();
        conn.execute(
            "INSERT INTO outbox (command_id, kind, data, queued_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                command_id,
                command.kind.name(),
                data,
                Utc::now().timestamp_millis()
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Commands not yet completed, oldest first.
    pub fn pending_commands(&self) -> Result<Vec<OutboxEntry>, StorageError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, queued_at, data FROM outbox WHERE completed_at IS NULL ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (row_id, queued_at, data) = row?;
            match serde_json::from_str::<CommandData>(&data) {
                Ok(command) => entries.push(OutboxEntry {
                    row_id,
                    queued_at,
                    command,
                }),
                Err(e) => tracing::warn!(row_id, "Skipping unreadable outbox entry: {e}"),
            }
        }
        Ok(entries)
    }

    /// Mark the outbox entry `row_id` as completed with `result`.
    ///
    /// Returns false when no pending entry matched.
    pub fn complete_command(
        &self,
        row_id: i64,
        result: &CommandResult,
    ) -> Result<bool, StorageError> {
        let result = serde_json::to_string(result)?;
        let updated = self.conn().execute(
            "UPDATE outbox SET completed_at = ?2, result = ?3
             WHERE id = ?1 AND completed_at IS NULL",
            params![row_id, Utc::now().timestamp_millis(), result],
        )?;
        Ok(updated > 0)
    }

    /// Row id of the pending entry for process-local `command_id`, if any.
    pub fn pending_row_for(&self, command_id: CommandId) -> Result<Option<i64>, StorageError> {
        Ok(self
            .pending_commands()?
            .into_iter()
            .find(|entry| entry.command.id() == command_id)
            .map(|entry| entry.row_id))
    }
}
