//! Users and messages: just enough storage to resolve display names.

use rusqlite::{OptionalExtension, params};
use warble_types::{MessageId, OriginId, UserId};

use crate::{Database, StorageError};

/// Which user of a message to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsgUserColumn {
    Author,
    Sender,
}

impl MsgUserColumn {
    const fn column(self) -> &'static str {
        match self {
            Self::Author => "author_id",
            Self::Sender => "sender_id",
        }
    }
}

impl Database {
    pub fn insert_user(
        &self,
        origin_id: OriginId,
        username: &str,
        real_name: Option<&str>,
    ) -> Result<UserId, StorageError> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO user (origin_id, username, real_name) VALUES (?1, ?2, ?3)",
            params![origin_id.value(), username, real_name],
        )?;
        Ok(UserId::new(conn.last_insert_rowid()))
    }

    pub fn insert_msg(
        &self,
        origin_id: OriginId,
        author_id: UserId,
        sender_id: UserId,
        body: &str,
        sent_date: i64,
    ) -> Result<MessageId, StorageError> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO msg (origin_id, author_id, sender_id, body, sent_date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                origin_id.value(),
                author_id.value(),
                sender_id.value(),
                body,
                sent_date
            ],
        )?;
        Ok(MessageId::new(conn.last_insert_rowid()))
    }

    /// Username of the author (or sender) of message `msg_id`.
    pub fn msg_id_to_username(
        &self,
        column: MsgUserColumn,
        msg_id: MessageId,
    ) -> Result<Option<String>, StorageError> {
        let sql = format!(
            "SELECT user.username FROM msg JOIN user ON user.id = msg.{} WHERE msg.id = ?1",
            column.column()
        );
        Ok(self
            .conn()
            .query_row(&sql, [msg_id.value()], |row| row.get(0))
            .optional()?)
    }

    pub fn user_id_to_name(&self, user_id: UserId) -> Result<Option<String>, StorageError> {
        Ok(self
            .conn()
            .query_row(
                "SELECT username FROM user WHERE id = ?1",
                [user_id.value()],
                |row| row.get(0),
            )
            .optional()?)
    }

    pub fn set_avatar_file_name(
        &self,
        user_id: UserId,
        file_name: Option<&str>,
    ) -> Result<(), StorageError> {
        self.conn().execute(
            "UPDATE user SET avatar_file = ?2 WHERE id = ?1",
            params![user_id.value(), file_name],
        )?;
        Ok(())
    }

    pub fn avatar_file_name(&self, user_id: UserId) -> Result<Option<String>, StorageError> {
        let stored: Option<Option<String>> = self
            .conn()
            .query_row(
                "SELECT avatar_file FROM user WHERE id = ?1",
                [user_id.value()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(stored.flatten())
    }
}
