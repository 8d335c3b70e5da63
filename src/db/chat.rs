use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, StoreError};
use crate::models::{Conversation, Message, MessageRole};

fn row_to_conversation(row: &Row) -> rusqlite::Result<Conversation> {
    let started_at: String = row.get(2)?;
    Ok(Conversation {
        id: row.get(0)?,
        user_id: row.get(1)?,
        started_at: chrono::DateTime::parse_from_rfc3339(&started_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        reason: row.get(3)?,
        status: row.get(4)?,
    })
}

fn row_to_message(row: &Row) -> rusqlite::Result<Message> {
    let created_at: String = row.get(2)?;
    let role: String = row.get(3)?;
    Ok(Message {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        // The schema CHECK admits exactly the two parseable values.
        role: MessageRole::parse(&role).unwrap_or(MessageRole::Assistant),
        content: row.get(4)?,
    })
}

impl Database {
    /// Open a new conversation for the user. Created lazily by the chat flow
    /// on the first outgoing message.
    pub fn start_conversation(&self, user_id: i64, reason: &str) -> Result<i64> {
        if !self.user_exists(user_id)? {
            return Err(StoreError::UserNotFound(user_id).into());
        }

        let reason = if reason.trim().is_empty() {
            "consultation"
        } else {
            reason.trim()
        };

        self.conn().execute(
            "INSERT INTO conversations (user_id, started_at, reason, status)
             VALUES (?, ?, ?, 'open')",
            params![user_id, Utc::now().to_rfc3339(), reason],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    pub(crate) fn conversation_exists(&self, conversation_id: i64) -> Result<bool> {
        let found: Option<i64> = self
            .conn()
            .query_row(
                "SELECT 1 FROM conversations WHERE id = ?",
                [conversation_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Append a message. Empty content is allowed; a missing conversation is
    /// a precondition error raised before any write.
    pub fn add_message(
        &self,
        conversation_id: i64,
        role: MessageRole,
        content: &str,
    ) -> Result<i64> {
        if !self.conversation_exists(conversation_id)? {
            return Err(StoreError::ConversationNotFound(conversation_id).into());
        }

        self.conn().execute(
            "INSERT INTO messages (conversation_id, created_at, role, content)
             VALUES (?, ?, ?, ?)",
            params![
                conversation_id,
                Utc::now().to_rfc3339(),
                role.as_str(),
                content
            ],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    /// Full message sequence for a conversation, ordered by insertion
    /// sequence (the monotonic id, not wall-clock time).
    pub fn messages(&self, conversation_id: i64) -> Result<Vec<Message>> {
        if !self.conversation_exists(conversation_id)? {
            return Err(StoreError::ConversationNotFound(conversation_id).into());
        }

        let mut stmt = self.conn().prepare(
            "SELECT id, conversation_id, created_at, role, content
               FROM messages
              WHERE conversation_id = ?
              ORDER BY id ASC",
        )?;

        let messages = stmt
            .query_map([conversation_id], row_to_message)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(messages)
    }

    /// Conversations for the user that contain at least one user-authored
    /// message, newest first. Abandoned sessions stay invisible but are not
    /// deleted.
    pub fn conversations_for_user(&self, user_id: i64) -> Result<Vec<Conversation>> {
        let mut stmt = self.conn().prepare(
            "SELECT c.id, c.user_id, c.started_at, c.reason, c.status
               FROM conversations c
              WHERE c.user_id = ?
                AND EXISTS (SELECT 1 FROM messages m
                             WHERE m.conversation_id = c.id
                               AND m.role = 'user')
              ORDER BY c.id DESC",
        )?;

        let conversations = stmt
            .query_map([user_id], row_to_conversation)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(conversations)
    }

    /// Destructive and irreversible: the FK cascade removes the
    /// conversation's messages and recommendations. Callers confirm with the
    /// end user first.
    pub fn delete_conversation(&self, conversation_id: i64) -> Result<()> {
        self.conn().execute(
            "DELETE FROM conversations WHERE id = ?",
            [conversation_id],
        )?;
        Ok(())
    }
}
