use std::path::PathBuf;

use chatlog_types::models::{ChatLine, Message, User};
use rusqlite::{Connection, ErrorCode, OptionalExtension};
use tracing::{debug, info};

use super::Backend;
use crate::{DbError, migrations};

/// SQLite-backed storage holding one connection while open.
pub struct SqliteBackend {
    path: PathBuf,
    conn: Option<Connection>,
}

impl SqliteBackend {
    /// `path` may be `:memory:` for a private in-memory database; its
    /// contents are lost on close.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            conn: None,
        }
    }

    fn conn(&self) -> Result<&Connection, DbError> {
        self.conn.as_ref().ok_or(DbError::NotConnected)
    }
}

impl Backend for SqliteBackend {
    fn describe(&self) -> String {
        format!("sqlite:{}", self.path.display())
    }

    fn open(&mut self) -> Result<(), DbError> {
        if self.conn.is_some() {
            return Ok(());
        }

        let conn = Connection::open(&self.path)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run(&conn)?;

        info!("Database opened at {}", self.path.display());
        self.conn = Some(conn);
        Ok(())
    }

    fn close(&mut self) -> Result<(), DbError> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| e)?;
            info!("Database closed at {}", self.path.display());
        }
        Ok(())
    }

    fn count_users(&self, username: &str) -> Result<u64, DbError> {
        let count: i64 = self.conn()?.query_row(
            "SELECT COUNT(*) FROM users WHERE username = ?1",
            [username],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn insert_user(&self, username: &str) -> Result<User, DbError> {
        let conn = self.conn()?;
        conn.execute("INSERT INTO users (username) VALUES (?1)", [username])
            .map_err(|e| constraint_or(e, format!("username '{}' is taken", username)))?;

        Ok(User {
            id: conn.last_insert_rowid(),
            username: username.to_string(),
        })
    }

    fn find_user(&self, username: &str) -> Result<Option<User>, DbError> {
        query_user_by_username(self.conn()?, username)
    }

    fn list_users(&self) -> Result<Vec<User>, DbError> {
        query_users(self.conn()?)
    }

    fn insert_message(
        &self,
        sender_id: i64,
        content: &str,
        timestamp: &str,
    ) -> Result<Message, DbError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO messages (sender_id, content, timestamp) VALUES (?1, ?2, ?3)",
            rusqlite::params![sender_id, content, timestamp],
        )
        .map_err(|e| constraint_or(e, format!("no user with id {}", sender_id)))?;

        let id = conn.last_insert_rowid();
        debug!("Inserted message {} from user {}", id, sender_id);
        Ok(Message {
            id,
            sender_id,
            content: content.to_string(),
            timestamp: timestamp.to_string(),
        })
    }

    fn list_messages(&self) -> Result<Vec<ChatLine>, DbError> {
        query_chat_lines(self.conn()?)
    }
}

fn constraint_or(err: rusqlite::Error, reason: String) -> DbError {
    match err.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => DbError::Constraint(reason),
        _ => err.into(),
    }
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<User>, DbError> {
    let mut stmt = conn.prepare("SELECT id, username FROM users WHERE username = ?1")?;

    let row = stmt
        .query_row([username], |row| {
            Ok(User {
                id: row.get(0)?,
                username: row.get(1)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_users(conn: &Connection) -> Result<Vec<User>, DbError> {
    let mut stmt = conn.prepare("SELECT id, username FROM users ORDER BY id")?;

    let rows = stmt
        .query_map([], |row| {
            Ok(User {
                id: row.get(0)?,
                username: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn query_chat_lines(conn: &Connection) -> Result<Vec<ChatLine>, DbError> {
    // Timestamp strings sort chronologically; id breaks ties within a second.
    let mut stmt = conn.prepare(
        "SELECT m.timestamp, u.username, m.content
         FROM messages m
         INNER JOIN users u ON m.sender_id = u.id
         ORDER BY m.timestamp ASC, m.id ASC",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok(ChatLine {
                timestamp: row.get(0)?,
                username: row.get(1)?,
                content: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}
