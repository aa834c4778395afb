pub mod file;
pub mod sqlite;

pub use file::FileBackend;
pub use sqlite::SqliteBackend;

use chatlog_types::models::{ChatLine, Message, User};

use crate::DbError;

/// Storage capabilities the repositories are written against.
///
/// `open` must leave the medium with both relations present; every other
/// method is only called between a successful `open` and `close`.
pub trait Backend {
    /// Human-readable location of the medium, for logs.
    fn describe(&self) -> String;

    fn open(&mut self) -> Result<(), DbError>;

    fn close(&mut self) -> Result<(), DbError>;

    fn count_users(&self, username: &str) -> Result<u64, DbError>;

    fn insert_user(&self, username: &str) -> Result<User, DbError>;

    fn find_user(&self, username: &str) -> Result<Option<User>, DbError>;

    /// All users in storage order (ascending id).
    fn list_users(&self) -> Result<Vec<User>, DbError>;

    fn insert_message(
        &self,
        sender_id: i64,
        content: &str,
        timestamp: &str,
    ) -> Result<Message, DbError>;

    /// Messages joined with their senders, ascending by timestamp, ties in
    /// insertion order. Messages without a known sender are left out.
    fn list_messages(&self) -> Result<Vec<ChatLine>, DbError>;
}
