pub mod backend;
pub mod error;
pub mod messages;
pub mod migrations;
pub mod users;

pub use backend::{Backend, FileBackend, SqliteBackend};
pub use error::DbError;
pub use messages::{MessageAdd, MessageRepository};
pub use users::{UserAdd, UserRepository};

use std::fmt;
use std::path::PathBuf;

use tracing::{error, info};

/// Outcome of a `connect` or `disconnect` call. Displays as the status line
/// shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Connected,
    AlreadyConnected,
    Disconnected,
    AlreadyDisconnected,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Connected => "Connecting to database...",
            Self::AlreadyConnected => "Already connected to the database.",
            Self::Disconnected => "Disconnecting from database...",
            Self::AlreadyDisconnected => "Database connection is already closed.",
        };
        f.write_str(text)
    }
}

/// Owns the single handle to the storage medium.
///
/// Starts disconnected. Repositories borrow the store and fail with
/// [`DbError::NotConnected`] until `connect` succeeds.
pub struct Store {
    backend: Box<dyn Backend>,
    connected: bool,
}

impl Store {
    pub fn new(backend: Box<dyn Backend>) -> Self {
        Self {
            backend,
            connected: false,
        }
    }

    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self::new(Box::new(SqliteBackend::new(path)))
    }

    pub fn file(history_path: impl Into<PathBuf>, users_path: impl Into<PathBuf>) -> Self {
        Self::new(Box::new(FileBackend::new(history_path, users_path)))
    }

    /// Open the medium and ensure the schema. A no-op when already
    /// connected. On failure the store stays disconnected.
    pub fn connect(&mut self) -> Result<Transition, DbError> {
        if self.connected {
            info!("Already connected to {}", self.backend.describe());
            return Ok(Transition::AlreadyConnected);
        }

        self.backend.open()?;
        self.connected = true;
        info!("Connected to {}", self.backend.describe());
        Ok(Transition::Connected)
    }

    pub fn disconnect(&mut self) -> Result<Transition, DbError> {
        if !self.connected {
            info!("Connection to {} already closed", self.backend.describe());
            return Ok(Transition::AlreadyDisconnected);
        }

        self.connected = false;
        self.backend.close()?;
        info!("Disconnected from {}", self.backend.describe());
        Ok(Transition::Disconnected)
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn users(&self) -> UserRepository<'_> {
        UserRepository::new(self)
    }

    pub fn messages(&self) -> MessageRepository<'_> {
        MessageRepository::new(self)
    }

    pub(crate) fn backend(&self) -> Result<&dyn Backend, DbError> {
        if self.connected {
            Ok(self.backend.as_ref())
        } else {
            Err(DbError::NotConnected)
        }
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        if self.connected {
            if let Err(e) = self.backend.close() {
                error!("Failed to close {}: {}", self.backend.describe(), e);
            }
        }
    }
}
