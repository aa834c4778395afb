use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Result, bail};
use chatlog_db::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Sqlite,
    File,
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "file" => Ok(Self::File),
            other => bail!("unknown CHATLOG_BACKEND '{}' (expected 'sqlite' or 'file')", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendKind,
    pub db_path: PathBuf,
    pub history_path: PathBuf,
    pub users_path: PathBuf,
    pub help_path: PathBuf,
    /// Drop messages from unregistered senders without saying so.
    pub quiet_unknown_sender: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.into());

        let backend = var("CHATLOG_BACKEND", "sqlite").parse()?;
        let quiet_unknown_sender = matches!(
            var("CHATLOG_QUIET_UNKNOWN_SENDER", "0").trim(),
            "1" | "true" | "yes"
        );

        Ok(Self {
            backend,
            db_path: var("CHATLOG_DB_PATH", "chat.db").into(),
            history_path: var("CHATLOG_HISTORY_PATH", "chat_history.txt").into(),
            users_path: var("CHATLOG_USERS_PATH", "users.txt").into(),
            help_path: var("CHATLOG_HELP_PATH", "help.txt").into(),
            quiet_unknown_sender,
        })
    }

    /// Build a disconnected store for the configured backend.
    pub fn store(&self) -> Store {
        match self.backend {
            BackendKind::Sqlite => Store::sqlite(&self.db_path),
            BackendKind::File => Store::file(&self.history_path, &self.users_path),
        }
    }

    pub fn medium(&self) -> String {
        match self.backend {
            BackendKind::Sqlite => self.db_path.display().to_string(),
            BackendKind::File => format!(
                "{} (users: {})",
                self.history_path.display(),
                self.users_path.display()
            ),
        }
    }
}
