use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chatlog_types::models::{ChatLine, Message, User};
use chatlog_types::time::{self, TIMESTAMP_LEN};
use tracing::{debug, info, warn};

use super::Backend;
use crate::DbError;

/// Flat-file storage.
///
/// Messages go to an append-only history file, one line each:
/// `<sender> at <yyyy-MM-dd HH:mm:ss>: <content>`. Users go to a second file,
/// one username per line; a user's id is its 1-based line number and a
/// message's id is its line number in the history file. Files are opened
/// per call, so "open" only makes sure both exist.
///
/// Content containing a newline splits into lines that no longer parse;
/// those lines are skipped on read.
pub struct FileBackend {
    history_path: PathBuf,
    users_path: PathBuf,
    open: bool,
}

impl FileBackend {
    pub fn new(history_path: impl Into<PathBuf>, users_path: impl Into<PathBuf>) -> Self {
        Self {
            history_path: history_path.into(),
            users_path: users_path.into(),
            open: false,
        }
    }

    fn ensure_open(&self) -> Result<(), DbError> {
        if self.open {
            Ok(())
        } else {
            Err(DbError::NotConnected)
        }
    }

    /// Usernames by line, blank lines kept so ids stay positional.
    fn read_usernames(&self) -> Result<Vec<String>, DbError> {
        read_lines(&self.users_path)
    }
}

impl Backend for FileBackend {
    fn describe(&self) -> String {
        format!(
            "file:{} (users: {})",
            self.history_path.display(),
            self.users_path.display()
        )
    }

    fn open(&mut self) -> Result<(), DbError> {
        touch(&self.history_path)?;
        touch(&self.users_path)?;
        self.open = true;
        info!("Chat history file ready at {}", self.history_path.display());
        Ok(())
    }

    fn close(&mut self) -> Result<(), DbError> {
        self.open = false;
        Ok(())
    }

    fn count_users(&self, username: &str) -> Result<u64, DbError> {
        self.ensure_open()?;
        let count = self
            .read_usernames()?
            .iter()
            .filter(|name| !name.is_empty() && name.as_str() == username)
            .count();
        Ok(count as u64)
    }

    fn insert_user(&self, username: &str) -> Result<User, DbError> {
        self.ensure_open()?;
        if username.chars().any(char::is_control) {
            return Err(DbError::Constraint(
                "username must not contain control characters".into(),
            ));
        }

        let names = self.read_usernames()?;
        if names.iter().any(|name| name == username) {
            return Err(DbError::Constraint(format!("username '{}' is taken", username)));
        }

        append_line(&self.users_path, username)?;
        Ok(User {
            id: names.len() as i64 + 1,
            username: username.to_string(),
        })
    }

    fn find_user(&self, username: &str) -> Result<Option<User>, DbError> {
        self.ensure_open()?;
        let user = self
            .read_usernames()?
            .into_iter()
            .enumerate()
            .find(|(_, name)| !name.is_empty() && name == username)
            .map(|(idx, name)| User {
                id: idx as i64 + 1,
                username: name,
            });
        Ok(user)
    }

    fn list_users(&self) -> Result<Vec<User>, DbError> {
        self.ensure_open()?;
        let users = self
            .read_usernames()?
            .into_iter()
            .enumerate()
            .filter(|(_, name)| !name.is_empty())
            .map(|(idx, name)| User {
                id: idx as i64 + 1,
                username: name,
            })
            .collect();
        Ok(users)
    }

    fn insert_message(
        &self,
        sender_id: i64,
        content: &str,
        timestamp: &str,
    ) -> Result<Message, DbError> {
        self.ensure_open()?;
        let names = self.read_usernames()?;
        let sender = sender_id
            .checked_sub(1)
            .and_then(|idx| usize::try_from(idx).ok())
            .and_then(|idx| names.get(idx))
            .filter(|name| !name.is_empty())
            .ok_or_else(|| DbError::Constraint(format!("no user with id {}", sender_id)))?;

        let id = read_lines(&self.history_path)?.len() as i64 + 1;
        append_line(
            &self.history_path,
            &format!("{} at {}: {}", sender, timestamp, content),
        )?;

        debug!("Appended message {} from {}", id, sender);
        Ok(Message {
            id,
            sender_id,
            content: content.to_string(),
            timestamp: timestamp.to_string(),
        })
    }

    fn list_messages(&self) -> Result<Vec<ChatLine>, DbError> {
        self.ensure_open()?;
        let known: HashSet<String> = self
            .read_usernames()?
            .into_iter()
            .filter(|name| !name.is_empty())
            .collect();

        let mut lines = Vec::new();
        for (idx, raw) in read_lines(&self.history_path)?.iter().enumerate() {
            let Some(line) = parse_history_line(raw) else {
                warn!("Skipping unreadable history line {}", idx + 1);
                continue;
            };
            if known.contains(&line.username) {
                lines.push(line);
            }
        }

        // Stable sort: same-second messages keep file order.
        lines.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(lines)
    }
}

/// Split `<sender> at <timestamp>: <content>` back into its parts.
///
/// The sender may itself contain " at ", so each occurrence is tried until
/// one is followed by a well-formed timestamp and ": ".
fn parse_history_line(line: &str) -> Option<ChatLine> {
    for (idx, sep) in line.match_indices(" at ") {
        let rest = &line[idx + sep.len()..];
        let Some(timestamp) = rest.get(..TIMESTAMP_LEN) else {
            continue;
        };
        if time::parse(timestamp).is_none() {
            continue;
        }
        if let Some(content) = rest[TIMESTAMP_LEN..].strip_prefix(": ") {
            return Some(ChatLine {
                timestamp: timestamp.to_string(),
                username: line[..idx].to_string(),
                content: content.to_string(),
            });
        }
    }
    None
}

fn touch(path: &Path) -> Result<(), DbError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)?;
    Ok(())
}

/// Lines split on `\n` only, so a stored `\r` reads back unchanged.
fn read_lines(path: &Path) -> Result<Vec<String>, DbError> {
    let text = fs::read_to_string(path)?;
    Ok(text.split_terminator('\n').map(str::to_string).collect())
}

fn append_line(path: &Path, line: &str) -> Result<(), DbError> {
    let mut file = OpenOptions::new().append(true).open(path)?;
    file.write_all(format!("{}\n", line).as_bytes())?;
    file.flush()?;
    Ok(())
}
