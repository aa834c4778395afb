use chatlog_types::models::ChatLine;
use chatlog_types::time;
use tracing::{info, warn};

use crate::{DbError, Store, UserRepository};

/// Result of [`MessageRepository::add`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageAdd {
    Stored(ChatLine),
    /// The sender is not a registered user; nothing was stored.
    UnknownSender(String),
}

pub struct MessageRepository<'a> {
    store: &'a Store,
    users: UserRepository<'a>,
}

impl<'a> MessageRepository<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self {
            store,
            users: UserRepository::new(store),
        }
    }

    /// Store `content` from `sender`, stamped with the current local time.
    pub fn add(&self, sender: &str, content: &str) -> Result<MessageAdd, DbError> {
        let Some(sender_id) = self.users.get_id(sender)? else {
            warn!("Dropped message from unknown sender {}", sender);
            return Ok(MessageAdd::UnknownSender(sender.to_string()));
        };

        let message = self
            .store
            .backend()?
            .insert_message(sender_id, content, &time::now())?;
        info!("Stored message {} from {}", message.id, sender);

        Ok(MessageAdd::Stored(ChatLine {
            timestamp: message.timestamp,
            username: sender.to_string(),
            content: message.content,
        }))
    }

    /// Full history, oldest first.
    pub fn list_all(&self) -> Result<Vec<ChatLine>, DbError> {
        self.store.backend()?.list_messages()
    }
}
