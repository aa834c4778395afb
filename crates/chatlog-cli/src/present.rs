//! Console text for every command outcome. Nothing here touches storage.

use chatlog_db::{MessageAdd, UserAdd};
use chatlog_types::models::{ChatLine, User};

pub const INVALID_COMMAND: &str = "Invalid command";

pub const BUILTIN_HELP: &str = "\
Commands:
  help         show this help
  adduser      register a new user
  getuser      show a user's record
  getallusers  list every registered user
  add          record a message from a registered user
  getmessages  show the chat history
  exit         disconnect and quit";

pub fn user_added(outcome: &UserAdd) -> String {
    match outcome {
        UserAdd::Created(user) => format!("User '{}' added.", user.username),
        UserAdd::AlreadyExists(username) => format!("User '{}' already exists.", username),
        UserAdd::InvalidUsername => {
            "Username must not be empty or contain control characters.".to_string()
        }
    }
}

pub fn user_record(username: &str, user: Option<&User>) -> String {
    match user {
        Some(user) => format!("ID: {}, Username: {}", user.id, user.username),
        None => format!("User '{}' not found.", username),
    }
}

pub fn user_list(usernames: &[String]) -> String {
    if usernames.is_empty() {
        return "No users found.".to_string();
    }
    let mut out = String::from("Users:");
    for name in usernames {
        out.push_str("\n- ");
        out.push_str(name);
    }
    out
}

/// `None` when an unknown sender should pass silently.
pub fn message_added(outcome: &MessageAdd, quiet_unknown_sender: bool) -> Option<String> {
    match outcome {
        MessageAdd::Stored(line) => Some(line.to_string()),
        MessageAdd::UnknownSender(_) if quiet_unknown_sender => None,
        MessageAdd::UnknownSender(sender) => {
            Some(format!("User '{}' not found. Message not stored.", sender))
        }
    }
}

pub fn history(lines: &[ChatLine]) -> String {
    if lines.is_empty() {
        return "No messages found.".to_string();
    }
    let mut out = String::from("Chat history:");
    for line in lines {
        out.push('\n');
        out.push_str(&line.to_string());
    }
    out
}
