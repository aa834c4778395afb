use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
}

/// A stored message. `sender_id` always refers to an existing [`User`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub content: String,
    pub timestamp: String,
}

/// One line of chat history: a message joined with its sender's username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    pub timestamp: String,
    pub username: String,
    pub content: String,
}

impl fmt::Display for ChatLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.timestamp, self.username, self.content)
    }
}
