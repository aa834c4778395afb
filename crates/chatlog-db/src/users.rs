use chatlog_types::models::User;
use tracing::{debug, info, warn};

use crate::{DbError, Store};

/// Result of [`UserRepository::add`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAdd {
    Created(User),
    AlreadyExists(String),
    /// Empty, or containing a control character.
    InvalidUsername,
}

pub struct UserRepository<'a> {
    store: &'a Store,
}

impl<'a> UserRepository<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// An empty username is logged as a caller mistake but still counted,
    /// which always yields `false`.
    pub fn exists(&self, username: &str) -> Result<bool, DbError> {
        if username.is_empty() {
            warn!("Existence check called with an empty username");
        }
        Ok(self.store.backend()?.count_users(username)? > 0)
    }

    pub fn add(&self, username: &str) -> Result<UserAdd, DbError> {
        if username.is_empty() || username.chars().any(char::is_control) {
            warn!("Rejected user with invalid username {:?}", username);
            return Ok(UserAdd::InvalidUsername);
        }

        if self.exists(username)? {
            info!("User {} already exists", username);
            return Ok(UserAdd::AlreadyExists(username.to_string()));
        }

        let user = self.store.backend()?.insert_user(username)?;
        info!("Added user {} with id {}", user.username, user.id);
        Ok(UserAdd::Created(user))
    }

    pub fn get_id(&self, username: &str) -> Result<Option<i64>, DbError> {
        let id = self.get(username)?.map(|user| user.id);
        if id.is_none() {
            debug!("No id for user {}", username);
        }
        Ok(id)
    }

    pub fn get(&self, username: &str) -> Result<Option<User>, DbError> {
        let user = self.store.backend()?.find_user(username)?;
        if user.is_none() {
            debug!("User {} not found", username);
        }
        Ok(user)
    }

    /// Usernames in storage order.
    pub fn list_all(&self) -> Result<Vec<String>, DbError> {
        let users = self.store.backend()?.list_users()?;
        Ok(users.into_iter().map(|user| user.username).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::with_each_backend;

    #[test]
    fn test_exists_before_and_after_add() {
        with_each_backend(|store| {
            let users = store.users();
            assert!(!users.exists("alice").unwrap());
            users.add("alice").unwrap();
            assert!(users.exists("alice").unwrap());
        });
    }

    #[test]
    fn test_distinct_users_both_added() {
        with_each_backend(|store| {
            let users = store.users();
            assert!(matches!(users.add("alice").unwrap(), UserAdd::Created(_)));
            assert!(matches!(users.add("bob").unwrap(), UserAdd::Created(_)));
            assert_eq!(users.list_all().unwrap(), vec!["alice", "bob"]);
        });
    }

    #[test]
    fn test_duplicate_add_is_rejected() {
        with_each_backend(|store| {
            let users = store.users();
            users.add("alice").unwrap();
            assert_eq!(
                users.add("alice").unwrap(),
                UserAdd::AlreadyExists("alice".to_string())
            );
            assert_eq!(users.list_all().unwrap(), vec!["alice"]);
        });
    }

    #[test]
    fn test_empty_username() {
        with_each_backend(|store| {
            let users = store.users();
            assert!(!users.exists("").unwrap());
            assert_eq!(users.add("").unwrap(), UserAdd::InvalidUsername);
            assert!(users.list_all().unwrap().is_empty());
        });
    }

    #[test]
    fn test_control_characters_do_not_duplicate_a_user() {
        with_each_backend(|store| {
            let users = store.users();
            users.add("bob").unwrap();
            assert_eq!(users.add("bob\r").unwrap(), UserAdd::InvalidUsername);
            assert_eq!(users.add("bob\r").unwrap(), UserAdd::InvalidUsername);
            assert_eq!(users.add("bo\u{7}b").unwrap(), UserAdd::InvalidUsername);
            assert!(!users.exists("bob\r").unwrap());
            assert_eq!(users.list_all().unwrap(), vec!["bob"]);
        });
    }

    #[test]
    fn test_get_and_get_id() {
        with_each_backend(|store| {
            let users = store.users();
            let UserAdd::Created(alice) = users.add("alice").unwrap() else {
                panic!("alice should be created");
            };

            assert_eq!(users.get("alice").unwrap(), Some(alice.clone()));
            assert_eq!(users.get_id("alice").unwrap(), Some(alice.id));
            assert_eq!(users.get("nobody").unwrap(), None);
            assert_eq!(users.get_id("nobody").unwrap(), None);
        });
    }

    #[test]
    fn test_list_all_on_fresh_store_is_empty() {
        with_each_backend(|store| {
            assert!(store.users().list_all().unwrap().is_empty());
        });
    }
}
