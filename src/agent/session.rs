//! Session state
//!
//! One run of the conversation loop: identity, creation time, and the
//! append-only message history.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::core::{DriverError, Message, Result, Role};

/// A single conversation session
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    created_at: DateTime<Utc>,
    history: Vec<Message>,
}

impl Session {
    /// Create an empty session with a fresh id
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            history: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Seed the history with the initiating prompt
    pub fn seed(&mut self, prompt: impl Into<String>) -> Result<()> {
        if !self.history.is_empty() {
            return Err(DriverError::Other(format!(
                "Session {} already has {} messages",
                self.id,
                self.history.len()
            )));
        }
        self.history.push(Message::user(prompt));
        Ok(())
    }

    /// Append a message; the first message must come from the user
    pub fn push(&mut self, message: Message) -> Result<()> {
        if self.history.is_empty() && message.role != Role::User {
            return Err(DriverError::Other(
                "The first message of a session must have the user role".to_string(),
            ));
        }
        self.history.push(message);
        Ok(())
    }

    pub fn messages(&self) -> &[Message] {
        &self.history
    }

    pub fn last(&self) -> Option<&Message> {
        self.history.last()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ContentBlock;

    #[test]
    fn test_seed_creates_single_text_user_message() {
        let mut session = Session::new();
        session.seed("create hello.txt").unwrap();

        assert_eq!(session.len(), 1);
        let first = &session.messages()[0];
        assert_eq!(first.role, Role::User);
        assert_eq!(first.content, vec![ContentBlock::text("create hello.txt")]);
    }

    #[test]
    fn test_seed_twice_fails() {
        let mut session = Session::new();
        session.seed("one").unwrap();
        assert!(session.seed("two").is_err());
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn test_first_message_must_be_user() {
        let mut session = Session::new();
        assert!(session
            .push(Message::assistant(vec![ContentBlock::text("hi")]))
            .is_err());
        assert!(session.is_empty());
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(Session::new().id(), Session::new().id());
    }
}
