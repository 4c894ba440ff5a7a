//! Ordered conversation history.

use crate::types::{Message, Role};

/// Messages exchanged with the model, seeded with a system message.
///
/// Messages are append-only from the outside; the agent loop can only roll
/// back to an earlier length when a turn fails.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new(system_message: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_message)],
        }
    }

    /// Resume from stored messages, for example loaded history.
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn system_message(&self) -> Option<&str> {
        self.messages
            .first()
            .filter(|m| m.role == Role::System)
            .map(Message::text)
    }

    /// Drop everything except the leading system message.
    pub fn clear(&mut self) {
        let keep = usize::from(
            self.messages
                .first()
                .is_some_and(|m| m.role == Role::System),
        );
        self.messages.truncate(keep);
    }

    pub(crate) fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.messages.truncate(len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_keeps_system() {
        let mut conversation = Conversation::new("Be precise and concise.");
        conversation.push(Message::user("hi"));
        conversation.push(Message::assistant("hello"));
        assert_eq!(conversation.len(), 3);

        conversation.clear();
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.system_message(), Some("Be precise and concise."));
    }

    #[test]
    fn test_clear_without_system() {
        let mut conversation = Conversation::from_messages(vec![Message::user("hi")]);
        conversation.clear();
        assert!(conversation.is_empty());
        assert_eq!(conversation.system_message(), None);
    }
}
