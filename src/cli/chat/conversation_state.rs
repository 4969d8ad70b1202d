use std::fmt;

use chrono::Utc;
use tracing::debug;

use crate::error::UnknownConversation;

/// Number of characters of the seeding query kept as a conversation's name.
pub const NAME_LENGTH: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Bot,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Bot => write!(f, "bot"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn bot(content: impl Into<String>) -> Self {
        Self {
            role: Role::Bot,
            content: content.into(),
        }
    }
}

/// Creation-timestamp derived conversation identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[cfg(test)]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Conversation {
    id: ConversationId,
    name: String,
    messages: Vec<Message>,
}

impl Conversation {
    pub fn id(&self) -> &ConversationId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}

/// First [`NAME_LENGTH`] characters of `seed`.
pub fn conversation_name(seed: &str) -> String {
    seed.chars().take(NAME_LENGTH).collect()
}

/// All conversations of the session, in creation order, plus the selection.
#[derive(Debug, Default)]
pub struct ConversationStore {
    conversations: Vec<Conversation>,
    current: Option<ConversationId>,
    last_id_millis: i64,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_conversation(&mut self, seed_text: &str) -> ConversationId {
        // Millisecond timestamps collide when two conversations start in the same tick.
        let millis = Utc::now().timestamp_millis().max(self.last_id_millis + 1);
        self.last_id_millis = millis;

        let id = ConversationId::new(millis.to_string());
        let name = conversation_name(seed_text);
        debug!(%id, %name, "Created conversation");

        self.conversations.push(Conversation {
            id: id.clone(),
            name,
            messages: Vec::new(),
        });
        id
    }

    pub fn append_message(
        &mut self,
        conversation_id: &ConversationId,
        message: Message,
    ) -> Result<(), UnknownConversation> {
        let conversation = self
            .conversations
            .iter_mut()
            .find(|c| &c.id == conversation_id)
            .ok_or_else(|| UnknownConversation(conversation_id.to_string()))?;
        debug!(%conversation_id, role = %message.role, "Appended message");
        conversation.messages.push(message);
        Ok(())
    }

    /// Selects `id` without checking that it exists.
    pub fn select_conversation(&mut self, id: ConversationId) {
        self.current = Some(id);
    }

    pub fn clear_selection(&mut self) {
        self.current = None;
    }

    pub fn current_id(&self) -> Option<&ConversationId> {
        self.current.as_ref()
    }

    pub fn current_conversation(&self) -> Option<&Conversation> {
        self.current.as_ref().and_then(|id| self.get(id))
    }

    pub fn current_messages(&self) -> &[Message] {
        self.current_conversation()
            .map(Conversation::messages)
            .unwrap_or(&[])
    }

    pub fn get(&self, id: &ConversationId) -> Option<&Conversation> {
        self.conversations.iter().find(|c| &c.id == id)
    }

    /// Conversation at a 1-based sidebar position.
    pub fn nth(&self, position: usize) -> Option<&Conversation> {
        position
            .checked_sub(1)
            .and_then(|index| self.conversations.get(index))
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }
}
