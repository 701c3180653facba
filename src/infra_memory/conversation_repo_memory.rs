use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

pub struct MemoryConversationRepo {
    rows: DashMap<ConversationId, Conversation>,
    // unique (private, user_low, user_high)
    private_pairs: DashMap<UserPair, ConversationId>,
}

impl MemoryConversationRepo {
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
            private_pairs: DashMap::new(),
        }
    }
}

#[async_trait::async_trait]
impl ConversationRepo for MemoryConversationRepo {
    async fn insert_private(
        &self,
        conversation: &Conversation,
        pair: UserPair,
    ) -> Result<PrivateConversationClaim, RelationError> {
        // rows are written while the pair slot is held, so an occupied slot
        // always points at a stored conversation
        match self.private_pairs.entry(pair) {
            Entry::Occupied(slot) => {
                let existing = self
                    .rows
                    .get(slot.get())
                    .map(|row| row.clone())
                    .ok_or_else(|| {
                        RelationError::Store(format!(
                            "private pair points at missing conversation {}",
                            slot.get()
                        ))
                    })?;
                Ok(PrivateConversationClaim::Existing(existing))
            }
            Entry::Vacant(slot) => {
                self.rows
                    .insert(conversation.conversation_id, conversation.clone());
                slot.insert(conversation.conversation_id);
                Ok(PrivateConversationClaim::Won(conversation.clone()))
            }
        }
    }

    async fn insert_group(&self, conversation: &Conversation) -> Result<(), RelationError> {
        match self.rows.entry(conversation.conversation_id) {
            Entry::Occupied(_) => Err(RelationError::Conflict(format!(
                "conversation {} already exists",
                conversation.conversation_id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(conversation.clone());
                Ok(())
            }
        }
    }

    async fn get(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<Conversation>, RelationError> {
        Ok(self.rows.get(&conversation_id).map(|row| row.clone()))
    }

    async fn get_many(
        &self,
        conversation_ids: &[ConversationId],
    ) -> Result<Vec<Conversation>, RelationError> {
        Ok(conversation_ids
            .iter()
            .filter_map(|id| self.rows.get(id).map(|row| row.clone()))
            .collect())
    }

    async fn add_pinned(
        &self,
        conversation_id: ConversationId,
        message_id: MessageId,
    ) -> Result<Option<bool>, RelationError> {
        Ok(self
            .rows
            .get_mut(&conversation_id)
            .map(|mut row| row.pinned_messages.insert(message_id)))
    }

    async fn remove_pinned(
        &self,
        conversation_id: ConversationId,
        message_id: MessageId,
    ) -> Result<Option<bool>, RelationError> {
        Ok(self
            .rows
            .get_mut(&conversation_id)
            .map(|mut row| row.pinned_messages.remove(&message_id)))
    }

    async fn set_last_message(
        &self,
        conversation_id: ConversationId,
        message_id: MessageId,
    ) -> Result<bool, RelationError> {
        match self.rows.get_mut(&conversation_id) {
            Some(mut row) => {
                row.last_message = Some(message_id);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
