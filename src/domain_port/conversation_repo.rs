use crate::application_port::*;
use crate::domain_model::*;

pub enum PrivateConversationClaim {
    Won(Conversation),
    Existing(Conversation),
}

#[async_trait::async_trait]
pub trait ConversationRepo: Send + Sync {
    /// Inserts a private conversation keyed by `pair`. When another private
    /// conversation already holds the pair, that one is returned instead.
    async fn insert_private(
        &self,
        conversation: &Conversation,
        pair: UserPair,
    ) -> Result<PrivateConversationClaim, RelationError>;
    async fn insert_group(&self, conversation: &Conversation) -> Result<(), RelationError>;
    async fn get(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<Conversation>, RelationError>;
    async fn get_many(
        &self,
        conversation_ids: &[ConversationId],
    ) -> Result<Vec<Conversation>, RelationError>;

    /// `None` when the conversation does not exist, otherwise whether the set changed.
    async fn add_pinned(
        &self,
        conversation_id: ConversationId,
        message_id: MessageId,
    ) -> Result<Option<bool>, RelationError>;
    async fn remove_pinned(
        &self,
        conversation_id: ConversationId,
        message_id: MessageId,
    ) -> Result<Option<bool>, RelationError>;
    /// `false` when the conversation does not exist.
    async fn set_last_message(
        &self,
        conversation_id: ConversationId,
        message_id: MessageId,
    ) -> Result<bool, RelationError>;
}
