use crate::application_port::RelationError;
use crate::domain_model::*;

#[async_trait::async_trait]
pub trait MembershipService: Send + Sync {
    /// Idempotent: an existing row is returned as stored, even when `role`
    /// differs. Role changes go through `set_role`.
    async fn add_member(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        role: MemberRole,
    ) -> Result<ConversationMember, RelationError>;
    async fn add_members(
        &self,
        conversation_id: ConversationId,
        user_ids: &[UserId],
        role: MemberRole,
    ) -> Result<Vec<ConversationMember>, RelationError>;
    async fn remove_member(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> Result<bool, RelationError>;
    async fn set_role(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        role: MemberRole,
    ) -> Result<ConversationMember, RelationError>;
    async fn is_member(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> Result<bool, RelationError>;
    async fn list_members(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<ConversationMember>, RelationError>;
    async fn list_conversations_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ConversationId>, RelationError>;

    /// Returns the private conversation between `a` and `b`, creating it with
    /// `a` as admin and `b` as member when none exists. `created` is true only
    /// for the call that created it.
    async fn find_or_create_private_conversation(
        &self,
        a: UserId,
        b: UserId,
    ) -> Result<(Conversation, bool), RelationError>;
    async fn create_group_conversation(
        &self,
        creator: UserId,
        members: &[UserId],
    ) -> Result<Conversation, RelationError>;

    async fn pin_message(
        &self,
        conversation_id: ConversationId,
        acting_user: UserId,
        message_id: MessageId,
    ) -> Result<Conversation, RelationError>;
    async fn unpin_message(
        &self,
        conversation_id: ConversationId,
        acting_user: UserId,
        message_id: MessageId,
    ) -> Result<Conversation, RelationError>;
    /// Moves `last_message` forward after the message store accepted a message.
    async fn record_message_created(
        &self,
        conversation_id: ConversationId,
        sender: UserId,
        message_id: MessageId,
    ) -> Result<(), RelationError>;
}
