use crate::application_port::*;
use crate::domain_model::*;

pub enum MembershipClaim {
    Inserted(ConversationMember),
    Existing(ConversationMember),
}

impl MembershipClaim {
    pub fn is_inserted(&self) -> bool {
        matches!(self, MembershipClaim::Inserted(_))
    }

    pub fn into_member(self) -> ConversationMember {
        match self {
            MembershipClaim::Inserted(m) | MembershipClaim::Existing(m) => m,
        }
    }
}

pub struct RoleUpdate {
    pub member: ConversationMember,
    pub changed: bool,
}

#[async_trait::async_trait]
pub trait MembershipRepo: Send + Sync {
    /// Inserts unless `(conversation_id, user_id)` is already present, in which
    /// case the stored row is returned untouched.
    async fn insert_if_absent(
        &self,
        member: &ConversationMember,
    ) -> Result<MembershipClaim, RelationError>;
    async fn delete(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> Result<bool, RelationError>;
    /// `None` when there is no such membership.
    async fn update_role(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        role: MemberRole,
    ) -> Result<Option<RoleUpdate>, RelationError>;
    async fn get(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> Result<Option<ConversationMember>, RelationError>;
    async fn list_by_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<ConversationMember>, RelationError>;
    async fn list_conversation_ids(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ConversationId>, RelationError>;
}
