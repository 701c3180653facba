use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

pub struct MemoryMembershipRepo {
    rows: DashMap<(ConversationId, UserId), ConversationMember>,
}

impl MemoryMembershipRepo {
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
        }
    }
}

#[async_trait::async_trait]
impl MembershipRepo for MemoryMembershipRepo {
    async fn insert_if_absent(
        &self,
        member: &ConversationMember,
    ) -> Result<MembershipClaim, RelationError> {
        match self.rows.entry((member.conversation_id, member.user_id)) {
            Entry::Occupied(existing) => Ok(MembershipClaim::Existing(existing.get().clone())),
            Entry::Vacant(slot) => {
                slot.insert(member.clone());
                Ok(MembershipClaim::Inserted(member.clone()))
            }
        }
    }

    async fn delete(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> Result<bool, RelationError> {
        Ok(self.rows.remove(&(conversation_id, user_id)).is_some())
    }

    async fn update_role(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        role: MemberRole,
    ) -> Result<Option<RoleUpdate>, RelationError> {
        let Some(mut row) = self.rows.get_mut(&(conversation_id, user_id)) else {
            return Ok(None);
        };
        let changed = row.role != role;
        row.role = role;

        Ok(Some(RoleUpdate {
            member: row.clone(),
            changed,
        }))
    }

    async fn get(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> Result<Option<ConversationMember>, RelationError> {
        Ok(self
            .rows
            .get(&(conversation_id, user_id))
            .map(|row| row.clone()))
    }

    async fn list_by_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<ConversationMember>, RelationError> {
        let mut members: Vec<ConversationMember> = self
            .rows
            .iter()
            .filter(|entry| entry.key().0 == conversation_id)
            .map(|entry| entry.value().clone())
            .collect();
        members.sort_by(|l, r| (l.joined_at, l.user_id).cmp(&(r.joined_at, r.user_id)));
        Ok(members)
    }

    async fn list_conversation_ids(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ConversationId>, RelationError> {
        let mut ids: Vec<ConversationId> = self
            .rows
            .iter()
            .filter(|entry| entry.key().1 == user_id)
            .map(|entry| entry.key().0)
            .collect();
        ids.sort();
        Ok(ids)
    }
}
