use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};

/// Calls to let through, then calls to fail, before the store recovers.
#[derive(Debug, Default)]
struct Outage(Mutex<(usize, usize)>);

impl Outage {
    fn arm(&self, skip: usize, calls: usize) {
        if let Ok(mut plan) = self.0.lock() {
            *plan = (skip, calls);
        }
    }

    fn check(&self, what: &str) -> Result<(), RelationError> {
        let Ok(mut plan) = self.0.lock() else {
            return Err(RelationError::Store(format!("{what}: outage plan poisoned")));
        };
        match *plan {
            (0, 0) => Ok(()),
            (0, calls) => {
                plan.1 = calls - 1;
                Err(RelationError::Store(format!("{what}: injected outage")))
            }
            (skip, _) => {
                plan.0 = skip - 1;
                Ok(())
            }
        }
    }
}

/// Membership store whose inserts fail while an outage is armed, like a
/// backend that drops out in the middle of a multi-step flow.
pub struct FlakyMembershipRepo {
    inner: Arc<dyn MembershipRepo>,
    inserts: Outage,
}

impl FlakyMembershipRepo {
    pub fn new(inner: Arc<dyn MembershipRepo>) -> Self {
        Self {
            inner,
            inserts: Outage::default(),
        }
    }

    /// Fails the next `calls` inserts.
    pub fn fail_inserts(&self, calls: usize) {
        self.inserts.arm(0, calls);
    }

    /// Lets `skip` inserts through, then fails the following `calls`.
    pub fn fail_inserts_after(&self, skip: usize, calls: usize) {
        self.inserts.arm(skip, calls);
    }
}

#[async_trait::async_trait]
impl MembershipRepo for FlakyMembershipRepo {
    async fn insert_if_absent(
        &self,
        member: &ConversationMember,
    ) -> Result<MembershipClaim, RelationError> {
        self.inserts.check("insert member")?;
        self.inner.insert_if_absent(member).await
    }

    async fn delete(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> Result<bool, RelationError> {
        self.inner.delete(conversation_id, user_id).await
    }

    async fn update_role(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        role: MemberRole,
    ) -> Result<Option<RoleUpdate>, RelationError> {
        self.inner.update_role(conversation_id, user_id, role).await
    }

    async fn get(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> Result<Option<ConversationMember>, RelationError> {
        self.inner.get(conversation_id, user_id).await
    }

    async fn list_by_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<ConversationMember>, RelationError> {
        self.inner.list_by_conversation(conversation_id).await
    }

    async fn list_conversation_ids(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ConversationId>, RelationError> {
        self.inner.list_conversation_ids(user_id).await
    }
}

/// Notification store whose tombstones fail while an outage is armed.
pub struct FlakyNotificationRepo {
    inner: Arc<dyn NotificationRepo>,
    tombstones: Outage,
}

impl FlakyNotificationRepo {
    pub fn new(inner: Arc<dyn NotificationRepo>) -> Self {
        Self {
            inner,
            tombstones: Outage::default(),
        }
    }

    /// Fails the next `calls` single-row tombstones.
    pub fn fail_tombstones(&self, calls: usize) {
        self.tombstones.arm(0, calls);
    }
}

#[async_trait::async_trait]
impl NotificationRepo for FlakyNotificationRepo {
    async fn insert(
        &self,
        notification: &Notification,
    ) -> Result<NotificationClaim, RelationError> {
        self.inner.insert(notification).await
    }

    async fn get(
        &self,
        notification_id: NotificationId,
    ) -> Result<Option<Notification>, RelationError> {
        self.inner.get(notification_id).await
    }

    async fn find_active(&self, key: &DedupKey) -> Result<Option<Notification>, RelationError> {
        self.inner.find_active(key).await
    }

    async fn mark_read(
        &self,
        notification_id: NotificationId,
    ) -> Result<Option<StateChange>, RelationError> {
        self.inner.mark_read(notification_id).await
    }

    async fn mark_all_read(&self, receiver: UserId) -> Result<u64, RelationError> {
        self.inner.mark_all_read(receiver).await
    }

    async fn tombstone(
        &self,
        notification_id: NotificationId,
        at: DateTime<Utc>,
    ) -> Result<Option<StateChange>, RelationError> {
        self.tombstones.check("tombstone notification")?;
        self.inner.tombstone(notification_id, at).await
    }

    async fn tombstone_all(
        &self,
        receiver: UserId,
        at: DateTime<Utc>,
    ) -> Result<u64, RelationError> {
        self.inner.tombstone_all(receiver, at).await
    }

    async fn list_active(
        &self,
        receiver: UserId,
        page_size: PageSize,
        before: Option<NotificationCursor>,
    ) -> Result<Vec<Notification>, RelationError> {
        self.inner.list_active(receiver, page_size, before).await
    }

    async fn count_unread(&self, receiver: UserId) -> Result<u64, RelationError> {
        self.inner.count_unread(receiver).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_memory::MemoryMembershipRepo;

    #[tokio::test]
    async fn outage_covers_exactly_the_armed_calls() {
        let repo = FlakyMembershipRepo::new(Arc::new(MemoryMembershipRepo::new()));
        let conversation_id = ConversationId(uuid::Uuid::new_v4());
        let member = |n: u128| {
            ConversationMember::new(conversation_id, UserId(uuid::Uuid::from_u128(n)), MemberRole::Member)
        };

        repo.fail_inserts(2);
        assert!(repo.insert_if_absent(&member(1)).await.is_err());
        assert!(repo.insert_if_absent(&member(1)).await.is_err());
        assert!(repo.insert_if_absent(&member(1)).await.unwrap().is_inserted());
        assert_eq!(repo.list_by_conversation(conversation_id).await.unwrap().len(), 1);

        repo.fail_inserts_after(1, 1);
        assert!(repo.insert_if_absent(&member(2)).await.unwrap().is_inserted());
        assert!(repo.insert_if_absent(&member(3)).await.is_err());
        assert!(repo.insert_if_absent(&member(3)).await.unwrap().is_inserted());
    }
}
