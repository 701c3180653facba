use crate::domain_model::*;

/// Read-only view of the external user directory. Ids are never validated
/// against it; it only enriches outgoing events.
#[async_trait::async_trait]
pub trait UserDirectory: Send + Sync {
    async fn lookup(&self, user_id: UserId) -> anyhow::Result<Option<UserProfile>>;
}
