use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, Utc};

pub enum NotificationClaim {
    Created(Notification),
    Existing(Notification),
}

impl NotificationClaim {
    pub fn into_notification(self) -> Notification {
        match self {
            NotificationClaim::Created(n) | NotificationClaim::Existing(n) => n,
        }
    }
}

pub struct StateChange {
    pub notification: Notification,
    pub changed: bool,
}

#[async_trait::async_trait]
pub trait NotificationRepo: Send + Sync {
    /// For deduplicated kinds the store keeps at most one active row per
    /// `DedupKey`; inserting a second one yields the stored row as `Existing`.
    async fn insert(&self, notification: &Notification)
    -> Result<NotificationClaim, RelationError>;
    /// Tombstoned rows included.
    async fn get(
        &self,
        notification_id: NotificationId,
    ) -> Result<Option<Notification>, RelationError>;
    async fn find_active(&self, key: &DedupKey) -> Result<Option<Notification>, RelationError>;
    /// Active rows only; `None` when absent or tombstoned.
    async fn mark_read(
        &self,
        notification_id: NotificationId,
    ) -> Result<Option<StateChange>, RelationError>;
    async fn mark_all_read(&self, receiver: UserId) -> Result<u64, RelationError>;
    async fn tombstone(
        &self,
        notification_id: NotificationId,
        at: DateTime<Utc>,
    ) -> Result<Option<StateChange>, RelationError>;
    async fn tombstone_all(
        &self,
        receiver: UserId,
        at: DateTime<Utc>,
    ) -> Result<u64, RelationError>;
    /// Active rows, newest first, strictly before `before`.
    async fn list_active(
        &self,
        receiver: UserId,
        page_size: PageSize,
        before: Option<NotificationCursor>,
    ) -> Result<Vec<Notification>, RelationError>;
    async fn count_unread(&self, receiver: UserId) -> Result<u64, RelationError>;
}
