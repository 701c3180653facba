use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Rows plus an index of the active row per dedup key.
///
/// Lock order: `active` may be held while touching `rows`, never the reverse.
pub struct MemoryNotificationRepo {
    rows: DashMap<NotificationId, Notification>,
    active: DashMap<DedupKey, NotificationId>,
}

impl MemoryNotificationRepo {
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
            active: DashMap::new(),
        }
    }

    fn active_row(&self, notification_id: NotificationId) -> Option<Notification> {
        self.rows
            .get(&notification_id)
            .filter(|row| row.is_active())
            .map(|row| row.clone())
    }
}

#[async_trait::async_trait]
impl NotificationRepo for MemoryNotificationRepo {
    async fn insert(
        &self,
        notification: &Notification,
    ) -> Result<NotificationClaim, RelationError> {
        let Some(key) = notification.dedup_key() else {
            self.rows
                .insert(notification.notification_id, notification.clone());
            return Ok(NotificationClaim::Created(notification.clone()));
        };

        match self.active.entry(key) {
            Entry::Occupied(mut slot) => {
                if let Some(existing) = self.active_row(*slot.get()) {
                    return Ok(NotificationClaim::Existing(existing));
                }
                // stale slot left behind by a concurrent tombstone
                self.rows
                    .insert(notification.notification_id, notification.clone());
                slot.insert(notification.notification_id);
                Ok(NotificationClaim::Created(notification.clone()))
            }
            Entry::Vacant(slot) => {
                self.rows
                    .insert(notification.notification_id, notification.clone());
                slot.insert(notification.notification_id);
                Ok(NotificationClaim::Created(notification.clone()))
            }
        }
    }

    async fn get(
        &self,
        notification_id: NotificationId,
    ) -> Result<Option<Notification>, RelationError> {
        Ok(self.rows.get(&notification_id).map(|row| row.clone()))
    }

    async fn find_active(&self, key: &DedupKey) -> Result<Option<Notification>, RelationError> {
        let Some(id) = self.active.get(key).map(|slot| *slot) else {
            return Ok(None);
        };
        Ok(self.active_row(id))
    }

    async fn mark_read(
        &self,
        notification_id: NotificationId,
    ) -> Result<Option<StateChange>, RelationError> {
        let Some(mut row) = self.rows.get_mut(&notification_id) else {
            return Ok(None);
        };
        if !row.is_active() {
            return Ok(None);
        }
        let changed = !row.is_read;
        row.is_read = true;

        Ok(Some(StateChange {
            notification: row.clone(),
            changed,
        }))
    }

    async fn mark_all_read(&self, receiver: UserId) -> Result<u64, RelationError> {
        let mut affected = 0;
        for mut row in self.rows.iter_mut() {
            if row.receiver == receiver && row.is_active() && !row.is_read {
                row.is_read = true;
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn tombstone(
        &self,
        notification_id: NotificationId,
        at: DateTime<Utc>,
    ) -> Result<Option<StateChange>, RelationError> {
        let change = {
            let Some(mut row) = self.rows.get_mut(&notification_id) else {
                return Ok(None);
            };
            let changed = !row.is_deleted;
            if changed {
                row.is_deleted = true;
                row.deleted_at = Some(at);
            }
            StateChange {
                notification: row.clone(),
                changed,
            }
        };

        if let Some(key) = change.notification.dedup_key() {
            self.active.remove_if(&key, |_, id| *id == notification_id);
        }
        Ok(Some(change))
    }

    async fn tombstone_all(
        &self,
        receiver: UserId,
        at: DateTime<Utc>,
    ) -> Result<u64, RelationError> {
        let ids: Vec<NotificationId> = self
            .rows
            .iter()
            .filter(|row| row.receiver == receiver && row.is_active())
            .map(|row| row.notification_id)
            .collect();

        let mut affected = 0;
        for id in ids {
            if let Some(change) = self.tombstone(id, at).await? {
                if change.changed {
                    affected += 1;
                }
            }
        }
        Ok(affected)
    }

    async fn list_active(
        &self,
        receiver: UserId,
        page_size: PageSize,
        before: Option<NotificationCursor>,
    ) -> Result<Vec<Notification>, RelationError> {
        let mut rows: Vec<Notification> = self
            .rows
            .iter()
            .filter(|row| row.receiver == receiver && row.is_active())
            .filter(|row| before.is_none_or(|cur| row.cursor() < cur))
            .map(|row| row.clone())
            .collect();
        rows.sort_by(|l, r| r.cursor().cmp(&l.cursor()));
        rows.truncate(page_size.clamped().0 as usize);
        Ok(rows)
    }

    async fn count_unread(&self, receiver: UserId) -> Result<u64, RelationError> {
        Ok(self
            .rows
            .iter()
            .filter(|row| row.receiver == receiver && row.is_active() && !row.is_read)
            .count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> (UserId, UserId) {
        (UserId(uuid::Uuid::new_v4()), UserId(uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn deduplicated_kind_resolves_to_active_row_until_tombstoned() {
        let repo = MemoryNotificationRepo::new();
        let (a, b) = users();
        let post = PostId(uuid::Uuid::new_v4());

        let first = Notification::new(a, b, NotificationKind::LikePost, NotificationExtra::post(post));
        let created = repo.insert(&first).await.unwrap();
        assert!(matches!(created, NotificationClaim::Created(_)));

        let again = Notification::new(a, b, NotificationKind::LikePost, NotificationExtra::post(post));
        match repo.insert(&again).await.unwrap() {
            NotificationClaim::Existing(n) => assert_eq!(n.notification_id, first.notification_id),
            NotificationClaim::Created(_) => panic!("duplicate like stored twice"),
        }

        repo.tombstone(first.notification_id, Utc::now()).await.unwrap();
        let after = repo.insert(&again).await.unwrap();
        assert!(matches!(after, NotificationClaim::Created(_)));
        assert_eq!(repo.rows.len(), 2);
    }

    #[tokio::test]
    async fn listing_skips_tombstones_and_pages_newest_first() {
        let repo = MemoryNotificationRepo::new();
        let (a, b) = users();

        let mut ids = Vec::new();
        for i in 0..5 {
            let mut n = Notification::new(
                a,
                b,
                NotificationKind::Message,
                NotificationExtra::message(MessageId(uuid::Uuid::new_v4())),
            );
            n.created_at = Utc::now() + chrono::Duration::seconds(i);
            repo.insert(&n).await.unwrap();
            ids.push(n.notification_id);
        }
        repo.tombstone(ids[4], Utc::now()).await.unwrap();

        let page = repo.list_active(b, PageSize(2), None).await.unwrap();
        assert_eq!(
            page.iter().map(|n| n.notification_id).collect::<Vec<_>>(),
            vec![ids[3], ids[2]]
        );

        let next = repo
            .list_active(b, PageSize(2), Some(page[1].cursor()))
            .await
            .unwrap();
        assert_eq!(
            next.iter().map(|n| n.notification_id).collect::<Vec<_>>(),
            vec![ids[1], ids[0]]
        );
        assert_eq!(repo.count_unread(b).await.unwrap(), 4);
        assert!(repo.list_active(a, PageSize(10), None).await.unwrap().is_empty());
    }
}
